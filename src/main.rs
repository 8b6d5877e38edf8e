//! Headless replay CLI.
//!
//! Each argument is a directory named after an entity (tail number) holding
//! its recorded files:
//!
//! ```text
//! N97CX/
//!   position.csv      required: time,lat,lon,alt_ft
//!   attitude.csv      optional: time,heading,pitch,roll
//!   groundspeed.csv   optional step-hold channels: time,value
//!   cas.csv
//!   bank.csv
//!   availability.csv  optional: start,stop (absent outside this interval)
//!   audio.wav         optional (first one found drives the audio session)
//! ```
//!
//! The CLI stands in for the rendering layer: it drives the tick loop in
//! real time and logs interpolated state once per second.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use flightscrub::audio::{AudioSync, RodioOutput};
use flightscrub::core::Track;
use flightscrub::engine::ReplayEngine;
use flightscrub::entity::{Channel, Entity};
use flightscrub::input::{
    load_attitude_csv, load_availability_csv, load_instrument_csv, load_position_csv,
    read_file_bytes, LoadOutcome, OneShotLoader,
};
use flightscrub::settings::ReplaySettings;

const FRAME: Duration = Duration::from_millis(33);

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let dirs: Vec<String> = std::env::args().skip(1).collect();
    if dirs.is_empty() {
        bail!("usage: flightscrub <entity-dir> [<entity-dir>...]");
    }

    let settings = ReplaySettings::load();

    let mut entities = Vec::new();
    let mut audio_bytes: Option<Vec<u8>> = None;
    for dir in &dirs {
        let (entity, audio) = load_entity(Path::new(dir))?;
        if audio_bytes.is_none() {
            audio_bytes = audio;
        }
        entities.push(entity);
    }

    let (start, stop) = session_bounds(&entities)
        .context("no entity has any position samples")?;
    info!(
        "session {} .. {} ({} entities)",
        start,
        stop,
        entities.len()
    );

    let mut engine = ReplayEngine::new(start, stop);
    engine.set_history_enabled(settings.history_enabled);
    engine.set_history_window_secs(settings.history_window_secs);
    engine.set_playback_multiplier(forward_rate(settings.playback_multiplier));
    for entity in entities {
        engine.add_entity(entity);
    }

    if let Some(bytes) = audio_bytes {
        match RodioOutput::decode(bytes) {
            Ok((output, duration)) => {
                let mut audio =
                    AudioSync::new(Box::new(output), duration, chrono::Duration::zero());
                audio.set_volume(settings.volume);
                audio.set_muted(settings.muted);
                engine.attach_audio(audio);
                engine.arm_audio();
            }
            // degraded mode: replay continues without sound
            Err(e) => warn!("audio unavailable: {}", e),
        }
    }

    run(&mut engine);

    settings.save();
    Ok(())
}

/// Load one entity directory; returns the entity and any audio bytes found.
fn load_entity(dir: &Path) -> Result<(Entity, Option<Vec<u8>>)> {
    let id = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());

    let position_path = dir.join("position.csv");
    let records = load_position_csv(&position_path.to_string_lossy())
        .with_context(|| format!("entity {id}"))?;
    let mut entity = Entity::new(&id, Track::build(records));

    let attitude_path = dir.join("attitude.csv");
    if attitude_path.exists() {
        let records = load_attitude_csv(&attitude_path.to_string_lossy())
            .with_context(|| format!("entity {id}"))?;
        entity.set_attitude(Track::build(records));
    }

    // instrument channels load in the background; absent files are normal
    let channels = [
        (Channel::GroundSpeed, "groundspeed.csv"),
        (Channel::Cas, "cas.csv"),
        (Channel::Bank, "bank.csv"),
    ];
    for (channel, file) in channels {
        let path = dir.join(file);
        let loader = OneShotLoader::spawn(move || {
            if !path.exists() {
                return Ok(None);
            }
            load_instrument_csv(&path.to_string_lossy())
                .map(Some)
                .map_err(|e| flightscrub::input::LoadError::Parse(e.to_string()))
        });
        match loader.wait() {
            LoadOutcome::Ready(records) => {
                entity.set_instrument(channel, Track::build(records));
            }
            LoadOutcome::Absent => {}
            LoadOutcome::Failed(msg) => {
                warn!("{}: {} channel unavailable: {}", id, channel.name(), msg)
            }
        }
    }

    // optional availability window, e.g. a post-collision cutoff
    let window_path = dir.join("availability.csv");
    if window_path.exists() {
        match load_availability_csv(&window_path.to_string_lossy()) {
            Ok((start, stop)) => entity.set_availability(start, stop),
            Err(e) => warn!("{}: availability window ignored: {}", id, e),
        }
    }

    let audio = match read_file_bytes(&dir.join("audio.wav")) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("{}: audio unavailable: {}", id, e);
            None
        }
    };

    Ok((entity, audio))
}

/// The CLI runs the session forward to completion; a persisted zero or
/// reverse rate would pin the clock and spin the loop forever.
fn forward_rate(rate: f64) -> f64 {
    if rate > 0.0 {
        rate
    } else {
        warn!("ignoring non-forward playback rate {rate}, using 1x");
        1.0
    }
}

fn session_bounds(entities: &[Entity]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = entities
        .iter()
        .filter_map(|e| e.position_track().first_time())
        .min()?;
    let stop = entities
        .iter()
        .filter_map(|e| e.position_track().last_time())
        .max()?;
    Some((start, stop))
}

fn run(engine: &mut ReplayEngine) {
    engine.play();

    let ids: Vec<String> = engine.entity_ids().iter().map(|s| s.to_string()).collect();
    let mut last_report = Instant::now();
    let mut last_frame = Instant::now();

    loop {
        let dt = last_frame.elapsed();
        last_frame = Instant::now();
        engine.advance(dt);

        let now = engine.clock().current();
        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            for id in &ids {
                report(engine, id, now);
            }
        }

        if now >= engine.clock().stop_time() {
            info!("end of recording");
            break;
        }
        thread::sleep(FRAME);
    }
}

fn report(engine: &ReplayEngine, id: &str, now: DateTime<Utc>) {
    match engine.query_position(id, now) {
        Some(pos) => {
            let heading = engine
                .query_orientation(id, now)
                .map(|a| format!("{:6.1}°", a.heading_deg))
                .unwrap_or_else(|| "  --  ".into());
            let gs = engine
                .query_instrument(id, Channel::GroundSpeed, now)
                .map(|v| format!("{v:.0} kt"))
                .unwrap_or_else(|| "--".into());
            info!(
                "{:8} {:9.5},{:10.5} {:6.0} ft hdg {} gs {} trail {}",
                id,
                pos.lat_deg,
                pos.lon_deg,
                pos.alt_ft,
                heading,
                gs,
                engine.trail(id).len()
            );
        }
        None => info!("{:8} (absent)", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_rate_rejects_pinned_and_reverse() {
        assert_eq!(forward_rate(2.0), 2.0);
        assert_eq!(forward_rate(0.0), 1.0);
        assert_eq!(forward_rate(-5.0), 1.0);
    }
}
