//! CSV record adapters for per-entity telemetry files.
//!
//! The engine proper consumes parsed record sequences; these loaders turn the
//! recorded CSV files into them. Column order is not fixed across recordings,
//! so columns are located by header name. Rows that fail to parse are skipped
//! (the track build counts them), never fatal.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::core::{Attitude, GeoPos, Sample};

/// Load position records `{time, lat, lon, altitude_ft}`.
pub fn load_position_csv(path: &str) -> Result<Vec<Sample<GeoPos>>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open position file {path}"))?;

    let headers = rdr.headers()?;
    let time_idx = find_column(headers, &["time", "timestamp", "t", "ts"])?;
    let lat_idx = find_column(headers, &["lat", "latitude"])?;
    let lon_idx = find_column(headers, &["lon", "lng", "longitude"])?;
    let alt_idx = find_column(headers, &["alt", "altitude", "alt_ft", "altitude_ft"])?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result.context("failed to read CSV row")?;
        let parsed = (|| {
            let time = parse_time(record.get(time_idx)?)?;
            let lat = record.get(lat_idx)?.trim().parse::<f64>().ok()?;
            let lon = record.get(lon_idx)?.trim().parse::<f64>().ok()?;
            let alt = record.get(alt_idx)?.trim().parse::<f64>().ok()?;
            Some(Sample::new(time, GeoPos::new(lat, lon, alt)))
        })();
        match parsed {
            Some(sample) => samples.push(sample),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{path}: skipped {skipped} malformed position rows");
    }
    Ok(samples)
}

/// Load attitude records `{time, heading_deg, pitch_deg, roll_deg}`.
pub fn load_attitude_csv(path: &str) -> Result<Vec<Sample<Attitude>>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open attitude file {path}"))?;

    let headers = rdr.headers()?;
    let time_idx = find_column(headers, &["time", "timestamp", "t", "ts"])?;
    let hdg_idx = find_column(headers, &["heading", "heading_deg", "hdg", "true_heading"])?;
    let pitch_idx = find_column(headers, &["pitch", "pitch_deg"])?;
    let roll_idx = find_column(headers, &["roll", "roll_deg", "bank", "bank_deg"])?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result.context("failed to read CSV row")?;
        let parsed = (|| {
            let time = parse_time(record.get(time_idx)?)?;
            let heading = record.get(hdg_idx)?.trim().parse::<f64>().ok()?;
            let pitch = record.get(pitch_idx)?.trim().parse::<f64>().ok()?;
            let roll = record.get(roll_idx)?.trim().parse::<f64>().ok()?;
            Some(Sample::new(time, Attitude::new(heading, pitch, roll)))
        })();
        match parsed {
            Some(sample) => samples.push(sample),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{path}: skipped {skipped} malformed attitude rows");
    }
    Ok(samples)
}

/// Load a step-hold instrument series `{time, value}` (groundspeed, CAS,
/// bank, one file per channel).
pub fn load_instrument_csv(path: &str) -> Result<Vec<Sample<f64>>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open instrument file {path}"))?;

    let headers = rdr.headers()?;
    let time_idx = find_column(headers, &["time", "timestamp", "t", "ts"])?;
    let value_idx = find_column(
        headers,
        &["value", "val", "speed", "kts", "groundspeed", "cas", "bank"],
    )?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = result.context("failed to read CSV row")?;
        let parsed = (|| {
            let time = parse_time(record.get(time_idx)?)?;
            let value = record.get(value_idx)?.trim().parse::<f64>().ok()?;
            Some(Sample::new(time, value))
        })();
        match parsed {
            Some(sample) => samples.push(sample),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("{path}: skipped {skipped} malformed instrument rows");
    }
    Ok(samples)
}

/// Load an availability window `{start, stop}`: the interval outside which
/// the entity is absent from the scene. One data row expected.
pub fn load_availability_csv(path: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open availability file {path}"))?;

    let headers = rdr.headers()?;
    let start_idx = find_column(headers, &["start", "from", "begin"])?;
    let stop_idx = find_column(headers, &["stop", "to", "end"])?;

    let record = rdr
        .records()
        .next()
        .context("availability file has no data row")??;
    let start = record
        .get(start_idx)
        .and_then(parse_time)
        .context("unparseable start instant")?;
    let stop = record
        .get(stop_idx)
        .and_then(parse_time)
        .context("unparseable stop instant")?;
    Ok((start, stop))
}

/// Parse a recorded timestamp: RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// local-less timestamp taken as UTC, or fractional Unix seconds.
fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    if let Ok(secs) = s.parse::<f64>() {
        if secs.is_finite() {
            return DateTime::from_timestamp_millis((secs * 1000.0).round() as i64);
        }
    }
    None
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }

    anyhow::bail!("Could not find column with names: {:?}", names)
}
