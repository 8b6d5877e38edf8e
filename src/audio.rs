//! Audio playback frame-locked to the simulation clock.
//!
//! One decoded audio buffer (typically ATC/cockpit audio) follows the clock:
//! the desired playback offset is recomputed every tick and the output sink
//! is restarted whenever it no longer matches. The sink always plays at 1x
//! real time, so its playhead is modeled as the offset anchored at the last
//! restart plus accumulated real time; any discontinuity (a seek in either
//! direction, a rate change, sustained non-1x playback) drifts the clock's
//! desired offset away from that model and triggers a restart once the drift
//! passes a small tolerance. An identical re-tick never restarts playback.

use std::io::Cursor;
use std::time::Duration as StdDuration;

use chrono::Duration;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use crate::playback::PlaybackClock;

/// Sink drift beyond this triggers a restart at the recomputed offset.
const RESYNC_TOLERANCE_MS: i64 = 250;

/// Output-device seam so the sync logic is testable without a sound card.
pub trait AudioOutput {
    /// Start playback of the decoded buffer at `offset`, replacing any
    /// in-flight playback (no overlap).
    fn play_from(&mut self, offset: StdDuration);

    /// Stop any in-flight playback.
    fn stop(&mut self);

    /// Output gain in [0, 1]; never affects offset computation.
    fn set_gain(&mut self, gain: f32);
}

/// Keeps one decoded audio buffer aligned with the playback clock.
pub struct AudioSync {
    output: Box<dyn AudioOutput>,
    buffer_duration: Duration,
    origin_offset: Duration,
    armed: bool,
    playing: bool,
    /// Modeled sink playhead: the offset anchored at the last restart plus
    /// accumulated real time. `None` after any interruption.
    expected_offset: Option<Duration>,
    volume: f32,
    muted: bool,
}

impl AudioSync {
    /// `origin_offset` shifts the audio timeline relative to the clock's
    /// start time (the recording may begin before or after the telemetry).
    pub fn new(output: Box<dyn AudioOutput>, buffer_duration: StdDuration, origin_offset: Duration) -> Self {
        Self {
            output,
            buffer_duration: Duration::from_std(buffer_duration).unwrap_or(Duration::zero()),
            origin_offset,
            armed: false,
            playing: false,
            expected_offset: None,
            volume: 1.0,
            muted: false,
        }
    }

    /// Arm the session for playback. Idempotent; once armed, the session
    /// stays armed for the process lifetime (models the user-gesture unlock
    /// of the original host platform).
    pub fn arm(&mut self) {
        if !self.armed {
            self.armed = true;
            debug!("audio session armed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_gain();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_gain();
    }

    fn apply_gain(&mut self) {
        let gain = if self.muted { 0.0 } else { self.volume };
        self.output.set_gain(gain);
    }

    /// Drop playback continuity after an explicit discontinuity (seek, rate
    /// change, backward scrub). The next `sync` restarts at the recomputed
    /// offset unconditionally.
    pub fn interrupt(&mut self) {
        self.halt();
    }

    /// Advance the session to the clock's current tick. `real_dt` is the
    /// real wall time elapsed since the previous tick; the sink's playhead
    /// advances by it no matter how fast the clock runs.
    pub fn sync(&mut self, clock: &PlaybackClock, real_dt: StdDuration) {
        if !self.armed {
            return;
        }

        if !clock.is_playing() {
            self.halt();
            return;
        }

        let desired = (clock.current() - clock.start_time()) + self.origin_offset;

        // outside the recording: expected boundary, suppress without error
        if desired < Duration::zero() || desired > self.buffer_duration {
            self.halt();
            return;
        }

        let expected = self
            .expected_offset
            .map(|exp| exp + Duration::from_std(real_dt).unwrap_or(Duration::zero()));

        let drifted = match expected {
            Some(exp) => (desired - exp).num_milliseconds().abs() > RESYNC_TOLERANCE_MS,
            None => true,
        };

        if !self.playing || drifted {
            self.output.stop();
            let offset = desired
                .to_std()
                .unwrap_or(StdDuration::ZERO);
            self.output.play_from(offset);
            self.playing = true;
            // re-anchor the playhead model at the restart offset
            self.expected_offset = Some(desired);
        } else {
            self.expected_offset = expected;
        }
    }

    fn halt(&mut self) {
        if self.playing {
            self.output.stop();
            self.playing = false;
        }
        self.expected_offset = None;
    }
}

/// Production output path: decoded samples played through a rodio sink.
pub struct RodioOutput {
    // the stream must stay alive for the sink to produce sound
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    gain: f32,
}

impl RodioOutput {
    /// Decode `bytes` (wav/mp3/flac per rodio) and open the default output
    /// device. Returns the output and the decoded buffer duration.
    pub fn decode(bytes: Vec<u8>) -> anyhow::Result<(Self, StdDuration)> {
        let decoder = Decoder::new(Cursor::new(bytes))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples().collect();

        let frames = samples.len() as u64 / channels.max(1) as u64;
        let duration = StdDuration::from_secs_f64(frames as f64 / sample_rate.max(1) as f64);

        let (stream, handle) = OutputStream::try_default()?;
        debug!(
            "decoded audio: {} ch, {} Hz, {:.1} s",
            channels,
            sample_rate,
            duration.as_secs_f64()
        );

        Ok((
            Self {
                _stream: stream,
                handle,
                sink: None,
                samples,
                channels,
                sample_rate,
                gain: 1.0,
            },
            duration,
        ))
    }
}

impl AudioOutput for RodioOutput {
    fn play_from(&mut self, offset: StdDuration) {
        self.stop();

        let start = (offset.as_secs_f64() * self.sample_rate as f64) as usize * self.channels as usize;
        if start >= self.samples.len() {
            return;
        }

        match Sink::try_new(&self.handle) {
            Ok(sink) => {
                sink.set_volume(self.gain);
                sink.append(SamplesBuffer::new(
                    self.channels,
                    self.sample_rate,
                    self.samples[start..].to_vec(),
                ));
                self.sink = Some(sink);
            }
            Err(e) => warn!("audio sink unavailable: {}", e),
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
        if let Some(sink) = &self.sink {
            sink.set_volume(gain);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    const NO_TIME: StdDuration = StdDuration::ZERO;
    const FRAME: StdDuration = StdDuration::from_millis(100);

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_658_084_400 + secs, 0).unwrap()
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Play(StdDuration),
        Stop,
        Gain(f32),
    }

    #[derive(Clone, Default)]
    struct MockOutput {
        events: Rc<RefCell<Vec<Event>>>,
    }

    impl AudioOutput for MockOutput {
        fn play_from(&mut self, offset: StdDuration) {
            self.events.borrow_mut().push(Event::Play(offset));
        }
        fn stop(&mut self) {
            self.events.borrow_mut().push(Event::Stop);
        }
        fn set_gain(&mut self, gain: f32) {
            self.events.borrow_mut().push(Event::Gain(gain));
        }
    }

    fn sync_with_mock(buffer_secs: u64, origin_offset_secs: i64) -> (AudioSync, Rc<RefCell<Vec<Event>>>) {
        let mock = MockOutput::default();
        let events = mock.events.clone();
        let sync = AudioSync::new(
            Box::new(mock),
            StdDuration::from_secs(buffer_secs),
            Duration::seconds(origin_offset_secs),
        );
        (sync, events)
    }

    fn play_count(events: &Rc<RefCell<Vec<Event>>>) -> usize {
        events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Play(_)))
            .count()
    }

    #[test]
    fn test_unarmed_session_is_inert() {
        let (mut audio, events) = sync_with_mock(60, 0);
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.play();
        audio.sync(&clock, NO_TIME);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_arm_is_idempotent() {
        let (mut audio, _) = sync_with_mock(60, 0);
        audio.arm();
        audio.arm();
        assert!(audio.is_armed());
    }

    #[test]
    fn test_starts_at_clock_offset() {
        let (mut audio, events) = sync_with_mock(60, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.seek(t(10));
        clock.play();
        audio.sync(&clock, NO_TIME);
        assert_eq!(
            events.borrow()[..],
            [Event::Stop, Event::Play(StdDuration::from_secs(10))]
        );
    }

    #[test]
    fn test_identical_retick_does_not_restart() {
        let (mut audio, events) = sync_with_mock(60, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.play();
        audio.sync(&clock, NO_TIME);
        audio.sync(&clock, NO_TIME);
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 1);
    }

    #[test]
    fn test_steady_playback_does_not_restart() {
        let (mut audio, events) = sync_with_mock(100, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.play();
        for _ in 0..20 {
            clock.advance(FRAME);
            audio.sync(&clock, FRAME);
        }
        assert_eq!(play_count(&events), 1);
    }

    #[test]
    fn test_interrupt_restarts_at_new_offset() {
        let (mut audio, events) = sync_with_mock(100, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.play();
        audio.sync(&clock, NO_TIME);

        clock.seek(t(42));
        audio.interrupt();
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 2);
        assert_eq!(
            *events.borrow().last().unwrap(),
            Event::Play(StdDuration::from_secs(42))
        );
    }

    #[test]
    fn test_forward_seek_drifts_into_restart() {
        // no explicit interrupt: the jump itself must show up as drift
        let (mut audio, events) = sync_with_mock(100, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.play();
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 1);

        clock.seek(t(50));
        audio.sync(&clock, StdDuration::from_millis(33));
        assert_eq!(play_count(&events), 2);
        assert_eq!(
            *events.borrow().last().unwrap(),
            Event::Play(StdDuration::from_secs(50))
        );
    }

    #[test]
    fn test_double_speed_playback_relocks() {
        // at 2x the clock gains 100 ms on the sink per 100 ms frame; the
        // drift passes the tolerance every third frame and re-anchors
        let (mut audio, events) = sync_with_mock(300, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(300));
        clock.set_multiplier(2.0);
        clock.play();
        for _ in 0..10 {
            clock.advance(FRAME);
            audio.sync(&clock, FRAME);
        }
        assert_eq!(play_count(&events), 4);
        assert_eq!(
            *events.borrow().last().unwrap(),
            Event::Play(StdDuration::from_secs(2))
        );
    }

    #[test]
    fn test_pause_stops_playback() {
        let (mut audio, events) = sync_with_mock(100, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.play();
        audio.sync(&clock, NO_TIME);

        clock.pause();
        audio.sync(&clock, NO_TIME);
        assert_eq!(*events.borrow().last().unwrap(), Event::Stop);

        // resuming restarts from the clock offset
        clock.play();
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 2);
    }

    #[test]
    fn test_offset_outside_buffer_suppresses_playback() {
        // 20 s recording, clock spans 100 s
        let (mut audio, events) = sync_with_mock(20, 0);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.seek(t(50));
        clock.play();
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 0);

        // scrubbing back inside the recording resumes
        clock.seek(t(10));
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 1);
    }

    #[test]
    fn test_negative_origin_offset_delays_audio() {
        // recording starts 30 s after the telemetry
        let (mut audio, events) = sync_with_mock(60, -30);
        audio.arm();
        let mut clock = PlaybackClock::new(t(0), t(100));
        clock.seek(t(10));
        clock.play();
        audio.sync(&clock, NO_TIME);
        assert_eq!(play_count(&events), 0);

        clock.seek(t(40));
        audio.sync(&clock, NO_TIME);
        assert_eq!(
            *events.borrow().last().unwrap(),
            Event::Play(StdDuration::from_secs(10))
        );
    }

    #[test]
    fn test_gain_controls_do_not_touch_offset() {
        let (mut audio, events) = sync_with_mock(60, 0);
        audio.arm();
        audio.set_volume(0.5);
        audio.set_muted(true);
        audio.set_muted(false);
        let gains: Vec<f32> = events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Gain(g) => Some(*g),
                _ => None,
            })
            .collect();
        assert_eq!(gains, vec![0.5, 0.0, 0.5]);
        assert_eq!(play_count(&events), 0);
    }
}
