//! One-shot background resource loads.
//!
//! Per-entity resources (instrument CSVs, the audio recording) load on a
//! worker thread and report back over a channel polled from the tick loop,
//! so a slow or missing file never blocks a frame. Each load reaches exactly
//! one terminal state: `Ready`, `Absent` (file not present, non-fatal), or
//! `Failed` (that feature stays inert; no automatic retry).

use std::io::ErrorKind;
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed records: {0}")]
    Parse(String),
}

/// Terminal state of a one-shot load.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    Ready(T),
    /// The resource does not exist for this entity; not a fault.
    Absent,
    /// Load or decode failed; the dependent feature stays unavailable.
    Failed(String),
}

/// Handle to a load running on a worker thread. Poll from the tick loop.
pub struct OneShotLoader<T> {
    rx: Receiver<LoadOutcome<T>>,
    finished: bool,
}

impl<T: Send + 'static> OneShotLoader<T> {
    /// Run `job` on a worker thread. `Ok(None)` maps to `Absent`.
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce() -> Result<Option<T>, LoadError> + Send + 'static,
    {
        let (tx, rx) = channel();
        thread::spawn(move || {
            let outcome = match job() {
                Ok(Some(value)) => LoadOutcome::Ready(value),
                Ok(None) => LoadOutcome::Absent,
                Err(e) => {
                    warn!("background load failed: {}", e);
                    LoadOutcome::Failed(e.to_string())
                }
            };
            // receiver may already be gone if the entity was unloaded
            let _ = tx.send(outcome);
        });
        Self { rx, finished: false }
    }

    /// Non-blocking poll; yields the terminal state exactly once.
    pub fn poll(&mut self) -> Option<LoadOutcome<T>> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.finished = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(LoadOutcome::Failed("loader thread vanished".into()))
            }
        }
    }

    /// Block until the load finishes (CLI startup path).
    pub fn wait(self) -> LoadOutcome<T> {
        self.rx
            .recv()
            .unwrap_or_else(|_| LoadOutcome::Failed("loader thread vanished".into()))
    }
}

/// Read a whole file, mapping a missing file to `Ok(None)` (absent).
pub fn read_file_bytes(path: &Path) -> Result<Option<Vec<u8>>, LoadError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_ready_outcome() {
        let loader = OneShotLoader::spawn(|| Ok(Some(42u32)));
        match loader.wait() {
            LoadOutcome::Ready(v) => assert_eq!(v, 42),
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_outcome() {
        let loader: OneShotLoader<u32> = OneShotLoader::spawn(|| Ok(None));
        assert!(matches!(loader.wait(), LoadOutcome::Absent));
    }

    #[test]
    fn test_failed_outcome() {
        let loader: OneShotLoader<u32> =
            OneShotLoader::spawn(|| Err(LoadError::Parse("bad header".into())));
        match loader.wait() {
            LoadOutcome::Failed(msg) => assert!(msg.contains("bad header")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_poll_yields_once() {
        let mut loader = OneShotLoader::spawn(|| Ok(Some(1u32)));
        let mut seen = None;
        for _ in 0..200 {
            if let Some(outcome) = loader.poll() {
                seen = Some(outcome);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(seen, Some(LoadOutcome::Ready(1))));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_read_missing_file_is_absent() {
        let path = std::env::temp_dir().join("flightscrub_definitely_missing.bin");
        assert!(matches!(read_file_bytes(&path), Ok(None)));
    }
}
