use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use board::BoardState;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use crate::{BoardDetector, DetectionFailure, SnapshotSource};

/// Receives the outcome of every scan. Called from the monitor thread.
pub trait BoardListener: Send + Sync {
    fn on_board(&self, state: &BoardState);

    /// Only failures worth reporting; a missing king is never delivered.
    fn on_detection_failure(&self, failure: &DetectionFailure);
}

/// Polls a snapshot source and scans every capture.
pub struct BoardMonitor {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

struct PollLoop {
    detector: Box<dyn BoardDetector>,
    source: Box<dyn SnapshotSource>,
    listeners: Vec<Arc<dyn BoardListener>>,
    interval: Duration,
    stop: Receiver<()>,
}

impl BoardMonitor {
    pub fn start(
        detector: Box<dyn BoardDetector>,
        source: Box<dyn SnapshotSource>,
        listeners: Vec<Arc<dyn BoardListener>>,
        interval: Duration,
    ) -> io::Result<Self> {
        let (stop_tx, stop) = bounded(0);
        let poll = PollLoop {
            detector,
            source,
            listeners,
            interval,
            stop,
        };

        let handle = thread::Builder::new()
            .name("board-monitor".to_string())
            .spawn(move || poll.run())?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Waits for the scan in progress, then ends polling.
    pub fn stop(&mut self) {
        if self.stop_tx.take().is_none() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BoardMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollLoop {
    fn run(mut self) {
        info!("Board monitor started, polling every {:?}", self.interval);
        loop {
            match self.scan() {
                Ok(state) => {
                    for listener in &self.listeners {
                        listener.on_board(&state);
                    }
                }
                Err(failure) if failure.is_reported() => {
                    for listener in &self.listeners {
                        listener.on_detection_failure(&failure);
                    }
                }
                Err(failure) => debug!("Skipping scan: {}", failure),
            }

            match self.stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                _ => break,
            }
        }
        info!("Board monitor stopped");
    }

    fn scan(&mut self) -> Result<BoardState, DetectionFailure> {
        let snapshot = self
            .source
            .capture()
            .map_err(|e| DetectionFailure::SnapshotUnavailable(e.to_string()))?;
        self.detector.scan(&snapshot)
    }
}
