use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, Receiver};
use log::debug;

use crate::session::Shared;
use crate::EngineError;

/// Escalates when a handed-off search never produces its bestmove.
pub(crate) struct Watchdog {
    shared: Arc<Shared>,
    notation: String,
    ack: Receiver<Receiver<()>>,
    shutdown: Receiver<()>,
    deadline: Duration,
}

impl Watchdog {
    pub(crate) fn new(
        shared: Arc<Shared>,
        notation: String,
        ack: Receiver<Receiver<()>>,
        shutdown: Receiver<()>,
        deadline: Duration,
    ) -> Self {
        Self {
            shared,
            notation,
            ack,
            shutdown,
            deadline,
        }
    }

    pub(crate) fn run(self) {
        // Wait for the dispatcher to hand the position to the engine
        let done = select! {
            recv(self.ack) -> done => match done {
                Ok(done) => done,
                Err(_) => {
                    debug!("Position {:?} was superseded", self.notation);
                    return;
                }
            },
            recv(self.shutdown) -> _ => return,
        };

        select! {
            recv(done) -> result => {
                if result.is_err() {
                    debug!("Search of {:?} abandoned", self.notation);
                }
            }
            recv(self.shutdown) -> _ => {}
            default(self.deadline) => {
                self.shared.raise_fatal(EngineError::Timeout {
                    notation: self.notation,
                    deadline: self.deadline,
                });
            }
        }
    }
}
