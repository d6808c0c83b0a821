use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use log::{debug, info, warn};
use uci::{EngineInput, GoParams};

use crate::session::{multi_pv, SessionState, Shared};
use crate::EngineError;

/// Commands queued for the dispatcher thread.
pub(crate) enum EngineCommand {
    /// Write `stop` and `quit`, then exit.
    Quit,
    /// Search a position. `ack` receives the done signal once the position is handed off.
    SetPosition {
        notation: String,
        ack: Sender<Receiver<()>>,
    },
    /// Move time for the following searches.
    SetTimeBudget(Duration),
    /// Number of variations the engine reports.
    SetLineCount(u8),
}

/// The search currently owned by the engine. Consumed by the reader on `bestmove`.
pub(crate) struct ActiveSearch {
    pub notation: String,
    pub done: Sender<()>,
}

/// Serializes every command written to the engine.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    commands: Receiver<EngineCommand>,
    backlog: Option<EngineCommand>,
    slot: Sender<ActiveSearch>,
    shutdown: Receiver<()>,
    move_time: Duration,
    settle_delay: Duration,
}

impl Dispatcher {
    pub(crate) fn new(
        shared: Arc<Shared>,
        commands: Receiver<EngineCommand>,
        slot: Sender<ActiveSearch>,
        shutdown: Receiver<()>,
        move_time: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            shared,
            commands,
            backlog: None,
            slot,
            shutdown,
            move_time,
            settle_delay,
        }
    }

    /// Main loop: process commands until Quit, shutdown or a write failure.
    pub(crate) fn run(mut self) {
        while let Some(command) = self.next_command() {
            let result = match command {
                EngineCommand::Quit => {
                    self.quit();
                    break;
                }
                EngineCommand::SetPosition { notation, ack } => self.search(notation, ack),
                EngineCommand::SetTimeBudget(move_time) => {
                    info!("Engine move time set to {:?}", move_time);
                    self.move_time = move_time;
                    Ok(true)
                }
                EngineCommand::SetLineCount(count) => {
                    info!("Engine line count set to {}", count);
                    self.shared.send(&multi_pv(count)).map(|_| true)
                }
            };

            match result {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    self.shared.raise_fatal(e);
                    break;
                }
            }
        }
        debug!("Engine dispatcher exited");
    }

    /// Next command to run. Back-to-back positions collapse to the most recent one.
    /// Once the session is stopping, pending positions are drained unsearched.
    fn next_command(&mut self) -> Option<EngineCommand> {
        loop {
            let mut command = match self.backlog.take() {
                Some(command) => command,
                None => self.commands.recv().ok()?,
            };

            if self.shared.is_stopping() {
                if let EngineCommand::SetPosition { notation, .. } = &command {
                    debug!("Engine stopping, dropping position {}", notation);
                    continue;
                }
                return Some(command);
            }

            while let EngineCommand::SetPosition { notation, .. } = &command {
                match self.commands.try_recv() {
                    Ok(next @ EngineCommand::SetPosition { .. }) => {
                        warn!("Dropping superseded position {}", notation);
                        command = next;
                    }
                    Ok(other) => {
                        self.backlog = Some(other);
                        break;
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            return Some(command);
        }
    }

    /// Returns false when the session is shutting down.
    fn search(
        &mut self,
        notation: String,
        ack: Sender<Receiver<()>>,
    ) -> Result<bool, EngineError> {
        if self.shared.is_stopping() {
            debug!("Engine stopping, not searching {}", notation);
            return Ok(true);
        }
        self.shared.send(&EngineInput::Stop)?;

        // Blocks until the previous search's bestmove has been consumed
        let (done_tx, done_rx) = bounded(1);
        let active = ActiveSearch {
            notation: notation.clone(),
            done: done_tx,
        };
        select! {
            send(self.slot, active) -> res => {
                if res.is_err() {
                    return Ok(false);
                }
            }
            recv(self.shutdown) -> _ => {
                debug!("Shutdown while handing off {}", notation);
                return Ok(false);
            }
        }
        if self.shared.is_stopping() {
            debug!("Engine stopping after handing off {}", notation);
            return Ok(true);
        }
        let _ = ack.send(done_rx);
        self.shared.set_state(SessionState::Searching);

        self.shared.send(&EngineInput::UciNewGame)?;
        self.shared.send(&EngineInput::Position { fen: notation })?;
        self.shared.send(&EngineInput::Go(GoParams {
            move_time: Some(self.move_time.as_millis() as u64),
        }))?;

        // Cut short by shutdown
        let _ = self.shutdown.recv_timeout(self.settle_delay);
        Ok(true)
    }

    fn quit(&self) {
        if let Err(e) = self
            .shared
            .send(&EngineInput::Stop)
            .and_then(|_| self.shared.send(&EngineInput::Quit))
        {
            warn!("Failed to quit engine: {}", e);
        }
    }
}
