//! The helper: decides what the user is shown and when the engine is asked.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use board::{decode_move, BoardState};
use engine::{EngineError, EngineListener, SearchLine};
use log::{debug, error, info, warn};
use vision::{BoardListener, DetectionFailure};

use crate::backend::{BackendLauncher, EngineFault, SearchBackend};
use crate::options::HelperOptions;
use crate::presenter::{CandidateMove, PositionView, Presenter};
use crate::throttle::NoticeThrottle;

const MAX_RESTARTS: u32 = 5;
const NO_BEST_MOVE: &str = "No best move found";

/// Commands from the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum HelperCommand {
    /// Seconds per search.
    SetTimeBudget(u64),
    SetLineCount(u8),
    /// Treat the next board as if the opponent just moved.
    ForceMyMoveNext,
    SetAssist(bool),
    ShowOptions,
}

/// Everything the helper reacts to, in arrival order.
#[derive(Debug)]
pub enum HelperEvent {
    Board(BoardState),
    DetectionFailed(DetectionFailure),
    SearchResult {
        generation: u64,
        notation: String,
        line: Option<SearchLine>,
    },
    EngineFatal {
        generation: u64,
        message: String,
    },
    Command(HelperCommand),
    Shutdown,
}

/// Tags engine reports with the session they came from.
struct EngineEvents {
    generation: u64,
    events: Sender<HelperEvent>,
}

impl EngineListener for EngineEvents {
    fn on_search_result(&self, notation: &str, line: Option<&SearchLine>) {
        let _ = self.events.send(HelperEvent::SearchResult {
            generation: self.generation,
            notation: notation.to_string(),
            line: line.cloned(),
        });
    }

    fn on_engine_fatal(&self, error: &EngineError) {
        let _ = self.events.send(HelperEvent::EngineFatal {
            generation: self.generation,
            message: error.to_string(),
        });
    }
}

struct BoardEvents {
    events: Sender<HelperEvent>,
}

impl BoardListener for BoardEvents {
    fn on_board(&self, state: &BoardState) {
        let _ = self.events.send(HelperEvent::Board(state.clone()));
    }

    fn on_detection_failure(&self, failure: &DetectionFailure) {
        let _ = self.events.send(HelperEvent::DetectionFailed(failure.clone()));
    }
}

pub struct Helper {
    options: HelperOptions,
    launcher: Box<dyn BackendLauncher>,
    backend: Option<Box<dyn SearchBackend>>,
    generation: u64,
    presenter: Box<dyn Presenter>,
    events_tx: Sender<HelperEvent>,
    events: Receiver<HelperEvent>,
    last_published: Option<BoardState>,
    active: Option<String>,
    force_my_move: bool,
    throttle: NoticeThrottle,
}

impl Helper {
    pub fn new(
        options: HelperOptions,
        launcher: Box<dyn BackendLauncher>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        let (events_tx, events) = mpsc::channel();
        Self {
            options,
            launcher,
            backend: None,
            generation: 0,
            presenter,
            events_tx,
            events,
            last_published: None,
            active: None,
            force_my_move: false,
            throttle: NoticeThrottle::default(),
        }
    }

    /// Feeds commands and the shutdown signal into the event loop.
    pub fn sender(&self) -> Sender<HelperEvent> {
        self.events_tx.clone()
    }

    /// Listener to register with the board monitor.
    pub fn board_listener(&self) -> Arc<dyn BoardListener> {
        Arc::new(BoardEvents {
            events: self.events_tx.clone(),
        })
    }

    /// Launches the first engine session.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.launch()
    }

    /// Handles events until shutdown.
    pub fn run(&mut self) {
        while let Ok(event) = self.events.recv() {
            if !self.handle(event) {
                break;
            }
        }
        info!("Helper stopped");
    }

    /// Stops the engine session. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.shutdown();
        }
    }

    /// Handles a single event. Returns false if we should quit.
    pub fn handle(&mut self, event: HelperEvent) -> bool {
        match event {
            HelperEvent::Board(state) => self.on_board(state),
            HelperEvent::DetectionFailed(failure) => self.on_detection_failure(failure),
            HelperEvent::SearchResult {
                generation,
                notation,
                line,
            } => {
                if generation == self.generation {
                    self.on_search_result(&notation, line.as_ref());
                } else {
                    debug!("Ignoring result from engine session {}", generation);
                }
            }
            HelperEvent::EngineFatal {
                generation,
                message,
            } => {
                if generation == self.generation {
                    self.on_engine_fatal(&message);
                } else {
                    debug!("Ignoring failure of engine session {}", generation);
                }
            }
            HelperEvent::Command(command) => self.on_command(command),
            HelperEvent::Shutdown => return false,
        }
        true
    }

    fn on_board(&mut self, state: BoardState) {
        let state = if self.force_my_move {
            self.force_my_move = false;
            self.last_published = None;
            self.active = None;
            info!("Treating the board as my move");
            state.with_move_side(state.my_side().opponent())
        } else {
            state
        };

        if let Some(last) = &self.last_published {
            if last.is_same(&state) && last.move_side() == state.move_side() {
                return;
            }
            if last.is_same_move(&state) {
                debug!("Dropping probable false detection: {}", state);
                return;
            }
        }

        debug!("Board: {}", state);
        self.presenter.show_position(&PositionView {
            grid: *state.grid(),
            my_side: state.my_side(),
            last_move_to: state.last_move_to(),
            last_move_from: state.last_move_from(),
            my_turn: state.is_my_turn(),
        });

        if state.is_my_turn() && self.options.assist.value {
            self.submit(&state);
        } else {
            self.active = None;
        }
        self.last_published = Some(state);
    }

    fn submit(&mut self, state: &BoardState) {
        let notation = state.full_notation();
        if self.active.as_deref() == Some(notation) {
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            debug!("No engine running, not searching {}", notation);
            return;
        };

        backend.submit_position(notation);
        self.active = Some(notation.to_string());
        self.presenter.show_candidates(&[]);
    }

    fn on_search_result(&mut self, notation: &str, line: Option<&SearchLine>) {
        if self.active.as_deref() != Some(notation) {
            debug!("Discarding stale result for {}", notation);
            return;
        }
        let Some(side) = self.last_published.as_ref().map(BoardState::my_side) else {
            return;
        };

        let Some(line) = line else {
            self.notice(NO_BEST_MOVE, false);
            return;
        };

        let mut moves = Vec::new();
        for token in line.pv.iter().take(self.options.display_depth.value) {
            match decode_move(side, token) {
                Ok((from, to)) => moves.push(CandidateMove {
                    token: token.clone(),
                    from,
                    to,
                }),
                Err(e) => {
                    error!("Cannot show move {}: {}", token, e);
                    break;
                }
            }
        }

        self.presenter.show_candidates(&moves);
        let first_moves: Vec<&str> = line.pv.iter().take(2).map(String::as_str).collect();
        self.presenter.log_line(&format!(
            "Bestmove: [{} {}] {}",
            line.score.unit(),
            line.score.value(),
            first_moves.join(" ")
        ));
    }

    fn on_engine_fatal(&mut self, message: &str) {
        error!("Engine failed: {}", message);
        self.presenter.fatal_notice("Engine fatal, restarting...");
        self.restart();
    }

    fn on_detection_failure(&mut self, failure: DetectionFailure) {
        self.last_published = None;
        self.notice(&failure.to_string(), true);
    }

    fn on_command(&mut self, command: HelperCommand) {
        match command {
            HelperCommand::SetTimeBudget(seconds) => {
                if self.update_option("movetime", seconds) {
                    if let Some(backend) = self.backend.as_mut() {
                        backend.set_time_budget(Duration::from_secs(seconds));
                    }
                }
            }
            HelperCommand::SetLineCount(count) => {
                if self.update_option("multipv", count) {
                    if let Some(backend) = self.backend.as_mut() {
                        backend.set_line_count(count);
                    }
                }
            }
            HelperCommand::ForceMyMoveNext => {
                self.force_my_move = true;
                self.presenter.log_line("Next board is treated as my move");
            }
            HelperCommand::SetAssist(enabled) => {
                if !self.update_option("assist", enabled) {
                    return;
                }
                if !enabled {
                    self.active = None;
                    self.presenter.log_line("Assistance off");
                    return;
                }
                self.presenter.log_line("Assistance on");
                if let Some(state) = self.last_published.clone() {
                    if state.is_my_turn() {
                        self.submit(&state);
                    }
                }
            }
            HelperCommand::ShowOptions => {
                for line in self.options.describe() {
                    self.presenter.log_line(&line);
                }
            }
        }
    }

    /// Returns whether the option changed.
    fn update_option(&mut self, name: &str, value: impl ToString) -> bool {
        let value = value.to_string();
        match self.options.update(name, &value) {
            Ok(changed) => {
                if changed {
                    info!("Set option '{}' to '{}'", name, value);
                }
                changed
            }
            Err(e) => {
                warn!("Option '{}' rejected: {}", name, e);
                self.presenter
                    .log_line(&format!("Invalid {} {}: {}", name, value, e));
                false
            }
        }
    }

    fn launch(&mut self) -> Result<(), EngineError> {
        self.generation += 1;
        let listener = Arc::new(EngineEvents {
            generation: self.generation,
            events: self.events_tx.clone(),
        });

        let mut backend = self.launcher.launch(listener)?;
        backend.set_time_budget(Duration::from_secs(self.options.move_time.value));
        if self.options.line_count.value > 1 {
            backend.set_line_count(self.options.line_count.value);
        }
        self.backend = Some(backend);
        Ok(())
    }

    fn restart(&mut self) {
        self.shutdown();
        self.active = None;

        for attempt in 1..=MAX_RESTARTS {
            match self.launch() {
                Ok(()) => {
                    info!("Engine restarted (attempt {})", attempt);
                    if let Some(state) = self.last_published.clone() {
                        if state.is_my_turn() && self.options.assist.value {
                            self.submit(&state);
                        }
                    }
                    return;
                }
                Err(e) => warn!("Engine restart attempt {} failed: {}", attempt, e),
            }
        }

        let fault = EngineFault::RestartExhausted {
            attempts: MAX_RESTARTS,
        };
        error!("{}", fault);
        self.presenter.fatal_notice(&fault.to_string());
    }

    fn notice(&mut self, message: &str, fatal: bool) {
        if !self.throttle.should_emit(message) {
            return;
        }
        if fatal {
            self.presenter.fatal_notice(message);
        } else {
            self.presenter.log_line(message);
        }
    }
}
