use std::io::BufRead;
use std::sync::Arc;

use ahash::AHashMap;
use crossbeam_channel::Receiver;
use log::{debug, info, trace, warn};
use uci::{AdvertisedOption, Decoder, EngineOutput, SearchLine, NULL_MOVE};

use crate::dispatcher::ActiveSearch;
use crate::session::{SessionState, Shared};
use crate::{select_line, EngineError};

/// Drains engine output until it closes.
pub(crate) struct OutputReader {
    shared: Arc<Shared>,
    output: Box<dyn BufRead + Send>,
    slot: Receiver<ActiveSearch>,
    lines: Vec<SearchLine>,
    advertised: AHashMap<String, AdvertisedOption>,
    configured: Vec<(String, String)>,
}

impl OutputReader {
    pub(crate) fn new(
        shared: Arc<Shared>,
        output: Box<dyn BufRead + Send>,
        slot: Receiver<ActiveSearch>,
        configured: Vec<(String, String)>,
    ) -> Self {
        Self {
            shared,
            output,
            slot,
            lines: Vec::new(),
            advertised: AHashMap::new(),
            configured,
        }
    }

    pub(crate) fn run(mut self) {
        let decoder = Decoder::new();
        let mut buffer = String::new();

        loop {
            buffer.clear();
            match self.output.read_line(&mut buffer) {
                Ok(0) => {
                    self.shared.raise_fatal(EngineError::OutputClosed);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    self.shared.raise_fatal(EngineError::Io(e));
                    break;
                }
            }

            let line = buffer.trim();
            if line.is_empty() {
                continue;
            }
            debug!("Output: {:?}", line);

            match decoder.decode(line) {
                EngineOutput::Info(info) => {
                    if let Some(search_line) = info.to_line() {
                        self.lines.push(search_line);
                    }
                }
                EngineOutput::BestMove { best_move, ponder } => {
                    self.on_best_move(&best_move, ponder.as_deref())
                }
                EngineOutput::Option(option) => {
                    self.advertised.insert(option.name.to_lowercase(), option);
                }
                EngineOutput::UciOk => {
                    self.check_configured_options();
                    if self.shared.state() == SessionState::Starting {
                        self.shared.set_state(SessionState::Ready);
                    }
                }
                EngineOutput::IdName(name) => info!("Engine: {}", name),
                EngineOutput::IdAuthor(_) => {}
                EngineOutput::Unknown(other) => trace!("Ignoring engine output: {}", other),
            }
        }
        debug!("Engine reader exited");
    }

    fn on_best_move(&mut self, best_move: &str, ponder: Option<&str>) {
        let lines = std::mem::take(&mut self.lines);

        // Ready first, so a dispatcher unblocked by the take below can mark Searching
        self.shared.set_state(SessionState::Ready);
        let Ok(active) = self.slot.try_recv() else {
            warn!("Receiving bestmove {} where not expected", best_move);
            return;
        };

        if best_move == NULL_MOVE {
            info!("Engine has no move for {:?}", active.notation);
            let _ = active.done.send(());
            self.shared.publish(&active.notation, None);
            return;
        }

        let selected = select_line(&lines, best_move, ponder);
        match &selected {
            Some(line) => info!("Found bestmove for {:?}: {}", active.notation, line),
            None => warn!("No variation matches bestmove {} for {:?}", best_move, active.notation),
        }

        let _ = active.done.send(());
        self.shared.publish(&active.notation, selected.as_ref());
    }

    /// Warns about configured options the engine does not know or would reject.
    fn check_configured_options(&self) {
        for (name, value) in &self.configured {
            match self.advertised.get(&name.to_lowercase()) {
                Some(option) => {
                    if let Err(e) = option.validate(value) {
                        warn!("Engine option {} = {}: {}", name, value, e);
                    }
                }
                None if !self.advertised.is_empty() => {
                    warn!("Engine does not advertise option {}", name);
                }
                None => {}
            }
        }
    }
}
