use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;

use log::{debug, warn};

use crate::helper::{HelperCommand, HelperEvent};

/// A line typed on the console.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(HelperCommand),
    Quit,
    Unknown(String),
}

pub struct CommandDecoder {}

impl CommandDecoder {
    pub fn new() -> Self {
        Self {}
    }

    pub fn decode(&self, line: &str) -> ConsoleInput {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let command = match parts.as_slice() {
            ["movetime", seconds] => seconds.parse().ok().map(HelperCommand::SetTimeBudget),
            ["multipv", count] => count.parse().ok().map(HelperCommand::SetLineCount),
            ["mymove"] => Some(HelperCommand::ForceMyMoveNext),
            ["assist", "on"] => Some(HelperCommand::SetAssist(true)),
            ["assist", "off"] => Some(HelperCommand::SetAssist(false)),
            ["options"] => Some(HelperCommand::ShowOptions),
            ["quit"] | ["exit"] => return ConsoleInput::Quit,
            _ => None,
        };

        match command {
            Some(command) => ConsoleInput::Command(command),
            None => ConsoleInput::Unknown(line.to_string()),
        }
    }
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards stdin commands to the helper until `quit` or end of input.
///
/// The thread is detached: a blocking stdin read cannot be interrupted, and the
/// thread ends by itself once the helper's channel is gone.
pub fn spawn_console(events: Sender<HelperEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let decoder = CommandDecoder::new();
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                debug!("Console: {:?}", line.trim());

                let event = match decoder.decode(line.trim()) {
                    ConsoleInput::Command(command) => HelperEvent::Command(command),
                    ConsoleInput::Quit => HelperEvent::Shutdown,
                    ConsoleInput::Unknown(line) => {
                        if !line.is_empty() {
                            warn!("Unknown command: {}", line);
                        }
                        continue;
                    }
                };
                let quit = matches!(event, HelperEvent::Shutdown);
                if events.send(event).is_err() || quit {
                    break;
                }
            }
        })?;
    Ok(())
}
