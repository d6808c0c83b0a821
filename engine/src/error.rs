use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Engine {0} pipe is not available")]
    MissingPipe(&'static str),

    #[error("Engine session already started")]
    AlreadyStarted,

    #[error("Engine output closed")]
    OutputClosed,

    #[error("No bestmove for {notation:?} within {deadline:?}")]
    Timeout { notation: String, deadline: Duration },

    #[error("Engine I/O failed: {0}")]
    Io(#[from] io::Error),
}
