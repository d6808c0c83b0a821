//! Drives one external UCI engine process on behalf of the helper.
//!
//! A session owns three kinds of workers: a dispatcher that serializes every
//! command written to the engine, a reader that turns engine output into
//! search results, and one watchdog per submitted position.

mod dispatcher;
mod error;
mod reader;
mod selection;
mod session;
mod settings;
mod transport;
mod watchdog;

pub use error::EngineError;
pub use selection::select_line;
pub use session::{EngineListener, EngineSession, SessionState};
pub use settings::EngineSettings;
pub use transport::{EngineProcess, Transport};
pub use uci::{Score, SearchLine};
