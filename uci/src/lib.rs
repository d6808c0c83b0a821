mod decoder;
mod encoder;
mod options;

pub mod commands;

pub use commands::{EngineInput, EngineOutput, GoParams, Info, Score, SearchLine};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use options::{AdvertisedOption, UciOption, UciOptionType};

/// Best move reported by engines when the position has no legal move.
pub const NULL_MOVE: &str = "(none)";
