use std::path::PathBuf;

use thiserror::Error;

/// Why a scan produced no board state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionFailure {
    #[error("Board Not Found")]
    NoBoardFound,
    #[error("King is not found on both sides")]
    KingMissing,
    #[error("Detector cannot read {0} snapshots")]
    UnsupportedSnapshot(&'static str),
    #[error("Snapshot unavailable: {0}")]
    SnapshotUnavailable(String),
}

impl DetectionFailure {
    /// Whether listeners hear about it. A missing king is skipped silently.
    pub fn is_reported(&self) -> bool {
        !matches!(self, DetectionFailure::KingMissing)
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Failed to load pattern {path:?}: {source}")]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Pattern {0} is empty")]
    Empty(String),
    #[error("Play area of {width}x{height} is too small for the grid")]
    PlayAreaTooSmall { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Markup(#[from] serde_json::Error),
}
