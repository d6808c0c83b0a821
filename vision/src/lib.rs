//! Board detection: finds the board in a capture and reads every cell.
//!
//! Raster captures go through [`TemplateDetector`], which matches a
//! [`PatternLibrary`] with normalized cross-correlation. Page dumps go through
//! [`MarkupDetector`]. [`BoardMonitor`] polls a [`SnapshotSource`] and feeds
//! either detector on a fixed interval.

mod detector;
mod error;
mod geometry;
mod markup;
mod matching;
mod monitor;
mod patterns;
mod snapshot;
mod source;
mod template;

pub use detector::{BoardDetector, DetectorSettings};
pub use error::{CaptureError, DetectionFailure, PatternError};
pub use geometry::BoardGeometry;
pub use markup::MarkupDetector;
pub use matching::{best_score, find_matches, suppress_overlaps, Match, Region, Template};
pub use monitor::{BoardListener, BoardMonitor};
pub use patterns::{
    piece_file_name, PatternLibrary, PieceTemplate, ANCHOR_FILE, CORNER_FILE, MARKER_FILE,
    PLAY_AREA_FILE,
};
pub use snapshot::{MarkupNode, Snapshot};
pub use source::{ImageFileSource, MarkupFileSource, SnapshotSource};
pub use template::TemplateDetector;
