use std::fs;
use std::path::PathBuf;

use crate::{CaptureError, MarkupNode, Snapshot};

/// Where snapshots come from. Called once per poll.
pub trait SnapshotSource: Send {
    fn capture(&mut self) -> Result<Snapshot, CaptureError>;
}

/// Re-reads an image file on every capture, converted to grayscale.
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for ImageFileSource {
    fn capture(&mut self) -> Result<Snapshot, CaptureError> {
        let image = image::open(&self.path)?;
        Ok(Snapshot::Raster(image.to_luma8()))
    }
}

/// Re-reads a JSON page dump on every capture.
pub struct MarkupFileSource {
    path: PathBuf,
}

impl MarkupFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for MarkupFileSource {
    fn capture(&mut self) -> Result<Snapshot, CaptureError> {
        let text = fs::read_to_string(&self.path)?;
        let root: MarkupNode = serde_json::from_str(&text)?;
        Ok(Snapshot::Markup(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_image_converted_to_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.png");
        RgbImage::from_pixel(3, 2, Rgb([200, 200, 200])).save(&path).unwrap();

        let Snapshot::Raster(image) = ImageFileSource::new(&path).capture().unwrap() else {
            panic!("Expected Raster")
        };
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(*image.get_pixel(0, 0), Luma([200]));
    }

    #[test]
    fn test_markup_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(
            &path,
            r#"{"classes": ["xq-board-wrap"], "children": [{"classes": ["p00"]}]}"#,
        )
        .unwrap();

        let Snapshot::Markup(root) = MarkupFileSource::new(&path).capture().unwrap() else {
            panic!("Expected Markup")
        };
        assert!(root.has_class("xq-board-wrap"));
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_capture_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = ImageFileSource::new(dir.path().join("missing.png")).capture();
        assert!(matches!(missing, Err(CaptureError::Image(_))));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();
        let broken = MarkupFileSource::new(&path).capture();
        assert!(matches!(broken, Err(CaptureError::Markup(_))));

        let absent = MarkupFileSource::new(dir.path().join("absent.json")).capture();
        assert!(matches!(absent, Err(CaptureError::Io(_))));
    }
}
