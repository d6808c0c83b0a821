use std::path::Path;

use board::{Piece, PieceKind, Side};
use image::GrayImage;
use log::info;

use crate::{BoardGeometry, PatternError, Template};

pub const ANCHOR_FILE: &str = "board.png";
pub const MARKER_FILE: &str = "last_move.png";
pub const PLAY_AREA_FILE: &str = "play_area.png";
pub const CORNER_FILE: &str = "corner_to_playfield.png";

pub struct PieceTemplate {
    pub piece: Piece,
    pub template: Template,
}

/// Reference images for one board skin. Immutable once loaded.
pub struct PatternLibrary {
    anchor: Template,
    marker: Template,
    pieces: Vec<PieceTemplate>,
    geometry: BoardGeometry,
}

impl PatternLibrary {
    /// Loads every pattern from `dir`. Pieces are read from `<side>_<kind>.png`.
    pub fn load(dir: &Path) -> Result<Self, PatternError> {
        let anchor = load_gray(&dir.join(ANCHOR_FILE))?;
        let marker = load_gray(&dir.join(MARKER_FILE))?;
        let play_area = dimensions(&dir.join(PLAY_AREA_FILE))?;
        let corner = dimensions(&dir.join(CORNER_FILE))?;

        let mut pieces = Vec::new();
        for side in Side::PLAYING {
            for kind in PieceKind::ALL {
                let piece = Piece::new(side, kind);
                pieces.push((piece, load_gray(&dir.join(piece_file_name(piece)))?));
            }
        }

        let library = Self::new(&anchor, &marker, play_area, corner, pieces)?;
        info!(
            "Loaded {} piece patterns from {:?} (board {}x{})",
            library.pieces.len(),
            dir,
            library.anchor.width(),
            library.anchor.height()
        );
        Ok(library)
    }

    /// The anchor and marker are matched masked, pieces unmasked.
    pub fn new(
        anchor: &GrayImage,
        marker: &GrayImage,
        play_area: (u32, u32),
        corner: (u32, u32),
        pieces: Vec<(Piece, GrayImage)>,
    ) -> Result<Self, PatternError> {
        let anchor = Template::masked(anchor);
        if anchor.is_flat() {
            return Err(PatternError::Empty("board".to_string()));
        }
        let marker = Template::masked(marker);
        if marker.is_flat() {
            return Err(PatternError::Empty("last move".to_string()));
        }

        let mut pieces = pieces
            .into_iter()
            .map(|(piece, image)| {
                let template = Template::new(&image);
                if template.is_flat() {
                    return Err(PatternError::Empty(piece_file_name(piece)));
                }
                Ok(PieceTemplate { piece, template })
            })
            .collect::<Result<Vec<_>, _>>()?;
        pieces.sort_by_key(|p| iteration_rank(p.piece));

        Ok(Self {
            anchor,
            marker,
            pieces,
            geometry: BoardGeometry::calibrate(play_area, corner)?,
        })
    }

    pub fn anchor(&self) -> &Template {
        &self.anchor
    }

    pub fn marker(&self) -> &Template {
        &self.marker
    }

    /// Second side first, then First; kinds in `PieceKind::ALL` order.
    pub fn pieces(&self) -> &[PieceTemplate] {
        &self.pieces
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }
}

pub fn piece_file_name(piece: Piece) -> String {
    format!("{}_{}.png", piece.side.name(), piece.kind.name())
}

fn iteration_rank(piece: Piece) -> usize {
    let side = Side::PLAYING
        .iter()
        .position(|&s| s == piece.side)
        .unwrap_or(Side::PLAYING.len());
    let kind = PieceKind::ALL
        .iter()
        .position(|&k| k == piece.kind)
        .unwrap_or(PieceKind::ALL.len());
    side * PieceKind::ALL.len() + kind
}

fn load_gray(path: &Path) -> Result<GrayImage, PatternError> {
    image::open(path)
        .map(|image| image.to_luma8())
        .map_err(|source| PatternError::Load {
            path: path.to_path_buf(),
            source,
        })
}

fn dimensions(path: &Path) -> Result<(u32, u32), PatternError> {
    image::image_dimensions(path).map_err(|source| PatternError::Load {
        path: path.to_path_buf(),
        source,
    })
}
