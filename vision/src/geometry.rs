use board::{Square, GRID_HEIGHT, GRID_WIDTH};

use crate::{PatternError, Region};

/// Maps between cells and pixels of a cropped board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    origin: (f32, f32),
    pitch: (f32, f32),
}

impl BoardGeometry {
    /// `origin` is the centre of cell (0, 0), `pitch` the distance between
    /// neighbouring cell centres.
    pub fn new(origin: (f32, f32), pitch: (f32, f32)) -> Self {
        Self { origin, pitch }
    }

    /// Derives the grid from the size of the play field (first to last line)
    /// and the size of the corner patch between the board edge and the field.
    pub fn calibrate(play_area: (u32, u32), corner: (u32, u32)) -> Result<Self, PatternError> {
        let (width, height) = play_area;
        let pitch = (
            width as f32 / (GRID_WIDTH - 1) as f32,
            height as f32 / (GRID_HEIGHT - 1) as f32,
        );
        if pitch.0 < 1.0 || pitch.1 < 1.0 {
            return Err(PatternError::PlayAreaTooSmall { width, height });
        }
        Ok(Self::new((corner.0 as f32, corner.1 as f32), pitch))
    }

    pub fn pitch(&self) -> (f32, f32) {
        self.pitch
    }

    pub fn cell_center(&self, square: Square) -> (f32, f32) {
        (
            self.origin.0 + self.pitch.0 * square.col as f32,
            self.origin.1 + self.pitch.1 * square.row as f32,
        )
    }

    /// One pitch wide window centred on the cell.
    pub fn cell_region(&self, square: Square) -> Region {
        let (cx, cy) = self.cell_center(square);
        let x = (cx - self.pitch.0 / 2.0).max(0.0);
        let y = (cy - self.pitch.1 / 2.0).max(0.0);
        Region::new(
            x as u32,
            y as u32,
            self.pitch.0.round() as u32,
            self.pitch.1.round() as u32,
        )
    }

    /// Cell nearest to a pixel position, if it is on the grid.
    pub fn square_at(&self, x: f32, y: f32) -> Option<Square> {
        let col = ((x - self.origin.0) / self.pitch.0).round();
        let row = ((y - self.origin.1) / self.pitch.1).round();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let square = Square::new(col as usize, row as usize);
        square.is_valid().then_some(square)
    }
}
