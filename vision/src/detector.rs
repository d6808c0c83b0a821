use board::{BoardState, Grid, Piece, PieceKind, Side, Square};
use log::warn;

use crate::{DetectionFailure, Snapshot};

/// Turns a snapshot into a board state.
pub trait BoardDetector: Send {
    fn scan(&mut self, snapshot: &Snapshot) -> Result<BoardState, DetectionFailure>;
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub anchor_threshold: f32,
    pub piece_threshold: f32,
    pub marker_threshold: f32,
    /// Share of a candidate's area that another match may cover before it is dropped.
    pub overlap_threshold: f32,
    /// How far around the last board position to look before searching everywhere.
    pub anchor_search_margin: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            anchor_threshold: 0.8,
            piece_threshold: 0.8,
            marker_threshold: 0.7,
            overlap_threshold: 0.3,
            anchor_search_margin: 16,
        }
    }
}

/// Cells flagged by the last-move highlight.
#[derive(Debug, Default)]
pub(crate) struct LastMove {
    pub to: Option<Square>,
    pub from: Option<Square>,
    pub side: Side,
}

impl LastMove {
    /// A highlighted piece is where the move landed, an empty highlight where it started.
    pub(crate) fn mark(&mut self, square: Square, piece: Option<Piece>) {
        match piece {
            Some(piece) => {
                if self.to.is_some() {
                    warn!("Multiple last move targets, keeping {:?}", self.to);
                    return;
                }
                self.to = Some(square);
                self.side = piece.side;
            }
            None => {
                if self.from.is_none() {
                    self.from = Some(square);
                }
            }
        }
    }
}

/// Decides which side is mine and builds the state. My king is the one nearer
/// the bottom of the capture.
pub(crate) fn assemble(grid: Grid, last_move: LastMove) -> Result<BoardState, DetectionFailure> {
    let state = BoardState::new(Side::Unknown, last_move.side, grid);

    let (Some(first), Some(second)) = (state.find_king(Side::First), state.find_king(Side::Second))
    else {
        return Err(DetectionFailure::KingMissing);
    };
    for side in Side::PLAYING {
        let kings = Square::all()
            .filter(|&square| state.piece_at(square) == Some(Piece::new(side, PieceKind::King)))
            .count();
        if kings > 1 {
            warn!("Found {} {} kings", kings, side);
        }
    }

    let my_side = if first.row > second.row {
        Side::First
    } else {
        Side::Second
    };
    Ok(BoardState::new(my_side, last_move.side, grid).with_last_move(last_move.to, last_move.from))
}
