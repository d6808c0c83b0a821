use std::fmt;
use std::sync::OnceLock;

use crate::{notation, Piece, PieceKind, Side};

pub const GRID_WIDTH: usize = 9;
pub const GRID_HEIGHT: usize = 10;

/// Indexed `[row][col]`, row 0 at the top of the captured board.
pub type Grid = [[Option<Piece>; GRID_WIDTH]; GRID_HEIGHT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub col: usize,
    pub row: usize,
}

impl Square {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    pub fn is_valid(&self) -> bool {
        self.col < GRID_WIDTH && self.row < GRID_HEIGHT
    }

    /// Row-major iteration over all 90 cells.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..GRID_HEIGHT).flat_map(|row| (0..GRID_WIDTH).map(move |col| Square::new(col, row)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// One detection result. Never mutated once built; overrides produce a new value.
#[derive(Debug, Clone)]
pub struct BoardState {
    my_side: Side,
    move_side: Side,
    grid: Grid,
    last_move_to: Option<Square>,
    last_move_from: Option<Square>,
    notation: OnceLock<String>,
    full_notation: OnceLock<String>,
}

impl BoardState {
    pub fn new(my_side: Side, move_side: Side, grid: Grid) -> Self {
        Self {
            my_side,
            move_side,
            grid,
            last_move_to: None,
            last_move_from: None,
            notation: OnceLock::new(),
            full_notation: OnceLock::new(),
        }
    }

    pub fn with_last_move(mut self, to: Option<Square>, from: Option<Square>) -> Self {
        self.last_move_to = to;
        self.last_move_from = from;
        self
    }

    /// Same board with a different side credited for the last move.
    pub fn with_move_side(&self, move_side: Side) -> Self {
        Self::new(self.my_side, move_side, self.grid)
            .with_last_move(self.last_move_to, self.last_move_from)
    }

    pub fn my_side(&self) -> Side {
        self.my_side
    }

    /// Side that made the last move.
    pub fn move_side(&self) -> Side {
        self.move_side
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.grid.get(square.row)?.get(square.col).copied().flatten()
    }

    pub fn last_move_to(&self) -> Option<Square> {
        self.last_move_to
    }

    pub fn last_move_from(&self) -> Option<Square> {
        self.last_move_from
    }

    /// Board part of the engine notation, computed once.
    pub fn notation(&self) -> &str {
        self.notation
            .get_or_init(|| notation::encode(&self.grid, self.my_side))
    }

    /// Board, side to move and the fixed ` - - 0 1` suffix.
    pub fn full_notation(&self) -> &str {
        self.full_notation.get_or_init(|| {
            let to_move = self.move_side.opponent().notation_char().unwrap_or('u');
            format!("{} {} - - 0 1", self.notation(), to_move)
        })
    }

    pub fn is_same(&self, other: &BoardState) -> bool {
        self.full_notation() == other.full_notation()
    }

    pub fn is_same_move(&self, other: &BoardState) -> bool {
        match (self.last_move_from, other.last_move_from) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_side.matches(self.move_side.opponent())
    }

    /// First king of `side` in row-major order.
    pub fn find_king(&self, side: Side) -> Option<Square> {
        Square::all().find(|&square| {
            self.piece_at(square) == Some(Piece::new(side, PieceKind::King))
        })
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "my={} lastmove={} {:?}->{:?} {}",
            self.my_side,
            self.move_side,
            self.last_move_from,
            self.last_move_to,
            self.notation()
        )
    }
}
