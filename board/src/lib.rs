mod notation;
mod piece;
mod side;
mod state;

pub use notation::{decode_move, encode, encode_move, parse_board, NotationError};
pub use piece::{Piece, PieceKind};
pub use side::Side;
pub use state::{BoardState, Grid, Square, GRID_HEIGHT, GRID_WIDTH};
