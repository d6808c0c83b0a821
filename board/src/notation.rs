//! Board notation as the engine expects it, and the move tokens it answers with.
//!
//! The grid is stored as captured, "my" side at the bottom. The engine always
//! wants the Second side's home rank first, so when "my" side is Second every
//! conversion here rotates the board by 180 degrees.

use thiserror::Error;

use crate::{Grid, Piece, Side, Square, GRID_HEIGHT, GRID_WIDTH};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Malformed move token: {0:?}")]
    MalformedMove(String),
    #[error("Square out of range in move token: {0:?}")]
    SquareOutOfRange(String),
    #[error("Malformed board notation: {0}")]
    MalformedBoard(String),
}

/// Maps a cell of the engine's view onto the captured grid (and back, it is its own inverse).
fn orient(square: Square, my_side: Side) -> Square {
    match my_side {
        Side::Second => Square::new(GRID_WIDTH - 1 - square.col, GRID_HEIGHT - 1 - square.row),
        _ => square,
    }
}

/// Board part of the engine notation, ranks separated by `/`, empty runs as digits.
pub fn encode(grid: &Grid, my_side: Side) -> String {
    let mut ranks = Vec::with_capacity(GRID_HEIGHT);

    for row in 0..GRID_HEIGHT {
        let mut rank = String::new();
        let mut empty = 0;

        for col in 0..GRID_WIDTH {
            let cell = orient(Square::new(col, row), my_side);
            match grid[cell.row][cell.col] {
                Some(piece) => {
                    if empty > 0 {
                        rank.push_str(&empty.to_string());
                        empty = 0;
                    }
                    rank.push(piece.symbol());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            rank.push_str(&empty.to_string());
        }
        ranks.push(rank);
    }

    ranks.join("/")
}

/// Inverse of [`encode`]. Accepts a trailing side/suffix part and ignores it.
pub fn parse_board(notation: &str, my_side: Side) -> Result<Grid, NotationError> {
    let board = notation.split_whitespace().next().unwrap_or("");
    let ranks: Vec<&str> = board.split('/').collect();
    if ranks.len() != GRID_HEIGHT {
        return Err(NotationError::MalformedBoard(format!(
            "expected {} ranks, found {}",
            GRID_HEIGHT,
            ranks.len()
        )));
    }

    let mut grid: Grid = [[None; GRID_WIDTH]; GRID_HEIGHT];
    for (row, rank) in ranks.iter().enumerate() {
        let mut col = 0;
        for symbol in rank.chars() {
            if let Some(run) = symbol.to_digit(10) {
                col += run as usize;
                continue;
            }
            let piece = Piece::from_symbol(symbol).ok_or_else(|| {
                NotationError::MalformedBoard(format!("unknown piece {:?}", symbol))
            })?;
            if col >= GRID_WIDTH {
                return Err(NotationError::MalformedBoard(format!("rank {} too wide", row)));
            }
            let cell = orient(Square::new(col, row), my_side);
            grid[cell.row][cell.col] = Some(piece);
            col += 1;
        }
        if col != GRID_WIDTH {
            return Err(NotationError::MalformedBoard(format!(
                "rank {} has width {}",
                row, col
            )));
        }
    }

    Ok(grid)
}

/// Translates an engine move token such as `h2e2` into captured-grid squares.
pub fn decode_move(side: Side, token: &str) -> Result<(Square, Square), NotationError> {
    let (from, rest) = parse_coordinate(token)?;
    let (to, rest) =
        parse_coordinate(rest).map_err(|_| NotationError::MalformedMove(token.into()))?;
    if !rest.is_empty() {
        return Err(NotationError::MalformedMove(token.to_string()));
    }

    let from = to_square(side, from).ok_or_else(|| NotationError::SquareOutOfRange(token.into()))?;
    let to = to_square(side, to).ok_or_else(|| NotationError::SquareOutOfRange(token.into()))?;
    Ok((from, to))
}

/// Inverse of [`decode_move`].
pub fn encode_move(side: Side, from: Square, to: Square) -> Result<String, NotationError> {
    let mut token = String::with_capacity(6);
    for square in [from, to] {
        if !square.is_valid() {
            return Err(NotationError::SquareOutOfRange(square.to_string()));
        }
        let (file, rank) = match side {
            Side::Second => (GRID_WIDTH - square.col, square.row + 1),
            _ => (square.col + 1, GRID_HEIGHT - square.row),
        };
        token.push((b'a' + file as u8 - 1) as char);
        token.push_str(&rank.to_string());
    }
    Ok(token)
}

/// One-based (file, rank) followed by the unparsed remainder.
fn parse_coordinate(input: &str) -> Result<((usize, usize), &str), NotationError> {
    let malformed = || NotationError::MalformedMove(input.to_string());

    let mut chars = input.char_indices();
    let (_, letter) = chars.next().ok_or_else(malformed)?;
    if !letter.is_ascii_lowercase() {
        return Err(malformed());
    }

    let digits_end = input[1..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(input.len());
    if digits_end == 1 {
        return Err(malformed());
    }

    let file = (letter as u8 - b'a') as usize + 1;
    let rank = input[1..digits_end].parse().map_err(|_| malformed())?;
    Ok(((file, rank), &input[digits_end..]))
}

fn to_square(side: Side, (file, rank): (usize, usize)) -> Option<Square> {
    if !(1..=GRID_WIDTH).contains(&file) || !(1..=GRID_HEIGHT).contains(&rank) {
        return None;
    }
    let square = match side {
        Side::Second => Square::new(GRID_WIDTH - file, rank - 1),
        _ => Square::new(file - 1, GRID_HEIGHT - rank),
    };
    Some(square)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PieceKind;

    const START: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR";

    #[test]
    fn test_encode_start_position() {
        let grid = parse_board(START, Side::First).unwrap();
        assert_eq!(encode(&grid, Side::First), START);
        assert_eq!(
            grid[9][4],
            Some(Piece::new(Side::First, PieceKind::King))
        );
    }

    #[test]
    fn test_encode_rotates_for_second() {
        // Second at the bottom of the capture: rows and files are mirrored
        let grid = parse_board(START, Side::Second).unwrap();
        assert_eq!(grid[9][4], Some(Piece::new(Side::Second, PieceKind::King)));
        assert_eq!(grid[0][4], Some(Piece::new(Side::First, PieceKind::King)));
        assert_eq!(encode(&grid, Side::Second), START);
        assert_ne!(encode(&grid, Side::First), START);
    }

    #[test]
    fn test_encode_asymmetric_rank() {
        let mut grid: Grid = [[None; GRID_WIDTH]; GRID_HEIGHT];
        grid[0][0] = Some(Piece::new(Side::Second, PieceKind::Rook));
        grid[0][3] = Some(Piece::new(Side::Second, PieceKind::King));
        grid[9][5] = Some(Piece::new(Side::First, PieceKind::King));

        assert_eq!(encode(&grid, Side::First), "r2k5/9/9/9/9/9/9/9/9/5K3");
        assert_eq!(encode(&grid, Side::Second), "3K5/9/9/9/9/9/9/9/9/5k2r");
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = parse_board(START, Side::First).unwrap();
        let b = parse_board(START, Side::First).unwrap();
        assert_eq!(encode(&a, Side::First), encode(&b, Side::First));
    }

    #[test]
    fn test_parse_board_rejects_bad_width() {
        assert!(matches!(
            parse_board("rnbakabnr/8/9/9/9/9/9/9/9/9", Side::First),
            Err(NotationError::MalformedBoard(_))
        ));
        assert!(parse_board("9/9", Side::First).is_err());
    }

    #[test]
    fn test_decode_move_first() {
        let (from, to) = decode_move(Side::First, "h2e2").unwrap();
        assert_eq!(from, Square::new(7, 8));
        assert_eq!(to, Square::new(4, 8));
    }

    #[test]
    fn test_decode_move_second() {
        let (from, to) = decode_move(Side::Second, "h2e2").unwrap();
        assert_eq!(from, Square::new(1, 1));
        assert_eq!(to, Square::new(4, 1));
    }

    #[test]
    fn test_decode_move_rank_ten() {
        let (from, to) = decode_move(Side::First, "a10a9").unwrap();
        assert_eq!(from, Square::new(0, 0));
        assert_eq!(to, Square::new(0, 1));
    }

    #[test]
    fn test_decode_move_rejects_garbage() {
        for token in ["", "e2", "e2e", "2e2e", "e0e1", "j1a1", "e11e1", "e2e4x", "(none)"] {
            assert!(decode_move(Side::First, token).is_err(), "{}", token);
        }
    }

    #[test]
    fn test_move_points_at_moved_piece() {
        // The cannon on h3 (First's view) lives in grid row 7, col 7
        let grid = parse_board(START, Side::First).unwrap();
        let (from, _) = decode_move(Side::First, "h3e3").unwrap();
        assert_eq!(
            grid[from.row][from.col],
            Some(Piece::new(Side::First, PieceKind::Cannon))
        );

        // The same engine move seen from a board captured with Second at the bottom
        let grid = parse_board(START, Side::Second).unwrap();
        let (from, _) = decode_move(Side::Second, "h3e3").unwrap();
        assert_eq!(
            grid[from.row][from.col],
            Some(Piece::new(Side::First, PieceKind::Cannon))
        );
    }

    #[test]
    fn test_encode_move_inverts_decode() {
        for side in [Side::First, Side::Second] {
            for square in Square::all() {
                let target = Square::new(GRID_WIDTH - 1 - square.col, square.row);
                let token = encode_move(side, square, target).unwrap();
                assert_eq!(decode_move(side, &token).unwrap(), (square, target));
            }
        }
    }
}
