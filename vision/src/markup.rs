use board::{BoardState, Grid, Piece, PieceKind, Side, Square};
use log::trace;

use crate::detector::{assemble, LastMove};
use crate::{BoardDetector, DetectionFailure, MarkupNode, Snapshot};

const BOARD_CLASS: &str = "xq-board-wrap";
const OCCUPIED_CLASS: &str = "occupied";
const LAST_MOVE_CLASS: &str = "last-move";
const SECOND_SIDE_CLASS: &str = "black";

/// Reads the board from a page dump: one child of the board wrapper per cell.
#[derive(Debug, Default)]
pub struct MarkupDetector;

impl MarkupDetector {
    pub fn new() -> Self {
        Self
    }

    fn scan_tree(&self, root: &MarkupNode) -> Result<BoardState, DetectionFailure> {
        let board = root.find(BOARD_CLASS).ok_or(DetectionFailure::NoBoardFound)?;

        let mut grid: Grid = Default::default();
        let mut last_move = LastMove::default();

        for cell in &board.children {
            let highlighted = cell.has_class(LAST_MOVE_CLASS);
            let Some(square) = position(cell) else {
                trace!("Skipping cell without position: {:?}", cell.classes);
                continue;
            };

            if cell.has_class(OCCUPIED_CLASS) {
                let Some(piece) = cell.children.first().and_then(piece) else {
                    trace!("Skipping unknown piece at {}", square);
                    continue;
                };
                grid[square.row][square.col] = Some(piece);
                if highlighted {
                    last_move.mark(square, Some(piece));
                }
            } else if highlighted {
                last_move.mark(square, None);
            }
        }

        assemble(grid, last_move)
    }
}

impl BoardDetector for MarkupDetector {
    fn scan(&mut self, snapshot: &Snapshot) -> Result<BoardState, DetectionFailure> {
        match snapshot {
            Snapshot::Markup(root) => self.scan_tree(root),
            other => Err(DetectionFailure::UnsupportedSnapshot(other.kind())),
        }
    }
}

/// `p<row><col>` class of a cell.
fn position(cell: &MarkupNode) -> Option<Square> {
    cell.classes.iter().find_map(|class| {
        let digits = class.strip_prefix('p')?.as_bytes();
        let [row, col] = digits else {
            return None;
        };
        let square = Square::new(
            (*col as char).to_digit(10)? as usize,
            (*row as char).to_digit(10)? as usize,
        );
        square.is_valid().then_some(square)
    })
}

fn piece(node: &MarkupNode) -> Option<Piece> {
    let kind = node.classes.iter().find_map(|class| match class.as_str() {
        "king" => Some(PieceKind::King),
        "adviser" => Some(PieceKind::Advisor),
        "elephant" => Some(PieceKind::Elephant),
        "chariot" => Some(PieceKind::Rook),
        "cannon" => Some(PieceKind::Cannon),
        "horse" => Some(PieceKind::Horse),
        "pawn" => Some(PieceKind::Pawn),
        _ => None,
    })?;
    let side = if node.has_class(SECOND_SIDE_CLASS) {
        Side::Second
    } else {
        Side::First
    };
    Some(Piece::new(side, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied(row: usize, col: usize, piece: &[&str]) -> MarkupNode {
        let position = format!("p{}{}", row, col);
        MarkupNode::new(&["cell", OCCUPIED_CLASS, position.as_str()])
            .with_children(vec![MarkupNode::new(piece)])
    }

    fn empty(row: usize, col: usize) -> MarkupNode {
        let position = format!("p{}{}", row, col);
        MarkupNode::new(&["cell", position.as_str()])
    }

    fn highlight(mut node: MarkupNode) -> MarkupNode {
        node.classes.push(LAST_MOVE_CLASS.to_string());
        node
    }

    fn page(cells: Vec<MarkupNode>) -> Snapshot {
        Snapshot::Markup(MarkupNode::new(&["body"]).with_children(vec![
            MarkupNode::new(&[BOARD_CLASS]).with_children(cells),
        ]))
    }

    #[test]
    fn test_reads_pieces_and_last_move() {
        let snapshot = page(vec![
            occupied(0, 4, &["piece", "king", "black"]),
            highlight(occupied(2, 7, &["piece", "cannon", "black"])),
            highlight(empty(2, 1)),
            occupied(9, 4, &["piece", "king"]),
            occupied(9, 0, &["piece", "chariot"]),
            empty(5, 5),
        ]);

        let state = MarkupDetector::new().scan(&snapshot).unwrap();

        assert_eq!(state.my_side(), Side::First);
        assert_eq!(state.move_side(), Side::Second);
        assert!(state.is_my_turn());
        assert_eq!(state.last_move_to(), Some(Square::new(7, 2)));
        assert_eq!(state.last_move_from(), Some(Square::new(1, 2)));
        assert_eq!(
            state.piece_at(Square::new(0, 9)),
            Some(Piece::new(Side::First, PieceKind::Rook))
        );
        assert_eq!(state.full_notation(), "4k4/9/7c1/9/9/9/9/9/9/R3K4 w - - 0 1");
    }

    #[test]
    fn test_my_side_second_when_black_at_bottom() {
        let snapshot = page(vec![
            occupied(0, 4, &["piece", "king"]),
            occupied(9, 4, &["piece", "king", "black"]),
        ]);

        let state = MarkupDetector::new().scan(&snapshot).unwrap();
        assert_eq!(state.my_side(), Side::Second);
        assert_eq!(state.move_side(), Side::Unknown);
        assert!(!state.is_my_turn());
    }

    #[test]
    fn test_missing_wrapper() {
        let snapshot = Snapshot::Markup(MarkupNode::new(&["body"]));
        let result = MarkupDetector::new().scan(&snapshot);
        assert_eq!(result.unwrap_err(), DetectionFailure::NoBoardFound);
    }

    #[test]
    fn test_missing_king() {
        let snapshot = page(vec![occupied(0, 4, &["piece", "king", "black"])]);
        let result = MarkupDetector::new().scan(&snapshot);
        assert_eq!(result.unwrap_err(), DetectionFailure::KingMissing);
    }

    #[test]
    fn test_rejects_raster() {
        let snapshot = Snapshot::Raster(image::GrayImage::new(4, 4));
        let result = MarkupDetector::new().scan(&snapshot);
        assert_eq!(result.unwrap_err(), DetectionFailure::UnsupportedSnapshot("raster"));
    }

    #[test]
    fn test_position_class() {
        let cell = MarkupNode::new(&["piece", "p38", "pawn"]);
        assert_eq!(position(&cell), Some(Square::new(8, 3)));
        assert_eq!(position(&MarkupNode::new(&["p3"])), None);
        assert_eq!(position(&MarkupNode::new(&["p39"])), None);
    }
}
