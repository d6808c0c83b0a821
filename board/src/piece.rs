use crate::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Rook,
    Cannon,
    Horse,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::King,
        PieceKind::Advisor,
        PieceKind::Elephant,
        PieceKind::Rook,
        PieceKind::Cannon,
        PieceKind::Horse,
        PieceKind::Pawn,
    ];

    /// Upper-case notation letter.
    pub fn symbol(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Cannon => 'C',
            PieceKind::Horse => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.symbol() == symbol.to_ascii_uppercase())
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "king",
            PieceKind::Advisor => "advisor",
            PieceKind::Elephant => "elephant",
            PieceKind::Rook => "rook",
            PieceKind::Cannon => "cannon",
            PieceKind::Horse => "horse",
            PieceKind::Pawn => "pawn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    pub fn symbol(self) -> char {
        match self.side {
            Side::Second => self.kind.symbol().to_ascii_lowercase(),
            _ => self.kind.symbol(),
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Piece> {
        let kind = PieceKind::from_symbol(symbol)?;
        let side = if symbol.is_ascii_lowercase() {
            Side::Second
        } else {
            Side::First
        };
        Some(Piece { side, kind })
    }
}
