use std::fmt;

/// One of the two players, or `Unknown` when the detector could not tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Unknown,
    /// Moves first; upper-case pieces, `w` in board notation.
    First,
    /// Lower-case pieces, `b` in board notation.
    Second,
}

impl Side {
    /// Playing sides in template iteration order.
    pub const PLAYING: [Side; 2] = [Side::Second, Side::First];

    pub fn opponent(self) -> Side {
        match self {
            Side::Unknown => Side::Unknown,
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Side-to-move letter of the engine notation.
    pub fn notation_char(self) -> Option<char> {
        match self {
            Side::Unknown => None,
            Side::First => Some('w'),
            Side::Second => Some('b'),
        }
    }

    /// Same side, and neither of them unknown.
    pub fn matches(self, other: Side) -> bool {
        self != Side::Unknown && self == other
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Unknown => "unknown",
            Side::First => "first",
            Side::Second => "second",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
