use std::cmp::Ordering;
use std::fmt;

use crate::options::AdvertisedOption;

/// Lines written to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    Uci,
    SetOption { name: String, value: String },
    UciNewGame,
    Position { fen: String },
    Go(GoParams),
    Stop,
    Quit,
}

/// Lines read back from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    IdName(String),
    IdAuthor(String),
    UciOk,
    BestMove {
        best_move: String,
        ponder: Option<String>,
    },
    Info(Info),
    Option(AdvertisedOption),
    Unknown(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    pub depth: Option<u32>,
    pub sel_depth: Option<u32>,
    pub multi_pv: Option<u32>,
    pub nodes: Option<u64>,
    pub nodes_per_second: Option<u64>,
    pub time: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<String>,
}

impl Info {
    /// A principal variation, if this line carries both a score and moves.
    pub fn to_line(&self) -> Option<SearchLine> {
        let score = self.score?;
        if self.pv.is_empty() {
            return None;
        }
        Some(SearchLine {
            score,
            pv: self.pv.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32), // Positive for mate-in-n, negative for mated-in-n
}

impl Score {
    pub fn unit(&self) -> &'static str {
        match self {
            Score::Centipawns(_) => "cp",
            Score::Mate(_) => "mate",
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            Score::Centipawns(v) | Score::Mate(v) => *v,
        }
    }

    /// Not losing for the side to move.
    pub fn is_non_negative(&self) -> bool {
        match self {
            Score::Centipawns(cp) => *cp >= 0,
            Score::Mate(moves) => *moves > 0,
        }
    }

    fn rank(&self) -> i64 {
        const MATE: i64 = 1_000_000;
        match *self {
            Score::Centipawns(cp) => cp as i64,
            Score::Mate(moves) if moves > 0 => MATE - moves as i64,
            Score::Mate(moves) => -MATE - moves as i64,
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.unit(), self.value())
    }
}

/// One principal variation with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLine {
    pub score: Score,
    pub pv: Vec<String>,
}

impl SearchLine {
    pub fn depth(&self) -> usize {
        self.pv.len()
    }

    /// Starts with `best_move`, followed by `ponder` when both are known.
    pub fn matches(&self, best_move: &str, ponder: Option<&str>) -> bool {
        if self.pv.first().map(String::as_str) != Some(best_move) {
            return false;
        }
        match (ponder, self.pv.get(1)) {
            (Some(ponder), Some(second)) => second == ponder,
            _ => true,
        }
    }
}

impl fmt::Display for SearchLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: Vec<&str> = self.pv.iter().take(2).map(String::as_str).collect();
        write!(f, "[{}] {}", self.score, head.join(" "))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoParams {
    // Search exactly movetime milliseconds.
    pub move_time: Option<u64>,
}
