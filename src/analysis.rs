//! Search limits, raw engine analysis, and the evaluation reported to clients.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Serialize, Serializer};
use shakmaty::uci::Uci;

use crate::error::RequestError;

/// How long "instant" searches are allowed to think.
pub const INSTANT_MOVE_TIME: Duration = Duration::from_millis(100);

/// The stopping criterion for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Time(Duration),
    Depth(u32),
}

impl SearchLimit {
    /// Combine the request's time and depth fields.
    ///
    /// A non-zero depth always wins over a time limit. `None` means neither was requested.
    pub fn from_request(move_time: MoveTime, fixed_depth: u32) -> Option<Self> {
        let mut limit = match move_time {
            MoveTime::NotRequested => None,
            MoveTime::Instant => Some(SearchLimit::Time(INSTANT_MOVE_TIME)),
            MoveTime::Seconds(secs) => Some(SearchLimit::Time(Duration::from_secs(secs))),
        };
        if fixed_depth != 0 {
            limit = Some(SearchLimit::Depth(fixed_depth));
        }
        limit
    }
}

/// The `move_time` request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTime {
    NotRequested,
    Instant,
    Seconds(u64),
}

impl FromStr for MoveTime {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "0" => Ok(MoveTime::NotRequested),
            "instant" => Ok(MoveTime::Instant),
            secs => secs
                .parse()
                .map(MoveTime::Seconds)
                .map_err(|_| RequestError::MoveTime(s.to_string())),
        }
    }
}

/// Parse the `fixed_depth` request field; empty means zero.
pub fn parse_fixed_depth(s: &str) -> Result<u32, RequestError> {
    match s.trim() {
        "" => Ok(0),
        depth => depth
            .parse()
            .map_err(|_| RequestError::FixedDepth(s.to_string())),
    }
}

/// Engine score, relative to the side to move in the searched position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns; positive is good for the side to move.
    Cp(i32),
    /// Mate in N; positive means the side to move mates, zero or negative means it is mated.
    Mate(i32),
}

/// What the engine reported for one completed search.
///
/// Every field is optional because engines are free to omit any of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub pv: Vec<Uci>,
    pub score: Option<Score>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub time: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn flip(self) -> Self {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        })
    }
}

/// The `score` value sent back to clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// The move came from the opening book.
    Book,
    /// Pawn units.
    Pawns(f64),
    /// A forced mate, rendered as `#+N` / `#-N`.
    Mate { sign: Sign, moves: u32 },
}

impl Evaluation {
    /// Placeholder for "no analysis": the side to move is treated as mated in one.
    pub const NO_ANALYSIS: Evaluation = Evaluation::Mate {
        sign: Sign::Plus,
        moves: 1,
    };

    /// Translate an engine score for the position *before* the best move into the
    /// perspective of the position after it.
    pub fn after_best_move(score: Score) -> Self {
        match score {
            Score::Cp(cp) => Evaluation::Pawns(-f64::from(cp) / 100.0),
            Score::Mate(moves) => {
                let sign = if moves > 0 { Sign::Plus } else { Sign::Minus };
                Evaluation::Mate {
                    sign: sign.flip(),
                    moves: moves.unsigned_abs(),
                }
            }
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Book => f.write_str("book move"),
            Evaluation::Pawns(pawns) => write!(f, "{pawns}"),
            Evaluation::Mate { sign, moves } => write!(f, "#{sign}{moves}"),
        }
    }
}

impl Serialize for Evaluation {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        match self {
            Evaluation::Pawns(pawns) => ser.serialize_f64(*pawns),
            other => ser.collect_str(other),
        }
    }
}
