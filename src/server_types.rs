#[cfg(feature = "server")]
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use shakmaty::{uci::Uci, Chess};
use std::time::Duration;
use tracing::warn;

use crate::analysis::{parse_fixed_depth, Evaluation, MoveTime, SearchLimit};
use crate::error::RequestError;

fn not_requested() -> String {
    "0".to_string()
}

/// Ask for the best move in a game.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MoveRequest {
    /// The game so far, as movetext from the standard starting position.
    #[serde(alias = "pgn", default)]
    pub position: String,

    /// Search depth in plies. `"0"` means no depth limit was requested.
    #[serde(default = "not_requested")]
    pub fixed_depth: String,

    /// `"instant"`, `"0"` for no time limit, or a whole number of seconds.
    #[serde(default = "not_requested")]
    pub move_time: String,
}

impl MoveRequest {
    pub fn new(position: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            fixed_depth: not_requested(),
            move_time: not_requested(),
        }
    }

    pub fn with_move_time(mut self, move_time: impl Into<String>) -> Self {
        self.move_time = move_time.into();
        self
    }

    pub fn with_fixed_depth(mut self, fixed_depth: impl Into<String>) -> Self {
        self.fixed_depth = fixed_depth.into();
        self
    }

    /// The limit to search under, or `None` if no search should run.
    ///
    /// An unreadable `move_time` counts as not requested. An unreadable `fixed_depth`
    /// cancels the search altogether, since depth would have overridden any time limit.
    pub fn search_limit(&self) -> Option<SearchLimit> {
        let move_time = self.move_time.parse().unwrap_or_else(|why: RequestError| {
            warn!(%why, "ignoring move_time");
            MoveTime::NotRequested
        });
        let fixed_depth = match parse_fixed_depth(&self.fixed_depth) {
            Ok(depth) => depth,
            Err(why) => {
                warn!(%why, "not searching");
                return None;
            }
        };
        SearchLimit::from_request(move_time, fixed_depth)
    }
}

/// The answer to a [`MoveRequest`].
#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ResolvedMove {
    /// A continuation taken from the opening book, in SAN.
    Book {
        score: Evaluation,
        best_move: String,
    },

    /// The engine's choice, already played on the board.
    Analysed {
        /// The position after the best move.
        #[serde(with = "crate::chess_serde::position_serde")]
        fen: Chess,
        #[serde(with = "crate::chess_serde::uci_serde")]
        best_move: Uci,
        score: Evaluation,
        depth: u32,
        #[serde(with = "crate::chess_serde::pv_serde")]
        pv: Vec<Uci>,
        nodes: u64,
        #[serde(with = "crate::chess_serde::seconds_serde")]
        time: Duration,
    },

    /// No analysis was available; the position is returned unchanged.
    NoAnalysis {
        #[serde(with = "crate::chess_serde::position_serde")]
        fen: Chess,
        score: Evaluation,
    },
}

impl ResolvedMove {
    pub fn book(best_move: String) -> Self {
        ResolvedMove::Book {
            score: Evaluation::Book,
            best_move,
        }
    }

    pub fn no_analysis(fen: Chess) -> Self {
        ResolvedMove::NoAnalysis {
            fen,
            score: Evaluation::NO_ANALYSIS,
        }
    }
}

/// General service info.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServiceInfo {
    /// The service's ID.
    pub id: String,

    /// A human-readable description of what the service does.
    pub description: String,

    /// How many lines the loaded opening book holds.
    pub book_lines: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorBody {
    pub detail: String,
}

/// Failures that reach the HTTP layer.
///
/// Bad request content never gets here; it degrades to a fallback answer instead.
#[cfg(feature = "server")]
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[cfg(feature = "server")]
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "resolver task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
