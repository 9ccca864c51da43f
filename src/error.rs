//! Error types for every stage of move resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Something went wrong talking to the search engine process.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine protocol violation: {0}")]
    Protocol(String),

    #[error("engine process terminated")]
    Terminated,
}

/// The session could not produce an analysis for this call.
///
/// The session has already been stopped when this is returned; the next call restarts it.
#[derive(Error, Debug)]
#[error("engine unavailable: {0}")]
pub struct EngineUnavailable(#[from] pub EngineError);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MovetextError {
    #[error("invalid SAN {token:?} at ply {ply}")]
    InvalidSan { ply: usize, token: String },

    #[error("illegal move {token:?} at ply {ply}")]
    IllegalMove { ply: usize, token: String },
}

#[derive(Error, Debug)]
pub enum BookError {
    #[error("failed to read book {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid UCI move {token:?}")]
    InvalidUci { line: usize, token: String },

    #[error("line {line}: illegal move {token:?}")]
    IllegalMove { line: usize, token: String },
}

/// A request search-limit field that could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid move_time {0:?}")]
    MoveTime(String),

    #[error("invalid fixed_depth {0:?}")]
    FixedDepth(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}
