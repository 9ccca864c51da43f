use std::env;
use std::path::PathBuf;

use crate::book::MatchMode;
use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct Config {
    /// Path to the UCI engine binary
    pub engine_path: PathBuf,

    /// UCI options applied after every engine start
    pub engine_options: Vec<(String, String)>,

    /// Opening book corpus, one game of UCI moves per line
    pub book_path: PathBuf,

    pub book_match: MatchMode,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine_path = lookup("ENGINE_PATH")
            .unwrap_or_else(|| "./engine/clemens".to_string())
            .into();

        let engine_options = match lookup("ENGINE_OPTIONS") {
            Some(raw) => parse_engine_options(&raw)?,
            None => Vec::new(),
        };

        let book_path = lookup("BOOK_PATH")
            .unwrap_or_else(|| "./engine/book.txt".to_string())
            .into();

        let book_match = match lookup("BOOK_MATCH") {
            Some(raw) => raw.parse()?,
            None => MatchMode::default(),
        };

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: raw,
            })?,
            None => 5000,
        };

        Ok(Self {
            engine_path,
            engine_options,
            book_path,
            book_match,
            host,
            port,
        })
    }
}

/// `Hash=64;Threads=1` -> `[("Hash", "64"), ("Threads", "1")]`
fn parse_engine_options(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
                key: "ENGINE_OPTIONS",
                value: raw.to_string(),
            })?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
