//! OpusCheckers - Error type
//!
//! The search never fails; errors only come from configuration and
//! protocol input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("search depth must be a positive number of plies, got {0}")]
    InvalidDepth(i64),

    #[error("invalid value {value} for option {key}")]
    InvalidOption { key: String, value: String },

    #[error("invalid board layout: {0}")]
    InvalidLayout(String),

    #[error("invalid square or move notation: {0}")]
    InvalidNotation(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
