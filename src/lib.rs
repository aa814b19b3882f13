//! OpusCheckers - Checkers Engine
//!
//! A checkers engine written in Rust with support for:
//! - 8x8 checkers rules with mandatory captures and multi-capture chains
//! - Flying kings
//! - Minimax search with optional alpha-beta pruning
//! - Material and material-plus-potential evaluation
//! - A line-oriented text protocol in the spirit of UCI

pub mod types;
pub mod error;
pub mod config;
pub mod board;
pub mod line;
pub mod move_generator;
pub mod evaluation;
pub mod search;
pub mod protocol;
