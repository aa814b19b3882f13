//! OpusCheckers - Checkers Engine
//!
//! Usage:
//!     opus_checkers [--config settings.json] [--section Bot] [--depth N]
//!
//! The engine reads protocol commands from stdin and writes responses to
//! stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use opus_checkers::config::{load_settings, SearchConfig, DEFAULT_SECTION};
use opus_checkers::error::EngineError;
use opus_checkers::protocol::Protocol;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Settings section holding the search keys
    #[arg(long, default_value = DEFAULT_SECTION)]
    section: String,
    /// Search depth in plies, overrides the settings file
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long, default_value = "warn")]
    log_level: log::Level,
}

fn main() -> Result<(), EngineError> {
    let args = Args::parse();
    simple_logger::init_with_level(args.log_level)?;

    let mut config = match &args.config {
        Some(path) => SearchConfig::from_lookup(&load_settings(path)?, &args.section)?,
        None => SearchConfig::default(),
    };
    if let Some(depth) = args.depth {
        config = config.with_max_depth(depth)?;
    }
    info!("starting with {:?}", config);

    let mut protocol = Protocol::new(config);
    protocol.run();
    Ok(())
}
