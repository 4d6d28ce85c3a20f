//! Command-line interface for snowsim
//!
//! Headless-only binary: runs a match from a JSON config and writes the
//! combat log.

use clap::Parser;
use std::path::PathBuf;

/// Deterministic snowball-fight combat simulator
#[derive(Parser, Debug)]
#[command(name = "snowsim")]
#[command(about = "Deterministic snowball-fight combat simulator")]
#[command(version)]
pub struct Args {
    /// JSON match configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: PathBuf,

    /// Random seed override for deterministic reproduction
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum match duration in seconds (overrides config)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Output path for the match log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
