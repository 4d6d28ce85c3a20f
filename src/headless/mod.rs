//! Headless mode
//!
//! Runs matches without any graphical output, suitable for automated
//! testing and batch analysis.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless match
//! cargo run --release -- --config match_config.json --seed 42
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "team1": ["Slinger", "Medic"],
//!   "team2": ["Bulwark", "Slinger"],
//!   "max_duration_secs": 120,
//!   "random_seed": 42
//! }
//! ```

pub mod ai;
pub mod config;
pub mod runner;

pub use config::HeadlessMatchConfig;
pub use runner::{run_headless_match, HeadlessPlugin, MatchResult};
