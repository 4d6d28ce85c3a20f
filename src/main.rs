//! snowsim - Deterministic snowball-fight combat simulator
//!
//! Fixed-timestep team combat simulation. The binary runs headless matches
//! from JSON configs; renderers and input layers are external collaborators
//! that link the library.

use snowsim::cli;
use snowsim::headless::{run_headless_match, HeadlessMatchConfig};

fn main() {
    let args = cli::parse_args();

    let mut config = match HeadlessMatchConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    // CLI flags override the config file.
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }

    if let Err(e) = run_headless_match(config) {
        eprintln!("Error running match: {}", e);
        std::process::exit(1);
    }
}
