//! Command line for the `antgrid` binary.

use antgrid_core::{Error, Params, SimConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "antgrid",
    about = "Ants foraging on a shared grid, one OS thread per ant",
    version = env!("CARGO_PKG_VERSION"),
    long_about = "antgrid runs one thread per ant on a square board.\n\
                  Ants pick up food and pile it next to other food while an\n\
                  observer redraws the board. Keys: 'q' quit, '+'/'-' delay,\n\
                  '*'/'/' sleepers."
)]
pub struct Cli {
    /// Number of ants
    #[arg(required_unless_present = "dump_config")]
    pub n_ants: Option<usize>,

    /// Number of food items seeded on the board
    #[arg(required_unless_present = "dump_config")]
    pub n_food: Option<usize>,

    /// How long to run, in seconds
    #[arg(required_unless_present = "dump_config")]
    pub max_seconds: Option<u64>,

    /// Path to config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// RNG seed for a reproducible board
    #[arg(long)]
    pub seed: Option<u64>,

    /// Initial per-step delay in milliseconds
    #[arg(long)]
    pub delay: Option<u64>,

    /// Initial sleeper threshold
    #[arg(long)]
    pub sleepers: Option<usize>,

    /// Log statistics instead of drawing the board
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Write logs to a file (TUI mode has no stderr logging)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the effective config as TOML and exit
    #[arg(long, default_value_t = false)]
    pub dump_config: bool,

    /// Print a JSON run summary on stdout after shutdown
    #[arg(long, default_value_t = false)]
    pub json_summary: bool,
}

impl Cli {
    /// Config file (or defaults) with command line overrides applied.
    pub fn load_config(&self) -> SimConfig {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path),
            None => SimConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(delay) = self.delay {
            config.pacing.step_delay_ms = delay;
        }
        if let Some(sleepers) = self.sleepers {
            config.initial_sleepers = sleepers;
        }
        config
    }

    /// Start parameters, checked against the configured board.
    pub fn params(&self, config: &SimConfig) -> antgrid_core::Result<Params> {
        let (Some(n_ants), Some(n_food), Some(max_seconds)) =
            (self.n_ants, self.n_food, self.max_seconds)
        else {
            return Err(Error::invalid_params(
                "usage: antgrid <N_ANTS> <N_FOOD> <MAX_SECONDS>",
            ));
        };
        let params = Params::new(n_ants, n_food, Duration::from_secs(max_seconds));
        params.validate(config.grid.size)?;
        Ok(params)
    }
}
