//! Simulation configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use crate::error::{Error, Result};
use crate::grid::WritePacing;
use crate::types::GRID_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Sleeper threshold applied before the first agent starts.
    pub initial_sleepers: usize,
    /// RNG seed. Agents use `seed + id`; unset means OS entropy.
    pub seed: Option<u64>,
    /// Board geometry and write cost.
    pub grid: GridConfig,
    /// Agent step pacing.
    pub pacing: PacingConfig,
    /// Observer frame pacing.
    pub observer: ObserverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of the square board.
    pub size: usize,
    /// Fixed cost of every cell write, in microseconds.
    pub write_delay_us: u64,
    /// Random extra cost of every cell write, in microseconds.
    pub write_jitter_us: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay every agent pays after each step, in milliseconds.
    pub step_delay_ms: u64,
    /// Random extra delay per step, in milliseconds.
    pub step_jitter_ms: u64,
    /// Amount the `+` / `-` keys change the step delay by.
    pub delay_increment_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Pause between two rendered frames, in milliseconds.
    pub frame_delay_ms: u64,
}

// ============================================================
// Defaults
// ============================================================

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_sleepers: 0,
            seed: None,
            grid: GridConfig::default(),
            pacing: PacingConfig::default(),
            observer: ObserverConfig::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { size: GRID_SIZE, write_delay_us: 1_000, write_jitter_us: 500 }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { step_delay_ms: 50, step_jitter_ms: 5, delay_increment_ms: 10 }
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self { frame_delay_ms: 50 }
    }
}

// ============================================================
// Loading
// ============================================================

impl SimConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// A config with every artificial delay removed. Handy for tests and
    /// benchmarks where only the locking protocol matters.
    pub fn unpaced() -> Self {
        Self {
            grid: GridConfig { write_delay_us: 0, write_jitter_us: 0, ..GridConfig::default() },
            pacing: PacingConfig { step_delay_ms: 0, step_jitter_ms: 0, ..PacingConfig::default() },
            observer: ObserverConfig { frame_delay_ms: 1 },
            ..Self::default()
        }
    }
}

impl GridConfig {
    pub fn write_pacing(&self) -> WritePacing {
        WritePacing {
            delay: Duration::from_micros(self.write_delay_us),
            jitter: Duration::from_micros(self.write_jitter_us),
        }
    }
}

impl ObserverConfig {
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }
}
