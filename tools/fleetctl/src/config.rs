//! fleetctl configuration
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "text"
//! file_dir = "/var/log/fleetctl"
//!
//! [analysis]
//! window_days = 7
//! top_n = 20
//!
//! [analysis.engine]
//! trend_threshold_pct = 5.0
//! parallel_min_batch = 512
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use common::LogConfig;
use fleet_health::{AnalyzerConfig, WindowDays, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "fleetctl";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Defaults for the recurrence command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default)]
    pub engine: AnalyzerConfig,
}

fn default_window_days() -> u32 {
    7
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            top_n: default_top_n(),
            engine: AnalyzerConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn window(&self) -> Result<WindowDays> {
        WindowDays::try_from(self.window_days).context("analysis.window_days")
    }
}

pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    common::load_config::<AppConfig>(APP_NAME, explicit)
        .context("Failed to load fleetctl configuration")
}
