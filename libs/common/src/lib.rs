//! Shared basics for the fleet-health tools
//!
//! - logging initialization (console + daily rolling file)
//! - layered configuration loading
//! - serde helpers for loosely typed feed data

pub mod config;
pub mod error;
pub mod logging;
pub mod serde_helpers;

pub use config::{load_config, load_config_from_file};
pub use error::{Error, Result};
pub use logging::{init_logging, LogConfig, LogFormat};
