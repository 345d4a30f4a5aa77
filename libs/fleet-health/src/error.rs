//! Error types for fleet-health

use thiserror::Error;

/// Engine errors
///
/// Evaluation and classification are total and never fail. Only the
/// recurrence entry points can reject their arguments or be cancelled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HealthError {
    #[error("Invalid recurrence window: {0} days (expected 3 or 7)")]
    InvalidWindow(u32),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl HealthError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HealthError>;
