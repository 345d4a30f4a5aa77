//! Error types for fleet-ingest

use std::path::PathBuf;
use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read feed: {0}")]
    Read(#[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported feed format: {0}")]
    UnsupportedFormat(String),

    /// Raised for the first rejected record in strict mode
    #[error("Malformed snapshot at line {line}: {reason}")]
    MalformedSnapshot { line: u64, reason: String },
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
