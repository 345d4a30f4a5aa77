//! fleet-ingest - snapshot feed ingestion for fleet-health
//!
//! This is the boundary where malformed feed data is stopped. A record with
//! a missing or unparseable health signal or timestamp is rejected here and
//! reported with its line number; it never reaches the engine with a
//! guessed value.
//!
//! # Example
//!
//! ```rust
//! use fleet_ingest::{read_snapshots, LoadOptions, SnapshotFormat};
//!
//! let feed = "unit_id,gateway_reachable,host_reachable,storage_healthy,login_ok,video_normal,observed_at\n\
//!             U1,1,1,1,1,0,2024-06-01 08:00:00\n\
//!             U2,1,,1,1,1,2024-06-01 08:00:00\n";
//!
//! let report =
//!     read_snapshots(feed.as_bytes(), SnapshotFormat::Csv, &LoadOptions::default()).unwrap();
//! assert_eq!(report.snapshots.len(), 1);
//! assert_eq!(report.rejected[0].line, 3);
//! ```

pub mod error;
pub mod loader;
pub mod record;

pub use error::{IngestError, Result};
pub use loader::{
    load_snapshots, read_snapshots, LoadOptions, LoadReport, RejectedRecord, SnapshotFormat,
};
pub use record::SnapshotRecord;
