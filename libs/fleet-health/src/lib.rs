//! fleet-health - fault propagation and recurrence analysis for recorder fleets
//!
//! Every recording unit is a stack of dependent layers: a network gateway,
//! the recorder host behind it, and the storage, login and video paths of
//! the host. This crate turns raw per-layer readings into:
//!
//! - **A single root cause per snapshot** ([`evaluate`]): a failed layer
//!   forces every dependent layer down, so one outage is never reported as
//!   several independent issues.
//! - **A severity tier** ([`classify`]): `critical` for gateway/host/storage,
//!   `attention` for video/login, `healthy` otherwise.
//! - **A recurrence report** ([`RecurrenceAnalyzer`]): per unit and issue,
//!   occurrence counts over a 3 or 7 day window with a trend derived from
//!   the two halves of the window.
//! - **A live fleet view** ([`FleetAssessment`]): latest verdict per unit and
//!   dashboard counters.
//!
//! The engine is pure: it never fetches, stores or renders anything and
//! re-derives every result from the snapshots it is given.
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use fleet_health::{
//!     evaluate, IssueCategory, RawSnapshot, RecurrenceAnalyzer, RecurrenceQuery,
//!     SeverityTier,
//! };
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
//! let snapshot = RawSnapshot {
//!     storage_healthy: false,
//!     video_normal: false,
//!     ..RawSnapshot::healthy("U1", now)
//! };
//!
//! // storage outranks video
//! let evaluation = evaluate(&snapshot);
//! assert_eq!(evaluation.category, IssueCategory::Storage);
//! assert_eq!(evaluation.severity(), SeverityTier::Critical);
//!
//! let earlier = RawSnapshot {
//!     storage_healthy: false,
//!     ..RawSnapshot::healthy("U1", now - Duration::days(5))
//! };
//! let query = RecurrenceQuery::from_days(7).unwrap().until(now);
//! let report = RecurrenceAnalyzer::default().analyze(&[snapshot, earlier], &query);
//! assert_eq!(report[0].occurrences, 2);
//! ```

pub mod error;
pub mod evaluator;
pub mod fleet;
pub mod recurrence;
pub mod severity;
pub mod types;

// Re-exports for convenience
pub use error::{HealthError, Result};
pub use evaluator::{evaluate, Evaluation, StatusEvaluator};
pub use fleet::{FleetAssessment, FleetSummary, TierCounts, UnitVerdict};
pub use recurrence::{
    compare_records, trend_direction, trend_magnitude, AnalyzerConfig, RecurrenceAnalyzer,
    RecurrenceQuery, DEFAULT_TOP_N,
};
pub use severity::{classify, SeverityClassifier};
pub use types::{
    EffectiveStatus, IssueCategory, RawSnapshot, RecurrenceRecord, SeverityTier, TrendDirection,
    WindowDays,
};
