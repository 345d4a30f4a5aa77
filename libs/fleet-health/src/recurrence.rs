//! RecurrenceAnalyzer - ranked, trend-annotated fault recurrence
//!
//! Pipeline:
//! 1. Evaluate every in-window snapshot, drop healthy ones (parallel for
//!    large batches)
//! 2. Barrier: group by `(unit_id, category)`
//! 3. Count occurrences per half window and derive the trend
//! 4. Sort and truncate to `top_n`

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{HealthError, Result};
use crate::evaluator::evaluate;
use crate::types::{IssueCategory, RawSnapshot, RecurrenceRecord, TrendDirection, WindowDays};

/// Default report length
pub const DEFAULT_TOP_N: usize = 20;

/// Percentage change beyond which a trend counts as up or down
pub const DEFAULT_TREND_THRESHOLD_PCT: f64 = 5.0;

/// Batches at least this large are evaluated on the rayon pool
pub const DEFAULT_PARALLEL_MIN_BATCH: usize = 512;

fn default_trend_threshold() -> f64 {
    DEFAULT_TREND_THRESHOLD_PCT
}

fn default_parallel_min_batch() -> usize {
    DEFAULT_PARALLEL_MIN_BATCH
}

// ============================================================================
// Configuration & query
// ============================================================================

/// Analyzer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold_pct: f64,

    #[serde(default = "default_parallel_min_batch")]
    pub parallel_min_batch: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            trend_threshold_pct: DEFAULT_TREND_THRESHOLD_PCT,
            parallel_min_batch: DEFAULT_PARALLEL_MIN_BATCH,
        }
    }
}

/// Parameters of one `analyze` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceQuery {
    pub window: WindowDays,
    pub top_n: usize,
    /// End of the window. `None` anchors it at the latest snapshot.
    pub until: Option<DateTime<Utc>>,
}

impl RecurrenceQuery {
    pub fn new(window: WindowDays) -> Self {
        Self {
            window,
            top_n: DEFAULT_TOP_N,
            until: None,
        }
    }

    /// Build from a raw day count, rejecting anything but 3 or 7
    pub fn from_days(days: u32) -> Result<Self> {
        WindowDays::try_from(days).map(Self::new)
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}

/// `[start, end]` split at `mid`; the later half includes `mid`
#[derive(Debug, Clone, Copy)]
struct WindowBounds {
    start: DateTime<Utc>,
    mid: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl WindowBounds {
    fn new(end: DateTime<Utc>, window: WindowDays) -> Self {
        let span = window.duration();
        Self {
            start: end - span,
            mid: end - span / 2,
            end,
        }
    }

    fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    fn is_later_half(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.mid
    }
}

// ============================================================================
// Trend
// ============================================================================

/// `(later - earlier) / max(earlier, 1) * 100`, rounded to one decimal
pub fn trend_magnitude(earlier: u32, later: u32) -> f64 {
    let base = f64::from(earlier.max(1));
    let pct = (f64::from(later) - f64::from(earlier)) / base * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Direction of a magnitude; the threshold itself counts as stable
pub fn trend_direction(magnitude: f64, threshold_pct: f64) -> TrendDirection {
    if magnitude > threshold_pct {
        TrendDirection::Up
    } else if magnitude < -threshold_pct {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

// ============================================================================
// Grouping
// ============================================================================

struct GroupAccumulator<'a> {
    latest: &'a RawSnapshot,
    first_seen: DateTime<Utc>,
    earlier: u32,
    later: u32,
}

impl<'a> GroupAccumulator<'a> {
    fn new(snapshot: &'a RawSnapshot) -> Self {
        Self {
            latest: snapshot,
            first_seen: snapshot.observed_at,
            earlier: 0,
            later: 0,
        }
    }

    fn add(&mut self, snapshot: &'a RawSnapshot, bounds: &WindowBounds) {
        if bounds.is_later_half(snapshot.observed_at) {
            self.later += 1;
        } else {
            self.earlier += 1;
        }
        if snapshot.observed_at < self.first_seen {
            self.first_seen = snapshot.observed_at;
        }
        if snapshot.observed_at >= self.latest.observed_at {
            self.latest = snapshot;
        }
    }

    fn into_record(
        self,
        category: IssueCategory,
        window: WindowDays,
        threshold_pct: f64,
    ) -> RecurrenceRecord {
        let magnitude = trend_magnitude(self.earlier, self.later);
        RecurrenceRecord {
            unit_id: self.latest.unit_id.clone(),
            unit_name: self.latest.unit_name.clone(),
            district: self.latest.district.clone(),
            category,
            severity: category.severity(),
            occurrences: self.earlier + self.later,
            window_days: window.days(),
            first_seen: self.first_seen,
            last_seen: self.latest.observed_at,
            earlier_count: self.earlier,
            later_count: self.later,
            trend_direction: trend_direction(magnitude, threshold_pct),
            trend_magnitude: magnitude,
        }
    }
}

/// Report order: occurrences desc, |trend| desc, unit id asc, category precedence
pub fn compare_records(a: &RecurrenceRecord, b: &RecurrenceRecord) -> Ordering {
    b.occurrences
        .cmp(&a.occurrences)
        .then_with(|| {
            b.trend_magnitude
                .abs()
                .total_cmp(&a.trend_magnitude.abs())
        })
        .then_with(|| a.unit_id.cmp(&b.unit_id))
        .then_with(|| a.category.cmp(&b.category))
}

fn fault_of(snapshot: &RawSnapshot) -> Option<(&RawSnapshot, IssueCategory)> {
    let category = evaluate(snapshot).category;
    (!category.is_healthy()).then_some((snapshot, category))
}

// ============================================================================
// Analyzer
// ============================================================================

/// Recurrence analyzer
///
/// Holds only configuration; every call re-derives its report from the
/// snapshots passed in.
#[derive(Debug, Clone, Default)]
pub struct RecurrenceAnalyzer {
    config: AnalyzerConfig,
}

impl RecurrenceAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Build the ranked recurrence report
    ///
    /// An empty input yields an empty report.
    pub fn analyze(
        &self,
        snapshots: &[RawSnapshot],
        query: &RecurrenceQuery,
    ) -> Vec<RecurrenceRecord> {
        self.run(snapshots, query, &|| false).unwrap_or_default()
    }

    /// Same as [`analyze`](Self::analyze), abandoned when `token` fires
    /// before the grouping barrier
    pub fn analyze_cancellable(
        &self,
        snapshots: &[RawSnapshot],
        query: &RecurrenceQuery,
        token: &CancellationToken,
    ) -> Result<Vec<RecurrenceRecord>> {
        self.run(snapshots, query, &|| token.is_cancelled())
            .ok_or(HealthError::Cancelled)
    }

    /// `None` means cancelled
    fn run(
        &self,
        snapshots: &[RawSnapshot],
        query: &RecurrenceQuery,
        cancelled: &dyn Fn() -> bool,
    ) -> Option<Vec<RecurrenceRecord>> {
        if cancelled() {
            return None;
        }

        let until = match query
            .until
            .or_else(|| snapshots.iter().map(|s| s.observed_at).max())
        {
            Some(until) if query.top_n > 0 => until,
            _ => return Some(Vec::new()),
        };
        let bounds = WindowBounds::new(until, query.window);

        let faults = self.collect_faults(snapshots, &bounds);

        // Barrier: everything below needs the complete mapped set
        if cancelled() {
            return None;
        }

        let mut groups: FxHashMap<(&str, IssueCategory), GroupAccumulator<'_>> =
            FxHashMap::default();
        for &(snapshot, category) in &faults {
            groups
                .entry((snapshot.unit_id.as_str(), category))
                .or_insert_with(|| GroupAccumulator::new(snapshot))
                .add(snapshot, &bounds);
        }
        let group_count = groups.len();

        let mut records: Vec<RecurrenceRecord> = groups
            .into_iter()
            .map(|((_, category), acc)| {
                acc.into_record(category, query.window, self.config.trend_threshold_pct)
            })
            .collect();
        records.sort_by(compare_records);
        records.truncate(query.top_n);

        debug!(
            "Recurrence {}: {} snapshots, {} faults, {} groups, {} reported",
            query.window,
            snapshots.len(),
            faults.len(),
            group_count,
            records.len()
        );

        Some(records)
    }

    /// Evaluate in-window snapshots and keep the faulty ones, input order
    /// preserved
    fn collect_faults<'a>(
        &self,
        snapshots: &'a [RawSnapshot],
        bounds: &WindowBounds,
    ) -> Vec<(&'a RawSnapshot, IssueCategory)> {
        let faults: Vec<_> = if snapshots.len() >= self.config.parallel_min_batch {
            snapshots
                .par_iter()
                .filter(|s| bounds.contains(s.observed_at))
                .filter_map(fault_of)
                .collect()
        } else {
            snapshots
                .iter()
                .filter(|s| bounds.contains(s.observed_at))
                .filter_map(fault_of)
                .collect()
        };

        let outside = snapshots
            .iter()
            .filter(|s| !bounds.contains(s.observed_at))
            .count();
        if outside > 0 {
            debug!(
                "Ignored {} snapshots outside [{}, {}]",
                outside, bounds.start, bounds.end
            );
        }

        faults
    }
}
