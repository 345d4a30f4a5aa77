//! Live fleet assessment
//!
//! Reduces a snapshot feed to the current verdict of each unit (its latest
//! snapshot) plus dashboard counters.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::evaluator::evaluate;
use crate::types::{EffectiveStatus, IssueCategory, RawSnapshot, SeverityTier};

/// Current verdict of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitVerdict {
    pub unit_id: String,
    pub unit_name: String,
    pub district: String,
    pub location: String,
    pub camera_count: u32,
    pub observed_at: DateTime<Utc>,
    pub status: EffectiveStatus,
    pub category: IssueCategory,
    pub severity: SeverityTier,
}

impl UnitVerdict {
    pub fn from_snapshot(snapshot: &RawSnapshot) -> Self {
        let evaluation = evaluate(snapshot);
        Self {
            unit_id: snapshot.unit_id.clone(),
            unit_name: snapshot.unit_name.clone(),
            district: snapshot.district.clone(),
            location: snapshot.location.clone(),
            camera_count: snapshot.camera_count,
            observed_at: snapshot.observed_at,
            status: evaluation.status,
            category: evaluation.category,
            severity: evaluation.severity(),
        }
    }
}

/// Unit counts per severity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub healthy: usize,
    pub attention: usize,
    pub critical: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: SeverityTier) {
        match tier {
            SeverityTier::Healthy => self.healthy += 1,
            SeverityTier::Attention => self.attention += 1,
            SeverityTier::Critical => self.critical += 1,
        }
    }

    pub fn get(&self, tier: SeverityTier) -> usize {
        match tier {
            SeverityTier::Healthy => self.healthy,
            SeverityTier::Attention => self.attention,
            SeverityTier::Critical => self.critical,
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.attention + self.critical
    }
}

/// Dashboard counters over the current verdicts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total_units: usize,
    pub tiers: TierCounts,
    pub by_category: BTreeMap<IssueCategory, usize>,
    pub by_district: BTreeMap<String, TierCounts>,
    /// Cameras on units whose video path is attributed as down
    pub cameras_without_video: u64,
}

impl FleetSummary {
    fn from_verdicts(units: &[UnitVerdict]) -> Self {
        let mut summary = Self {
            total_units: units.len(),
            ..Self::default()
        };
        for unit in units {
            summary.tiers.record(unit.severity);
            *summary.by_category.entry(unit.category).or_insert(0) += 1;
            summary
                .by_district
                .entry(unit.district.clone())
                .or_default()
                .record(unit.severity);
            if !unit.status.video {
                summary.cameras_without_video += u64::from(unit.camera_count);
            }
        }
        summary
    }
}

/// Current state of every unit in a feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetAssessment {
    /// Ordered critical first, then by category precedence and unit id
    pub units: Vec<UnitVerdict>,
    pub summary: FleetSummary,
}

impl FleetAssessment {
    /// Assess the latest snapshot of each unit
    ///
    /// When a unit has several snapshots with the same timestamp, the one
    /// appearing last in the input wins.
    pub fn from_snapshots(snapshots: &[RawSnapshot]) -> Self {
        let mut latest: FxHashMap<&str, &RawSnapshot> = FxHashMap::default();
        for snapshot in snapshots {
            latest
                .entry(snapshot.unit_id.as_str())
                .and_modify(|current| {
                    if snapshot.observed_at >= current.observed_at {
                        *current = snapshot;
                    }
                })
                .or_insert(snapshot);
        }

        let mut units: Vec<UnitVerdict> = latest
            .into_values()
            .map(UnitVerdict::from_snapshot)
            .collect();
        units.sort_by(|a, b| {
            a.severity
                .cmp(&b.severity)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });

        let summary = FleetSummary::from_verdicts(&units);
        Self { units, summary }
    }

    pub fn by_severity(&self, tier: SeverityTier) -> impl Iterator<Item = &UnitVerdict> {
        self.units.iter().filter(move |u| u.severity == tier)
    }

    pub fn by_district<'a>(&'a self, district: &'a str) -> impl Iterator<Item = &'a UnitVerdict> {
        self.units.iter().filter(move |u| u.district == district)
    }

    pub fn get(&self, unit_id: &str) -> Option<&UnitVerdict> {
        self.units.iter().find(|u| u.unit_id == unit_id)
    }
}
