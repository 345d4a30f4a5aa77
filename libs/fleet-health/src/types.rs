//! Core type definitions
//!
//! - RawSnapshot: one observation of one recording unit
//! - EffectiveStatus: attributed (post-propagation) layer health
//! - IssueCategory / SeverityTier: root cause and its operator priority
//! - WindowDays / TrendDirection / RecurrenceRecord: recurrence reporting

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{HealthError, Result};

// ============================================================================
// Raw input
// ============================================================================

/// One observation of one unit at one instant
///
/// Produced by the ingestion layer and only read by the engine. The
/// descriptive fields (`unit_name`, `district`, `location`) are carried for
/// presentation and never influence a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Stable unit identifier
    pub unit_id: String,
    pub unit_name: String,
    pub district: String,
    pub location: String,

    /// Network gateway (ONU) answered
    pub gateway_reachable: bool,
    /// Recorder host (NVR) answered
    pub host_reachable: bool,
    pub storage_healthy: bool,
    pub login_ok: bool,
    pub video_normal: bool,

    pub camera_count: u32,
    pub observed_at: DateTime<Utc>,
}

impl RawSnapshot {
    /// Snapshot with every layer healthy, mostly useful for building fixtures
    pub fn healthy(unit_id: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        let unit_id = unit_id.into();
        Self {
            unit_name: unit_id.clone(),
            unit_id,
            district: String::new(),
            location: String::new(),
            gateway_reachable: true,
            host_reachable: true,
            storage_healthy: true,
            login_ok: true,
            video_normal: true,
            camera_count: 0,
            observed_at,
        }
    }
}

// ============================================================================
// Derived status
// ============================================================================

/// Attributed health of the five layers of a unit
///
/// A layer that depends on a failed layer is reported as down rather than
/// with its raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectiveStatus {
    pub gateway: bool,
    pub host: bool,
    pub storage: bool,
    pub login: bool,
    pub video: bool,
}

impl EffectiveStatus {
    /// Every layer down
    pub const DOWN: Self = Self {
        gateway: false,
        host: false,
        storage: false,
        login: false,
        video: false,
    };

    /// Health of the layer a category names (`Healthy` is always up)
    pub fn layer(&self, category: IssueCategory) -> bool {
        match category {
            IssueCategory::Gateway => self.gateway,
            IssueCategory::Host => self.host,
            IssueCategory::Storage => self.storage,
            IssueCategory::Video => self.video,
            IssueCategory::Login => self.login,
            IssueCategory::Healthy => true,
        }
    }

    /// First failed layer in precedence order, or `Healthy`
    pub fn root_cause(&self) -> IssueCategory {
        IssueCategory::PRECEDENCE
            .into_iter()
            .find(|category| !self.layer(*category))
            .unwrap_or(IssueCategory::Healthy)
    }
}

/// Single root cause of a snapshot
///
/// Variant order is the attribution precedence, so `Ord` sorts the most
/// fundamental layer first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Gateway,
    Host,
    Storage,
    Video,
    Login,
    Healthy,
}

impl IssueCategory {
    /// Failure layers from most to least fundamental
    pub const PRECEDENCE: [IssueCategory; 5] = [
        IssueCategory::Gateway,
        IssueCategory::Host,
        IssueCategory::Storage,
        IssueCategory::Video,
        IssueCategory::Login,
    ];

    /// All six categories, healthy last
    pub const ALL: [IssueCategory; 6] = [
        IssueCategory::Gateway,
        IssueCategory::Host,
        IssueCategory::Storage,
        IssueCategory::Video,
        IssueCategory::Login,
        IssueCategory::Healthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Gateway => "gateway",
            IssueCategory::Host => "host",
            IssueCategory::Storage => "storage",
            IssueCategory::Video => "video",
            IssueCategory::Login => "login",
            IssueCategory::Healthy => "healthy",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, IssueCategory::Healthy)
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueCategory {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        IssueCategory::ALL
            .into_iter()
            .find(|c| t.eq_ignore_ascii_case(c.as_str()))
            .ok_or_else(|| HealthError::invalid_argument(format!("unknown issue category '{}'", s)))
    }
}

/// Operator priority bucket
///
/// Ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Critical,
    Attention,
    Healthy,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 3] = [
        SeverityTier::Critical,
        SeverityTier::Attention,
        SeverityTier::Healthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Critical => "critical",
            SeverityTier::Attention => "attention",
            SeverityTier::Healthy => "healthy",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityTier {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        let t = s.trim();
        SeverityTier::ALL
            .into_iter()
            .find(|tier| t.eq_ignore_ascii_case(tier.as_str()))
            .ok_or_else(|| HealthError::invalid_argument(format!("unknown severity tier '{}'", s)))
    }
}

// ============================================================================
// Recurrence
// ============================================================================

/// Lookback period for recurrence analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WindowDays {
    Three,
    Seven,
}

impl WindowDays {
    pub fn days(&self) -> u32 {
        match self {
            WindowDays::Three => 3,
            WindowDays::Seven => 7,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.days()))
    }
}

impl TryFrom<u32> for WindowDays {
    type Error = HealthError;

    fn try_from(days: u32) -> Result<Self> {
        match days {
            3 => Ok(WindowDays::Three),
            7 => Ok(WindowDays::Seven),
            other => Err(HealthError::InvalidWindow(other)),
        }
    }
}

impl From<WindowDays> for u32 {
    fn from(window: WindowDays) -> u32 {
        window.days()
    }
}

impl fmt::Display for WindowDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendDirection {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(TrendDirection::Up),
            "down" => Ok(TrendDirection::Down),
            "stable" => Ok(TrendDirection::Stable),
            _ => Err(HealthError::invalid_argument(format!(
                "unknown trend direction '{}'",
                s
            ))),
        }
    }
}

/// Occurrences of one root cause on one unit over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRecord {
    pub unit_id: String,
    /// Display fields from the latest snapshot of the group
    pub unit_name: String,
    pub district: String,

    pub category: IssueCategory,
    pub severity: SeverityTier,

    /// Always > 0
    pub occurrences: u32,
    pub window_days: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    /// Occurrences in the earlier half of the window
    pub earlier_count: u32,
    /// Occurrences in the later half of the window
    pub later_count: u32,
    pub trend_direction: TrendDirection,
    /// Signed percentage change, one decimal
    pub trend_magnitude: f64,
}
