//! Wire representation of one feed record
//!
//! Every field is optional on the wire so that a missing value is detected
//! and reported instead of failing the whole feed or being defaulted.

use common::serde_helpers::{
    deserialize_optional_bool_flexible, deserialize_optional_trimmed, deserialize_optional_u32,
    parse_timestamp,
};
use fleet_health::RawSnapshot;
use serde::Deserialize;

/// One record as found in a CSV row or JSON object
///
/// JSON feeds may use camelCase keys (`unitId`, `gatewayReachable`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default, alias = "unitId", deserialize_with = "deserialize_optional_trimmed")]
    pub unit_id: Option<String>,

    #[serde(default, alias = "unitName", deserialize_with = "deserialize_optional_trimmed")]
    pub unit_name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub district: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub location: Option<String>,

    #[serde(
        default,
        alias = "gatewayReachable",
        deserialize_with = "deserialize_optional_bool_flexible"
    )]
    pub gateway_reachable: Option<bool>,

    #[serde(
        default,
        alias = "hostReachable",
        deserialize_with = "deserialize_optional_bool_flexible"
    )]
    pub host_reachable: Option<bool>,

    #[serde(
        default,
        alias = "storageHealthy",
        deserialize_with = "deserialize_optional_bool_flexible"
    )]
    pub storage_healthy: Option<bool>,

    #[serde(
        default,
        alias = "loginOk",
        deserialize_with = "deserialize_optional_bool_flexible"
    )]
    pub login_ok: Option<bool>,

    #[serde(
        default,
        alias = "videoNormal",
        deserialize_with = "deserialize_optional_bool_flexible"
    )]
    pub video_normal: Option<bool>,

    #[serde(default, alias = "cameraCount", deserialize_with = "deserialize_optional_u32")]
    pub camera_count: Option<u32>,

    #[serde(default, alias = "observedAt", deserialize_with = "deserialize_optional_trimmed")]
    pub observed_at: Option<String>,
}

impl SnapshotRecord {
    /// Validate and convert into a snapshot the engine can consume
    ///
    /// The error lists every missing required field, or the first value
    /// that could not be parsed.
    pub fn into_snapshot(self) -> Result<RawSnapshot, String> {
        let (
            Some(unit_id),
            Some(gateway_reachable),
            Some(host_reachable),
            Some(storage_healthy),
            Some(login_ok),
            Some(video_normal),
            Some(observed_at),
        ) = (
            self.unit_id.as_ref(),
            self.gateway_reachable,
            self.host_reachable,
            self.storage_healthy,
            self.login_ok,
            self.video_normal,
            self.observed_at.as_deref(),
        )
        else {
            return Err(format!(
                "missing required field(s): {}",
                self.missing_fields().join(", ")
            ));
        };

        let observed_at = parse_timestamp(observed_at)?;
        let unit_id = unit_id.clone();

        Ok(RawSnapshot {
            unit_name: self.unit_name.unwrap_or_else(|| unit_id.clone()),
            unit_id,
            district: self.district.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            gateway_reachable,
            host_reachable,
            storage_healthy,
            login_ok,
            video_normal,
            camera_count: self.camera_count.unwrap_or(0),
            observed_at,
        })
    }

    /// Names of the required fields this record lacks, in column order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("unit_id", self.unit_id.is_none()),
            ("gateway_reachable", self.gateway_reachable.is_none()),
            ("host_reachable", self.host_reachable.is_none()),
            ("storage_healthy", self.storage_healthy.is_none()),
            ("login_ok", self.login_ok.is_none()),
            ("video_normal", self.video_normal.is_none()),
            ("observed_at", self.observed_at.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect()
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    fn complete() -> SnapshotRecord {
        SnapshotRecord {
            unit_id: Some("U1".to_string()),
            unit_name: Some("Main gate".to_string()),
            district: Some("North".to_string()),
            location: None,
            gateway_reachable: Some(true),
            host_reachable: Some(false),
            storage_healthy: Some(true),
            login_ok: Some(true),
            video_normal: Some(true),
            camera_count: Some(6),
            observed_at: Some("2024-06-01 08:00:00".to_string()),
        }
    }

    #[test]
    fn test_complete_record_converts() {
        let snapshot = complete().into_snapshot().unwrap();

        assert_eq!(snapshot.unit_id, "U1");
        assert_eq!(snapshot.unit_name, "Main gate");
        assert_eq!(snapshot.location, "");
        assert!(!snapshot.host_reachable);
        assert_eq!(snapshot.camera_count, 6);
    }

    #[test]
    fn test_unit_name_falls_back_to_id() {
        let record = SnapshotRecord {
            unit_name: None,
            camera_count: None,
            ..complete()
        };
        let snapshot = record.into_snapshot().unwrap();
        assert_eq!(snapshot.unit_name, "U1");
        assert_eq!(snapshot.camera_count, 0);
    }

    #[test]
    fn test_missing_booleans_are_rejected_not_defaulted() {
        let record = SnapshotRecord {
            host_reachable: None,
            video_normal: None,
            ..complete()
        };
        let err = record.into_snapshot().unwrap_err();
        assert_eq!(
            err,
            "missing required field(s): host_reachable, video_normal"
        );
    }

    #[test]
    fn test_missing_unit_id_is_rejected() {
        let record = SnapshotRecord {
            unit_id: None,
            unit_name: None,
            ..complete()
        };
        assert_eq!(record.missing_fields(), vec!["unit_id"]);
        assert_eq!(
            record.into_snapshot().unwrap_err(),
            "missing required field(s): unit_id"
        );
        assert!(complete().missing_fields().is_empty());
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let record = SnapshotRecord {
            observed_at: Some("last tuesday".to_string()),
            ..complete()
        };
        assert!(record.into_snapshot().unwrap_err().contains("Invalid timestamp"));
    }

    #[test]
    fn test_camel_case_json() {
        let record: SnapshotRecord = serde_json::from_str(
            r#"{
                "unitId": "U9",
                "gatewayReachable": true,
                "hostReachable": 1,
                "storageHealthy": "yes",
                "loginOk": "true",
                "videoNormal": false,
                "cameraCount": "3",
                "observedAt": "2024-06-01T08:00:00Z"
            }"#,
        )
        .unwrap();

        let snapshot = record.into_snapshot().unwrap();
        assert_eq!(snapshot.unit_id, "U9");
        assert!(snapshot.host_reachable);
        assert!(snapshot.storage_healthy);
        assert!(!snapshot.video_normal);
        assert_eq!(snapshot.camera_count, 3);
    }
}
