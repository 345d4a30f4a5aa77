//! Snapshot feed loader
//!
//! Reads CSV, JSON array or JSON-lines feeds. Well-formed records become
//! [`RawSnapshot`]s; malformed ones are set aside as [`RejectedRecord`]s so
//! the engine only ever sees fully populated snapshots.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use fleet_health::RawSnapshot;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::record::SnapshotRecord;

/// Feed encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Header row followed by one snapshot per row
    Csv,
    /// Top-level array of objects
    Json,
    /// One object per line
    JsonLines,
}

impl SnapshotFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                IngestError::unsupported_format(format!(
                    "cannot infer format of {} without an extension",
                    path.display()
                ))
            })?;
        extension.parse()
    }
}

impl FromStr for SnapshotFormat {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" | "json-lines" => Ok(Self::JsonLines),
            other => Err(IngestError::unsupported_format(other)),
        }
    }
}

/// Loader options
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Explicit format; inferred from the file extension when `None`
    pub format: Option<SnapshotFormat>,
    /// Fail on the first malformed record instead of setting it aside
    pub strict: bool,
}

/// A record that did not make it into the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    /// CSV / JSON-lines: 1-based line in the file. JSON array: 1-based
    /// element index.
    pub line: u64,
    pub reason: String,
}

/// Outcome of loading one feed
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub snapshots: Vec<RawSnapshot>,
    pub rejected: Vec<RejectedRecord>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn total(&self) -> usize {
        self.snapshots.len() + self.rejected.len()
    }

    fn push(
        &mut self,
        line: u64,
        outcome: std::result::Result<RawSnapshot, String>,
        strict: bool,
    ) -> Result<()> {
        match outcome {
            Ok(snapshot) => self.snapshots.push(snapshot),
            Err(reason) if strict => return Err(IngestError::MalformedSnapshot { line, reason }),
            Err(reason) => {
                warn!("Rejected record at line {}: {}", line, reason);
                self.rejected.push(RejectedRecord { line, reason });
            },
        }
        Ok(())
    }
}

/// Load a snapshot feed from a file
pub fn load_snapshots(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadReport> {
    let path = path.as_ref();
    let format = match options.format {
        Some(format) => format,
        None => SnapshotFormat::from_path(path)?,
    };

    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let report = read_snapshots(BufReader::new(file), format, options)?;

    info!(
        "Loaded {} snapshots from {} ({} rejected)",
        report.snapshots.len(),
        path.display(),
        report.rejected.len()
    );
    Ok(report)
}

/// Read a snapshot feed from any reader
pub fn read_snapshots<R: Read>(
    reader: R,
    format: SnapshotFormat,
    options: &LoadOptions,
) -> Result<LoadReport> {
    match format {
        SnapshotFormat::Csv => read_csv(reader, options.strict),
        SnapshotFormat::Json => read_json(reader, options.strict),
        SnapshotFormat::JsonLines => read_json_lines(BufReader::new(reader), options.strict),
    }
}

fn read_csv<R: Read>(reader: R, strict: bool) -> Result<LoadReport> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    debug!("CSV columns: {:?}", headers);

    let mut report = LoadReport::default();
    for result in csv_reader.byte_records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        // Decode per row so one badly encoded export row does not sink the feed
        let outcome = csv::StringRecord::from_byte_record(record)
            .map_err(|e| format!("field {}: invalid UTF-8", e.utf8_error().field() + 1))
            .and_then(|record| {
                record
                    .deserialize::<SnapshotRecord>(Some(&headers))
                    .map_err(|e| deserialize_reason(&e))
            })
            .and_then(SnapshotRecord::into_snapshot);
        report.push(line, outcome, strict)?;
    }
    Ok(report)
}

fn read_json<R: Read>(reader: R, strict: bool) -> Result<LoadReport> {
    let items: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    let mut report = LoadReport::default();
    for (index, item) in items.into_iter().enumerate() {
        let outcome = serde_json::from_value::<SnapshotRecord>(item)
            .map_err(|e| e.to_string())
            .and_then(SnapshotRecord::into_snapshot);
        report.push(index as u64 + 1, outcome, strict)?;
    }
    Ok(report)
}

fn read_json_lines<R: BufRead>(reader: R, strict: bool) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    for (index, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes.map_err(IngestError::Read)?;
        let text = match std::str::from_utf8(&bytes) {
            Ok(text) if text.trim().is_empty() => continue,
            Ok(text) => Ok(text),
            Err(e) => Err(format!("invalid UTF-8 after byte {}", e.valid_up_to())),
        };

        let outcome = text
            .and_then(|text| {
                serde_json::from_str::<SnapshotRecord>(text).map_err(|e| e.to_string())
            })
            .and_then(SnapshotRecord::into_snapshot);
        report.push(index as u64 + 1, outcome, strict)?;
    }
    Ok(report)
}

/// Field-level CSV errors without the position prefix
fn deserialize_reason(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(field) => format!("field {}: {}", field + 1, err.kind()),
            None => err.kind().to_string(),
        },
        _ => err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    const HEADER: &str = "unit_id,unit_name,district,location,gateway_reachable,host_reachable,storage_healthy,login_ok,video_normal,camera_count,observed_at";

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SnapshotFormat::from_path(Path::new("feed.csv")).unwrap(),
            SnapshotFormat::Csv
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("feed.JSON")).unwrap(),
            SnapshotFormat::Json
        );
        assert_eq!(
            SnapshotFormat::from_path(Path::new("feed.ndjson")).unwrap(),
            SnapshotFormat::JsonLines
        );
        assert!(SnapshotFormat::from_path(Path::new("feed")).is_err());
        assert!(SnapshotFormat::from_path(Path::new("feed.xlsx")).is_err());
    }

    #[test]
    fn test_csv_accepts_and_rejects() {
        let data = format!(
            "{}\n\
             U1,Gate,North,Lot A,1,1,1,1,1,4,2024-06-01 08:00:00\n\
             U2,Depot,South,,yes,no,yes,yes,yes,2,2024-06-01T08:00:00Z\n\
             U3,Yard,South,,1,,1,1,1,2,2024-06-01 08:00:00\n\
             U4,Dock,East,,maybe,1,1,1,1,2,2024-06-01 08:00:00\n",
            HEADER
        );

        let report = read_snapshots(data.as_bytes(), SnapshotFormat::Csv, &LoadOptions::default())
            .unwrap();

        assert_eq!(report.snapshots.len(), 2);
        assert_eq!(report.snapshots[1].unit_id, "U2");
        assert!(!report.snapshots[1].host_reachable);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].line, 4);
        assert!(report.rejected[0].reason.contains("host_reachable"));
        assert_eq!(report.rejected[1].line, 5);
        assert_eq!(report.total(), 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_csv_short_row_reports_missing_fields() {
        let data = format!("{}\nU1,Gate,North,Lot A,1,1\n", HEADER);

        let report = read_snapshots(data.as_bytes(), SnapshotFormat::Csv, &LoadOptions::default())
            .unwrap();

        assert!(report.snapshots.is_empty());
        assert!(report.rejected[0].reason.contains("observed_at"));
    }

    #[test]
    fn test_csv_skips_blank_rows() {
        let data = format!(
            "{}\n,,,,,,,,,,\nU1,Gate,North,Lot A,1,1,1,1,1,4,2024-06-01 08:00:00\n",
            HEADER
        );
        let report = read_snapshots(data.as_bytes(), SnapshotFormat::Csv, &LoadOptions::default())
            .unwrap();
        assert_eq!(report.snapshots.len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_strict_mode_fails_fast() {
        let data = format!("{}\nU1,Gate,North,Lot A,1,1,1,1,,4,2024-06-01 08:00:00\n", HEADER);
        let options = LoadOptions {
            strict: true,
            ..LoadOptions::default()
        };

        let err = read_snapshots(data.as_bytes(), SnapshotFormat::Csv, &options).unwrap_err();
        match err {
            IngestError::MalformedSnapshot { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("video_normal"));
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_json_array() {
        let data = r#"[
            {"unit_id": "U1", "gateway_reachable": true, "host_reachable": true,
             "storage_healthy": false, "login_ok": true, "video_normal": true,
             "camera_count": 8, "observed_at": "2024-06-01T08:00:00Z"},
            {"unit_id": "U2", "gateway_reachable": true}
        ]"#;

        let report = read_snapshots(data.as_bytes(), SnapshotFormat::Json, &LoadOptions::default())
            .unwrap();

        assert_eq!(report.snapshots.len(), 1);
        assert!(!report.snapshots[0].storage_healthy);
        assert_eq!(report.rejected[0].line, 2);
    }

    #[test]
    fn test_csv_badly_encoded_row_is_rejected_alone() {
        let mut data = format!(
            "{}\nU1,Gate,North,Lot A,1,1,1,1,1,4,2024-06-01 08:00:00\nU2,Depot,",
            HEADER
        )
        .into_bytes();
        data.extend_from_slice(b"\xb1\xb1\xbe\xa9");
        data.extend_from_slice(b",,1,1,1,1,1,2,2024-06-01 08:00:00\n");
        data.extend_from_slice(b"U3,Yard,South,,1,1,0,1,1,2,2024-06-01 08:00:00\n");

        let report =
            read_snapshots(&data[..], SnapshotFormat::Csv, &LoadOptions::default()).unwrap();

        assert_eq!(report.snapshots.len(), 2);
        assert_eq!(report.snapshots[1].unit_id, "U3");
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 3);
        assert!(report.rejected[0].reason.contains("field 3"));
        assert!(report.rejected[0].reason.contains("UTF-8"));

        let strict = LoadOptions {
            strict: true,
            ..LoadOptions::default()
        };
        assert!(matches!(
            read_snapshots(&data[..], SnapshotFormat::Csv, &strict),
            Err(IngestError::MalformedSnapshot { line: 3, .. })
        ));
    }

    #[test]
    fn test_json_lines_badly_encoded_line_is_rejected_alone() {
        let mut data = br#"{"unit_id": "U1", "gateway_reachable": true, "host_reachable": true, "storage_healthy": true, "login_ok": true, "video_normal": false, "observed_at": "2024-06-01T08:00:00Z"}"#.to_vec();
        data.extend_from_slice(b"\n{\"unit_id\": \"U2\", \"district\": \"");
        data.extend_from_slice(b"\xb1\xb1\xbe\xa9");
        data.extend_from_slice(b"\"}\r\n");

        let report =
            read_snapshots(&data[..], SnapshotFormat::JsonLines, &LoadOptions::default())
                .unwrap();

        assert_eq!(report.snapshots.len(), 1);
        assert!(!report.snapshots[0].video_normal);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 2);
        assert!(report.rejected[0].reason.contains("UTF-8"));
    }

    #[test]
    fn test_json_must_be_an_array() {
        let result = read_snapshots(
            r#"{"unit_id": "U1"}"#.as_bytes(),
            SnapshotFormat::Json,
            &LoadOptions::default(),
        );
        assert!(matches!(result, Err(IngestError::Json(_))));
    }

    #[test]
    fn test_json_lines() {
        let data = concat!(
            r#"{"unitId": "U1", "gatewayReachable": false, "hostReachable": false, "storageHealthy": false, "loginOk": false, "videoNormal": false, "observedAt": "2024-06-01 08:00:00"}"#,
            "\n\n",
            "not json\n",
        );

        let report =
            read_snapshots(data.as_bytes(), SnapshotFormat::JsonLines, &LoadOptions::default())
                .unwrap();

        assert_eq!(report.snapshots.len(), 1);
        assert!(!report.snapshots[0].gateway_reachable);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 3);
    }
}
