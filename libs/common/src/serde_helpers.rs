//! Shared Serde deserializers
//!
//! Feed exports come from spreadsheets and device pollers, so booleans and
//! numbers arrive in several shapes. These helpers accept the common shapes
//! but never invent a value for a missing required field:
//! - `null` / absent / `""` → `None`
//! - `true`, `1`, `"1"`, `"true"`, `"yes"` → `Some(true)`
//! - `false`, `0`, `"0"`, `"false"`, `"no"` → `Some(false)`

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

// ============================================================================
// Default Value Functions (for serde #[serde(default = "...")] attributes)
// ============================================================================

/// Default value: true
pub fn bool_true() -> bool {
    true
}

// ============================================================================
// Parsers
// ============================================================================

/// Parse a flexible boolean string
///
/// Returns `Ok(None)` for an empty string.
pub fn parse_bool_flexible(s: &str) -> Result<Option<bool>, String> {
    // trim first, then eq_ignore_ascii_case (zero allocation)
    let t = s.trim();
    if t.is_empty() {
        Ok(None)
    } else if t == "1" || t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("yes") {
        Ok(Some(true))
    } else if t == "0" || t.eq_ignore_ascii_case("false") || t.eq_ignore_ascii_case("no") {
        Ok(Some(false))
    } else {
        Err(format!(
            "Invalid boolean value '{}', expected: 1/0, true/false, yes/no",
            s
        ))
    }
}

/// Parse a timestamp
///
/// Accepts RFC 3339 (`2024-06-01T08:00:00Z`, `2024-06-01T16:00:00+08:00`) or
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` without offset, read as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let t = s.trim();
    if t.is_empty() {
        return Err("empty timestamp".to_string());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(t) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid timestamp '{}'", s))
}

// ============================================================================
// Custom Deserializers (for CSV/JSON parsing)
// ============================================================================

/// Optional boolean accepting native booleans, 0/1 integers and strings
///
/// Use with `#[serde(default, deserialize_with = "...")]` so that an absent
/// field also becomes `None`.
pub fn deserialize_optional_bool_flexible<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrStringOrInt {
        Bool(bool),
        Int(i64),
        String(String),
    }

    match Option::<BoolOrStringOrInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrStringOrInt::Bool(b)) => Ok(Some(b)),
        Some(BoolOrStringOrInt::Int(i)) => match i {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            _ => Err(D::Error::custom(format!(
                "Invalid integer value {}, expected 0 or 1",
                i
            ))),
        },
        Some(BoolOrStringOrInt::String(s)) => parse_bool_flexible(&s).map_err(D::Error::custom),
    }
}

/// Optional u32 accepting numbers or numeric strings; `""` → `None`
pub fn deserialize_optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(u32),
        String(String),
    }

    match Option::<StringOrInt>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrInt::Int(i)) => Ok(Some(i)),
        Some(StringOrInt::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrInt::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid non-negative integer: {}", s))),
    }
}

/// Optional string; whitespace-only becomes `None`
pub fn deserialize_optional_trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
