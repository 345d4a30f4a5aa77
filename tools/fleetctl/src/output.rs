//! Report rendering: colored tables or structured JSON / YAML

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use colored::*;
use fleet_health::{
    EffectiveStatus, FleetSummary, IssueCategory, RecurrenceRecord, SeverityTier, TrendDirection,
    UnitVerdict, WindowDays,
};
use fleet_ingest::LoadReport;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

/// Serialize a report for machine consumption
pub fn structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(value)?,
    })
}

fn tier_label(tier: SeverityTier) -> ColoredString {
    let padded = format!("{:<9}", tier.as_str().to_uppercase());
    match tier {
        SeverityTier::Critical => padded.red().bold(),
        SeverityTier::Attention => padded.yellow(),
        SeverityTier::Healthy => padded.green(),
    }
}

fn layer_flag(up: bool) -> ColoredString {
    if up {
        format!("{:<5}", "ok").green()
    } else {
        format!("{:<5}", "--").red()
    }
}

fn layer_flags(status: &EffectiveStatus) -> String {
    [
        status.gateway,
        status.host,
        status.storage,
        status.login,
        status.video,
    ]
    .iter()
    .map(|up| layer_flag(*up).to_string())
    .collect::<Vec<_>>()
    .join(" ")
}

fn trend_label(record: &RecurrenceRecord) -> ColoredString {
    let text = format!(
        "{:<18}",
        format!("{:>+8.1}% {}", record.trend_magnitude, record.trend_direction)
    );
    match record.trend_direction {
        TrendDirection::Up => text.red(),
        TrendDirection::Down => text.green(),
        TrendDirection::Stable => text.normal(),
    }
}

/// Live status table
pub fn status_table(
    units: &[&UnitVerdict],
    summary: &FleetSummary,
    summary_only: bool,
) -> String {
    let mut out = String::new();

    if !summary_only {
        let _ = writeln!(
            out,
            "{:<12} {:<20} {:<12} {:<9} {:<8} {:<5} {:<5} {:<5} {:<5} {:<5} {:>4}  {}",
            "UNIT",
            "NAME",
            "DISTRICT",
            "TIER",
            "CAUSE",
            "GW",
            "HOST",
            "STOR",
            "LOGIN",
            "VIDEO",
            "CAMS",
            "OBSERVED"
        );
        let _ = writeln!(out, "{}", "=".repeat(118).bright_blue());
        for unit in units {
            let _ = writeln!(
                out,
                "{:<12} {:<20} {:<12} {} {:<8} {} {:>4}  {}",
                unit.unit_id,
                truncate(&unit.unit_name, 20),
                truncate(&unit.district, 12),
                tier_label(unit.severity),
                unit.category.as_str(),
                layer_flags(&unit.status),
                unit.camera_count,
                unit.observed_at.format("%Y-%m-%d %H:%M")
            );
        }
        if units.is_empty() {
            let _ = writeln!(out, "{}", "No units match".dimmed());
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "{} {} units: {} critical, {} attention, {} healthy",
        "Fleet:".bright_cyan(),
        summary.total_units,
        summary.tiers.critical.to_string().red(),
        summary.tiers.attention.to_string().yellow(),
        summary.tiers.healthy.to_string().green()
    );
    let causes: Vec<String> = IssueCategory::PRECEDENCE
        .iter()
        .filter_map(|c| summary.by_category.get(c).map(|n| format!("{} {}", c, n)))
        .collect();
    if !causes.is_empty() {
        let _ = writeln!(out, "{} {}", "Root causes:".bright_cyan(), causes.join(", "));
    }
    if summary.cameras_without_video > 0 {
        let _ = writeln!(
            out,
            "{} {}",
            "Cameras without video:".bright_cyan(),
            summary.cameras_without_video.to_string().red()
        );
    }
    if !summary.by_district.is_empty() {
        let _ = writeln!(out, "{}", "By district:".bright_cyan());
        for (district, counts) in &summary.by_district {
            let name = if district.is_empty() { "(none)" } else { district.as_str() };
            let _ = writeln!(
                out,
                "  {:<16} {} critical, {} attention, {} healthy",
                name, counts.critical, counts.attention, counts.healthy
            );
        }
    }

    out
}

/// Ranked recurrence table
pub fn recurrence_table(records: &[RecurrenceRecord], window: WindowDays) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} top {} recurring issues over {}",
        "Recurrence:".bright_cyan(),
        records.len(),
        window
    );
    if records.is_empty() {
        let _ = writeln!(out, "{}", "No recurring issues in window".dimmed());
        return out;
    }

    let _ = writeln!(
        out,
        "{:>3}  {:<12} {:<20} {:<12} {:<8} {:<9} {:>5} {:>5} {:>5}  {:<18} {}",
        "#",
        "UNIT",
        "NAME",
        "DISTRICT",
        "CAUSE",
        "TIER",
        "COUNT",
        "PREV",
        "LAST",
        "TREND",
        "LAST SEEN"
    );
    let _ = writeln!(out, "{}", "=".repeat(120).bright_blue());
    for (rank, record) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<12} {:<20} {:<12} {:<8} {} {:>5} {:>5} {:>5}  {} {}",
            rank + 1,
            record.unit_id,
            truncate(&record.unit_name, 20),
            truncate(&record.district, 12),
            record.category.as_str(),
            tier_label(record.severity),
            record.occurrences,
            record.earlier_count,
            record.later_count,
            trend_label(record),
            record.last_seen.format("%Y-%m-%d %H:%M")
        );
    }

    out
}

/// Feed validation summary
pub fn validation_table(report: &LoadReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {} records, {} accepted, {} rejected",
        "Feed:".bright_cyan(),
        report.total(),
        report.snapshots.len().to_string().green(),
        if report.is_clean() {
            "0".green()
        } else {
            report.rejected.len().to_string().red()
        }
    );
    for rejected in &report.rejected {
        let _ = writeln!(
            out,
            "  {} line {}: {}",
            "REJECTED".red(),
            rejected.line,
            rejected.reason
        );
    }
    if report.is_clean() {
        let _ = writeln!(out, "{} Feed is well-formed", "OK".green());
    }

    out
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
