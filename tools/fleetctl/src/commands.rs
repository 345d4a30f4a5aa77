//! Command implementations
//!
//! Each command renders into a `String` first so that reports can be
//! checked in tests without capturing stdout.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, Utc};
use fleet_health::{
    FleetAssessment, FleetSummary, RecurrenceAnalyzer, RecurrenceQuery, RecurrenceRecord,
    SeverityTier, UnitVerdict, WindowDays,
};
use fleet_ingest::{load_snapshots, LoadOptions, LoadReport, RejectedRecord, SnapshotFormat};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::output::{self, OutputFormat};

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub config: AppConfig,
    pub format: OutputFormat,
    pub load: LoadOptions,
}

impl Context {
    pub fn new(
        config: AppConfig,
        format: OutputFormat,
        input_format: Option<SnapshotFormat>,
        strict: bool,
    ) -> Self {
        Self {
            config,
            format,
            load: LoadOptions {
                format: input_format,
                strict,
            },
        }
    }

    fn load(&self, input: &Path) -> Result<LoadReport> {
        let report = load_snapshots(input, &self.load)
            .with_context(|| format!("Failed to load feed {}", input.display()))?;
        if !report.is_clean() {
            warn!(
                "{} malformed records skipped; run 'fleetctl validate' for details",
                report.rejected.len()
            );
        }
        Ok(report)
    }
}

// ============================================================================
// status
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StatusFilter {
    pub severity: Option<SeverityTier>,
    pub district: Option<String>,
    pub summary_only: bool,
}

impl StatusFilter {
    fn matches(&self, unit: &UnitVerdict) -> bool {
        self.severity.map_or(true, |tier| unit.severity == tier)
            && self.district.as_deref().map_or(true, |d| unit.district == d)
    }
}

#[derive(Serialize)]
struct StatusReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<Vec<&'a UnitVerdict>>,
    summary: &'a FleetSummary,
    rejected: usize,
}

pub fn render_status(
    ctx: &Context,
    report: &LoadReport,
    filter: &StatusFilter,
) -> Result<String> {
    let fleet = FleetAssessment::from_snapshots(&report.snapshots);
    let units: Vec<&UnitVerdict> = fleet.units.iter().filter(|u| filter.matches(u)).collect();
    info!(
        "Assessed {} units, {} shown",
        fleet.summary.total_units,
        units.len()
    );

    match ctx.format {
        OutputFormat::Table => Ok(output::status_table(
            &units,
            &fleet.summary,
            filter.summary_only,
        )),
        format => output::structured(
            &StatusReport {
                units: (!filter.summary_only).then_some(units),
                summary: &fleet.summary,
                rejected: report.rejected.len(),
            },
            format,
        ),
    }
}

pub fn status(ctx: &Context, input: &Path, filter: &StatusFilter) -> Result<ExitCode> {
    let report = ctx.load(input)?;
    print!("{}", render_status(ctx, &report, filter)?);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// recurrence
// ============================================================================

#[derive(Serialize)]
struct RecurrenceReport<'a> {
    window_days: WindowDays,
    #[serde(skip_serializing_if = "Option::is_none")]
    until: Option<DateTime<Utc>>,
    records: &'a [RecurrenceRecord],
}

/// Build the query from command-line overrides and configured defaults
pub fn build_query(
    ctx: &Context,
    window: Option<u32>,
    top: Option<usize>,
    until: Option<DateTime<Utc>>,
) -> Result<RecurrenceQuery> {
    let window = match window {
        Some(days) => WindowDays::try_from(days)?,
        None => ctx.config.analysis.window()?,
    };
    let mut query =
        RecurrenceQuery::new(window).with_top_n(top.unwrap_or(ctx.config.analysis.top_n));
    if let Some(until) = until {
        query = query.until(until);
    }
    Ok(query)
}

pub fn render_recurrence(
    ctx: &Context,
    report: &LoadReport,
    query: &RecurrenceQuery,
) -> Result<String> {
    let analyzer = RecurrenceAnalyzer::new(ctx.config.analysis.engine.clone());
    let records = analyzer.analyze(&report.snapshots, query);

    match ctx.format {
        OutputFormat::Table => Ok(output::recurrence_table(&records, query.window)),
        format => output::structured(
            &RecurrenceReport {
                window_days: query.window,
                until: query.until,
                records: &records,
            },
            format,
        ),
    }
}

pub fn recurrence(
    ctx: &Context,
    input: &Path,
    window: Option<u32>,
    top: Option<usize>,
    until: Option<DateTime<Utc>>,
) -> Result<ExitCode> {
    let query = build_query(ctx, window, top, until)?;
    let report = ctx.load(input)?;
    print!("{}", render_recurrence(ctx, &report, &query)?);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// validate
// ============================================================================

#[derive(Serialize)]
struct ValidationReport<'a> {
    total: usize,
    accepted: usize,
    rejected: &'a [RejectedRecord],
}

pub fn render_validation(ctx: &Context, report: &LoadReport) -> Result<String> {
    match ctx.format {
        OutputFormat::Table => Ok(output::validation_table(report)),
        format => output::structured(
            &ValidationReport {
                total: report.total(),
                accepted: report.snapshots.len(),
                rejected: &report.rejected,
            },
            format,
        ),
    }
}

/// Load a feed collecting every problem, even when `--strict` is set
pub fn check_feed(ctx: &Context, input: &Path) -> Result<LoadReport> {
    if !input.exists() {
        bail!("Feed not found: {}", input.display());
    }

    let options = LoadOptions {
        strict: false,
        ..ctx.load
    };
    load_snapshots(input, &options)
        .with_context(|| format!("Failed to read feed {}", input.display()))
}

/// Exits non-zero when any record was rejected
pub fn validate(ctx: &Context, input: &Path) -> Result<ExitCode> {
    let report = check_feed(ctx, input)?;
    print!("{}", render_validation(ctx, &report)?);
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
