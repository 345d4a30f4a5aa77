//! fleetctl - recorder fleet health from the command line
//!
//! Loads snapshot feeds, attributes every fault to its root-cause layer and
//! reports live status, recurring issues or feed problems.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use fleet_health::SeverityTier;
use fleet_ingest::SnapshotFormat;
use tracing::debug;

use crate::commands::{Context, StatusFilter};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "fleetctl")]
#[command(about = "Recorder fleet health - root-cause status and recurrence reports")]
#[command(long_about = "Recorder fleet health - root-cause status and recurrence reports

Commands:
  status      Latest state of every unit, most severe first
  recurrence  Most frequent recurring issues over a 3 or 7 day window
  validate    Check a snapshot feed and list malformed records

Feeds may be CSV, a JSON array or JSON lines; the format follows the file
extension unless --input-format is given.

Examples:
  fleetctl status feed.csv --severity critical
  fleetctl recurrence feed.csv --window 3 --top 10
  fleetctl validate feed.jsonl

Use 'fleetctl <command> --help' for more information on a specific command.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: config/fleetctl.* and FLEETCTL_* env)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Feed format: csv, json or jsonl (default: from file extension)
    #[arg(long = "input-format", global = true)]
    input_format: Option<SnapshotFormat>,

    /// Fail on the first malformed record instead of skipping it
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the latest state of every unit
    Status {
        /// Snapshot feed file
        input: PathBuf,

        /// Only show units in this tier: critical, attention or healthy
        #[arg(short, long)]
        severity: Option<SeverityTier>,

        /// Only show units in this district
        #[arg(short, long)]
        district: Option<String>,

        /// Print fleet totals without the per-unit table
        #[arg(long)]
        summary_only: bool,
    },

    /// Rank recurring issues over a trailing window
    Recurrence {
        /// Snapshot feed file
        input: PathBuf,

        /// Window length in days: 3 or 7 (default from config)
        #[arg(short, long)]
        window: Option<u32>,

        /// Number of records to report (default from config)
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Window end (default: latest snapshot in the feed)
        #[arg(long, value_parser = parse_until)]
        until: Option<DateTime<Utc>>,
    },

    /// Check a feed and report malformed records
    Validate {
        /// Snapshot feed file
        input: PathBuf,
    },
}

fn parse_until(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    common::serde_helpers::parse_timestamp(s)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.no_color {
        config.logging.ansi = false;
    }
    let _guard = common::init_logging(&config.logging)?;
    debug!("Effective configuration: {:?}", config);

    let ctx = Context::new(config, cli.format, cli.input_format, cli.strict);

    match cli.command {
        Commands::Status {
            input,
            severity,
            district,
            summary_only,
        } => {
            let filter = StatusFilter {
                severity,
                district,
                summary_only,
            };
            commands::status(&ctx, &input, &filter)
        },
        Commands::Recurrence {
            input,
            window,
            top,
            until,
        } => commands::recurrence(&ctx, &input, window, top, until),
        Commands::Validate { input } => commands::validate(&ctx, &input),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from([
            "fleetctl",
            "status",
            "feed.csv",
            "--severity",
            "critical",
            "--district",
            "North",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Status {
                input,
                severity,
                district,
                summary_only,
            } => {
                assert_eq!(input, PathBuf::from("feed.csv"));
                assert_eq!(severity, Some(SeverityTier::Critical));
                assert_eq!(district.as_deref(), Some("North"));
                assert!(!summary_only);
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_recurrence() {
        let cli = Cli::try_parse_from([
            "fleetctl",
            "--strict",
            "recurrence",
            "feed.jsonl",
            "-w",
            "3",
            "-n",
            "5",
            "--until",
            "2024-06-07 00:00:00",
        ])
        .unwrap();

        assert!(cli.strict);
        match cli.command {
            Commands::Recurrence {
                window, top, until, ..
            } => {
                assert_eq!(window, Some(3));
                assert_eq!(top, Some(5));
                assert_eq!(until, Some(Utc.with_ymd_and_hms(2024, 6, 7, 0, 0, 0).unwrap()));
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        let rejected = [
            vec!["fleetctl", "status", "f.csv", "--severity", "meh"],
            vec!["fleetctl", "recurrence", "f.csv", "--until", "soon"],
            vec!["fleetctl", "validate", "f.csv", "--input-format", "xml"],
            vec!["fleetctl", "validate"],
        ];
        for args in rejected {
            assert!(Cli::try_parse_from(args.clone()).is_err(), "accepted {:?}", args);
        }
    }

    #[test]
    fn test_input_format_flag() {
        let cli =
            Cli::try_parse_from(["fleetctl", "validate", "feed.txt", "--input-format", "jsonl"])
                .unwrap();
        assert_eq!(cli.input_format, Some(SnapshotFormat::JsonLines));
    }
}
