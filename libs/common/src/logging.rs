//! Logging setup for the fleet-health tools
//!
//! Console output goes to stderr so machine-readable reports on stdout stay
//! clean. An optional daily rolling file receives the same events in the
//! bracketed text format.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{
        self,
        format::Writer,
        FmtContext, FormatEvent, FormatFields,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::{Error, Result};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2024-06-01T08:00:00.000000Z [INFO] Loaded 120 snapshots`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp [LEVEL] message`
    #[default]
    Text,
    Compact,
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive (`info`, `debug`, `info,fleet_health=debug`, ...)
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "crate::serde_helpers::bool_true")]
    pub console: bool,

    #[serde(default)]
    pub format: LogFormat,

    /// Enable ANSI colors in console output
    #[serde(default = "crate::serde_helpers::bool_true")]
    pub ansi: bool,

    /// Directory for daily rolling log files; no file logging when unset
    #[serde(default)]
    pub file_dir: Option<PathBuf>,

    /// File name prefix, e.g. `fleetctl` -> `fleetctl.log.2024-06-01`
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_file_prefix() -> String {
    "fleet".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            console: true,
            format: LogFormat::Text,
            ansi: true,
            file_dir: None,
            file_prefix: default_file_prefix(),
        }
    }
}

/// Build the level filter; `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var("RUST_LOG") {
        Ok(env) if !env.trim().is_empty() => EnvFilter::try_new(&env)
            .map_err(|e| Error::config(format!("Invalid RUST_LOG '{}': {}", env, e))),
        _ => EnvFilter::try_new(level)
            .map_err(|e| Error::config(format!("Invalid log level '{}': {}", level, e))),
    }
}

/// Initialize logging with the given configuration
///
/// Returns a guard that must be kept alive for file logging to work.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    let mut guard = None;

    if config.console {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi);
        let console_layer = match config.format {
            LogFormat::Text => base.event_format(BracketedLevelFormat).boxed(),
            LogFormat::Compact => base.compact().with_target(true).boxed(),
            LogFormat::Pretty => base.pretty().with_target(true).boxed(),
            LogFormat::Json => base.json().with_target(true).boxed(),
        };
        layers.push(console_layer.with_filter(build_filter(&config.level)?).boxed());
    }

    if let Some(dir) = &config.file_dir {
        std::fs::create_dir_all(dir)?;
        let file_appender =
            tracing_appender::rolling::daily(dir, format!("{}.log", config.file_prefix));
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .event_format(BracketedLevelFormat)
            .with_filter(build_filter(&config.level)?)
            .boxed();
        layers.push(file_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
