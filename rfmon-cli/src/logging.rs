//! Tracing subscriber setup shared by the binaries.
//!
//! Logs go to stderr so that stdout carries nothing but the CSV stream.
//! Optionally a plain-text and a JSON log are written to daily rolling files.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing_appender::rolling::daily;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging flags common to every rfmon binary.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Log level or filter directive (e.g. "debug", "rfmon_rfexplorer=trace").
    /// Overridden by RUST_LOG when set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write logs to daily rolling files.
    #[arg(long)]
    pub log_to_file: bool,

    /// Directory for log files.
    #[arg(long, default_value = "logs")]
    pub log_dir: String,
}

/// Build the event filter: `RUST_LOG` wins, then the `--log-level` flag.
pub fn log_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))
}

/// Install the global subscriber.
///
/// `console` turns the stderr layer off, for output modes that take over
/// the terminal. `app` names the log files.
pub fn init_logging(args: &LogArgs, app: &str, console: bool) -> Result<()> {
    // Each layer gets its own filter; EnvFilter is not Clone.
    let console_layer = if console {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(log_filter(&args.log_level)?),
        )
    } else {
        None
    };

    let (file_layer, json_layer) = if args.log_to_file {
        std::fs::create_dir_all(Path::new(&args.log_dir))
            .with_context(|| format!("creating log directory {}", args.log_dir))?;

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(daily(&args.log_dir, format!("{app}.log")))
            .with_filter(log_filter(&args.log_level)?);

        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(daily(&args.log_dir, format!("{app}.json")))
            .with_filter(log_filter(&args.log_level)?);

        (Some(file_layer), Some(json_layer))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .try_init()
        .context("installing the log subscriber")?;

    if args.log_to_file {
        tracing::info!(dir = %args.log_dir, "writing log files");
    }
    Ok(())
}
