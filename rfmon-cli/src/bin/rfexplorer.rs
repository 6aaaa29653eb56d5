// rfexplorer -- stream sweeps from an RF Explorer spectrum analyzer.
//
// Usage:
//   rfexplorer                               # strongest signal per sweep, 60 s
//   rfexplorer -m swipe -c 868 -s 2 -d 0     # full sweeps until Ctrl-C
//   rfexplorer -m plot -f 863 -t 870         # live chart
//   rfexplorer -r -p /dev/ttyUSB0 --log-to-file

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use rfmon_cli::logging::{init_logging, LogArgs};
use rfmon_cli::parse_or_exit;
use rfmon_cli::printers::{PeakPrinter, PlotPrinter, SwipePrinter};
use rfmon_cli::session::{interrupt_token, monitor};
use rfmon_core::{apply_range, Printer, RangeRequest, SweepSource};
use rfmon_rfexplorer::builder::DEFAULT_BAUD_RATE;
use rfmon_rfexplorer::RfExplorerBuilder;
use rfmon_transport::discovery::{self, RF_EXPLORER};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One CSV row per sweep with the strongest step.
    Peak,
    /// One CSV row per sweep with every step.
    Swipe,
    /// Live chart with max-hold.
    Plot,
}

/// Stream sweeps from an RF Explorer spectrum analyzer.
#[derive(Debug, Parser)]
#[command(name = "rfexplorer", version, about)]
struct Cli {
    /// Output mode.
    #[arg(short, long, value_enum, default_value_t = Mode::Peak)]
    mode: Mode,

    /// Reset the analyzer before configuring it.
    #[arg(short, long)]
    reset: bool,

    /// Center frequency in MHz. Takes precedence over --from/--to.
    #[arg(short, long)]
    center: Option<f64>,

    /// Span in MHz, used with --center.
    #[arg(short, long, default_value_t = 7.0)]
    span: f64,

    /// Window start in MHz.
    #[arg(short, long)]
    from: Option<f64>,

    /// Window end in MHz.
    #[arg(short, long)]
    to: Option<f64>,

    /// Seconds to run. 0 runs until interrupted.
    #[arg(short, long, default_value_t = 60)]
    duration: u64,

    /// Serial port. Found from the USB IDs when omitted.
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    #[command(flatten)]
    log: LogArgs,
}

impl Cli {
    fn range_request(&self) -> RangeRequest {
        RangeRequest {
            center_mhz: self.center,
            span_mhz: self.span,
            from_mhz: self.from,
            to_mhz: self.to,
        }
    }
}

fn printer_for(mode: Mode) -> rfmon_core::Result<Box<dyn Printer>> {
    let printer: Box<dyn Printer> = match mode {
        Mode::Peak => Box::new(PeakPrinter::new(io::stdout())),
        Mode::Swipe => Box::new(SwipePrinter::new(io::stdout())),
        Mode::Plot => Box::new(PlotPrinter::on_stdout()?),
    };
    Ok(printer)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = parse_or_exit();
    init_logging(&cli.log, "rfexplorer", cli.mode != Mode::Plot)?;
    let cancel = interrupt_token();

    let port = discovery::resolve_port(cli.port.as_deref(), RF_EXPLORER)
        .context("RF Explorer not found")?;
    tracing::info!(port = %port, baud = cli.baud, "connecting");

    let builder = RfExplorerBuilder::new()
        .serial_port(&port)
        .baud_rate(cli.baud)
        .reset(cli.reset);
    let mut analyzer = tokio::select! {
        result = builder.build() => {
            result.with_context(|| format!("connecting to RF Explorer on {port}"))?
        }
        _ = cancel.cancelled() => return Ok(()),
    };

    let (center, span) = cli.range_request().resolve();
    let applied = tokio::select! {
        result = apply_range(&mut analyzer, center, span) => Some(result),
        _ = cancel.cancelled() => None,
    };
    match applied {
        Some(Ok(range)) => tracing::debug!(%range, "window ready"),
        Some(Err(e)) => {
            let _ = analyzer.close().await;
            return Err(e).context("setting the frequency range");
        }
        None => {
            analyzer.close().await?;
            return Ok(());
        }
    }

    let mut printer = match printer_for(cli.mode) {
        Ok(printer) => printer,
        Err(e) => {
            let _ = analyzer.close().await;
            return Err(e).context("opening the output");
        }
    };

    monitor(
        &mut analyzer,
        printer.as_mut(),
        Duration::from_secs(cli.duration),
        &cancel,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["rfexplorer"]).unwrap();
        assert_eq!(cli.mode, Mode::Peak);
        assert!(!cli.reset);
        assert_eq!(cli.span, 7.0);
        assert_eq!(cli.duration, 60);
        assert_eq!(cli.baud, 500_000);
        assert_eq!(cli.port, None);
        assert_eq!(cli.log.log_level, "info");
        assert_eq!(cli.range_request(), RangeRequest::default());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from([
            "rfexplorer", "-m", "swipe", "-r", "-c", "868", "-s", "2", "-d", "0", "-p",
            "/dev/ttyUSB1",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::Swipe);
        assert!(cli.reset);
        assert_eq!(cli.duration, 0);
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(cli.range_request().resolve(), (868.0, 2.0));
    }

    #[test]
    fn from_to_window() {
        let cli = Cli::try_parse_from(["rfexplorer", "-f", "865", "-t", "867"]).unwrap();
        assert_eq!(cli.range_request().resolve(), (866.0, 2.0));
    }

    #[test]
    fn plot_mode() {
        let cli = Cli::try_parse_from(["rfexplorer", "--mode", "plot"]).unwrap();
        assert_eq!(cli.mode, Mode::Plot);
    }

    #[test]
    fn unknown_mode_is_a_usage_error() {
        let err = Cli::try_parse_from(["rfexplorer", "-m", "waterfall"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn help_is_not_an_error_exit() {
        let err = Cli::try_parse_from(["rfexplorer", "--help"]).unwrap_err();
        assert!(!err.use_stderr());
    }
}
