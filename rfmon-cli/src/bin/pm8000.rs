// pm8000 -- stream readings from a PM8000 RF power meter.
//
// Usage:
//   pm8000                                   # CSV readings until Ctrl-C
//   pm8000 --frequency 433 --offset -20      # calibrate for a 20 dB attenuator
//   pm8000 --threshold -30 -d 600            # log readings above -30 dBm
//   pm8000 -m plot

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use rfmon_cli::logging::{init_logging, LogArgs};
use rfmon_cli::parse_or_exit;
use rfmon_cli::printers::{PlotPrinter, ReadingPrinter};
use rfmon_cli::session::{interrupt_token, monitor};
use rfmon_core::{Printer, SweepSource};
use rfmon_pm8000::builder::{DEFAULT_BAUD_RATE, DEFAULT_FREQUENCY_MHZ};
use rfmon_pm8000::PowerMeterBuilder;
use rfmon_transport::discovery::{self, POWER_METER};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One CSV row per reading.
    Reading,
    /// Live chart of recent readings.
    Plot,
}

/// Stream readings from a PM8000 RF power meter.
#[derive(Debug, Parser)]
#[command(name = "pm8000", version, about)]
struct Cli {
    /// Output mode.
    #[arg(short, long, value_enum, default_value_t = Mode::Reading)]
    mode: Mode,

    /// Seconds to run. 0 runs until interrupted.
    #[arg(short, long, default_value_t = 0)]
    duration: u64,

    /// Serial port. Found from the USB IDs when omitted.
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Measurement frequency in MHz.
    #[arg(long, default_value_t = DEFAULT_FREQUENCY_MHZ)]
    frequency: f64,

    /// Attenuator offset in dB, sent with the frequency at startup.
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    offset: f64,

    /// Log a warning for readings above this level in dBm.
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<f32>,

    #[command(flatten)]
    log: LogArgs,
}

fn printer_for(mode: Mode, threshold: Option<f32>) -> rfmon_core::Result<Box<dyn Printer>> {
    let printer: Box<dyn Printer> = match mode {
        Mode::Reading => Box::new(ReadingPrinter::new(io::stdout()).threshold(threshold)),
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
    init_logging(&cli.log, "pm8000", cli.mode != Mode::Plot)?;
    let cancel = interrupt_token();

    let port = discovery::resolve_port(cli.port.as_deref(), POWER_METER)
        .context("RF power meter not found")?;
    tracing::info!(port = %port, baud = cli.baud, "connecting");

    let builder = PowerMeterBuilder::new()
        .serial_port(&port)
        .baud_rate(cli.baud)
        .frequency_mhz(cli.frequency)
        .offset_db(cli.offset);
    let mut meter = tokio::select! {
        result = builder.build() => {
            result.with_context(|| format!("connecting to power meter on {port}"))?
        }
        _ = cancel.cancelled() => return Ok(()),
    };

    let mut printer = match printer_for(cli.mode, cli.threshold) {
        Ok(printer) => printer,
        Err(e) => {
            let _ = meter.close().await;
            return Err(e).context("opening the output");
        }
    };

    monitor(
        &mut meter,
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
        let cli = Cli::try_parse_from(["pm8000"]).unwrap();
        assert_eq!(cli.mode, Mode::Reading);
        assert_eq!(cli.duration, 0);
        assert_eq!(cli.baud, 9600);
        assert_eq!(cli.frequency, 868.0);
        assert_eq!(cli.offset, 0.0);
        assert_eq!(cli.threshold, None);
    }

    #[test]
    fn calibration_and_threshold() {
        let cli = Cli::try_parse_from([
            "pm8000",
            "--frequency",
            "433",
            "--offset",
            "-20",
            "--threshold",
            "-30.5",
            "-d",
            "600",
        ])
        .unwrap();
        assert_eq!(cli.frequency, 433.0);
        assert_eq!(cli.offset, -20.0);
        assert_eq!(cli.threshold, Some(-30.5));
        assert_eq!(cli.duration, 600);
    }

    #[test]
    fn unknown_mode_is_a_usage_error() {
        let err = Cli::try_parse_from(["pm8000", "-m", "peak"]).unwrap_err();
        assert!(err.use_stderr());
    }
}
