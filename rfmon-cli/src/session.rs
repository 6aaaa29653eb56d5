//! Running one monitoring session: header, poll loop, cleanup.

use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use rfmon_core::{poll, Error, PollContext, PollOutcome, Printer, StopReason, SweepSource};

/// Token that fires on Ctrl-C.
///
/// Must be called from inside the runtime. Spawn it before connecting so an
/// interrupt during setup is not lost.
pub fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupted");
                token.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });
    cancel
}

/// Print the header, poll `source` into `printer`, then finish the printer
/// and close the source.
///
/// Cleanup runs on every exit path. When the poll loop itself failed, that
/// error is the one returned.
pub async fn monitor<S, P>(
    source: &mut S,
    printer: &mut P,
    duration: Duration,
    cancel: &CancellationToken,
) -> anyhow::Result<PollOutcome>
where
    S: SweepSource + ?Sized,
    P: Printer + ?Sized,
{
    let result = run(source, printer, duration, cancel).await;
    let finished = printer.finish();
    let closed = source.close().await;

    let outcome = result.context("monitoring failed")?;
    finished.context("failed to finish output")?;
    closed.context("failed to close the instrument")?;

    match outcome.reason {
        StopReason::Elapsed => tracing::info!(rows = outcome.rows, "session complete"),
        StopReason::Cancelled => tracing::info!(rows = outcome.rows, "session stopped"),
    }
    Ok(outcome)
}

async fn run<S, P>(
    source: &mut S,
    printer: &mut P,
    duration: Duration,
    cancel: &CancellationToken,
) -> rfmon_core::Result<PollOutcome>
where
    S: SweepSource + ?Sized,
    P: Printer + ?Sized,
{
    let axis = source
        .axis()
        .ok_or_else(|| Error::Protocol("instrument reported no sweep axis".into()))?;
    printer.header(&axis)?;

    tracing::info!(
        start_mhz = axis.start_mhz,
        stop_mhz = axis.stop_mhz(),
        steps = axis.steps,
        duration_s = duration.as_secs_f64(),
        "monitoring"
    );
    let ctx = PollContext::new(duration);
    poll::run(source, printer, &ctx, cancel).await
}
