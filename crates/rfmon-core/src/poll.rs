//! The live polling loop.
//!
//! One task owns the driver and the printer. Each iteration drains whatever
//! the driver has buffered, and if the driver's sweep counter moved since
//! the last iteration the newest sweep is handed to the printer. There is
//! no blocking read anywhere in the loop: the driver's drain returns
//! immediately when no bytes are pending, and the loop only yields to the
//! runtime so that the cancellation watcher gets to run.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::printer::Printer;
use crate::source::SweepSource;

/// Session state shared by the loop and the rows it emits.
#[derive(Debug, Clone, Copy)]
pub struct PollContext {
    /// When the session started. Row timestamps are relative to this.
    pub started: Instant,
    /// How long to poll. [`Duration::ZERO`] polls until cancelled.
    pub duration: Duration,
}

impl PollContext {
    /// Start a session now.
    pub fn new(duration: Duration) -> Self {
        PollContext {
            started: Instant::now(),
            duration,
        }
    }

    /// Milliseconds elapsed since the session started.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Whether a bounded session has run its full duration.
    pub fn expired(&self) -> bool {
        !self.duration.is_zero() && self.started.elapsed() >= self.duration
    }
}

/// Why the poll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The session duration elapsed.
    Elapsed,
    /// The cancellation token fired.
    Cancelled,
}

/// Summary of a finished poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub reason: StopReason,
    /// Number of rows handed to the printer.
    pub rows: u64,
}

/// Poll `source` until the session expires or `cancel` fires, forwarding
/// each newly completed sweep to `printer`.
///
/// Only the newest sweep is forwarded when several complete between two
/// iterations. A driver error aborts the loop and is returned as-is; the
/// caller remains responsible for closing the driver and finishing the
/// printer.
pub async fn run<S, P>(
    source: &mut S,
    printer: &mut P,
    ctx: &PollContext,
    cancel: &CancellationToken,
) -> Result<PollOutcome>
where
    S: SweepSource + ?Sized,
    P: Printer + ?Sized,
{
    let mut last_seen = 0u64;
    let mut rows = 0u64;

    let reason = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }
        if ctx.expired() {
            break StopReason::Elapsed;
        }

        source.process_received().await?;

        let count = source.sweep_count();
        if count > last_seen {
            last_seen = count;
            if let Some(sweep) = source.latest_sweep() {
                printer.row(ctx.elapsed_ms(), sweep)?;
                rows += 1;
            }
        } else {
            tokio::task::yield_now().await;
        }
    };

    tracing::debug!(?reason, rows, "poll loop finished");
    Ok(PollOutcome { reason, rows })
}
