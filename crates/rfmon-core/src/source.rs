//! Instrument driver traits.
//!
//! The poll loop only needs a [`SweepSource`]: something that can drain
//! pending input without blocking and report how many sweeps it has
//! completed. Tunable instruments additionally implement [`Analyzer`], which
//! exposes the device limits and accepts a new frequency window.

use async_trait::async_trait;

use crate::error::Result;
use crate::range::{normalize, FrequencyLimits, FrequencyRange};
use crate::sweep::{Sweep, SweepAxis};

/// A driver that accumulates complete sweeps from an instrument.
#[async_trait]
pub trait SweepSource: Send {
    /// Process whatever input the transport has buffered right now.
    ///
    /// Must not wait for data: if no bytes are available the call returns
    /// immediately. Partial frames stay buffered until a later call
    /// completes them.
    async fn process_received(&mut self) -> Result<()>;

    /// Number of complete sweeps decoded since the driver was created.
    ///
    /// Monotonically non-decreasing.
    fn sweep_count(&self) -> u64;

    /// The most recently completed sweep, if any.
    fn latest_sweep(&self) -> Option<&Sweep>;

    /// Frequency axis that upcoming sweeps will use, if known.
    fn axis(&self) -> Option<SweepAxis>;

    /// Release the underlying transport.
    async fn close(&mut self) -> Result<()>;
}

/// A tunable spectrum analyzer.
#[async_trait]
pub trait Analyzer: SweepSource {
    /// Tuning limits reported by the device.
    fn limits(&self) -> FrequencyLimits;

    /// Reconfigure the device to sweep `start_mhz..=stop_mhz`.
    async fn update_range(&mut self, start_mhz: f64, stop_mhz: f64) -> Result<()>;
}

/// Normalize the requested window against the analyzer's limits and push
/// the result to the device.
///
/// Returns the range actually applied, which differs from the request when
/// it had to be clamped.
pub async fn apply_range<A: Analyzer + ?Sized>(
    analyzer: &mut A,
    center_mhz: f64,
    span_mhz: f64,
) -> Result<FrequencyRange> {
    let limits = analyzer.limits();
    let range = normalize(center_mhz, span_mhz, &limits);

    if range.center_mhz != center_mhz || range.span_mhz != span_mhz {
        tracing::debug!(
            requested_center_mhz = center_mhz,
            requested_span_mhz = span_mhz,
            min_freq_mhz = limits.min_freq_mhz,
            max_freq_mhz = limits.max_freq_mhz,
            max_span_mhz = limits.max_span_mhz,
            "requested window clamped to device limits"
        );
    }

    analyzer.update_range(range.start_mhz, range.stop_mhz).await?;
    tracing::info!(
        center_mhz = range.center_mhz,
        start_mhz = range.start_mhz,
        stop_mhz = range.stop_mhz,
        span_mhz = range.span_mhz,
        "frequency range applied"
    );
    Ok(range)
}
