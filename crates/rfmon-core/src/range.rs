//! Frequency window normalization.
//!
//! Analyzers advertise the band they can tune ([`FrequencyLimits`]).
//! [`normalize`] fits a requested center/span into that band, sliding the
//! window rather than shrinking it wherever possible, and returns the
//! [`FrequencyRange`] that should be pushed to the device.
//!
//! # Example
//!
//! ```
//! use rfmon_core::range::{normalize, FrequencyLimits};
//!
//! let limits = FrequencyLimits::new(863.0, 870.0, 7.0).unwrap();
//!
//! // Window below the band is slid up until it starts at the band edge.
//! let range = normalize(860.0, 4.0, &limits);
//! assert_eq!(range.start_mhz, 863.0);
//! assert_eq!(range.stop_mhz, 867.0);
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// Center frequency used when neither a center nor a usable from/to pair
/// is requested.
pub const DEFAULT_CENTER_MHZ: f64 = 866.5;

/// Span used when none is requested.
pub const DEFAULT_SPAN_MHZ: f64 = 7.0;

/// Hardware tuning limits advertised by a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyLimits {
    /// Lowest tunable frequency in MHz.
    pub min_freq_mhz: f64,
    /// Highest tunable frequency in MHz.
    pub max_freq_mhz: f64,
    /// Widest span the device can sweep in MHz.
    pub max_span_mhz: f64,
}

impl FrequencyLimits {
    /// Validate and build a set of limits.
    ///
    /// Fails if any value is not finite, if `min > max`, or if the maximum
    /// span is not positive.
    pub fn new(min_freq_mhz: f64, max_freq_mhz: f64, max_span_mhz: f64) -> Result<Self> {
        if !(min_freq_mhz.is_finite() && max_freq_mhz.is_finite() && max_span_mhz.is_finite()) {
            return Err(Error::InvalidParameter(
                "frequency limits must be finite".into(),
            ));
        }
        if min_freq_mhz > max_freq_mhz {
            return Err(Error::InvalidParameter(format!(
                "minimum frequency {min_freq_mhz} MHz above maximum {max_freq_mhz} MHz"
            )));
        }
        if max_span_mhz <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "maximum span must be positive, got {max_span_mhz} MHz"
            )));
        }
        Ok(FrequencyLimits {
            min_freq_mhz,
            max_freq_mhz,
            max_span_mhz,
        })
    }
}

/// A frequency window that fits inside a device's [`FrequencyLimits`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyRange {
    pub center_mhz: f64,
    pub span_mhz: f64,
    pub start_mhz: f64,
    pub stop_mhz: f64,
}

impl fmt::Display for FrequencyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "center {:.3} MHz, start {:.3} MHz, stop {:.3} MHz, span {:.3} MHz",
            self.center_mhz, self.start_mhz, self.stop_mhz, self.span_mhz
        )
    }
}

/// Fit a requested center/span into the device limits.
///
/// - A span wider than the device maximum is reduced to that maximum.
/// - A window starting below the band is slid up to start at the band edge.
/// - A window ending above the band is slid down to end at the band edge,
///   unless it was already slid up, in which case its top is cut off and
///   the span shrinks to what remains.
///
/// A request that already fits is returned unchanged. Clamping never
/// fails; callers report the resulting range.
pub fn normalize(center_mhz: f64, span_mhz: f64, limits: &FrequencyLimits) -> FrequencyRange {
    let min = limits.min_freq_mhz;
    let max = limits.max_freq_mhz;

    let mut corrected = false;
    let mut span = span_mhz.max(0.0);
    if span > limits.max_span_mhz {
        span = limits.max_span_mhz;
        corrected = true;
    }

    let mut start = center_mhz - span / 2.0;
    let mut stop = center_mhz + span / 2.0;

    let mut low_corrected = false;
    if start < min {
        stop += min - start;
        start = min;
        low_corrected = true;
        corrected = true;
    }
    if stop > max {
        if !low_corrected {
            start -= stop - max;
        }
        stop = max;
        span = stop - start;
        corrected = true;
    }

    if !corrected {
        return FrequencyRange {
            center_mhz,
            span_mhz: span,
            start_mhz: start,
            stop_mhz: stop,
        };
    }

    // Guard the invariants against rounding and windows wider than the band.
    let start = start.max(min).min(max);
    let stop = stop.min(max).max(start);
    let span = (stop - start).min(span.max(0.0)).min(limits.max_span_mhz);

    FrequencyRange {
        center_mhz: start + span / 2.0,
        span_mhz: span,
        start_mhz: start,
        stop_mhz: stop,
    }
}

/// A window request as given on the command line.
///
/// Either an explicit center (with a span), or a from/to pair. Missing
/// values fall back to the 866.5 MHz / 7 MHz default window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRequest {
    pub center_mhz: Option<f64>,
    pub span_mhz: f64,
    pub from_mhz: Option<f64>,
    pub to_mhz: Option<f64>,
}

impl Default for RangeRequest {
    fn default() -> Self {
        RangeRequest {
            center_mhz: None,
            span_mhz: DEFAULT_SPAN_MHZ,
            from_mhz: None,
            to_mhz: None,
        }
    }
}

impl RangeRequest {
    /// Resolve the request to a `(center, span)` pair in MHz.
    ///
    /// An explicit center always wins. Otherwise a from/to pair with
    /// `to > from` gives center and span directly; an inverted or empty
    /// pair falls back to the default center with the requested span.
    pub fn resolve(&self) -> (f64, f64) {
        if let Some(center) = self.center_mhz {
            return (center, self.span_mhz);
        }
        let from = self
            .from_mhz
            .unwrap_or(DEFAULT_CENTER_MHZ - DEFAULT_SPAN_MHZ / 2.0);
        let to = self
            .to_mhz
            .unwrap_or(DEFAULT_CENTER_MHZ + DEFAULT_SPAN_MHZ / 2.0);
        if to > from {
            ((from + to) / 2.0, to - from)
        } else {
            (DEFAULT_CENTER_MHZ, self.span_mhz)
        }
    }
}
