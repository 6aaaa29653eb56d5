//! rfmon-core: Core traits, types, and error definitions for rfmon.
//!
//! This crate defines the instrument-agnostic pieces shared by every rfmon
//! tool: the byte-level [`Transport`], the [`Sweep`] records drivers
//! produce, the frequency window normalizer ([`range::normalize`]), the
//! [`SweepSource`]/[`Analyzer`] driver traits, the [`Printer`] output sink,
//! and the [`poll`] loop that ties a driver to a printer.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`SweepSource`] / [`Analyzer`] -- instrument drivers
//! - [`Printer`] -- where completed sweeps go
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod poll;
pub mod printer;
pub mod range;
pub mod source;
pub mod sweep;
pub mod transport;

// Re-export key types at crate root for ergonomic `use rfmon_core::*`.
pub use error::{Error, Result};
pub use poll::{PollContext, PollOutcome, StopReason};
pub use printer::Printer;
pub use range::{FrequencyLimits, FrequencyRange, RangeRequest};
pub use source::{apply_range, Analyzer, SweepSource};
pub use sweep::{Sweep, SweepAxis};
pub use transport::Transport;
