//! rfmon-pm8000: PM8000 USB RF power meter driver for rfmon.
//!
//! The meter streams ASCII readings; [`PowerMeter`] turns each one into a
//! one-step [`Sweep`](rfmon_core::Sweep) so the same poll loop and printers
//! serve both analyzers and power meters.

pub mod builder;
pub mod device;
pub mod protocol;

pub use builder::PowerMeterBuilder;
pub use device::PowerMeter;
