//! rfmon-test-harness: Test utilities for rfmon.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! instrument drivers without requiring real hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
