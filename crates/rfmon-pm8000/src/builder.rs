//! PowerMeterBuilder -- fluent builder for connecting to a [`PowerMeter`].
//!
//! # Example
//!
//! ```no_run
//! use rfmon_pm8000::PowerMeterBuilder;
//!
//! # async fn example() -> rfmon_core::Result<()> {
//! let meter = PowerMeterBuilder::new()
//!     .serial_port("/dev/ttyUSB1")
//!     .frequency_mhz(433.0)
//!     .offset_db(-20.0)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use rfmon_core::error::{Error, Result};
use rfmon_core::transport::Transport;

use crate::device::PowerMeter;

/// Baud rate of the meter's CH340 bridge.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Frequency readings are attributed to when none is configured.
pub const DEFAULT_FREQUENCY_MHZ: f64 = 868.0;

/// Fluent builder for [`PowerMeter`].
///
/// The calibration command is only sent when an offset is set; otherwise
/// the meter keeps whatever calibration it already has and the frequency
/// only labels the readings.
pub struct PowerMeterBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    frequency_mhz: f64,
    offset_db: Option<f64>,
}

impl PowerMeterBuilder {
    pub fn new() -> Self {
        PowerMeterBuilder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            frequency_mhz: DEFAULT_FREQUENCY_MHZ,
            offset_db: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate (9600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the measurement frequency in MHz.
    pub fn frequency_mhz(mut self, freq: f64) -> Self {
        self.frequency_mhz = freq;
        self
    }

    /// Set the attenuator offset in dB and send the calibration on build.
    pub fn offset_db(mut self, offset: f64) -> Self {
        self.offset_db = Some(offset);
        self
    }

    /// Connect over a caller-provided transport.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<PowerMeter> {
        if !self.frequency_mhz.is_finite() || self.frequency_mhz < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "frequency {} MHz is not valid",
                self.frequency_mhz
            )));
        }

        let mut meter = PowerMeter::new(transport, self.frequency_mhz);
        if let Some(offset) = self.offset_db {
            meter.calibrate(self.frequency_mhz, offset).await?;
        }
        Ok(meter)
    }

    /// Connect over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<PowerMeter> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = rfmon_transport::SerialTransport::open(port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for PowerMeterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfmon_core::SweepSource;
    use rfmon_test_harness::MockTransport;

    #[test]
    fn builder_defaults() {
        let builder = PowerMeterBuilder::new();
        assert_eq!(builder.baud_rate, 9600);
        assert_eq!(builder.frequency_mhz, 868.0);
        assert!(builder.offset_db.is_none());
    }

    #[tokio::test]
    async fn no_offset_sends_nothing() {
        let meter = PowerMeterBuilder::new()
            .frequency_mhz(433.0)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();
        assert_eq!(meter.frequency_mhz(), 433.0);
        assert_eq!(meter.axis().unwrap().start_mhz, 433.0);
    }

    #[tokio::test]
    async fn offset_sends_calibration() {
        let mut mock = MockTransport::new();
        mock.expect(b"$0866+01.5#", b"");

        let meter = PowerMeterBuilder::new()
            .frequency_mhz(866.0)
            .offset_db(1.5)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();
        assert_eq!(meter.frequency_mhz(), 866.0);
    }

    #[tokio::test]
    async fn invalid_frequency_is_rejected() {
        let result = PowerMeterBuilder::new()
            .frequency_mhz(f64::NAN)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_without_port_is_rejected() {
        let result = PowerMeterBuilder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
