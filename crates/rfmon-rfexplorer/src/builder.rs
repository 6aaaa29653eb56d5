//! RfExplorerBuilder -- fluent builder for connecting to an [`RfExplorer`].
//!
//! Building performs the whole connection sequence: optional reset, then the
//! configuration handshake. A successfully built driver is always a
//! spectrum analyzer with a known configuration.
//!
//! # Example
//!
//! ```no_run
//! use rfmon_rfexplorer::RfExplorerBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> rfmon_core::Result<()> {
//! let analyzer = RfExplorerBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .reset(true)
//!     .response_timeout(Duration::from_secs(3))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use rfmon_core::error::{Error, Result};
use rfmon_core::transport::Transport;

use crate::device::{self, RfExplorer};
use crate::io::FrameReader;

/// Baud rate RF Explorer analyzers use over USB.
pub const DEFAULT_BAUD_RATE: u32 = 500_000;

/// Fluent builder for [`RfExplorer`].
pub struct RfExplorerBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    response_timeout: Duration,
    reset: bool,
    reset_settle: Duration,
}

impl RfExplorerBuilder {
    pub fn new() -> Self {
        RfExplorerBuilder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            response_timeout: Duration::from_secs(5),
            reset: false,
            reset_settle: Duration::from_secs(3),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate (500000).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// How long to wait for the analyzer to report or confirm its
    /// configuration (default: 5s).
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Reboot the analyzer before the handshake.
    pub fn reset(mut self, enabled: bool) -> Self {
        self.reset = enabled;
        self
    }

    /// How long to let the analyzer boot after a reset (default: 3s).
    pub fn reset_settle(mut self, settle: Duration) -> Self {
        self.reset_settle = settle;
        self
    }

    /// Connect over a caller-provided transport.
    ///
    /// This is the entry point for testing with a `MockTransport` from
    /// `rfmon-test-harness`.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<RfExplorer> {
        let mut reader = FrameReader::new(transport);
        if self.reset {
            device::reset(&mut reader, self.reset_settle).await?;
        }
        RfExplorer::connect(reader, self.response_timeout).await
    }

    /// Connect over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<RfExplorer> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = rfmon_transport::SerialTransport::open(port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for RfExplorerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
