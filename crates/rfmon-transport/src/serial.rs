//! Serial port transport.
//!
//! Both instruments are USB virtual COM ports running 8 data bits, no
//! parity, one stop bit and no flow control; only the baud rate differs
//! (500000 for the RF Explorer, 9600 for the PM8000).
//!
//! The drivers poll with a zero timeout while streaming, so a read that
//! finds nothing buffered is [`Error::Timeout`]. A read that completes with
//! zero bytes is end of file: the device was unplugged and the read is
//! reported as [`Error::ConnectionLost`].
//!
//! ```no_run
//! use rfmon_transport::SerialTransport;
//! use rfmon_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> rfmon_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 500_000).await?;
//! transport.send(b"#\x04C0").await?;
//!
//! let mut buf = [0u8; 256];
//! let _ = transport.receive(&mut buf, Duration::ZERO).await;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use rfmon_core::error::{Error, Result};
use rfmon_core::transport::Transport;

/// An open instrument port.
pub struct SerialTransport {
    /// `None` once closed.
    stream: Option<SerialStream>,
    path: String,
    baud_rate: u32,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`, 8N1 without flow control.
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let stream = tokio_serial::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|e| Error::Transport(format!("cannot open {path}: {e}")))?;

        tracing::info!(port = %path, baud_rate, "serial port open");
        Ok(SerialTransport {
            stream: Some(stream),
            path: path.to_string(),
            baud_rate,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

/// Turn the outcome of one timed read into the transport result.
///
/// `read` is `None` when the timeout expired first.
fn read_result(requested: usize, read: Option<io::Result<usize>>) -> Result<usize> {
    match read {
        None => Err(Error::Timeout),
        Some(Ok(0)) if requested > 0 => Err(Error::ConnectionLost),
        Some(Ok(n)) => Ok(n),
        Some(Err(e)) => Err(io_error(e)),
    }
}

fn io_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected
        | io::ErrorKind::UnexpectedEof => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;
        tracing::trace!(port = %self.path, data = ?data, "send");
        stream.write_all(data).await.map_err(io_error)?;
        stream.flush().await.map_err(io_error)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        // A zero timeout still polls the read once, so bytes the OS has
        // already buffered are returned.
        let read = tokio::time::timeout(timeout, stream.read(buf)).await.ok();
        let result = read_result(buf.len(), read);
        match &result {
            Ok(n) => tracing::trace!(port = %self.path, bytes = n, "receive"),
            Err(Error::Timeout) => {}
            Err(e) => tracing::error!(port = %self.path, error = %e, "serial read failed"),
        }
        result
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush().await {
                tracing::debug!(port = %self.path, error = %e, "flush on close failed");
            }
            tracing::info!(port = %self.path, "serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.stream.is_some() {
            tracing::debug!(port = %self.path, "serial port dropped while open");
        }
    }
}
