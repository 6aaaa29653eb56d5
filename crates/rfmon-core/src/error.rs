//! Error types for rfmon.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer and
//! discovery errors are all captured here.

/// The error type for all rfmon operations.
///
/// Variants cover the failure modes encountered when talking to RF test
/// instruments: serial transport failures, protocol decode errors,
/// timeouts, missing devices, and operations the attached instrument
/// cannot perform.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, USB virtual COM port).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (malformed configuration frame, bad command).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for the instrument.
    ///
    /// This typically indicates the instrument is powered off or the baud
    /// rate is wrong.
    #[error("timeout waiting for response")]
    Timeout,

    /// No USB device with the expected vendor/product IDs was found.
    #[error("no device found with vendor {vendor_id:#06x} product {product_id:#06x}")]
    DeviceNotFound {
        /// USB vendor ID that was searched for.
        vendor_id: u16,
        /// USB product ID that was searched for.
        product_id: u16,
    },

    /// The attached instrument cannot perform the requested operation
    /// (e.g. a signal generator where an analyzer was expected).
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to an instrument command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the instrument has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the instrument was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
