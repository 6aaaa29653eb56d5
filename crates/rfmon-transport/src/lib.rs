//! Transport implementations for rfmon.
//!
//! - [`SerialTransport`]: USB virtual COM ports, implementing the
//!   [`Transport`](rfmon_core::Transport) trait from `rfmon-core`
//! - [`discovery`]: locate an instrument's serial port from its USB IDs
//!
//! # Example
//!
//! ```no_run
//! use rfmon_transport::{discovery, SerialTransport};
//!
//! # async fn example() -> rfmon_core::Result<()> {
//! let port = discovery::resolve_port(None, discovery::POWER_METER)?;
//! let transport = SerialTransport::open(&port, 9600).await?;
//! # Ok(())
//! # }
//! ```

pub mod discovery;
pub mod serial;

pub use discovery::{UsbId, POWER_METER, RF_EXPLORER};
pub use serial::SerialTransport;
