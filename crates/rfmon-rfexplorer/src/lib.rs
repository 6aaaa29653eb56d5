//! rfmon-rfexplorer: RF Explorer spectrum analyzer driver for rfmon.
//!
//! Covers the part of the RF Explorer serial protocol the monitoring tools
//! need: configuration handshake, window updates, reset, and decoding of
//! the continuous sweep stream. The driver implements
//! [`SweepSource`](rfmon_core::SweepSource) and
//! [`Analyzer`](rfmon_core::Analyzer).
//!
//! # Example
//!
//! ```no_run
//! use rfmon_core::{apply_range, SweepSource};
//! use rfmon_rfexplorer::RfExplorerBuilder;
//!
//! # async fn example() -> rfmon_core::Result<()> {
//! let mut analyzer = RfExplorerBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//! let range = apply_range(&mut analyzer, 866.5, 7.0).await?;
//! println!("sweeping {range}");
//!
//! analyzer.process_received().await?;
//! if let Some(sweep) = analyzer.latest_sweep() {
//!     println!("{} steps", sweep.total_steps());
//! }
//! analyzer.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod device;
mod io;
pub mod protocol;

pub use builder::RfExplorerBuilder;
pub use device::RfExplorer;
pub use protocol::{AnalyzerConfig, ModelInfo};
