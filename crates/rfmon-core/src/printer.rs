//! Output sink for completed sweeps.

use crate::error::Result;
use crate::sweep::{Sweep, SweepAxis};

/// Receives sweeps from the poll loop and renders them.
///
/// `header` is called once before polling starts, `row` once for every new
/// sweep, and `finish` once when polling ends for any reason. All calls are
/// synchronous and are expected to return quickly.
pub trait Printer {
    /// Emit whatever precedes the first row (column names, chart setup).
    fn header(&mut self, axis: &SweepAxis) -> Result<()>;

    /// Render one sweep. `timestamp_ms` is the time since the session
    /// started.
    fn row(&mut self, timestamp_ms: u64, sweep: &Sweep) -> Result<()>;

    /// Release any output resources. Called on every exit path.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<P: Printer + ?Sized> Printer for Box<P> {
    fn header(&mut self, axis: &SweepAxis) -> Result<()> {
        (**self).header(axis)
    }

    fn row(&mut self, timestamp_ms: u64, sweep: &Sweep) -> Result<()> {
        (**self).row(timestamp_ms, sweep)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
