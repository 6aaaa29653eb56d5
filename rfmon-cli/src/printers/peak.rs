use std::io::Write;

use rfmon_core::{Printer, Result, Sweep, SweepAxis};

/// Prints the strongest step of every sweep: `timestamp,frequency,amplitude`.
pub struct PeakPrinter<W: Write> {
    out: W,
}

impl<W: Write> PeakPrinter<W> {
    pub fn new(out: W) -> Self {
        PeakPrinter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Printer for PeakPrinter<W> {
    fn header(&mut self, _axis: &SweepAxis) -> Result<()> {
        writeln!(self.out, "timestamp,frequency,amplitude")?;
        self.out.flush()?;
        Ok(())
    }

    fn row(&mut self, timestamp_ms: u64, sweep: &Sweep) -> Result<()> {
        let Some(step) = sweep.peak_step() else {
            return Ok(());
        };
        let dbm = sweep.amplitude_dbm(step).unwrap_or_default();
        writeln!(
            self.out,
            "{:06},{:.2},{:.1}",
            timestamp_ms,
            sweep.frequency_mhz(step),
            dbm
        )?;
        self.out.flush()?;
        Ok(())
    }
}
