use std::io::Write;

use rfmon_core::{Printer, Result, Sweep, SweepAxis};

/// Prints every step of every sweep, one CSV column per frequency.
pub struct SwipePrinter<W: Write> {
    out: W,
}

impl<W: Write> SwipePrinter<W> {
    pub fn new(out: W) -> Self {
        SwipePrinter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Printer for SwipePrinter<W> {
    fn header(&mut self, axis: &SweepAxis) -> Result<()> {
        let mut line = String::from("timestamp");
        for freq in axis.frequencies() {
            line.push_str(&format!(",{freq:.2}"));
        }
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    fn row(&mut self, timestamp_ms: u64, sweep: &Sweep) -> Result<()> {
        let mut line = format!("{timestamp_ms:06}");
        for dbm in sweep.amplitudes() {
            line.push_str(&format!(",{dbm:.1}"));
        }
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}
