use std::io::Write;

use rfmon_core::{Printer, Result, Sweep, SweepAxis};

/// Prints one power reading per row: `timestamp,amplitude`.
///
/// For multi-step sweeps the strongest step is the reading. The maximum
/// seen is logged when the session ends.
pub struct ReadingPrinter<W: Write> {
    out: W,
    threshold_dbm: Option<f32>,
    max_dbm: Option<f32>,
    readings: u64,
}

impl<W: Write> ReadingPrinter<W> {
    pub fn new(out: W) -> Self {
        ReadingPrinter {
            out,
            threshold_dbm: None,
            max_dbm: None,
            readings: 0,
        }
    }

    /// Log a warning for every reading above `dbm`.
    pub fn threshold(mut self, dbm: Option<f32>) -> Self {
        self.threshold_dbm = dbm;
        self
    }

    /// Strongest reading so far.
    pub fn max_dbm(&self) -> Option<f32> {
        self.max_dbm
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Printer for ReadingPrinter<W> {
    fn header(&mut self, _axis: &SweepAxis) -> Result<()> {
        writeln!(self.out, "timestamp,amplitude")?;
        self.out.flush()?;
        Ok(())
    }

    fn row(&mut self, timestamp_ms: u64, sweep: &Sweep) -> Result<()> {
        let Some(dbm) = sweep.peak_step().and_then(|step| sweep.amplitude_dbm(step)) else {
            return Ok(());
        };

        self.readings += 1;
        if self.max_dbm.map_or(true, |max| dbm > max) {
            self.max_dbm = Some(dbm);
        }
        if let Some(threshold) = self.threshold_dbm {
            if dbm > threshold {
                tracing::warn!(timestamp_ms, dbm, threshold, "reading above threshold");
            }
        }

        // `{:?}` prints the shortest exact form and always keeps a decimal
        // point, so -42.0 stays "-42.0".
        writeln!(self.out, "{timestamp_ms:06},{dbm:?}")?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        match self.max_dbm {
            Some(max) => tracing::info!(max_dbm = max, readings = self.readings, "session maximum"),
            None => tracing::info!("no readings received"),
        }
        self.out.flush()?;
        Ok(())
    }
}
