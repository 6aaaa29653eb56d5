//! Sweep records produced by instrument drivers.
//!
//! A [`Sweep`] is one complete set of amplitude readings, one per step of
//! its [`SweepAxis`]. Spectrum analyzers produce multi-step sweeps across
//! the configured frequency window; power meters produce one-step sweeps
//! at their calibration frequency.

/// Frequency axis of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepAxis {
    /// Frequency of the first step in MHz.
    pub start_mhz: f64,
    /// Distance between consecutive steps in MHz.
    pub step_mhz: f64,
    /// Number of steps.
    pub steps: usize,
}

impl SweepAxis {
    /// Axis with a single step at `freq_mhz`.
    pub fn single(freq_mhz: f64) -> Self {
        SweepAxis {
            start_mhz: freq_mhz,
            step_mhz: 0.0,
            steps: 1,
        }
    }

    /// Frequency of `step` in MHz.
    pub fn frequency_mhz(&self, step: usize) -> f64 {
        self.start_mhz + self.step_mhz * step as f64
    }

    /// Frequency of the last step in MHz.
    pub fn stop_mhz(&self) -> f64 {
        self.frequency_mhz(self.steps.saturating_sub(1))
    }

    /// Iterate over the frequency of every step.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.steps).map(|step| self.frequency_mhz(step))
    }
}

/// One complete sweep: an amplitude in dBm for every step of the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    axis: SweepAxis,
    amplitudes: Vec<f32>,
}

impl Sweep {
    /// Build a sweep from an axis and its amplitudes.
    ///
    /// The axis step count is taken from `amplitudes`, so the two can
    /// never disagree.
    pub fn new(axis: SweepAxis, amplitudes: Vec<f32>) -> Self {
        let axis = SweepAxis {
            steps: amplitudes.len(),
            ..axis
        };
        Sweep { axis, amplitudes }
    }

    /// A one-step sweep holding a single reading at `freq_mhz`.
    pub fn single(freq_mhz: f64, dbm: f32) -> Self {
        Sweep::new(SweepAxis::single(freq_mhz), vec![dbm])
    }

    pub fn axis(&self) -> &SweepAxis {
        &self.axis
    }

    pub fn total_steps(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitudes(&self) -> &[f32] {
        &self.amplitudes
    }

    /// Amplitude of `step` in dBm, if the step exists.
    pub fn amplitude_dbm(&self, step: usize) -> Option<f32> {
        self.amplitudes.get(step).copied()
    }

    /// Frequency of `step` in MHz.
    pub fn frequency_mhz(&self, step: usize) -> f64 {
        self.axis.frequency_mhz(step)
    }

    /// Index of the strongest step. The first step wins ties.
    ///
    /// Returns `None` for an empty sweep.
    pub fn peak_step(&self) -> Option<usize> {
        let mut peak: Option<(usize, f32)> = None;
        for (step, &dbm) in self.amplitudes.iter().enumerate() {
            match peak {
                Some((_, best)) if dbm <= best => {}
                _ => peak = Some((step, dbm)),
            }
        }
        peak.map(|(step, _)| step)
    }
}
