//! Output modes.
//!
//! Every mode is a [`Printer`](rfmon_core::Printer). The CSV printers write
//! to any [`std::io::Write`] and flush after every row so the stream can be
//! piped live; the plotter draws on a ratatui terminal.

mod peak;
mod plot;
mod reading;
mod swipe;

pub use peak::PeakPrinter;
pub use plot::PlotPrinter;
pub use reading::ReadingPrinter;
pub use swipe::SwipePrinter;

/// Bottom of the amplitude axis in dBm.
pub const DBM_MIN: f64 = -120.0;

/// Top of the amplitude axis in dBm.
pub const DBM_MAX: f64 = 0.0;
