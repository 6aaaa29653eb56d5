use std::collections::VecDeque;
use std::io::{self, Stdout};

use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Chart, Dataset, GraphType};
use ratatui::{Frame, Terminal};

use rfmon_core::{Printer, Result, Sweep, SweepAxis};

use super::{DBM_MAX, DBM_MIN};

/// Number of one-step readings kept on screen.
pub const WINDOW_SAMPLES: usize = 120;

enum Trace {
    Empty,
    /// Multi-step sweeps: current trace, max-hold trace and the strongest
    /// point the max-hold has reached.
    Spectrum {
        axis: SweepAxis,
        current: Vec<(f64, f64)>,
        hold: Vec<(f64, f64)>,
        peak: Option<(f64, f64)>,
    },
    /// One-step readings: a sliding window of (seconds, dBm).
    Samples {
        freq_mhz: f64,
        points: VecDeque<(f64, f64)>,
    },
}

impl Trace {
    fn for_axis(axis: &SweepAxis) -> Self {
        if axis.steps > 1 {
            let floor: Vec<(f64, f64)> = axis.frequencies().map(|f| (f, DBM_MIN)).collect();
            Trace::Spectrum {
                axis: *axis,
                current: floor.clone(),
                hold: floor,
                peak: None,
            }
        } else {
            Trace::Samples {
                freq_mhz: axis.start_mhz,
                points: VecDeque::with_capacity(WINDOW_SAMPLES + 1),
            }
        }
    }

    fn update(&mut self, timestamp_ms: u64, sweep: &Sweep) {
        let resized = match self {
            Trace::Empty => true,
            Trace::Spectrum { current, .. } => current.len() != sweep.total_steps(),
            Trace::Samples { .. } => sweep.total_steps() > 1,
        };
        if resized {
            *self = Trace::for_axis(sweep.axis());
        }

        match self {
            Trace::Empty => {}
            Trace::Spectrum {
                current,
                hold,
                peak,
                ..
            } => {
                for (step, &dbm) in sweep.amplitudes().iter().enumerate() {
                    let point = (sweep.frequency_mhz(step), f64::from(dbm));
                    current[step] = point;
                    if point.1 > hold[step].1 {
                        hold[step] = point;
                        if point.1 > peak.map_or(DBM_MIN, |p| p.1) {
                            *peak = Some(point);
                        }
                    }
                }
            }
            Trace::Samples { points, .. } => {
                if let Some(dbm) = sweep.amplitude_dbm(0) {
                    points.push_back((timestamp_ms as f64 / 1000.0, f64::from(dbm)));
                    while points.len() > WINDOW_SAMPLES {
                        points.pop_front();
                    }
                }
            }
        }
    }
}

/// Text shown next to the strongest point: `<MHz>,<dBm>`.
pub fn peak_label(freq_mhz: f64, dbm: f64) -> String {
    format!("{freq_mhz:.2},{dbm:.1}")
}

/// Live terminal chart of the incoming sweeps.
pub struct PlotPrinter<B: Backend> {
    terminal: Terminal<B>,
    trace: Trace,
    alternate_screen: bool,
}

impl<B: Backend> PlotPrinter<B> {
    /// Draw on an already prepared terminal.
    pub fn new(terminal: Terminal<B>) -> Self {
        PlotPrinter {
            terminal,
            trace: Trace::Empty,
            alternate_screen: false,
        }
    }

    fn draw(&mut self) -> Result<()> {
        let Self {
            terminal, trace, ..
        } = self;
        terminal.draw(|frame| render(frame, trace))?;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.terminal.show_cursor()?;
        if self.alternate_screen {
            self.alternate_screen = false;
            execute!(io::stdout(), LeaveAlternateScreen)?;
        }
        Ok(())
    }
}

impl PlotPrinter<CrosstermBackend<Stdout>> {
    /// Take over the terminal on stdout using the alternate screen.
    ///
    /// Raw mode stays off so Ctrl-C still interrupts the session.
    pub fn on_stdout() -> Result<Self> {
        execute!(io::stdout(), EnterAlternateScreen)?;
        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                return Err(e.into());
            }
        };

        let mut printer = PlotPrinter {
            terminal,
            trace: Trace::Empty,
            alternate_screen: true,
        };
        printer.terminal.hide_cursor()?;
        printer.terminal.clear()?;
        Ok(printer)
    }
}

impl<B: Backend> Printer for PlotPrinter<B> {
    fn header(&mut self, axis: &SweepAxis) -> Result<()> {
        self.trace = Trace::for_axis(axis);
        self.draw()
    }

    fn row(&mut self, timestamp_ms: u64, sweep: &Sweep) -> Result<()> {
        self.trace.update(timestamp_ms, sweep);
        self.draw()
    }

    fn finish(&mut self) -> Result<()> {
        self.restore()?;
        Ok(())
    }
}

impl<B: Backend> Drop for PlotPrinter<B> {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = self.restore();
        }
    }
}

fn bounds(lo: f64, hi: f64) -> [f64; 2] {
    if hi > lo {
        [lo, hi]
    } else {
        [lo - 0.5, lo + 0.5]
    }
}

fn render(frame: &mut Frame<'_>, trace: &Trace) {
    let (title, x_title, x_bounds, current, hold, peak) = match trace {
        Trace::Empty => (
            "waiting for data".to_string(),
            "frequency (MHz)",
            [0.0, 1.0],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ),
        Trace::Spectrum {
            axis,
            current,
            hold,
            peak,
        } => {
            let title = match peak {
                Some((freq, dbm)) => format!("peak {}", peak_label(*freq, *dbm)),
                None => "no signal".to_string(),
            };
            (
                title,
                "frequency (MHz)",
                bounds(axis.start_mhz, axis.stop_mhz()),
                current.clone(),
                hold.clone(),
                peak.iter().copied().collect(),
            )
        }
        Trace::Samples { freq_mhz, points } => {
            let title = match points.back() {
                Some((_, dbm)) => format!("{freq_mhz:.2} MHz, last {dbm:.1} dBm"),
                None => format!("{freq_mhz:.2} MHz, waiting for data"),
            };
            let first = points.front().map_or(0.0, |p| p.0);
            let last = points.back().map_or(1.0, |p| p.0);
            (
                title,
                "time (s)",
                bounds(first, last),
                points.iter().copied().collect(),
                Vec::new(),
                Vec::new(),
            )
        }
    };

    let mut datasets = Vec::new();
    if !hold.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::DarkGray))
                .data(&hold),
        );
    }
    datasets.push(
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&current),
    );
    if !peak.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Yellow))
                .data(&peak),
        );
    }

    let x_mid = (x_bounds[0] + x_bounds[1]) / 2.0;
    let chart = Chart::new(datasets)
        .block(Block::bordered().title(title))
        .x_axis(
            Axis::default()
                .title(x_title)
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels([
                    format!("{:.2}", x_bounds[0]),
                    format!("{x_mid:.2}"),
                    format!("{:.2}", x_bounds[1]),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("amplitude (dBm)")
                .style(Style::default().fg(Color::Gray))
                .bounds([DBM_MIN, DBM_MAX])
                .labels(["-120", "-60", "0"]),
        );
    frame.render_widget(chart, frame.area());
}
