//! Shared plumbing for the `rfexplorer` and `pm8000` monitors.
//!
//! - [`logging`]: tracing subscriber setup and the common log flags
//! - [`printers`]: the output modes
//! - [`session`]: Ctrl-C handling and the monitor run itself

pub mod logging;
pub mod printers;
pub mod session;

use clap::Parser;

/// Parse the command line, exiting on failure.
///
/// Usage errors exit with status 1; `--help` and `--version` exit with 0.
pub fn parse_or_exit<C: Parser>() -> C {
    match C::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            std::process::exit(code);
        }
    }
}
