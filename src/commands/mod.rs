//! Command-line entry point and orchestration.

mod report;

pub use report::{ReportArgs, process_report};

use crate::Error;
use clap::Parser;
use clap::error::ErrorKind;
use log::LevelFilter;
use std::ffi::OsString;
use std::io::Write;

/// Exit code for malformed arguments and invalid configuration.
const EXIT_INPUT_ERROR: i32 = 2;

/// Exit code for failures while querying or writing reports.
const EXIT_RUNTIME_ERROR: i32 = 1;

/// Abstraction over the process environment so the command can be driven from tests.
pub trait Host {
    fn output(&mut self) -> impl Write;
    fn error(&mut self) -> impl Write;
    fn exit(&mut self, code: i32);
}

/// Parse `args` (including the program name) and run the report command.
pub async fn run<H, I, T>(host: &mut H, args: I)
where
    H: Host,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = match ReportArgs::try_parse_from(args) {
        Ok(args) => args,
        Err(e) => {
            let _ = write!(host.error(), "{}", e.render());
            let code = if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                0
            } else {
                EXIT_INPUT_ERROR
            };
            host.exit(code);
            return;
        }
    };

    init_logging(args.verbose);

    if let Err(e) = process_report(host, &args).await {
        let _ = writeln!(host.error(), "error: {e:#}");
        host.exit(exit_code_for(&e));
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // A logger may already be installed when running more than once in a process.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .try_init();
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    let is_input = error
        .chain()
        .any(|cause| cause.downcast_ref::<Error>().is_some_and(Error::is_input));

    if is_input { EXIT_INPUT_ERROR } else { EXIT_RUNTIME_ERROR }
}
