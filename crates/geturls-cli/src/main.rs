use geturls_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Log to the state-dir file; fall back to stderr so the CLI still runs.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = Cli::run_from_args() {
        eprintln!("geturls error: {:#}", err);
        std::process::exit(1);
    }
}
