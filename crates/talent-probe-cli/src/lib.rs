//! talent-probe CLI library
//!
//! Command-line front end for the talent-probe scenario suite.

#![warn(missing_docs)]

mod commands;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, DriverArg, RunArgs};
pub use error::{CliError, CliResult};
pub use output::Reporter;
pub use runner::{build_config, SuiteRunner};

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` wins over the flags.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
