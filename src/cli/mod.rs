//! CLI module for savecraft
//!
//! Thin layer over `PlayerEditor`: parse arguments, run one command, print
//! one JSON object. Mutating commands save before they report.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, IdAction, Target, DEFAULT_CONFIG_PATH};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
