//! CLI module for the recipe catalog
//!
//! Provides command-line interface for:
//! - serve: Open the configured store and serve HTTP
//! - explain: Print the compiled plan for one filter read from stdin
//! - import: Upsert a JSON array of recipes

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{explain, explain_request, import, import_recipes, run_command, serve};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
