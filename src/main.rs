//! recipe-catalog entry point
//!
//! Installs the tracing subscriber, then delegates everything else to the
//! CLI module. Errors go to stderr with a non-zero exit.

use recipe_catalog::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
