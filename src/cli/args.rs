//! CLI argument definitions using clap
//!
//! Commands:
//! - recipe-catalog serve --config <path> [--port <n>]
//! - recipe-catalog explain --config <path>
//! - recipe-catalog import --config <path> --file <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recipe catalog backend
#[derive(Parser, Debug)]
#[command(name = "recipe-catalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./recipe-catalog.json")]
        config: PathBuf,

        /// Port override (takes precedence over file and environment)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Read one JSON filter object from stdin and print its compiled plan
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./recipe-catalog.json")]
        config: PathBuf,
    },

    /// Upsert a JSON array of recipes into the configured store
    Import {
        /// Path to configuration file
        #[arg(long, default_value = "./recipe-catalog.json")]
        config: PathBuf,

        /// JSON file holding an array of recipes
        #[arg(long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
