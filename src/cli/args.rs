// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
#[command(arg_required_else_help = true, disable_help_subcommand = true)]
pub struct Args {
    /// Path to TOML configuration file (optional)
    #[arg(long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute (generate, guid, or inspect)
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate an .apkg package from a JSON request
    Generate {
        /// JSON request with `files`, `decks` and `models`
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Where to write the package
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Generation time in seconds since the epoch (defaults to now)
        #[arg(long, value_name = "SECS")]
        timestamp: Option<f64>,
    },

    /// Print the guid derived from note field values
    Guid {
        /// Field values in model order
        #[arg(value_name = "FIELD", required = true)]
        fields: Vec<String>,
    },

    /// Summarize the contents of an .apkg package
    Inspect {
        /// Package to inspect
        #[arg(value_name = "PACKAGE")]
        package: PathBuf,

        /// Output summary as JSON
        #[arg(long)]
        json: bool,
    },
}
