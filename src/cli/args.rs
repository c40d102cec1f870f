//! CLI argument definitions using clap
//!
//! Commands:
//! - relschema validate --schema <file> [--input <file>]
//! - relschema defaults --schema <file> [--input <file>]
//! - relschema check --interface <name> --version <N> --role <role> [--input <file>] [--builtin]
//! - relschema list [--builtin]
//! - relschema matrix

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::interface::Role;

/// relschema - validate relation databags and config documents against JSON schemas
#[derive(Parser, Debug)]
#[command(name = "relschema")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (optional; defaults apply when missing)
    #[arg(long, global = true, default_value = "./relschema.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a JSON document against a schema file
    Validate {
        /// Schema file
        #[arg(long)]
        schema: PathBuf,

        /// Candidate document (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print a valid document with schema defaults filled in
    Defaults {
        #[arg(long)]
        schema: PathBuf,

        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Validate relation data against an interface schema
    Check {
        /// Interface name, e.g. `tracing`
        #[arg(long)]
        interface: String,

        /// Major version, e.g. `2`
        #[arg(long)]
        version: u32,

        /// `provider` or `requirer`
        #[arg(long)]
        role: Role,

        #[arg(long)]
        input: Option<PathBuf>,

        /// Use the bundled schemas instead of the interfaces directory
        #[arg(long)]
        builtin: bool,
    },

    /// List catalog entries
    List {
        #[arg(long)]
        builtin: bool,
    },

    /// Run every fixture under the interfaces directory
    Matrix,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
