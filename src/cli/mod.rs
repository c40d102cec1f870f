//! CLI module for relschema
//!
//! Provides command-line interface for:
//! - validate: Check a document against a schema file
//! - defaults: Fill schema defaults into a valid document
//! - check: Validate relation data against an interface schema
//! - list: Show catalog entries
//! - matrix: Run stored fixtures against their schemas

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check, defaults, list, matrix, run, run_command, validate, CommandOutput, Config,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_candidate, write_error, write_response};
