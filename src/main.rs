//! relschema CLI entry point
//!
//! All logic is delegated to the CLI module. The response line is already
//! on stdout when `run` returns; main only maps the outcome to an exit code.

use relschema::cli;

fn main() {
    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
