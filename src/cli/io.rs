//! JSON I/O handling for CLI
//!
//! - Input: one JSON document from a file or stdin
//! - Output: single JSON object per command on stdout
//! - UTF-8 only

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads the candidate document from `input`, or stdin when `None`.
pub fn read_candidate(input: Option<&Path>) -> CliResult<Value> {
    let (content, source) = match input {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| {
                CliError::io_error(format!("Failed to read {}: {}", path.display(), e))
            })?;
            (content, path.display().to_string())
        }
        None => {
            let mut content = String::new();
            io::stdin().lock().read_to_string(&mut content)?;
            (content, "stdin".to_string())
        }
    };
    parse_candidate(&content, &source)
}

fn parse_candidate(content: &str, source: &str) -> CliResult<Value> {
    if content.trim().is_empty() {
        return Err(CliError::invalid_candidate(format!("Empty input from {}", source)));
    }
    serde_json::from_str(content)
        .map_err(|e| CliError::invalid_candidate(format!("Invalid JSON in {}: {}", source, e)))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(&response)
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
