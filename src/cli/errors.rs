//! CLI-specific error types
//!
//! Every CLI error ends the command with a non-zero exit.

use std::fmt;
use std::io;

use crate::interface::InterfaceError;
use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout, input files)
    IoError,
    /// Candidate input is not a JSON document
    InvalidCandidate,
    /// Candidate violates the schema where a valid one is needed
    CandidateRejected,
    /// Error raised by the schema or interface layer, code passed through
    Library(&'static str),
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "REL_CLI_CONFIG_ERROR",
            Self::IoError => "REL_CLI_IO_ERROR",
            Self::InvalidCandidate => "REL_CLI_INVALID_CANDIDATE",
            Self::CandidateRejected => "REL_CLI_CANDIDATE_REJECTED",
            Self::Library(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_candidate(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidCandidate, msg)
    }

    pub fn candidate_rejected(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::CandidateRejected, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        // Display carries severity and location
        Self::new(CliErrorCode::Library(e.code().code()), e.to_string())
    }
}

impl From<InterfaceError> for CliError {
    fn from(e: InterfaceError) -> Self {
        Self::new(CliErrorCode::Library(e.code()), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
