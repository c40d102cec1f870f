//! CLI command implementations
//!
//! Each command loads the config, does its work, and returns the `data`
//! payload of the response. `run` writes the single response line and
//! turns the outcome into the exit status.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::interface::{builtin_catalog, run_matrix, InterfaceCatalog, InterfaceKey, MatrixOptions};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::{load_schema_file, SchemaDocument, ValidationReport, ValidatorOptions};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_candidate, write_error, write_response};

/// Configuration file structure
///
/// Every field is optional; a missing file means all defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the `<interface>/v<N>/...` tree
    #[serde(default = "default_interfaces_dir")]
    pub interfaces_dir: String,

    /// Reject unknown properties where a schema doesn't say
    #[serde(default)]
    pub strict_additional_properties: bool,

    /// Decode JSON-encoded databag values (`check`, `matrix`)
    #[serde(default = "default_decode_databags")]
    pub decode_databags: bool,

    /// trace | info | warn | error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_interfaces_dir() -> String {
    "interfaces".to_string()
}
fn default_decode_databags() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interfaces_dir: default_interfaces_dir(),
            strict_additional_properties: false,
            decode_databags: default_decode_databags(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults when the file is absent
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.interfaces_dir.trim().is_empty() {
            return Err(CliError::config_error("interfaces_dir must not be empty"));
        }

        self.log_level
            .parse::<Severity>()
            .map_err(CliError::config_error)?;

        Ok(())
    }

    pub fn interfaces_path(&self) -> PathBuf {
        PathBuf::from(&self.interfaces_dir)
    }

    /// Falls back to INFO for a level that never went through `validate`.
    pub fn log_severity(&self) -> Severity {
        self.log_level.parse().unwrap_or(Severity::Info)
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            strict_additional_properties: self.strict_additional_properties,
        }
    }

    pub fn matrix_options(&self) -> MatrixOptions {
        MatrixOptions {
            validator: self.validator_options(),
            decode_databags: self.decode_databags,
        }
    }
}

/// Result of a command: the response payload and whether it succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub data: Value,
    /// False for an invalid candidate or a failing fixture matrix
    pub passed: bool,
}

impl CommandOutput {
    fn ok(data: Value) -> Self {
        Self { data, passed: true }
    }
}

/// Main CLI entry point
///
/// Parses arguments, runs the command and writes exactly one response
/// line. Returns `Ok(false)` when the command ran but reported a failure.
pub fn run() -> CliResult<bool> {
    let cli = super::args::Cli::parse_args();
    match run_command(cli.command, &cli.config) {
        Ok(output) => {
            write_response(output.data)?;
            Ok(output.passed)
        }
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config_path: &Path) -> CliResult<CommandOutput> {
    let config = Config::load(config_path)?;
    Logger::set_level(config.log_severity());
    let config_source = config_path.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("config", config_source.as_str()),
            ("interfaces_dir", config.interfaces_dir.as_str()),
        ],
    );

    match cmd {
        Command::Validate { schema, input } => validate(&config, &schema, input.as_deref()),
        Command::Defaults { schema, input } => defaults(&config, &schema, input.as_deref()),
        Command::Check {
            interface,
            version,
            role,
            input,
            builtin,
        } => check(
            &config,
            InterfaceKey::new(interface, version, role),
            input.as_deref(),
            builtin,
        ),
        Command::List { builtin } => list(&config, builtin),
        Command::Matrix => matrix(&config),
    }
}

/// Validate a document against a schema file
pub fn validate(
    config: &Config,
    schema_path: &Path,
    input: Option<&Path>,
) -> CliResult<CommandOutput> {
    let document = load_document(schema_path)?;
    let candidate = read_candidate(input)?;

    let report = document.validate_with(&candidate, config.validator_options());
    log_report(&schema_path.display().to_string(), &report);

    Ok(CommandOutput {
        passed: report.is_valid(),
        data: report_json(&report)?,
    })
}

/// Print the candidate with defaults applied. The candidate must be valid.
pub fn defaults(
    config: &Config,
    schema_path: &Path,
    input: Option<&Path>,
) -> CliResult<CommandOutput> {
    let document = load_document(schema_path)?;
    let candidate = read_candidate(input)?;

    let report = document.validate_with(&candidate, config.validator_options());
    log_report(&schema_path.display().to_string(), &report);
    if let Some(first) = report.violations().first() {
        return Err(CliError::candidate_rejected(format!(
            "Candidate has {} violation(s); first: {}",
            report.len(),
            first
        )));
    }

    Ok(CommandOutput::ok(document.apply_defaults(&candidate)))
}

/// Validate relation data against one catalog entry
pub fn check(
    config: &Config,
    key: InterfaceKey,
    input: Option<&Path>,
    builtin: bool,
) -> CliResult<CommandOutput> {
    let catalog = open_catalog(config, builtin)?;
    let candidate = read_candidate(input)?;

    let options = config.validator_options();
    let report = if config.decode_databags {
        catalog.validate_databag(&key, &candidate, options)?
    } else {
        catalog.validate(&key, &candidate, options)?
    };
    log_report(&key.to_string(), &report);

    let mut data = report_json(&report)?;
    data["interface"] = json!(key);
    Ok(CommandOutput {
        passed: report.is_valid(),
        data,
    })
}

/// List catalog keys
pub fn list(config: &Config, builtin: bool) -> CliResult<CommandOutput> {
    let catalog = open_catalog(config, builtin)?;
    let interfaces: Vec<Value> = catalog
        .keys()
        .map(|key| {
            json!({
                "key": key,
                "name": key.name,
                "version": key.version,
                "role": key.role,
            })
        })
        .collect();

    Ok(CommandOutput::ok(json!({
        "count": interfaces.len(),
        "interfaces": interfaces,
    })))
}

/// Run the fixture matrix over the interfaces directory
pub fn matrix(config: &Config) -> CliResult<CommandOutput> {
    let catalog = open_catalog(config, false)?;

    let schemas = catalog.len().to_string();
    log_event_with_fields(Event::MatrixBegin, &[("schemas", schemas.as_str())]);
    let report = run_matrix(&catalog, catalog.root(), config.matrix_options())?;

    let (failed, passed, total) = (
        report.failed.to_string(),
        report.passed.to_string(),
        report.total.to_string(),
    );
    log_event_with_fields(
        Event::MatrixComplete,
        &[
            ("failed", failed.as_str()),
            ("passed", passed.as_str()),
            ("total", total.as_str()),
        ],
    );

    Ok(CommandOutput {
        passed: report.all_passed(),
        data: serde_json::to_value(&report)?,
    })
}

fn load_document(schema_path: &Path) -> CliResult<SchemaDocument> {
    let source = schema_path.display().to_string();
    match load_schema_file(schema_path) {
        Ok(document) => {
            let definitions = document.definitions.len().to_string();
            log_event_with_fields(
                Event::SchemaLoaded,
                &[("definitions", definitions.as_str()), ("schema", source.as_str())],
            );
            Ok(document)
        }
        Err(e) => {
            log_event_with_fields(
                Event::SchemaRejected,
                &[("code", e.code().code()), ("schema", source.as_str())],
            );
            Err(e.into())
        }
    }
}

fn open_catalog(config: &Config, builtin: bool) -> CliResult<InterfaceCatalog> {
    let (catalog, source) = if builtin {
        (builtin_catalog()?, "builtin".to_string())
    } else {
        let mut catalog = InterfaceCatalog::new(&config.interfaces_path());
        catalog.load_all()?;
        (catalog, config.interfaces_dir.clone())
    };

    let schemas = catalog.len().to_string();
    log_event_with_fields(
        Event::CatalogLoaded,
        &[("schemas", schemas.as_str()), ("source", source.as_str())],
    );
    Ok(catalog)
}

fn log_report(schema: &str, report: &ValidationReport) {
    if report.is_valid() {
        log_event_with_fields(Event::ValidationPassed, &[("schema", schema)]);
    } else {
        let violations = report.len().to_string();
        log_event_with_fields(
            Event::ValidationFailed,
            &[("schema", schema), ("violations", violations.as_str())],
        );
    }
}

fn report_json(report: &ValidationReport) -> CliResult<Value> {
    Ok(json!({
        "valid": report.is_valid(),
        "violations": serde_json::to_value(report.violations())?,
    }))
}
