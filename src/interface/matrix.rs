//! Fixture matrix: runs every stored databag example against its schema
//!
//! Fixtures live next to the schemas:
//!
//! ```text
//! <root>/<interface>/v<N>/fixtures/<role>/<name>.json
//! ```
//!
//! Each fixture is `{"valid": <bool>, "data": <relation data>}`. A fixture
//! passes when the validation outcome equals `valid`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{ValidatorOptions, Violation};

use super::catalog::InterfaceCatalog;
use super::errors::{InterfaceError, InterfaceResult};
use super::role::InterfaceKey;

/// fixture name -> outcome
pub type FixtureResults = BTreeMap<String, FixtureOutcome>;
/// role -> fixtures
pub type ResultsPerRole = BTreeMap<String, FixtureResults>;
/// "vN" -> roles
pub type ResultsPerVersion = BTreeMap<String, ResultsPerRole>;
/// interface name -> versions
pub type ResultsPerInterface = BTreeMap<String, ResultsPerVersion>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixOptions {
    pub validator: ValidatorOptions,
    /// Decode JSON-encoded databag values before validating
    pub decode_databags: bool,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            validator: ValidatorOptions::default(),
            decode_databags: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Fixture {
    valid: bool,
    data: Value,
}

/// Result of one fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureOutcome {
    pub expected_valid: bool,
    pub valid: bool,
    pub passed: bool,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    /// Serialized as RFC 3339
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub interfaces: ResultsPerInterface,
}

impl MatrixReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// `interface/vN/role/fixture` for every failing fixture
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        for (name, versions) in &self.interfaces {
            for (version, roles) in versions {
                for (role, fixtures) in roles {
                    for (fixture, outcome) in fixtures {
                        if !outcome.passed {
                            failures.push(format!("{}/{}/{}/{}", name, version, role, fixture));
                        }
                    }
                }
            }
        }
        failures
    }
}

/// Directory holding the fixtures for `key` under `root`.
pub fn fixture_dir(root: &Path, key: &InterfaceKey) -> PathBuf {
    root.join(&key.name)
        .join(format!("v{}", key.version))
        .join("fixtures")
        .join(key.role.as_str())
}

/// Runs all fixtures under `root` for every schema in `catalog`.
///
/// Schemas without a fixture directory contribute nothing.
pub fn run_matrix(
    catalog: &InterfaceCatalog,
    root: &Path,
    options: MatrixOptions,
) -> InterfaceResult<MatrixReport> {
    let mut report = MatrixReport {
        generated_at: Utc::now(),
        total: 0,
        passed: 0,
        failed: 0,
        interfaces: BTreeMap::new(),
    };

    for key in catalog.keys() {
        let dir = fixture_dir(root, key);
        if !dir.is_dir() {
            continue;
        }

        let mut results = FixtureResults::new();
        for path in fixture_files(&dir)? {
            let fixture = read_fixture(&path)?;
            let report_for_fixture = if options.decode_databags {
                catalog.validate_databag(key, &fixture.data, options.validator)?
            } else {
                catalog.validate(key, &fixture.data, options.validator)?
            };

            let valid = report_for_fixture.is_valid();
            let outcome = FixtureOutcome {
                expected_valid: fixture.valid,
                valid,
                passed: valid == fixture.valid,
                violations: report_for_fixture.into_iter().collect(),
            };

            report.total += 1;
            if outcome.passed {
                report.passed += 1;
            } else {
                report.failed += 1;
            }

            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            results.insert(name, outcome);
        }

        report
            .interfaces
            .entry(key.name.clone())
            .or_default()
            .entry(format!("v{}", key.version))
            .or_default()
            .insert(key.role.to_string(), results);
    }

    Ok(report)
}

/// `*.json` files in `dir`, sorted by path.
fn fixture_files(dir: &Path) -> InterfaceResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_fixture(path: &Path) -> InterfaceResult<Fixture> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| InterfaceError::InvalidFixture(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::role::Role;
    use crate::schema::load_schema;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_fixture(root: &Path, key: &InterfaceKey, name: &str, fixture: &Value) {
        let dir = fixture_dir(root, key);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.json", name)), fixture.to_string()).unwrap();
    }

    fn index_catalog() -> (InterfaceCatalog, InterfaceKey) {
        let key = InterfaceKey::new("opensearch_client", 0, Role::Requirer);
        let mut catalog = InterfaceCatalog::default();
        let schema = json!({
            "type": "object",
            "required": ["index"],
            "properties": {"index": {"type": "string"}}
        });
        catalog.register(key.clone(), load_schema(&schema).unwrap()).unwrap();
        (catalog, key)
    }

    #[test]
    fn test_matrix_counts_pass_and_fail() {
        let tmp = TempDir::new().unwrap();
        let (catalog, key) = index_catalog();

        write_fixture(tmp.path(), &key, "ok", &json!({"valid": true, "data": {"index": "logs"}}));
        write_fixture(tmp.path(), &key, "missing", &json!({"valid": false, "data": {}}));
        // Wrong expectation: data is valid but the fixture says otherwise
        let mislabelled = json!({"valid": false, "data": {"index": "x"}});
        write_fixture(tmp.path(), &key, "mislabelled", &mislabelled);

        let report = run_matrix(&catalog, tmp.path(), MatrixOptions::default()).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
        assert_eq!(report.failures(), vec!["opensearch_client/v0/requirer/mislabelled"]);

        let fixtures = &report.interfaces["opensearch_client"]["v0"]["requirer"];
        assert!(fixtures["ok"].passed);
        assert_eq!(fixtures["missing"].violations.len(), 1);
    }

    #[test]
    fn test_schemas_without_fixtures_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let (catalog, _) = index_catalog();

        let report = run_matrix(&catalog, tmp.path(), MatrixOptions::default()).unwrap();
        assert_eq!(report.total, 0);
        assert!(report.interfaces.is_empty());
        assert!(report.all_passed());
    }

    #[test]
    fn test_invalid_fixture_is_error() {
        let tmp = TempDir::new().unwrap();
        let (catalog, key) = index_catalog();
        write_fixture(tmp.path(), &key, "broken", &json!({"data": {}}));

        let err = run_matrix(&catalog, tmp.path(), MatrixOptions::default()).unwrap_err();
        assert_eq!(err.code(), "REL_INVALID_FIXTURE");
    }

    #[test]
    fn test_report_serializes() {
        let tmp = TempDir::new().unwrap();
        let (catalog, key) = index_catalog();
        write_fixture(tmp.path(), &key, "ok", &json!({"valid": true, "data": {"index": "logs"}}));

        let report = run_matrix(&catalog, tmp.path(), MatrixOptions::default()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total"], 1);
        let fixtures = &value["interfaces"]["opensearch_client"]["v0"]["requirer"];
        assert_eq!(fixtures["ok"]["passed"], true);
        assert!(value["generated_at"].as_str().unwrap().contains('T'));
    }
}
