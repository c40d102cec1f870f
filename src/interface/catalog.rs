//! Interface catalog: loads relation interface schemas from disk
//!
//! Layout:
//!
//! ```text
//! <root>/<interface>/v<N>/schemas/provider.json
//! <root>/<interface>/v<N>/schemas/requirer.json
//! ```
//!
//! - Directories not named `v<N>` are skipped (docs, fixtures, ...)
//! - A missing role file means the interface publishes nothing on that side
//! - A malformed schema file is FATAL for the whole load
//! - Registered schemas are immutable

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::schema::{load_schema_file, SchemaDocument, ValidationReport, ValidatorOptions};

use super::databag::decode_relation_data;
use super::errors::{InterfaceError, InterfaceResult};
use super::role::{parse_version_dir, InterfaceKey, Role};

/// Registry of loaded interface schemas indexed by (name, version, role).
#[derive(Debug, Default)]
pub struct InterfaceCatalog {
    /// Directory holding one sub-directory per interface
    root: PathBuf,
    entries: BTreeMap<InterfaceKey, SchemaDocument>,
}

impl InterfaceCatalog {
    /// Creates an empty catalog rooted at `root`. Nothing is read until
    /// [`load_all`](Self::load_all).
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            entries: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the schema file for `key` under this catalog's root.
    pub fn schema_path(&self, key: &InterfaceKey) -> PathBuf {
        self.root
            .join(&key.name)
            .join(format!("v{}", key.version))
            .join("schemas")
            .join(format!("{}.json", key.role))
    }

    /// Loads every schema file under the root.
    ///
    /// Returns the number of schemas loaded.
    pub fn load_all(&mut self) -> InterfaceResult<usize> {
        if !self.root.is_dir() {
            return Err(InterfaceError::Io(format!(
                "Interfaces directory not found: {}",
                self.root.display()
            )));
        }

        let mut loaded = 0;
        for interface_dir in sorted_subdirs(&self.root)? {
            let Some(name) = dir_name(&interface_dir) else { continue };
            for version_dir in sorted_subdirs(&interface_dir)? {
                let version = dir_name(&version_dir).and_then(|n| parse_version_dir(&n));
                let Some(version) = version else { continue };
                for role in Role::ALL {
                    let key = InterfaceKey::new(name.clone(), version, role);
                    let path = self.schema_path(&key);
                    if !path.is_file() {
                        continue;
                    }
                    let document = load_schema_file(&path)?;
                    self.register(key, document)?;
                    loaded += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// Registers a schema directly (built-ins, tests).
    ///
    /// # Errors
    ///
    /// `AlreadyRegistered` if `key` is already present.
    pub fn register(&mut self, key: InterfaceKey, document: SchemaDocument) -> InterfaceResult<()> {
        if self.entries.contains_key(&key) {
            return Err(InterfaceError::AlreadyRegistered(key.to_string()));
        }
        self.entries.insert(key, document);
        Ok(())
    }

    pub fn get(&self, key: &InterfaceKey) -> Option<&SchemaDocument> {
        self.entries.get(key)
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn require(&self, key: &InterfaceKey) -> InterfaceResult<&SchemaDocument> {
        self.get(key)
            .ok_or_else(|| InterfaceError::UnknownInterface(key.to_string()))
    }

    pub fn contains(&self, key: &InterfaceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &InterfaceKey> {
        self.entries.keys()
    }

    /// Versions registered for an interface, ascending.
    pub fn versions(&self, name: &str) -> Vec<u32> {
        let mut versions: Vec<u32> = self
            .entries
            .keys()
            .filter(|k| k.name == name)
            .map(|k| k.version)
            .collect();
        versions.dedup();
        versions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates an already-decoded candidate.
    pub fn validate(
        &self,
        key: &InterfaceKey,
        candidate: &Value,
        options: ValidatorOptions,
    ) -> InterfaceResult<ValidationReport> {
        Ok(self.require(key)?.validate_with(candidate, options))
    }

    /// Decodes the `app`/`unit` databags of `relation`, then validates.
    pub fn validate_databag(
        &self,
        key: &InterfaceKey,
        relation: &Value,
        options: ValidatorOptions,
    ) -> InterfaceResult<ValidationReport> {
        self.validate(key, &decode_relation_data(relation), options)
    }
}

/// Sub-directories of `dir`, sorted by path.
fn sorted_subdirs(dir: &Path) -> InterfaceResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_schema;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_schema(root: &Path, name: &str, version: &str, role: &str, schema: &Value) {
        let dir = root.join(name).join(version).join("schemas");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.json", role)), schema.to_string()).unwrap();
    }

    fn index_schema() -> Value {
        json!({
            "type": "object",
            "required": ["index"],
            "properties": {"index": {"type": "string"}}
        })
    }

    #[test]
    fn test_load_all_walks_layout() {
        let tmp = TempDir::new().unwrap();
        write_schema(tmp.path(), "opensearch_client", "v0", "requirer", &index_schema());
        write_schema(tmp.path(), "opensearch_client", "v0", "provider", &json!({"type": "object"}));
        write_schema(tmp.path(), "tracing", "v2", "provider", &json!({"type": "object"}));
        // Ignored: not a version directory
        write_schema(tmp.path(), "tracing", "docs", "provider", &json!({"type": "object"}));

        let mut catalog = InterfaceCatalog::new(tmp.path());
        assert_eq!(catalog.load_all().unwrap(), 3);

        let keys: Vec<String> = catalog.keys().map(|k| k.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "opensearch_client/v0/provider",
                "opensearch_client/v0/requirer",
                "tracing/v2/provider",
            ]
        );
        assert_eq!(catalog.versions("tracing"), vec![2]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut catalog = InterfaceCatalog::new(&tmp.path().join("nope"));
        let err = catalog.load_all().unwrap_err();
        assert_eq!(err.code(), "REL_IO_ERROR");
    }

    #[test]
    fn test_malformed_schema_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_schema(tmp.path(), "broken", "v1", "provider", &json!({"required": "app"}));

        let mut catalog = InterfaceCatalog::new(tmp.path());
        let err = catalog.load_all().unwrap_err();
        assert_eq!(err.code(), "REL_SCHEMA_MALFORMED");
        assert!(err.to_string().contains("provider.json"));
    }

    #[test]
    fn test_register_is_immutable() {
        let mut catalog = InterfaceCatalog::default();
        let key = InterfaceKey::new("opensearch_client", 0, Role::Requirer);
        let doc = load_schema(&index_schema()).unwrap();

        catalog.register(key.clone(), doc.clone()).unwrap();
        let err = catalog.register(key, doc).unwrap_err();
        assert_eq!(err.code(), "REL_INTERFACE_IMMUTABLE");
    }

    #[test]
    fn test_validate_unknown_interface() {
        let catalog = InterfaceCatalog::default();
        let key = InterfaceKey::new("nope", 1, Role::Provider);
        let err = catalog
            .validate(&key, &json!({}), ValidatorOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), "REL_UNKNOWN_INTERFACE");
    }

    #[test]
    fn test_validate_databag_decodes_first() {
        let mut catalog = InterfaceCatalog::default();
        let key = InterfaceKey::new("demo", 1, Role::Provider);
        let schema = json!({
            "type": "object",
            "properties": {
                "app": {
                    "type": "object",
                    "required": ["ports"],
                    "properties": {"ports": {"type": "array", "items": {"type": "string"}}}
                }
            }
        });
        catalog.register(key.clone(), load_schema(&schema).unwrap()).unwrap();

        let relation = json!({"app": {"ports": "[\"80\", \"443\"]"}});
        let report = catalog
            .validate_databag(&key, &relation, ValidatorOptions::default())
            .unwrap();
        assert!(report.is_valid(), "{:?}", report);

        // Without decoding the encoded list is just a string
        let report = catalog.validate(&key, &relation, ValidatorOptions::default()).unwrap();
        assert!(!report.is_valid());
    }

    #[test]
    fn test_schema_path() {
        let catalog = InterfaceCatalog::new(Path::new("/srv/interfaces"));
        let key = InterfaceKey::new("tracing", 2, Role::Provider);
        assert_eq!(
            catalog.schema_path(&key),
            PathBuf::from("/srv/interfaces/tracing/v2/schemas/provider.json")
        );
    }
}
