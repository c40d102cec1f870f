//! Schemas bundled into the binary
//!
//! Sources live under `interfaces/` at the repository root and are embedded
//! at compile time, so the bundled catalog needs no filesystem access.

use crate::schema::load_schema_str;

use super::catalog::InterfaceCatalog;
use super::errors::InterfaceResult;
use super::role::{InterfaceKey, Role};

/// (interface, version, role, schema text)
const BUNDLED: &[(&str, u32, Role, &str)] = &[
    (
        "ingress",
        2,
        Role::Provider,
        include_str!("../../interfaces/ingress/v2/schemas/provider.json"),
    ),
    (
        "ingress",
        2,
        Role::Requirer,
        include_str!("../../interfaces/ingress/v2/schemas/requirer.json"),
    ),
    (
        "opensearch_client",
        0,
        Role::Requirer,
        include_str!("../../interfaces/opensearch_client/v0/schemas/requirer.json"),
    ),
    (
        "tracing",
        2,
        Role::Provider,
        include_str!("../../interfaces/tracing/v2/schemas/provider.json"),
    ),
];

/// Returns a catalog holding every bundled schema.
pub fn catalog() -> InterfaceResult<InterfaceCatalog> {
    let mut catalog = InterfaceCatalog::default();
    for (name, version, role, text) in BUNDLED {
        let key = InterfaceKey::new(*name, *version, *role);
        let document = load_schema_str(text).map_err(|e| e.in_source(&key))?;
        catalog.register(key, document)?;
    }
    Ok(catalog)
}
