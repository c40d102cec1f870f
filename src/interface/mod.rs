//! Relation interfaces for relschema
//!
//! An interface is a named, versioned contract between the two sides of a
//! relation. Each side (role) publishes databags whose shape is described by
//! a schema document. This module owns:
//!
//! - Role and key types (`tracing/v2/provider`)
//! - Databag decoding (JSON-encoded string values)
//! - The on-disk catalog of interface schemas
//! - Schemas bundled into the binary
//! - The fixture matrix that checks stored examples against their schemas

mod builtin;
mod catalog;
mod databag;
mod errors;
mod matrix;
mod role;

pub use builtin::catalog as builtin_catalog;
pub use catalog::InterfaceCatalog;
pub use databag::{decode_databag, decode_relation_data};
pub use errors::{InterfaceError, InterfaceResult};
pub use matrix::{
    fixture_dir, run_matrix, FixtureOutcome, FixtureResults, MatrixOptions, MatrixReport,
    ResultsPerInterface, ResultsPerRole, ResultsPerVersion,
};
pub use role::{parse_version_dir, DatabagScope, InterfaceKey, Role};
