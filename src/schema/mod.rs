//! Schema subsystem for relschema
//!
//! Loads JSON Schema documents into immutable node trees and validates
//! candidate documents against them.
//!
//! # Design Principles
//!
//! - Schema trees are parsed once and never mutated
//! - `$ref` is a name lookup into a definition table, resolved lazily
//! - Malformed schemas are FATAL; candidate violations accumulate
//! - Validation is deterministic and side-effect free
//!
//! # Usage
//!
//! ```ignore
//! use relschema::schema::load_schema;
//!
//! let document = load_schema(&raw_schema)?;
//! let report = document.validate(&candidate);
//! for violation in report.violations() {
//!     println!("{}", violation);
//! }
//! ```

mod errors;
mod loader;
mod path;
mod report;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::{load_schema, load_schema_file, load_schema_str};
pub use path::{DocumentPath, PathSegment};
pub use report::{ValidationReport, Violation, ViolationKind};
pub use types::{
    parse_ref, AdditionalProperties, DefinitionTable, NodeType, Pattern, SchemaDocument, SchemaNode,
};
pub use validator::{SchemaValidator, ValidatorOptions};
