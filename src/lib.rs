//! relschema - schema-validated configuration and relation databags
//!
//! Loads JSON Schema documents into an immutable node tree, validates
//! candidate documents against them and reports every violation with its
//! path. The `interface` layer organises schemas by relation interface,
//! version and role.

pub mod cli;
pub mod interface;
pub mod observability;
pub mod schema;
