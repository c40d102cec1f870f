//! Schema loader: raw JSON Schema document -> immutable node tree
//!
//! Accepted keywords: `type`, `properties`, `required`, `items`, `enum`,
//! `$ref`, `definitions`/`$defs`, `default`, `additionalProperties`,
//! `allOf`, `pattern`. Annotation keywords are kept (`title`,
//! `description`, `$id`); anything else is ignored.
//!
//! After parsing, every `$ref` must resolve and no `$ref`/`allOf` chain may
//! loop without passing through `properties`, `items` or
//! `additionalProperties`. Violations are FATAL.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::types::{
    parse_ref, AdditionalProperties, DefinitionTable, NodeType, Pattern, SchemaDocument, SchemaNode,
};

/// Parses a schema document.
///
/// # Errors
///
/// - `REL_SCHEMA_MALFORMED` if a structural keyword is missing or mistyped
/// - `REL_SCHEMA_UNRESOLVED_REF` if a `$ref` has no matching definition
/// - `REL_SCHEMA_REF_CYCLE` if references loop without consuming structure
/// - `REL_SCHEMA_INVALID_PATTERN` if a `pattern` does not compile
pub fn load_schema(document: &Value) -> SchemaResult<SchemaDocument> {
    SchemaLoader::default().load(document)
}

/// Parses a schema document from JSON text.
pub fn load_schema_str(text: &str) -> SchemaResult<SchemaDocument> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| SchemaError::malformed("#", format!("Invalid JSON: {}", e)))?;
    load_schema(&document)
}

/// Reads and parses a schema file. Error locations are prefixed with the path.
pub fn load_schema_file(path: &Path) -> SchemaResult<SchemaDocument> {
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::malformed("#", format!("Failed to read file: {}", e)).in_source(path.display())
    })?;
    load_schema_str(&content).map_err(|e| e.in_source(path.display()))
}

/// Single-use parser state: collects `$ref` sites for the resolution pass.
#[derive(Default)]
struct SchemaLoader {
    /// (definition name, location of the referencing node)
    references: Vec<(String, String)>,
}

impl SchemaLoader {
    fn load(mut self, document: &Value) -> SchemaResult<SchemaDocument> {
        let obj = document
            .as_object()
            .ok_or_else(|| SchemaError::malformed("#", "Schema document must be an object"))?;

        let mut definitions = DefinitionTable::new();
        for key in ["definitions", "$defs"] {
            let Some(raw) = obj.get(key) else { continue };
            let entries = raw
                .as_object()
                .ok_or_else(|| SchemaError::malformed(format!("#/{}", key), "expected object"))?;
            for (name, raw_node) in entries {
                let location = format!("#/{}/{}", key, escape_pointer(name));
                if definitions.contains(name) {
                    return Err(SchemaError::malformed(location, "definition declared twice"));
                }
                let node = self.parse_node(raw_node, &location)?;
                definitions.insert(name.clone(), node);
            }
        }

        let root = self.parse_node(document, "#")?;

        for (name, location) in &self.references {
            if !definitions.contains(name) {
                return Err(SchemaError::unresolved_reference(location.clone(), name));
            }
        }
        check_reference_cycles(&definitions)?;

        let id = optional_string(obj, "$id", "#")?;
        Ok(SchemaDocument {
            root,
            definitions,
            id,
        })
    }

    fn parse_node(&mut self, raw: &Value, location: &str) -> SchemaResult<SchemaNode> {
        let obj = match raw {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(SchemaNode::any()),
            Value::Bool(false) => {
                return Err(SchemaError::malformed(
                    location,
                    "boolean 'false' schemas are not supported",
                ))
            }
            _ => return Err(SchemaError::malformed(location, "schema node must be an object")),
        };

        let node_type = self.parse_type(obj, location)?;

        let reference = match obj.get("$ref") {
            None => None,
            Some(Value::String(raw_ref)) => {
                let name = parse_ref(raw_ref).ok_or_else(|| {
                    SchemaError::malformed(
                        format!("{}/$ref", location),
                        format!("unsupported reference '{}'", raw_ref),
                    )
                })?;
                self.references.push((name.clone(), location.to_string()));
                Some(name)
            }
            Some(_) => {
                return Err(SchemaError::malformed(
                    format!("{}/$ref", location),
                    "expected string",
                ))
            }
        };

        let all_of = match obj.get("allOf") {
            None => Vec::new(),
            Some(Value::Array(members)) if !members.is_empty() => members
                .iter()
                .enumerate()
                .map(|(i, member)| self.parse_node(member, &format!("{}/allOf/{}", location, i)))
                .collect::<SchemaResult<Vec<_>>>()?,
            Some(_) => {
                return Err(SchemaError::malformed(
                    format!("{}/allOf", location),
                    "expected non-empty array",
                ))
            }
        };

        Ok(SchemaNode {
            node_type,
            reference,
            all_of,
            default: obj.get("default").cloned(),
            title: optional_string(obj, "title", location)?,
            description: optional_string(obj, "description", location)?,
        })
    }

    fn parse_type(&mut self, obj: &Map<String, Value>, location: &str) -> SchemaResult<NodeType> {
        let declared = match obj.get("type") {
            None => None,
            Some(Value::String(name)) => Some(name.as_str()),
            Some(Value::Array(_)) => {
                return Err(SchemaError::malformed(
                    format!("{}/type", location),
                    "type arrays are not supported",
                ))
            }
            Some(_) => {
                return Err(SchemaError::malformed(
                    format!("{}/type", location),
                    "expected string",
                ))
            }
        };

        if let Some(raw_enum) = obj.get("enum") {
            if let Some(other) = declared.filter(|t| *t != "string") {
                return Err(SchemaError::malformed(
                    format!("{}/enum", location),
                    format!("enum is only supported on string types, found '{}'", other),
                ));
            }
            return Ok(NodeType::Enum {
                values: parse_enum(raw_enum, location)?,
            });
        }

        let inferred = declared.or_else(|| {
            if ["properties", "required", "additionalProperties"]
                .iter()
                .any(|k| obj.contains_key(*k))
            {
                Some("object")
            } else if obj.contains_key("items") {
                Some("array")
            } else if obj.contains_key("pattern") {
                Some("string")
            } else {
                None
            }
        });

        match inferred {
            None => Ok(NodeType::Any),
            Some("null") => Ok(NodeType::Null),
            Some("boolean") => Ok(NodeType::Boolean),
            Some("integer") => Ok(NodeType::Integer),
            Some("number") => Ok(NodeType::Number),
            Some("string") => Ok(NodeType::String {
                pattern: parse_pattern(obj, location)?,
            }),
            Some("object") => self.parse_object(obj, location),
            Some("array") => {
                let items = match obj.get("items") {
                    None => None,
                    Some(raw_items @ (Value::Object(_) | Value::Bool(_))) => Some(Box::new(
                        self.parse_node(raw_items, &format!("{}/items", location))?,
                    )),
                    Some(_) => {
                        return Err(SchemaError::malformed(
                            format!("{}/items", location),
                            "expected a single schema; tuple items are not supported",
                        ))
                    }
                };
                Ok(NodeType::Array { items })
            }
            Some(other) => Err(SchemaError::malformed(
                format!("{}/type", location),
                format!("unknown type '{}'", other),
            )),
        }
    }

    fn parse_object(&mut self, obj: &Map<String, Value>, location: &str) -> SchemaResult<NodeType> {
        let mut properties = BTreeMap::new();
        if let Some(raw) = obj.get("properties") {
            let members = raw.as_object().ok_or_else(|| {
                SchemaError::malformed(format!("{}/properties", location), "expected object")
            })?;
            for (name, raw_child) in members {
                let child_location = format!("{}/properties/{}", location, escape_pointer(name));
                properties.insert(name.clone(), self.parse_node(raw_child, &child_location)?);
            }
        }

        let mut required: Vec<String> = Vec::new();
        if let Some(raw) = obj.get("required") {
            let names = raw.as_array().ok_or_else(|| {
                SchemaError::malformed(
                    format!("{}/required", location),
                    "expected array of strings",
                )
            })?;
            for (i, name) in names.iter().enumerate() {
                let name = name.as_str().ok_or_else(|| {
                    SchemaError::malformed(
                        format!("{}/required/{}", location, i),
                        "expected string",
                    )
                })?;
                if !required.iter().any(|n| n == name) {
                    required.push(name.to_string());
                }
            }
        }

        let additional = match obj.get("additionalProperties") {
            None => AdditionalProperties::Unspecified,
            Some(Value::Bool(true)) => AdditionalProperties::Allowed,
            Some(Value::Bool(false)) => AdditionalProperties::Forbidden,
            Some(raw @ Value::Object(_)) => AdditionalProperties::Schema(Box::new(
                self.parse_node(raw, &format!("{}/additionalProperties", location))?,
            )),
            Some(_) => {
                return Err(SchemaError::malformed(
                    format!("{}/additionalProperties", location),
                    "expected boolean or object",
                ))
            }
        };

        Ok(NodeType::Object {
            properties,
            required,
            additional,
        })
    }
}

fn parse_enum(raw: &Value, location: &str) -> SchemaResult<Vec<String>> {
    let members = raw
        .as_array()
        .filter(|members| !members.is_empty())
        .ok_or_else(|| {
            SchemaError::malformed(format!("{}/enum", location), "expected non-empty array")
        })?;
    members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            member.as_str().map(str::to_string).ok_or_else(|| {
                SchemaError::malformed(
                    format!("{}/enum/{}", location, i),
                    "enum values must be strings",
                )
            })
        })
        .collect()
}

fn parse_pattern(obj: &Map<String, Value>, location: &str) -> SchemaResult<Option<Pattern>> {
    match obj.get("pattern") {
        None => Ok(None),
        Some(Value::String(source)) => Pattern::new(source)
            .map(Some)
            .map_err(|e| SchemaError::invalid_pattern(format!("{}/pattern", location), source, e)),
        Some(_) => Err(SchemaError::malformed(format!("{}/pattern", location), "expected string")),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    location: &str,
) -> SchemaResult<Option<String>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::malformed(format!("{}/{}", location, key), "expected string")),
    }
}

/// JSON pointer escaping for member names
fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

/// Definitions a node applies without descending into the document.
fn immediate_references(node: &SchemaNode) -> Vec<&str> {
    let mut names = Vec::new();
    if let Some(name) = &node.reference {
        names.push(name.as_str());
    }
    for member in &node.all_of {
        names.extend(immediate_references(member));
    }
    names
}

/// Rejects `$ref`/`allOf` chains that revisit a definition.
///
/// Recursion through `properties`/`items` is fine: each step consumes one
/// level of the candidate, so validation terminates.
fn check_reference_cycles(definitions: &DefinitionTable) -> SchemaResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        name: &str,
        definitions: &DefinitionTable,
        marks: &mut BTreeMap<String, Mark>,
        chain: &mut Vec<String>,
    ) -> SchemaResult<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = chain.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle: Vec<String> = chain[start..].to_vec();
                cycle.push(name.to_string());
                return Err(SchemaError::reference_cycle(&cycle));
            }
            None => {}
        }

        marks.insert(name.to_string(), Mark::Visiting);
        chain.push(name.to_string());
        let node = definitions.resolve(name)?;
        for next in immediate_references(node) {
            visit(next, definitions, marks, chain)?;
        }
        chain.pop();
        marks.insert(name.to_string(), Mark::Done);
        Ok(())
    }

    let mut marks = BTreeMap::new();
    for name in definitions.names() {
        visit(name, definitions, &mut marks, &mut Vec::new())?;
    }
    Ok(())
}
