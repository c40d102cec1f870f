//! Schema node tree and definition table
//!
//! Supported constraint kinds:
//! - object: properties, required, additionalProperties
//! - array: items
//! - string: optional pattern
//! - enum: ordered list of allowed strings
//! - integer, number, boolean, null
//! - any: no `type` keyword
//!
//! Every node may also carry `$ref`, `allOf` and `default`.
//! Trees are immutable once loaded.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::report::ValidationReport;
use super::validator::{SchemaValidator, ValidatorOptions};

/// Compiled `pattern` keyword. Compared by source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Unanchored search, as JSON Schema specifies for `pattern`.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.0.is_match(candidate)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Policy for object members not listed under `properties`
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    /// Schema is silent; the validator options decide
    #[default]
    Unspecified,
    /// `additionalProperties: true`
    Allowed,
    /// `additionalProperties: false`
    Forbidden,
    /// `additionalProperties: {...}`, applied to every unknown member
    Schema(Box<SchemaNode>),
}

/// Type constraint of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// No `type` keyword: any value is accepted
    Any,
    Null,
    Boolean,
    /// Integral JSON number
    Integer,
    /// Any JSON number
    Number,
    String {
        pattern: Option<Pattern>,
    },
    /// String restricted to an exact, case-sensitive value set
    Enum {
        values: Vec<String>,
    },
    Object {
        /// Declared members, sorted by name
        properties: BTreeMap<String, SchemaNode>,
        /// Required member names in declaration order, deduplicated
        required: Vec<String>,
        additional: AdditionalProperties,
    },
    Array {
        /// Element schema; `None` accepts any element
        items: Option<Box<SchemaNode>>,
    },
}

impl NodeType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeType::Any => "any",
            NodeType::Null => "null",
            NodeType::Boolean => "boolean",
            NodeType::Integer => "integer",
            NodeType::Number => "number",
            NodeType::String { .. } => "string",
            NodeType::Enum { .. } => "enum",
            NodeType::Object { .. } => "object",
            NodeType::Array { .. } => "array",
        }
    }
}

/// A node in a schema tree
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub node_type: NodeType,
    /// Definition name this node refers to (`$ref`)
    pub reference: Option<String>,
    /// Subschemas that all apply (`allOf`)
    pub all_of: Vec<SchemaNode>,
    pub default: Option<Value>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl SchemaNode {
    fn of(node_type: NodeType) -> Self {
        Self {
            node_type,
            reference: None,
            all_of: Vec::new(),
            default: None,
            title: None,
            description: None,
        }
    }

    /// Node accepting any value
    pub fn any() -> Self {
        Self::of(NodeType::Any)
    }

    pub fn string() -> Self {
        Self::of(NodeType::String { pattern: None })
    }

    pub fn integer() -> Self {
        Self::of(NodeType::Integer)
    }

    pub fn number() -> Self {
        Self::of(NodeType::Number)
    }

    pub fn boolean() -> Self {
        Self::of(NodeType::Boolean)
    }

    pub fn null() -> Self {
        Self::of(NodeType::Null)
    }

    /// String node with a `pattern`
    pub fn string_matching(pattern: Pattern) -> Self {
        Self::of(NodeType::String {
            pattern: Some(pattern),
        })
    }

    /// Enum node over the given values
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(NodeType::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Object node; `required` is deduplicated keeping first occurrence.
    pub fn object<I, S>(properties: BTreeMap<String, SchemaNode>, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in required {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Self::of(NodeType::Object {
            properties,
            required: names,
            additional: AdditionalProperties::Unspecified,
        })
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::of(NodeType::Array {
            items: Some(Box::new(items)),
        })
    }

    /// Bare `$ref` node
    pub fn reference(name: impl Into<String>) -> Self {
        let mut node = Self::any();
        node.reference = Some(name.into());
        node
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_all_of(mut self, all_of: Vec<SchemaNode>) -> Self {
        self.all_of = all_of;
        self
    }

    /// Sets the additionalProperties policy. No effect on non-object nodes.
    pub fn with_additional(mut self, policy: AdditionalProperties) -> Self {
        if let NodeType::Object { additional, .. } = &mut self.node_type {
            *additional = policy;
        }
        self
    }

    /// Declared properties, empty for non-object nodes.
    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match &self.node_type {
            NodeType::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }
}

/// Named, reusable sub-schemas addressed by `$ref`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionTable {
    entries: BTreeMap<String, SchemaNode>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode) {
        self.entries.insert(name.into(), node);
    }

    /// Looks up a definition by name.
    ///
    /// # Errors
    ///
    /// `REL_SCHEMA_UNRESOLVED_REF` if no definition has that name.
    pub fn resolve(&self, name: &str) -> SchemaResult<&SchemaNode> {
        self.entries.get(name).ok_or_else(|| {
            SchemaError::unresolved_reference(format!("#/definitions/{}", name), name)
        })
    }

    /// Parses a `$ref` string and resolves it.
    pub fn resolve_ref(&self, reference: &str) -> SchemaResult<&SchemaNode> {
        let name = parse_ref(reference).ok_or_else(|| {
            SchemaError::malformed(
                reference.to_string(),
                "only local '#/definitions/<name>' or '#/$defs/<name>' references are supported",
            )
        })?;
        self.resolve(&name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extracts the definition name from a local `$ref`.
///
/// Accepts `#/definitions/<name>` and `#/$defs/<name>`; JSON pointer escapes
/// (`~1`, `~0`) are decoded.
pub fn parse_ref(reference: &str) -> Option<String> {
    let raw = reference
        .strip_prefix("#/definitions/")
        .or_else(|| reference.strip_prefix("#/$defs/"))?;
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    Some(raw.replace("~1", "/").replace("~0", "~"))
}

/// A loaded schema: root node plus its definition table
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    pub root: SchemaNode,
    pub definitions: DefinitionTable,
    /// `$id` of the document, if declared
    pub id: Option<String>,
}

impl SchemaDocument {
    pub fn new(root: SchemaNode, definitions: DefinitionTable) -> Self {
        Self {
            root,
            definitions,
            id: None,
        }
    }

    /// Validates a candidate with default (permissive) options.
    pub fn validate(&self, candidate: &Value) -> ValidationReport {
        SchemaValidator::new(&self.definitions).validate(&self.root, candidate)
    }

    pub fn validate_with(&self, candidate: &Value, options: ValidatorOptions) -> ValidationReport {
        SchemaValidator::with_options(&self.definitions, options).validate(&self.root, candidate)
    }

    /// Returns the candidate with schema defaults filled in.
    pub fn apply_defaults(&self, candidate: &Value) -> Value {
        SchemaValidator::new(&self.definitions).apply_defaults(&self.root, candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ref_forms() {
        assert_eq!(parse_ref("#/definitions/Ingester"), Some("Ingester".into()));
        assert_eq!(parse_ref("#/$defs/Ingester"), Some("Ingester".into()));
        assert_eq!(parse_ref("#/definitions/a~1b"), Some("a/b".into()));
        assert_eq!(parse_ref("#/definitions/"), None);
        assert_eq!(parse_ref("#/properties/app"), None);
        assert_eq!(parse_ref("other.json#/definitions/X"), None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut table = DefinitionTable::new();
        table.insert("Port", SchemaNode::string());

        let first = table.resolve("Port").unwrap();
        let second = table.resolve("Port").unwrap();
        assert_eq!(first, second);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let table = DefinitionTable::new();
        let err = table.resolve("Missing").unwrap_err();
        assert_eq!(err.code().code(), "REL_SCHEMA_UNRESOLVED_REF");
    }

    #[test]
    fn test_resolve_ref_rejects_remote() {
        let table = DefinitionTable::new();
        let err = table.resolve_ref("http://example.com/schema.json").unwrap_err();
        assert_eq!(err.code().code(), "REL_SCHEMA_MALFORMED");
    }

    #[test]
    fn test_object_dedupes_required() {
        let node = SchemaNode::object(BTreeMap::new(), ["a", "b", "a"]);
        match node.node_type {
            NodeType::Object { required, .. } => assert_eq!(required, vec!["a", "b"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_with_additional_ignored_on_scalars() {
        let node = SchemaNode::string().with_additional(AdditionalProperties::Forbidden);
        assert_eq!(node, SchemaNode::string());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_schema_types_are_send_sync() {
        assert_send_sync::<SchemaDocument>();
        assert_send_sync::<SchemaNode>();
        assert_send_sync::<DefinitionTable>();
    }

    #[test]
    fn test_pattern_compares_by_source() {
        let a = Pattern::new("^[0-9]+$").unwrap();
        let b = Pattern::new("^[0-9]+$").unwrap();
        assert_eq!(a, b);
        assert!(a.is_match("4317"));
        assert!(!a.is_match("port"));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(SchemaNode::string().node_type.type_name(), "string");
        assert_eq!(SchemaNode::enumeration(["a"]).node_type.type_name(), "enum");
        assert_eq!(SchemaNode::array(SchemaNode::any()).node_type.type_name(), "array");
        assert_eq!(SchemaNode::any().with_default(json!(1)).node_type.type_name(), "any");
    }
}
