//! Schema validator for candidate documents
//!
//! Validation semantics:
//! - object: candidate is a mapping, required members present, declared
//!   members validated recursively, unknown members checked against
//!   `additionalProperties` (permissive when the schema is silent, unless
//!   [`ValidatorOptions::strict_additional_properties`] is set)
//! - array: every element validated against `items`
//! - string / enum: exact, case-sensitive matching
//! - `$ref` and `allOf`: applied at the same location as the node itself
//!
//! Violations accumulate; nothing short-circuits except a type mismatch on a
//! container, which skips that container's contents. The validator never
//! mutates the schema or the candidate.

use serde_json::Value;

use super::path::DocumentPath;
use super::report::{ValidationReport, Violation};
use super::types::{AdditionalProperties, DefinitionTable, NodeType, SchemaNode};

/// Knobs the schema itself does not express
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Reject unknown object members when `additionalProperties` is absent
    pub strict_additional_properties: bool,
}

/// Nodes that apply at one document location after following `$ref`/`allOf`
struct Applied<'s> {
    nodes: Vec<&'s SchemaNode>,
    unresolved: Vec<&'s str>,
}

/// Validates candidates against schema nodes, resolving `$ref` lazily
/// through a definition table.
pub struct SchemaValidator<'a> {
    definitions: &'a DefinitionTable,
    options: ValidatorOptions,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(definitions: &'a DefinitionTable) -> Self {
        Self::with_options(definitions, ValidatorOptions::default())
    }

    pub fn with_options(definitions: &'a DefinitionTable, options: ValidatorOptions) -> Self {
        Self { definitions, options }
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Validates `candidate` against `schema`.
    ///
    /// Returns every violation found, path-qualified, in traversal order.
    /// Identical violations reached through different `$ref`/`allOf` routes
    /// are reported once.
    pub fn validate(&self, schema: &SchemaNode, candidate: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.check_node(schema, candidate, &DocumentPath::root(), &mut report);
        report.dedup();
        report
    }

    /// Returns a copy of `candidate` where every absent optional member whose
    /// schema declares a `default` is filled in. Present members are left
    /// untouched apart from their own nested defaults; an inserted default
    /// is taken literally and not filled further.
    pub fn apply_defaults(&self, schema: &SchemaNode, candidate: &Value) -> Value {
        let mut filled = candidate.clone();
        self.fill_defaults(schema, &mut filled);
        filled
    }

    /// Expands a node into itself plus every definition and `allOf` member
    /// applying at the same location. A definition is applied at most once
    /// per location, which also stops self-referential chains in hand-built
    /// tables.
    fn expand<'s>(&'s self, node: &'s SchemaNode) -> Applied<'s> {
        let mut applied = Applied {
            nodes: Vec::new(),
            unresolved: Vec::new(),
        };
        let mut seen: Vec<&'s str> = Vec::new();
        self.expand_into(node, &mut seen, &mut applied);
        applied
    }

    fn expand_into<'s>(
        &'s self,
        node: &'s SchemaNode,
        seen: &mut Vec<&'s str>,
        applied: &mut Applied<'s>,
    ) {
        applied.nodes.push(node);
        if let Some(name) = node.reference.as_deref() {
            if !seen.contains(&name) {
                seen.push(name);
                match self.definitions.resolve(name) {
                    Ok(target) => self.expand_into(target, seen, applied),
                    Err(_) => applied.unresolved.push(name),
                }
            }
        }
        for member in &node.all_of {
            self.expand_into(member, seen, applied);
        }
    }

    fn check_node(
        &self,
        node: &SchemaNode,
        value: &Value,
        path: &DocumentPath,
        report: &mut ValidationReport,
    ) {
        let applied = self.expand(node);
        for name in applied.unresolved {
            report.push(Violation::unresolved_reference(path.clone(), name));
        }
        for applied_node in applied.nodes {
            self.check_type(applied_node, value, path, report);
        }
    }

    fn check_type(
        &self,
        node: &SchemaNode,
        value: &Value,
        path: &DocumentPath,
        report: &mut ValidationReport,
    ) {
        match &node.node_type {
            NodeType::Any => {}
            NodeType::Null => {
                if !value.is_null() {
                    report.push(type_mismatch(path, "null", value));
                }
            }
            NodeType::Boolean => {
                if !value.is_boolean() {
                    report.push(type_mismatch(path, "boolean", value));
                }
            }
            NodeType::Integer => {
                if !is_integer(value) {
                    report.push(type_mismatch(path, "integer", value));
                }
            }
            NodeType::Number => {
                if !value.is_number() {
                    report.push(type_mismatch(path, "number", value));
                }
            }
            NodeType::String { pattern } => match value.as_str() {
                None => report.push(type_mismatch(path, "string", value)),
                Some(s) => {
                    if let Some(pattern) = pattern {
                        if !pattern.is_match(s) {
                            report.push(Violation::pattern_mismatch(
                                path.clone(),
                                pattern.as_str(),
                                describe(value),
                            ));
                        }
                    }
                }
            },
            NodeType::Enum { values } => {
                let matched = value
                    .as_str()
                    .map_or(false, |s| values.iter().any(|allowed| allowed == s));
                if !matched {
                    report.push(Violation::enum_mismatch(path.clone(), values, describe(value)));
                }
            }
            NodeType::Object {
                properties,
                required,
                additional,
            } => {
                let Some(members) = value.as_object() else {
                    report.push(type_mismatch(path, "object", value));
                    return;
                };

                for name in required {
                    if !members.contains_key(name) {
                        report.push(Violation::missing_required(path.field(name.as_str())));
                    }
                }

                for (key, member) in members {
                    let member_path = path.field(key.as_str());
                    if let Some(child) = properties.get(key) {
                        self.check_node(child, member, &member_path, report);
                        continue;
                    }
                    match additional {
                        AdditionalProperties::Allowed => {}
                        AdditionalProperties::Forbidden => {
                            report.push(Violation::additional_property(member_path));
                        }
                        AdditionalProperties::Schema(child) => {
                            self.check_node(child, member, &member_path, report);
                        }
                        AdditionalProperties::Unspecified => {
                            if self.options.strict_additional_properties {
                                report.push(Violation::additional_property(member_path));
                            }
                        }
                    }
                }
            }
            NodeType::Array { items } => {
                let Some(elements) = value.as_array() else {
                    report.push(type_mismatch(path, "array", value));
                    return;
                };
                if let Some(items) = items {
                    for (i, element) in elements.iter().enumerate() {
                        self.check_node(items, element, &path.index(i), report);
                    }
                }
            }
        }
    }

    fn fill_defaults(&self, node: &SchemaNode, value: &mut Value) {
        let applied = self.expand(node);
        match value {
            Value::Object(members) => {
                for applied_node in &applied.nodes {
                    let Some(properties) = applied_node.properties() else { continue };
                    for (name, child) in properties {
                        if let Some(member) = members.get_mut(name) {
                            self.fill_defaults(child, member);
                        } else if let Some(default) = self.default_for(child) {
                            // Taken literally, no defaults are filled inside it
                            members.insert(name.clone(), default.clone());
                        }
                    }
                }
            }
            Value::Array(elements) => {
                for applied_node in &applied.nodes {
                    if let NodeType::Array { items: Some(items) } = &applied_node.node_type {
                        for element in elements.iter_mut() {
                            self.fill_defaults(items, element);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// First `default` found on the node or anything it applies.
    fn default_for<'s>(&'s self, node: &'s SchemaNode) -> Option<&'s Value> {
        self.expand(node).nodes.into_iter().find_map(|n| n.default.as_ref())
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn type_mismatch(path: &DocumentPath, expected: &str, value: &Value) -> Violation {
    Violation::type_mismatch(path.clone(), expected, json_type_name(value))
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Scalars render as JSON text; containers as their type name.
fn describe(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => json_type_name(value).to_string(),
        scalar => scalar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::report::ViolationKind;
    use crate::schema::types::Pattern;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn props(entries: Vec<(&str, SchemaNode)>) -> BTreeMap<String, SchemaNode> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Hand-built equivalent of the tracing provider app databag
    fn tracing_table() -> (SchemaNode, DefinitionTable) {
        let mut table = DefinitionTable::new();
        table.insert(
            "IngesterProtocol",
            SchemaNode::enumeration(["otlp_grpc", "otlp_http", "zipkin", "tempo"]),
        );
        table.insert(
            "Ingester",
            SchemaNode::object(
                props(vec![
                    ("port", SchemaNode::string()),
                    ("protocol", SchemaNode::reference("IngesterProtocol")),
                ]),
                ["port", "protocol"],
            ),
        );
        table.insert(
            "AppData",
            SchemaNode::object(
                props(vec![
                    ("host", SchemaNode::string()),
                    ("ingesters", SchemaNode::array(SchemaNode::reference("Ingester"))),
                ]),
                ["host", "ingesters"],
            ),
        );
        let root = SchemaNode::object(
            props(vec![("app", SchemaNode::reference("AppData"))]),
            ["app"],
        );
        (root, table)
    }

    #[test]
    fn test_valid_document_passes() {
        let (root, table) = tracing_table();
        let validator = SchemaValidator::new(&table);

        let doc = json!({
            "app": {"host": "x", "ingesters": [{"port": "4317", "protocol": "otlp_grpc"}]}
        });
        let report = validator.validate(&root, &doc);
        assert!(report.is_valid(), "{:?}", report);
    }

    #[test]
    fn test_missing_required_field_reported_once() {
        let (root, table) = tracing_table();
        let validator = SchemaValidator::new(&table);

        let report = validator.validate(&root, &json!({"app": {"ingesters": []}}));
        assert_eq!(report.len(), 1);
        let violation = &report.violations()[0];
        assert_eq!(violation.kind, ViolationKind::MissingRequired);
        assert_eq!(violation.path.to_string(), "app.host");
    }

    #[test]
    fn test_enum_mismatch_at_field_path() {
        let (root, table) = tracing_table();
        let validator = SchemaValidator::new(&table);

        let doc = json!({
            "app": {"host": "x", "ingesters": [{"port": "4317", "protocol": "OTLP_GRPC"}]}
        });
        let report = validator.validate(&root, &doc);
        assert_eq!(report.len(), 1);
        let violation = &report.violations()[0];
        assert_eq!(violation.kind, ViolationKind::EnumMismatch);
        assert_eq!(violation.path.to_string(), "app.ingesters[0].protocol");
        assert_eq!(violation.actual, "\"OTLP_GRPC\"");
    }

    #[test]
    fn test_enum_rejects_non_string() {
        let table = DefinitionTable::new();
        let node = SchemaNode::enumeration(["a"]);
        let report = SchemaValidator::new(&table).validate(&node, &json!(1));
        assert_eq!(report.violations()[0].kind, ViolationKind::EnumMismatch);
        assert_eq!(report.violations()[0].actual, "1");
    }

    #[test]
    fn test_errors_accumulate() {
        let (root, table) = tracing_table();
        let validator = SchemaValidator::new(&table);

        let doc = json!({
            "app": {
                "ingesters": [
                    {"port": 4317, "protocol": "otlp_grpc"},
                    {"protocol": "jaeger"},
                    "not-an-object"
                ]
            }
        });
        let report = validator.validate(&root, &doc);
        let paths: Vec<String> = report.violations().iter().map(|v| v.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "app.host",
                "app.ingesters[0].port",
                "app.ingesters[1].port",
                "app.ingesters[1].protocol",
                "app.ingesters[2]",
            ]
        );
    }

    #[test]
    fn test_type_mismatch_does_not_descend() {
        let (root, table) = tracing_table();
        let report = SchemaValidator::new(&table).validate(&root, &json!({"app": ["host"]}));
        assert_eq!(report.len(), 1);
        assert_eq!(report.violations()[0].expected, "object");
        assert_eq!(report.violations()[0].actual, "array");
    }

    #[test]
    fn test_root_must_match_type() {
        let (root, table) = tracing_table();
        let report = SchemaValidator::new(&table).validate(&root, &json!("text"));
        assert_eq!(report.violations()[0].path.to_string(), "$root");
    }

    #[test]
    fn test_additional_properties_policies() {
        let table = DefinitionTable::new();
        let base = SchemaNode::object(props(vec![("index", SchemaNode::string())]), ["index"]);
        let doc = json!({"index": "logs", "extra": 1});

        let permissive = SchemaValidator::new(&table);
        assert!(permissive.validate(&base, &doc).is_valid());

        let strict = SchemaValidator::with_options(
            &table,
            ValidatorOptions {
                strict_additional_properties: true,
            },
        );
        let report = strict.validate(&base, &doc);
        assert_eq!(report.violations()[0].kind, ViolationKind::AdditionalProperty);
        assert_eq!(report.violations()[0].path.to_string(), "extra");

        // Explicit `true` wins over strict options
        let allowed = base.clone().with_additional(AdditionalProperties::Allowed);
        assert!(strict.validate(&allowed, &doc).is_valid());

        let forbidden = base.clone().with_additional(AdditionalProperties::Forbidden);
        assert!(!permissive.validate(&forbidden, &doc).is_valid());

        let typed =
            base.with_additional(AdditionalProperties::Schema(Box::new(SchemaNode::string())));
        let report = permissive.validate(&typed, &doc);
        assert_eq!(report.violations()[0].kind, ViolationKind::TypeMismatch);
        assert_eq!(report.violations()[0].path.to_string(), "extra");
    }

    #[test]
    fn test_pattern_mismatch() {
        let table = DefinitionTable::new();
        let node = SchemaNode::string_matching(Pattern::new("^[0-9]+$").unwrap());
        let validator = SchemaValidator::new(&table);
        assert!(validator.validate(&node, &json!("4317")).is_valid());
        let report = validator.validate(&node, &json!("port"));
        assert_eq!(report.violations()[0].kind, ViolationKind::PatternMismatch);
    }

    #[test]
    fn test_scalar_types() {
        let table = DefinitionTable::new();
        let validator = SchemaValidator::new(&table);
        assert!(validator.validate(&SchemaNode::integer(), &json!(3)).is_valid());
        assert!(validator.validate(&SchemaNode::integer(), &json!(3.0)).is_valid());
        assert!(!validator.validate(&SchemaNode::integer(), &json!(3.5)).is_valid());
        assert!(validator.validate(&SchemaNode::number(), &json!(3.5)).is_valid());
        assert!(validator.validate(&SchemaNode::boolean(), &json!(false)).is_valid());
        assert!(validator.validate(&SchemaNode::null(), &json!(null)).is_valid());
        assert!(!validator.validate(&SchemaNode::string(), &json!(null)).is_valid());
        assert!(validator.validate(&SchemaNode::any(), &json!({"x": [1]})).is_valid());
    }

    #[test]
    fn test_all_of_applies_every_member() {
        let table = DefinitionTable::new();
        let node = SchemaNode::any().with_all_of(vec![
            SchemaNode::object(BTreeMap::new(), ["a"]),
            SchemaNode::object(BTreeMap::new(), ["b"]),
        ]);
        let report = SchemaValidator::new(&table).validate(&node, &json!({}));
        let paths: Vec<String> = report.violations().iter().map(|v| v.path.to_string()).collect();
        assert_eq!(paths, vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_constraints_reported_once() {
        let mut table = DefinitionTable::new();
        table.insert("NeedsA", SchemaNode::object(BTreeMap::new(), ["a"]));
        let node =
            SchemaNode::reference("NeedsA").with_all_of(vec![SchemaNode::reference("NeedsA")]);
        let report = SchemaValidator::new(&table).validate(&node, &json!({}));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_unresolved_reference_in_hand_built_table() {
        let table = DefinitionTable::new();
        let node = SchemaNode::object(
            props(vec![("app", SchemaNode::reference("Missing"))]),
            ["app"],
        );
        let report = SchemaValidator::new(&table).validate(&node, &json!({"app": {}}));
        assert_eq!(report.violations()[0].kind, ViolationKind::UnresolvedReference);
        assert_eq!(report.violations()[0].path.to_string(), "app");
    }

    #[test]
    fn test_self_reference_in_hand_built_table_terminates() {
        let mut table = DefinitionTable::new();
        table.insert("Loop", SchemaNode::reference("Loop"));
        let report =
            SchemaValidator::new(&table).validate(&SchemaNode::reference("Loop"), &json!(1));
        assert!(report.is_valid());
    }

    #[test]
    fn test_validation_is_deterministic() {
        let (root, table) = tracing_table();
        let validator = SchemaValidator::new(&table);
        let doc = json!({"app": {"ingesters": [{"protocol": "nope"}], "host": 1}});

        let first = validator.validate(&root, &doc);
        for _ in 0..50 {
            assert_eq!(validator.validate(&root, &doc), first);
        }
    }

    #[test]
    fn test_apply_defaults_fills_missing_optional() {
        let table = DefinitionTable::new();
        let node = SchemaNode::object(
            props(vec![
                ("index", SchemaNode::string()),
                ("extra-user-roles", SchemaNode::string().with_default(json!("default"))),
            ]),
            ["index"],
        );
        let validator = SchemaValidator::new(&table);

        let filled = validator.apply_defaults(&node, &json!({"index": "myapp"}));
        assert_eq!(filled, json!({"index": "myapp", "extra-user-roles": "default"}));

        let candidate = json!({"index": "myapp", "extra-user-roles": "admin"});
        let kept = validator.apply_defaults(&node, &candidate);
        assert_eq!(kept["extra-user-roles"], "admin");
    }

    #[test]
    fn test_apply_defaults_through_refs_and_arrays() {
        let mut table = DefinitionTable::new();
        table.insert("Mode", SchemaNode::enumeration(["a", "b"]).with_default(json!("a")));
        table.insert(
            "Entry",
            SchemaNode::object(
                props(vec![("mode", SchemaNode::reference("Mode"))]),
                Vec::<String>::new(),
            ),
        );
        let root = SchemaNode::object(
            props(vec![("entries", SchemaNode::array(SchemaNode::reference("Entry")))]),
            Vec::<String>::new(),
        );
        let validator = SchemaValidator::new(&table);

        let candidate = json!({"entries": [{}, {"mode": "b"}]});
        let filled = validator.apply_defaults(&root, &candidate);
        assert_eq!(filled, json!({"entries": [{"mode": "a"}, {"mode": "b"}]}));
        // Input untouched
        assert_eq!(candidate, json!({"entries": [{}, {"mode": "b"}]}));
    }

    #[test]
    fn test_apply_defaults_terminates_on_recursive_default() {
        let mut table = DefinitionTable::new();
        table.insert(
            "Node",
            SchemaNode::object(
                props(vec![("child", SchemaNode::reference("Node").with_default(json!({})))]),
                Vec::<String>::new(),
            ),
        );
        let root = SchemaNode::reference("Node");
        let validator = SchemaValidator::new(&table);

        assert!(validator.validate(&root, &json!({})).is_valid());
        assert_eq!(validator.apply_defaults(&root, &json!({})), json!({"child": {}}));
        assert_eq!(
            validator.apply_defaults(&root, &json!({"child": {"child": {}}})),
            json!({"child": {"child": {"child": {}}}})
        );
    }

    #[test]
    fn test_absent_optional_field_is_not_an_error() {
        let table = DefinitionTable::new();
        let node = SchemaNode::object(
            props(vec![("opt", SchemaNode::string().with_default(json!("x")))]),
            Vec::<String>::new(),
        );
        assert!(SchemaValidator::new(&table).validate(&node, &json!({})).is_valid());
    }
}
