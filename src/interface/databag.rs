//! Relation databag decoding
//!
//! Juju databags map string keys to string values; structured fields are
//! published JSON-encoded (`"ingesters": "[{\"port\": \"4317\", ...}]"`).
//! Before validation each value is decoded back into JSON. Only decodings
//! that yield an object, an array or a string are kept; anything else stays
//! the raw string. Plain text such as a hostname and bare scalars such as a
//! port `8080` or `true` therefore still validate against a `string` schema.

use serde_json::{Map, Value};

use super::role::DatabagScope;

/// Decodes every string value of a single databag.
///
/// Non-object input and non-string members are returned unchanged.
pub fn decode_databag(databag: &Value) -> Value {
    match databag {
        Value::Object(members) => Value::Object(
            members
                .iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

/// Decodes the `app` and `unit` databags of a full relation payload.
/// Other members are left as-is.
pub fn decode_relation_data(relation: &Value) -> Value {
    let Value::Object(members) = relation else {
        return relation.clone();
    };
    let mut decoded = members.clone();
    for scope in DatabagScope::ALL {
        if let Some(bag) = members.get(scope.as_str()) {
            decoded.insert(scope.as_str().to_string(), decode_databag(bag));
        }
    }
    Value::Object(decoded)
}

fn decode_value(value: &Value) -> Value {
    match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(decoded @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => decoded,
            _ => value.clone(),
        },
        other => other.clone(),
    }
}
