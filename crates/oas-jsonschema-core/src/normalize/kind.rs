//! Schema node classification and shared predicates.

use serde_json::{Map, Value};

/// The shape of a schema node, decided once on entry to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchemaKind {
    /// Carries `$ref`. After dereferencing, only circular refs remain.
    Ref,
    /// Carries `allOf`, `anyOf`, or `oneOf`.
    Composition,
    /// A media-type wrapper (`{content: {...}}`) rather than a schema.
    RequestBodyWrapper,
    /// Carries an explicit `type`.
    Typed,
    Untyped,
}

impl SchemaKind {
    pub(crate) fn classify(obj: &Map<String, Value>) -> Self {
        if is_ref(obj) {
            SchemaKind::Ref
        } else if is_polymorphic(obj) {
            SchemaKind::Composition
        } else if obj.contains_key("content") {
            SchemaKind::RequestBodyWrapper
        } else if obj.contains_key("type") {
            SchemaKind::Typed
        } else {
            SchemaKind::Untyped
        }
    }
}

pub(crate) fn is_ref(obj: &Map<String, Value>) -> bool {
    obj.get("$ref").is_some_and(Value::is_string)
}

pub(crate) fn is_polymorphic(obj: &Map<String, Value>) -> bool {
    obj.contains_key("allOf") || obj.contains_key("anyOf") || obj.contains_key("oneOf")
}

/// Whether a node looks like a schema worth reshaping. Bare annotation-only
/// objects (`{description: ...}`) are not, unless they are `allOf` children.
pub(crate) fn is_schema(obj: &Map<String, Value>, polymorphic_all_of_child: bool) -> bool {
    polymorphic_all_of_child
        || [
            "type",
            "allOf",
            "anyOf",
            "oneOf",
            "not",
            "items",
            "properties",
            "additionalProperties",
        ]
        .iter()
        .any(|k| obj.contains_key(*k))
}

/// `type` equals `expected` or is an array containing it.
pub(crate) fn has_schema_type(obj: &Map<String, Value>, expected: &str) -> bool {
    match obj.get("type") {
        Some(Value::String(t)) => t == expected,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(expected)),
        _ => false,
    }
}

/// Strings, numbers and booleans. `null` is not a primitive here.
pub(crate) fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Loose truthiness: `null`, `false`, `0` and `""` are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
