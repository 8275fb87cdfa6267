//! Reshaping OpenAPI `example` / `examples` into a JSON Schema `examples` list.
//!
//! Only primitives (or arrays of primitives) survive on the schema itself.
//! Object-valued examples are handed back as `{example: value}` (or
//! `{examples: [...]}`) fragments so the driver can put them on the ancestor
//! chain for descendants to search.

use serde_json::{Map, Value};

use super::kind::is_primitive;

/// What reshaping produced besides the in-place edit.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ExampleReshape {
    /// `{example: value}` fragments for the ancestor chain.
    pub deferred: Vec<Value>,
    /// `$ref` targets of named examples that stayed unresolved (circular).
    pub circular_refs: Vec<String>,
}

/// Reshape `example`/`examples` in place.
pub(crate) fn reshape(obj: &mut Map<String, Value>) -> ExampleReshape {
    let mut outcome = ExampleReshape::default();

    if let Some(example) = obj.remove("example") {
        if is_primitive(&example) {
            obj.insert("examples".to_string(), Value::Array(vec![example]));
        } else if let Value::Array(items) = example {
            let primitives: Vec<Value> = items.iter().filter(|v| is_primitive(v)).cloned().collect();
            if primitives.is_empty() {
                // An array of objects describes the items; let them search it.
                outcome.deferred.push(single_example(Value::Array(items)));
            } else {
                obj.insert("examples".to_string(), Value::Array(primitives));
            }
        } else if !example.is_null() {
            outcome.deferred.push(single_example(example));
        }
        return outcome;
    }

    let Some(examples) = obj.remove("examples") else {
        return outcome;
    };

    match examples {
        Value::Object(named) => {
            let mut reshaped = Vec::new();
            for (name, entry) in named {
                if let Some(reference) = entry.get("$ref").and_then(Value::as_str) {
                    outcome.circular_refs.push(reference.to_string());
                    continue;
                }
                let Some(value) = entry.get("value") else {
                    tracing::trace!(example = %name, "named example has no value");
                    continue;
                };
                match value {
                    v if is_primitive(v) => reshaped.push(v.clone()),
                    Value::Array(items) if items.first().is_some_and(is_primitive) => {
                        reshaped.push(items[0].clone());
                    }
                    other => outcome.deferred.push(single_example(other.clone())),
                }
            }
            if !reshaped.is_empty() {
                obj.insert("examples".to_string(), Value::Array(reshaped));
            }
        }
        Value::Array(items) if items.first().is_some_and(is_primitive) => {
            obj.insert("examples".to_string(), Value::Array(items));
        }
        Value::Array(items) if !items.is_empty() => {
            let mut fragment = Map::new();
            fragment.insert("examples".to_string(), Value::Array(items));
            outcome.deferred.push(Value::Object(fragment));
        }
        _ => {}
    }

    outcome
}

fn single_example(value: Value) -> Value {
    let mut fragment = Map::new();
    fragment.insert("example".to_string(), value);
    Value::Object(fragment)
}

/// Whether a value found by the reverse search may become an example.
pub(crate) fn is_promotable_example(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(is_primitive),
        other => is_primitive(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(value: Value) -> (Value, ExampleReshape) {
        let mut obj = value.as_object().cloned().unwrap();
        let outcome = reshape(&mut obj);
        (Value::Object(obj), outcome)
    }

    #[test]
    fn test_primitive_example() {
        let (schema, outcome) = run(json!({ "type": "string", "example": "dog" }));
        assert_eq!(schema, json!({ "type": "string", "examples": ["dog"] }));
        assert_eq!(outcome, ExampleReshape::default());
    }

    #[test]
    fn test_array_example_filters_non_primitives() {
        let (schema, _) = run(json!({ "example": [1, { "a": 1 }, "x"] }));
        assert_eq!(schema, json!({ "examples": [1, "x"] }));

        let (schema, outcome) = run(json!({ "example": [{ "a": 1 }] }));
        assert_eq!(schema, json!({}));
        assert_eq!(outcome.deferred, vec![json!({ "example": [{ "a": 1 }] })]);
    }

    #[test]
    fn test_object_example_is_deferred() {
        let (schema, outcome) = run(json!({ "type": "object", "example": { "id": 10 } }));
        assert_eq!(schema, json!({ "type": "object" }));
        assert_eq!(outcome.deferred, vec![json!({ "example": { "id": 10 } })]);
    }

    #[test]
    fn test_named_examples() {
        let (schema, outcome) = run(json!({
            "examples": {
                "cat": { "value": "cat" },
                "list": { "value": ["dog", "bird"] },
                "obj": { "value": { "name": "fish" } },
                "loop": { "$ref": "#/components/examples/Loop" },
                "empty": { "summary": "no value" }
            }
        }));
        assert_eq!(schema, json!({ "examples": ["cat", "dog"] }));
        assert_eq!(outcome.deferred, vec![json!({ "example": { "name": "fish" } })]);
        assert_eq!(outcome.circular_refs, vec!["#/components/examples/Loop"]);
    }

    #[test]
    fn test_primitive_examples_array_kept() {
        let (schema, _) = run(json!({ "examples": ["a", "b"] }));
        assert_eq!(schema, json!({ "examples": ["a", "b"] }));

    }

    #[test]
    fn test_object_examples_array_is_deferred() {
        let (schema, outcome) = run(json!({ "examples": [{ "a": 1 }] }));
        assert_eq!(schema, json!({}));
        assert_eq!(outcome.deferred, vec![json!({ "examples": [{ "a": 1 }] })]);
    }

    #[test]
    fn test_promotable() {
        assert!(is_promotable_example(&json!("x")));
        assert!(is_promotable_example(&json!([1, 2])));
        assert!(!is_promotable_example(&json!({ "a": 1 })));
        assert!(!is_promotable_example(&json!([{ "a": 1 }])));
    }
}
