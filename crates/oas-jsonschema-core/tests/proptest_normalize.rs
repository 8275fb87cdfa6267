//! Property-based tests for schema normalization.
//!
//! Two invariants:
//! - normalizing an already-normalized schema changes nothing
//! - structurally malformed schemas never panic the normalizer

use oas_jsonschema_core::{to_json_schema, NormalizeOptions};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_prop_name() -> impl Strategy<Value = String> {
    "p[a-zA-Z0-9_]{0,8}"
}

fn arb_primitive_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("string"),
        Just("integer"),
        Just("number"),
        Just("boolean"),
    ]
}

fn arb_example(kind: &'static str) -> BoxedStrategy<Value> {
    match kind {
        "string" => "[a-z]{1,6}".prop_map(Value::from).boxed(),
        "integer" => (0i64..1000).prop_map(Value::from).boxed(),
        "number" => (0i64..1000).prop_map(|n| json!(n as f64 / 4.0)).boxed(),
        _ => any::<bool>().prop_map(Value::from).boxed(),
    }
}

/// A primitive leaf with optional nullable, example, and enum.
fn arb_leaf() -> impl Strategy<Value = Value> {
    arb_primitive_type().prop_flat_map(|kind| {
        (
            Just(kind),
            any::<bool>(),
            proptest::option::of(arb_example(kind)),
            proptest::option::of(proptest::collection::vec(arb_example(kind), 1..4)),
        )
            .prop_map(|(kind, nullable, example, values)| {
                let mut schema = Map::new();
                schema.insert("type".into(), json!(kind));
                if nullable {
                    schema.insert("nullable".into(), json!(true));
                }
                if let Some(example) = example {
                    schema.insert("example".into(), example);
                }
                if let Some(values) = values {
                    schema.insert("enum".into(), Value::Array(values));
                }
                Value::Object(schema)
            })
    })
}

/// Objects, arrays, and `oneOf` unions over leaves, a few levels deep.
fn arb_schema() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec((arb_prop_name(), inner.clone()), 1..4).prop_map(|props| {
                let properties: Map<String, Value> = props.into_iter().collect();
                json!({ "type": "object", "properties": properties })
            }),
            inner.clone().prop_map(|items| json!({ "type": "array", "items": items })),
            proptest::collection::vec(inner, 1..3)
                .prop_map(|branches| json!({ "oneOf": branches })),
        ]
    })
}

/// Valid JSON, invalid schema semantics.
fn arb_malformed_schema() -> impl Strategy<Value = Value> {
    let junk = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,5}".prop_map(Value::from),
        Just(json!([])),
        Just(json!({})),
    ];
    let keyword = prop_oneof![
        Just("type"),
        Just("properties"),
        Just("items"),
        Just("required"),
        Just("allOf"),
        Just("anyOf"),
        Just("oneOf"),
        Just("enum"),
        Just("example"),
        Just("examples"),
        Just("default"),
        Just("additionalProperties"),
        Just("nullable"),
        Just("discriminator"),
        Just("$ref"),
    ];
    proptest::collection::vec((keyword, junk), 1..6).prop_map(|pairs| {
        let schema: Map<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Value::Object(schema)
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, ..Default::default() })]

    #[test]
    fn normalize_is_idempotent(schema in arb_schema()) {
        let options = NormalizeOptions::default();
        let once = to_json_schema(&schema, &options);
        let twice = to_json_schema(&once, &options);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_never_panics_on_malformed(schema in arb_malformed_schema()) {
        let _ = to_json_schema(&schema, &NormalizeOptions::default());
    }

    #[test]
    fn normalize_never_leaves_unsupported_keywords(schema in arb_schema()) {
        let result = to_json_schema(&schema, &NormalizeOptions::default());
        let text = result.to_string();
        prop_assert!(!text.contains("\"nullable\""));
        prop_assert!(!text.contains("\"example\""));
    }
}
