//! `type` canonicalization.
//!
//! - `nullable: true` (OpenAPI 3.0) becomes a `"null"` member of `type`
//! - a JSON `null` type becomes the string `"null"`
//! - type arrays are deduplicated and single-entry arrays collapse to a scalar
//! - unions mixing `array`/`boolean`/`object` with other types are split into
//!   a `oneOf`, each branch carrying only its own type-specific keywords

use serde_json::{Map, Value};

const ARRAY_KEYWORDS: &[&str] = &[
    "additionalItems",
    "contains",
    "items",
    "maxContains",
    "maxItems",
    "minContains",
    "minItems",
    "prefixItems",
    "uniqueItems",
];

const OBJECT_KEYWORDS: &[&str] = &[
    "additionalProperties",
    "maxProperties",
    "minProperties",
    "nullable",
    "patternProperties",
    "properties",
    "propertyNames",
    "required",
];

const SHARED_KEYWORDS: &[&str] = &[
    "allowEmptyValue",
    "deprecated",
    "description",
    "readOnly",
    "title",
    "writeOnly",
];

const SPLIT_TYPES: &[(&str, &[&str])] = &[
    ("array", ARRAY_KEYWORDS),
    ("boolean", &[]),
    ("object", OBJECT_KEYWORDS),
];

/// Canonicalize `type` in place.
///
/// Returns the `oneOf` branches when the schema had to be split; the caller
/// replaces the schema with `{oneOf: branches}`.
pub(crate) fn canonicalize(obj: &mut Map<String, Value>) -> Option<Vec<Value>> {
    if !obj.contains_key("type") {
        return None;
    }

    if let Some(nullable) = obj.remove("nullable") {
        if nullable == Value::Bool(true) {
            apply_nullable(obj);
        }
    }

    match obj.get("type") {
        Some(Value::Null) => {
            obj.insert("type".to_string(), Value::String("null".to_string()));
            None
        }
        Some(Value::Array(_)) => canonicalize_type_array(obj),
        _ => None,
    }
}

fn apply_nullable(obj: &mut Map<String, Value>) {
    let null = Value::String("null".to_string());
    match obj.get_mut("type") {
        Some(Value::Array(types)) => {
            if !types.contains(&null) && !types.contains(&Value::Null) {
                types.push(null);
            }
        }
        Some(Value::String(t)) if t != "null" => {
            let original = Value::String(std::mem::take(t));
            obj.insert("type".to_string(), Value::Array(vec![original, null]));
        }
        _ => {}
    }
}

fn canonicalize_type_array(obj: &mut Map<String, Value>) -> Option<Vec<Value>> {
    let Some(Value::Array(raw)) = obj.remove("type") else {
        return None;
    };

    let mut types: Vec<String> = Vec::with_capacity(raw.len());
    for t in raw {
        let name = match t {
            Value::String(s) => s,
            Value::Null => "null".to_string(),
            other => {
                tracing::debug!(value = %other, "dropping non-string type entry");
                continue;
            }
        };
        if !types.contains(&name) {
            types.push(name);
        }
    }

    match types.len() {
        0 => return None,
        1 => {
            obj.insert("type".to_string(), Value::String(types.remove(0)));
            return None;
        }
        _ => {}
    }

    let has = |name: &str| types.iter().any(|t| t == name);
    let is_nullable = has("null");
    let needs_split = has("array") || has("boolean") || has("object");
    // `array|null` and `object|null` pass through unsplit. `boolean|null` is
    // kept whole too: its only branch would be the schema itself.
    let single_nullable = types.len() == 2 && is_nullable;

    if !needs_split || single_nullable {
        obj.insert("type".to_string(), string_array(&types));
        return None;
    }

    Some(split_union(obj, types, is_nullable))
}

fn split_union(obj: &mut Map<String, Value>, types: Vec<String>, is_nullable: bool) -> Vec<Value> {
    let mut branches = Vec::new();

    for (type_name, keywords) in SPLIT_TYPES {
        if !types.iter().any(|t| t == type_name) {
            continue;
        }

        let mut reduced = Map::new();
        let branch_type = if is_nullable {
            string_array(&[type_name.to_string(), "null".to_string()])
        } else {
            Value::String(type_name.to_string())
        };
        reduced.insert("type".to_string(), branch_type);
        for key in SHARED_KEYWORDS {
            if let Some(v) = obj.get(*key) {
                reduced.insert(key.to_string(), v.clone());
            }
        }
        for key in *keywords {
            if let Some(v) = obj.remove(*key) {
                reduced.insert(key.to_string(), v);
            }
        }
        branches.push(Value::Object(reduced));
    }

    let remaining: Vec<String> = types
        .into_iter()
        .filter(|t| !matches!(t.as_str(), "array" | "boolean" | "object"))
        .collect();

    // Every branch already admits null, so a base schema of just `null` adds nothing.
    let only_null = remaining.len() == 1 && remaining[0] == "null" && !branches.is_empty();
    if remaining.is_empty() || only_null {
        return branches;
    }

    let base_type = if remaining.len() == 1 {
        Value::String(remaining[0].clone())
    } else {
        string_array(&remaining)
    };
    obj.insert("type".to_string(), base_type);

    let mut all = Vec::with_capacity(branches.len() + 1);
    all.push(Value::Object(std::mem::take(obj)));
    all.extend(branches);
    all
}

fn string_array(types: &[String]) -> Value {
    Value::Array(types.iter().cloned().map(Value::String).collect())
}
