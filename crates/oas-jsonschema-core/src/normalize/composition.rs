//! `allOf` merging.
//!
//! Folds the schema's own keywords and every `allOf` branch into one schema.
//! Per-keyword policy:
//!
//! | Keyword                                  | Policy                               |
//! |------------------------------------------|--------------------------------------|
//! | `properties`                             | union, shared names merged recursively |
//! | `required`                               | union (arrays only)                  |
//! | `type`                                   | intersection, empty → conflict       |
//! | `description`                            | last branch wins                     |
//! | `enum`                                   | concatenation                        |
//! | `items`, `additionalProperties`          | recursive merge                      |
//! | `min*` / `max*`                          | tightest bound                       |
//! | `const`, `anyOf`, `oneOf`                | must agree, otherwise conflict       |
//! | `deprecated`, `readOnly`, `writeOnly`, `nullable`, `uniqueItems` | any `true` wins |
//! | everything else (`example`, `format`, `$ref`, `x-*`, ...) | first value wins   |
//!
//! A conflict aborts the whole merge; the driver then drops `allOf` and keeps
//! whatever keywords the schema carried directly.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::pointer::build_path;

/// Structurally incompatible `allOf` branches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("allOf conflict at {path}: {message}")]
pub(crate) struct MergeConflict {
    pub path: String,
    pub message: String,
}

impl MergeConflict {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Merge `allOf` into the surrounding schema.
///
/// The schema's sibling keywords act as the implicit first branch. Branches
/// that are themselves `allOf` compositions are flattened first.
pub(crate) fn merge_all_of(
    mut obj: Map<String, Value>,
) -> Result<Map<String, Value>, MergeConflict> {
    let Some(Value::Array(branches)) = obj.remove("allOf") else {
        return Ok(obj);
    };

    let mut acc = obj;
    for branch in branches {
        let branch = match branch {
            Value::Object(m) if m.get("allOf").is_some_and(Value::is_array) => merge_all_of(m)?,
            Value::Object(m) => m,
            Value::Bool(true) => Map::new(),
            Value::Bool(false) => {
                return Err(MergeConflict::new("", "`false` branch admits no value"))
            }
            other => {
                tracing::debug!(branch = %other, "ignoring non-schema allOf branch");
                continue;
            }
        };
        acc = merge_two(acc, branch, "")?;
    }
    Ok(acc)
}

/// Merge `overlay` into `base`. `base` is the earlier branch.
fn merge_two(
    base: Map<String, Value>,
    overlay: Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, MergeConflict> {
    let mut result = base;

    for (k, v) in overlay {
        match k.as_str() {
            "properties" => merge_properties(&mut result, v, path)?,
            "required" => merge_required(&mut result, v),
            "type" => intersect_type(&mut result, v, path)?,
            "description" => {
                result.insert(k, v);
            }
            "enum" => concat_enum(&mut result, v),
            "items" => merge_schema_keyword(&mut result, "items", v, path)?,
            "additionalProperties" => merge_additional_properties(&mut result, v, path)?,
            "minimum" | "exclusiveMinimum" | "minLength" | "minItems" | "minProperties" => {
                tighten(&mut result, &k, v, |existing, new| new > existing)
            }
            "maximum" | "exclusiveMaximum" | "maxLength" | "maxItems" | "maxProperties" => {
                tighten(&mut result, &k, v, |existing, new| new < existing)
            }
            "const" | "anyOf" | "oneOf" => match result.get(&k) {
                Some(existing) if *existing != v => {
                    return Err(MergeConflict::new(
                        path,
                        format!("incompatible `{k}` values"),
                    ));
                }
                _ => {
                    result.insert(k, v);
                }
            },
            "deprecated" | "readOnly" | "writeOnly" | "nullable" | "uniqueItems" => {
                if v == Value::Bool(true) || !result.contains_key(&k) {
                    result.insert(k, v);
                }
            }
            _ => {
                result.entry(k).or_insert(v);
            }
        }
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Merge helpers
// ---------------------------------------------------------------------------

fn merge_properties(
    result: &mut Map<String, Value>,
    overlay_val: Value,
    path: &str,
) -> Result<(), MergeConflict> {
    let Value::Object(overlay_props) = overlay_val else {
        return Ok(());
    };
    let base_props = result
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(base_map) = base_props.as_object_mut() else {
        return Ok(());
    };
    for (prop_key, prop_val) in overlay_props {
        match (base_map.remove(&prop_key), prop_val) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                let prop_path = build_path(path, &["properties", &prop_key]);
                let merged = merge_two(existing, incoming, &prop_path)?;
                base_map.insert(prop_key, Value::Object(merged));
            }
            (Some(existing), _) => {
                base_map.insert(prop_key, existing);
            }
            (None, incoming) => {
                base_map.insert(prop_key, incoming);
            }
        }
    }
    Ok(())
}

/// Union of `required` arrays. A non-array `required` only fills a gap.
fn merge_required(result: &mut Map<String, Value>, overlay_val: Value) {
    let Value::Array(overlay_arr) = overlay_val else {
        result.entry("required").or_insert(overlay_val);
        return;
    };
    match result.get_mut("required") {
        Some(Value::Array(base_arr)) => {
            for item in overlay_arr {
                if !base_arr.contains(&item) {
                    base_arr.push(item);
                }
            }
        }
        _ => {
            result.insert("required".to_string(), Value::Array(overlay_arr));
        }
    }
}

fn type_list(val: &Value) -> Vec<String> {
    match val {
        Value::String(s) => vec![s.clone()],
        Value::Null => vec!["null".to_string()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => Some("null".to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Intersect `type`, treating `integer` as a subtype of `number`.
fn intersect_type(
    result: &mut Map<String, Value>,
    overlay_val: Value,
    path: &str,
) -> Result<(), MergeConflict> {
    let Some(existing) = result.get("type") else {
        result.insert("type".to_string(), overlay_val);
        return Ok(());
    };

    let base_types = type_list(existing);
    let overlay_types = type_list(&overlay_val);
    if base_types.is_empty() || overlay_types.is_empty() {
        return Ok(());
    }

    let mut intersection: Vec<String> = Vec::new();
    for t in &base_types {
        let narrowed = if overlay_types.contains(t) {
            Some(t.as_str())
        } else if t == "number" && overlay_types.iter().any(|o| o == "integer") {
            Some("integer")
        } else if t == "integer" && overlay_types.iter().any(|o| o == "number") {
            Some("integer")
        } else {
            None
        };
        if let Some(n) = narrowed {
            if !intersection.iter().any(|i| i == n) {
                intersection.push(n.to_string());
            }
        }
    }

    match intersection.len() {
        0 => Err(MergeConflict::new(
            path,
            format!("no common type between {base_types:?} and {overlay_types:?}"),
        )),
        1 => {
            result.insert("type".to_string(), Value::String(intersection.remove(0)));
            Ok(())
        }
        _ => {
            let arr = intersection.into_iter().map(Value::String).collect();
            result.insert("type".to_string(), Value::Array(arr));
            Ok(())
        }
    }
}

/// Enums only hold primitives, so concatenation is always safe. Duplicates
/// are removed later by the driver.
fn concat_enum(result: &mut Map<String, Value>, overlay_val: Value) {
    let Value::Array(overlay_arr) = overlay_val else {
        return;
    };
    match result.get_mut("enum") {
        Some(Value::Array(base_arr)) => base_arr.extend(overlay_arr),
        _ => {
            result.insert("enum".to_string(), Value::Array(overlay_arr));
        }
    }
}

fn tighten(
    result: &mut Map<String, Value>,
    key: &str,
    overlay_val: Value,
    replaces: impl Fn(f64, f64) -> bool,
) {
    if let Some(existing) = result.get(key) {
        if let (Some(base_f), Some(overlay_f)) = (existing.as_f64(), overlay_val.as_f64()) {
            if replaces(base_f, overlay_f) {
                result.insert(key.to_string(), overlay_val);
            }
            return;
        }
    }
    result.insert(key.to_string(), overlay_val);
}

/// Recursive merge for a single-schema keyword; non-object values keep the first.
fn merge_schema_keyword(
    result: &mut Map<String, Value>,
    key: &str,
    overlay_val: Value,
    path: &str,
) -> Result<(), MergeConflict> {
    match (result.remove(key), overlay_val) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            let child_path = build_path(path, &[key]);
            let merged = merge_two(existing, incoming, &child_path)?;
            result.insert(key.to_string(), Value::Object(merged));
        }
        (Some(existing), _) => {
            result.insert(key.to_string(), existing);
        }
        (None, incoming) => {
            result.insert(key.to_string(), incoming);
        }
    }
    Ok(())
}

/// `false` wins, a schema beats `true`, two schemas merge.
fn merge_additional_properties(
    result: &mut Map<String, Value>,
    overlay_val: Value,
    path: &str,
) -> Result<(), MergeConflict> {
    match result.get("additionalProperties") {
        None => {
            result.insert("additionalProperties".to_string(), overlay_val);
            Ok(())
        }
        Some(Value::Bool(false)) => Ok(()),
        Some(Value::Bool(true)) => {
            result.insert("additionalProperties".to_string(), overlay_val);
            Ok(())
        }
        Some(_) if overlay_val == Value::Bool(false) => {
            result.insert("additionalProperties".to_string(), overlay_val);
            Ok(())
        }
        Some(_) => merge_schema_keyword(result, "additionalProperties", overlay_val, path),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
