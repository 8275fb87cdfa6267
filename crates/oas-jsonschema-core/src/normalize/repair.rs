//! Best-effort repair of malformed schema fragments.
//!
//! Nothing here fails: a fragment that cannot be understood is left alone
//! for downstream consumers to tolerate.

use serde_json::{Map, Value};

use super::kind::SchemaKind;

/// Infer a missing `type` from the keywords present.
///
/// `properties` implies `object`, `items` implies `array`. Compositions and
/// request-body wrappers are never typed here. Does not recurse.
pub(crate) fn infer_missing_type(obj: &mut Map<String, Value>) {
    if SchemaKind::classify(obj) != SchemaKind::Untyped {
        return;
    }

    let inferred = if obj.contains_key("properties") {
        "object"
    } else if obj.contains_key("items") {
        "array"
    } else {
        return;
    };

    tracing::debug!(inferred, "inferred missing schema type");
    obj.insert("type".to_string(), Value::String(inferred.to_string()));
}

/// Outcome of checking an `array`-typed schema for a usable `items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArrayRepair {
    /// `items` is present; nothing to repair.
    Intact,
    /// `properties`/`additionalProperties` were given instead of `items`: the
    /// schema was meant to be an object and has been retyped.
    RetypedAsObject,
    /// No `items` at all: an empty `items` schema was added.
    AddedEmptyItems,
}

pub(crate) fn repair_array(obj: &mut Map<String, Value>) -> ArrayRepair {
    if obj.contains_key("items") {
        return ArrayRepair::Intact;
    }

    if obj.contains_key("properties") || obj.contains_key("additionalProperties") {
        tracing::debug!("array schema declares properties, retyping as object");
        obj.insert("type".to_string(), Value::String("object".to_string()));
        return ArrayRepair::RetypedAsObject;
    }

    obj.insert("items".to_string(), Value::Object(Map::new()));
    ArrayRepair::AddedEmptyItems
}

/// Drop a `required` that is not an array (only object properties may carry
/// the OpenAPI-style boolean form, and those are promoted separately).
pub(crate) fn strip_non_array_required(value: &mut Value) {
    if let Some(obj) = value.as_object_mut() {
        if obj.get("required").is_some_and(|r| !r.is_array()) {
            obj.remove("required");
        }
    }
}
