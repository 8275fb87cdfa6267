//! OpenAPI schema → JSON Schema normalization.
//!
//! [`Normalizer::normalize`] walks a schema tree and, per node:
//!
//! 1. returns bare `$ref`s (circular after dereferencing) untouched
//! 2. merges `allOf`, dropping it on conflict
//! 3. normalizes `anyOf`/`oneOf` branches, inlining sibling `properties`/`items`
//! 4. reports discriminator mapping refs
//! 5. infers a missing `type`
//! 6. canonicalizes `type`/`nullable`, splitting mixed unions into `oneOf`
//! 7. reshapes examples and backfills leaf examples from ancestors
//! 8. normalizes array `items`
//! 9. normalizes object `properties`/`additionalProperties`
//! 10. injects caller-supplied global defaults
//! 11. applies the `default` policy
//! 12. backfills leaf defaults from ancestors
//! 13. deduplicates `enum`
//! 14. drops `properties`/`items` left beside `anyOf`/`oneOf`
//! 15. strips keywords JSON Schema does not know
//! 16. hides read-only/write-only nodes when asked
//! 17. applies the caller's transformer
//!
//! Nothing in here fails. Malformed fragments are repaired or dropped and the
//! repair is logged at `debug`.

pub(crate) mod ancestors;
pub(crate) mod composition;
pub(crate) mod examples;
pub(crate) mod kind;
pub(crate) mod repair;
pub(crate) mod types;

use serde_json::{Map, Value};

use crate::config::NormalizeOptions;
use crate::pointer::{self, build_path};

use ancestors::{search_by_pointer, AncestorChain, AncestorProp};
use kind::{has_schema_type, is_polymorphic, is_primitive, is_ref, is_schema, is_truthy, SchemaKind};
use repair::ArrayRepair;

/// What kind of reference a [`RefLogger`] is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// A `$ref` left in place (circular after dereferencing).
    Ref,
    /// A `$ref` that only appears as a `discriminator.mapping` target.
    Discriminator,
}

/// Receives every reference the normalizer leaves unexpanded.
pub trait RefLogger {
    fn log(&mut self, reference: &str, kind: RefKind);
}

impl<F> RefLogger for F
where
    F: FnMut(&str, RefKind),
{
    fn log(&mut self, reference: &str, kind: RefKind) {
        self(reference, kind)
    }
}

/// Records which kinds of reference were seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefTracker {
    pub has_circular_refs: bool,
    pub has_discriminator_mapping_refs: bool,
}

impl RefTracker {
    pub fn record(&mut self, _reference: &str, kind: RefKind) {
        match kind {
            RefKind::Ref => self.has_circular_refs = true,
            RefKind::Discriminator => self.has_discriminator_mapping_refs = true,
        }
    }
}

/// Keywords that survive on a `$ref` node returned as-is.
const REF_ANNOTATIONS: &[&str] = &["description", "deprecated", "title", "readOnly", "writeOnly"];

/// Keywords with no JSON Schema meaning, always stripped.
const UNSUPPORTED_KEYWORDS: &[&str] = &["example", "externalDocs", "xml", "nullable"];

/// An `additionalProperties` schema without any of these accepts anything.
const CONSTRAINING_KEYWORDS: &[&str] = &[
    "type",
    "$ref",
    "allOf",
    "anyOf",
    "oneOf",
    "properties",
    "items",
    "enum",
    "additionalProperties",
];

/// Per-node traversal state. Cloning is cheap: the chains share their tails.
#[derive(Debug, Clone)]
struct Scope {
    location: String,
    examples: AncestorChain,
    defaults: AncestorChain,
    polymorphic_all_of_child: bool,
}

impl Scope {
    fn child(&self, location: String) -> Self {
        Self {
            location,
            examples: self.examples.clone(),
            defaults: self.defaults.clone(),
            polymorphic_all_of_child: false,
        }
    }
}

/// Schema normalizer with optional hooks.
///
/// ```
/// use oas_jsonschema_core::{NormalizeOptions, Normalizer};
/// use serde_json::json;
///
/// let schema = json!({ "type": "string", "nullable": true, "example": "dog" });
/// let normalized = Normalizer::new(NormalizeOptions::default()).normalize(&schema);
/// assert_eq!(normalized, json!({ "type": ["string", "null"], "examples": ["dog"] }));
/// ```
pub struct Normalizer<'a> {
    options: NormalizeOptions,
    global_defaults: Value,
    ref_logger: Option<&'a mut dyn RefLogger>,
    transformer: Option<&'a dyn Fn(Value) -> Value>,
}

impl<'a> Normalizer<'a> {
    pub fn new(options: NormalizeOptions) -> Self {
        let global_defaults = Value::Object(options.global_defaults.clone());
        Self {
            options,
            global_defaults,
            ref_logger: None,
            transformer: None,
        }
    }

    pub fn with_ref_logger(mut self, logger: &'a mut dyn RefLogger) -> Self {
        self.ref_logger = Some(logger);
        self
    }

    /// Hook applied to every normalized node before it is returned.
    pub fn with_transformer(mut self, transformer: &'a dyn Fn(Value) -> Value) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Normalize `schema`. The input is never modified.
    pub fn normalize(&mut self, schema: &Value) -> Value {
        let scope = Scope {
            location: self.options.current_location.clone(),
            examples: AncestorChain::from_seeds(&self.options.prev_example_schemas),
            defaults: AncestorChain::from_seeds(&self.options.prev_default_schemas),
            polymorphic_all_of_child: self.options.is_polymorphic_all_of_child,
        };
        self.normalize_node(schema, &scope)
    }

    fn log_ref(&mut self, reference: &str, kind: RefKind) {
        tracing::debug!(reference, ?kind, "leaving reference unexpanded");
        if let Some(logger) = self.ref_logger.as_mut() {
            logger.log(reference, kind);
        }
    }

    fn transform(&self, value: Value) -> Value {
        match self.transformer {
            Some(transform) => transform(value),
            None => value,
        }
    }

    /// Normalize one node, then apply the transformer to it.
    fn normalize_node(&mut self, schema: &Value, scope: &Scope) -> Value {
        let value = self.normalize_untransformed(schema, scope);
        self.transform(value)
    }

    /// Steps 1 to 16. Children come back transformed; this node does not.
    fn normalize_untransformed(&mut self, schema: &Value, scope: &Scope) -> Value {
        let mut obj = match schema {
            Value::Object(map) => map.clone(),
            Value::Bool(true) => Map::new(),
            Value::Bool(false) => return Value::Bool(false),
            other => {
                tracing::debug!(location = %scope.location, value = %other, "replacing non-schema value with {{}}");
                Map::new()
            }
        };
        tracing::trace!(location = %scope.location, "normalizing schema");

        // 1. Bare `$ref`.
        if SchemaKind::classify(&obj) == SchemaKind::Ref {
            return self.keep_ref(obj);
        }

        // 2. allOf.
        if obj.contains_key("allOf") {
            obj = match composition::merge_all_of(obj.clone()) {
                Ok(merged) => merged,
                Err(conflict) => {
                    tracing::debug!(location = %scope.location, %conflict, "dropping allOf");
                    obj.remove("allOf");
                    obj
                }
            };
            if is_ref(&obj) {
                return self.keep_ref(obj);
            }
        }

        // 3. anyOf / oneOf.
        self.normalize_alternatives(&mut obj, scope);

        // 4. Discriminator mapping refs.
        if let Some(mapping) = obj
            .get("discriminator")
            .and_then(|d| d.get("mapping"))
            .and_then(Value::as_object)
        {
            let targets: Vec<String> = mapping
                .values()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            for target in targets {
                self.log_ref(&target, RefKind::Discriminator);
            }
        }

        // 5. Missing type.
        if !scope.polymorphic_all_of_child {
            repair::infer_missing_type(&mut obj);
        }

        // 6. Type canonicalization; a split replaces this node.
        if let Some(branches) = types::canonicalize(&mut obj) {
            let one_of: Vec<Value> = branches
                .iter()
                .map(|branch| self.normalize_node(branch, scope))
                .collect();
            let mut wrapper = Map::new();
            wrapper.insert("oneOf".to_string(), Value::Array(one_of));
            return Value::Object(wrapper);
        }

        // 7. Examples.
        let reshaped = examples::reshape(&mut obj);
        for reference in &reshaped.circular_refs {
            self.log_ref(reference, RefKind::Ref);
        }
        let mut example_chain = scope.examples.clone();
        for fragment in reshaped.deferred {
            example_chain = example_chain.push(fragment);
        }
        if is_leaf(&obj, scope) && !obj.contains_key("examples") {
            if let Some(found) = search_by_pointer(AncestorProp::Example, &scope.location, &example_chain)
            {
                if !found.is_null() && examples::is_promotable_example(&found) {
                    obj.insert("examples".to_string(), Value::Array(vec![found]));
                }
            }
        }

        let mut default_chain = scope.defaults.clone();
        if let Some(default @ Value::Object(_)) = obj.get("default") {
            let mut fragment = Map::new();
            fragment.insert("default".to_string(), default.clone());
            default_chain = default_chain.push(Value::Object(fragment));
        }
        let child_scope = Scope {
            location: scope.location.clone(),
            examples: example_chain,
            defaults: default_chain,
            polymorphic_all_of_child: false,
        };

        // 8. Arrays.
        let mut treat_as_object = has_schema_type(&obj, "object");
        if has_schema_type(&obj, "array") {
            match repair::repair_array(&mut obj) {
                ArrayRepair::RetypedAsObject => treat_as_object = true,
                ArrayRepair::Intact | ArrayRepair::AddedEmptyItems => {
                    if let Some(found) = backfilled_default(&obj, scope) {
                        obj.insert("default".to_string(), found);
                    }
                    let mut items_scope = child_scope.clone();
                    if obj.get("default").is_some_and(Value::is_array) {
                        // An array default already covers its items.
                        items_scope.defaults = AncestorChain::default();
                    }
                    self.normalize_items(&mut obj, &items_scope)
                }
            }
        }

        // 9. Objects.
        if treat_as_object && self.normalize_object(&mut obj, &child_scope) == ObjectOutcome::Emptied {
            return Value::Object(Map::new());
        }

        // 10. Global defaults.
        if !scope.location.is_empty() {
            if let Ok(Some(value)) = pointer::get(&self.global_defaults, &scope.location) {
                if is_truthy(value) {
                    obj.insert("default".to_string(), value.clone());
                }
            }
        }

        // 11. Default policy.
        let allow_empty_value = obj.get("allowEmptyValue") == Some(&Value::Bool(true));
        let drop_default = match obj.get("default") {
            Some(_) if has_schema_type(&obj, "object") => true,
            Some(Value::String(s)) => s.is_empty() && !allow_empty_value,
            _ => false,
        };
        if drop_default {
            obj.remove("default");
        }

        // 12. Default backfill.
        if let Some(found) = backfilled_default(&obj, scope) {
            obj.insert("default".to_string(), found);
        }

        // 13. enum.
        dedup_enum(&mut obj);
        if self.options.add_enums_to_descriptions {
            add_enum_to_description(&mut obj);
        }

        // 14. Leftovers beside alternatives.
        if obj.contains_key("anyOf") || obj.contains_key("oneOf") {
            obj.remove("properties");
            obj.remove("items");
        }

        // 15. Unsupported keywords.
        for key in UNSUPPORTED_KEYWORDS {
            obj.remove(*key);
        }

        // 16. Hidden nodes.
        if self.is_hidden(&obj) {
            return Value::Object(Map::new());
        }

        Value::Object(obj)
    }

    fn keep_ref(&mut self, obj: Map<String, Value>) -> Value {
        let mut kept = Map::new();
        if let Some(reference) = obj.get("$ref") {
            if let Some(s) = reference.as_str() {
                self.log_ref(s, RefKind::Ref);
            }
            kept.insert("$ref".to_string(), reference.clone());
        }
        for key in REF_ANNOTATIONS {
            if let Some(v) = obj.get(*key) {
                kept.insert(key.to_string(), v.clone());
            }
        }
        Value::Object(kept)
    }

    fn normalize_alternatives(&mut self, obj: &mut Map<String, Value>, scope: &Scope) {
        let discriminated = obj
            .get("discriminator")
            .and_then(|d| d.get("propertyName"))
            .is_some();

        for key in ["anyOf", "oneOf"] {
            let branches = match obj.remove(key) {
                Some(Value::Array(branches)) => branches,
                Some(other) => {
                    tracing::debug!(keyword = key, value = %other, "dropping non-array composition");
                    continue;
                }
                None => continue,
            };

            let mut normalized = Vec::with_capacity(branches.len());
            for (idx, branch) in branches.into_iter().enumerate() {
                let branch = inline_siblings(obj, branch);
                let child = scope.child(build_path(&scope.location, &[&idx.to_string()]));
                let mut result = self.normalize_node(&branch, &child);
                repair::strip_non_array_required(&mut result);
                if discriminated {
                    if let Some(child_obj) = result.as_object_mut() {
                        child_obj.remove("discriminator");
                        child_obj.remove("oneOf");
                        child_obj.remove("anyOf");
                    }
                }
                normalized.push(result);
            }
            obj.insert(key.to_string(), Value::Array(normalized));
        }
    }

    fn normalize_items(&mut self, obj: &mut Map<String, Value>, scope: &Scope) {
        let Some(items) = obj.get("items") else {
            return;
        };

        let normalized = match items {
            Value::Object(item) if item.len() == 1 && is_ref(item) => {
                if let Some(reference) = item.get("$ref").and_then(Value::as_str) {
                    let reference = reference.to_string();
                    self.log_ref(&reference, RefKind::Ref);
                }
                return;
            }
            Value::Array(tuple) => {
                let tuple = tuple.clone();
                let normalized: Vec<Value> = tuple
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        let child = scope.child(build_path(&scope.location, &[&idx.to_string()]));
                        let mut result = self.normalize_node(item, &child);
                        repair::strip_non_array_required(&mut result);
                        result
                    })
                    .collect();
                Value::Array(normalized)
            }
            item => {
                let item = item.clone();
                let child = scope.child(build_path(&scope.location, &["0"]));
                let mut result = self.normalize_node(&item, &child);
                repair::strip_non_array_required(&mut result);
                result
            }
        };
        obj.insert("items".to_string(), normalized);
    }

    fn normalize_object(&mut self, obj: &mut Map<String, Value>, scope: &Scope) -> ObjectOutcome {
        let hiding =
            self.options.hide_read_only_properties || self.options.hide_write_only_properties;

        if let Some(properties) = obj.remove("properties") {
            let Value::Object(properties) = properties else {
                tracing::debug!(location = %scope.location, "dropping non-object properties");
                return self.finish_object(obj, scope);
            };
            let had_properties = !properties.is_empty();

            let mut normalized = Map::new();
            let mut promoted = Vec::new();
            let mut hidden = Vec::new();
            for (name, mut property) in properties {
                if let Some(prop) = property.as_object_mut() {
                    match prop.get("required") {
                        Some(Value::Bool(true)) => {
                            promoted.push(name.clone());
                            prop.remove("required");
                        }
                        Some(Value::Bool(false)) => {
                            prop.remove("required");
                        }
                        _ => {}
                    }
                }
                let originally_non_empty = property.as_object().is_some_and(|p| !p.is_empty());

                let child = scope.child(build_path(&scope.location, &[&name]));
                let result = self.normalize_untransformed(&property, &child);
                if hiding && originally_non_empty && result.as_object().is_some_and(Map::is_empty) {
                    tracing::trace!(property = %name, "hiding property");
                    hidden.push(name);
                    continue;
                }
                normalized.insert(name, self.transform(result));
            }

            if hiding && had_properties && normalized.is_empty() {
                return ObjectOutcome::Emptied;
            }
            obj.insert("properties".to_string(), Value::Object(normalized));

            if !promoted.is_empty() {
                if !obj.get("required").is_some_and(Value::is_array) {
                    obj.insert("required".to_string(), Value::Array(Vec::new()));
                }
                if let Some(Value::Array(required)) = obj.get_mut("required") {
                    for name in promoted {
                        let name = Value::String(name);
                        if !required.contains(&name) {
                            required.push(name);
                        }
                    }
                }
            }
            if !hidden.is_empty() {
                if let Some(Value::Array(required)) = obj.get_mut("required") {
                    required.retain(|r| !r.as_str().is_some_and(|r| hidden.iter().any(|h| h == r)));
                }
            }
        }

        self.finish_object(obj, scope)
    }

    fn finish_object(&mut self, obj: &mut Map<String, Value>, scope: &Scope) -> ObjectOutcome {
        let extra = match obj.get("additionalProperties") {
            Some(Value::Object(extra)) if extra.is_empty() => Extra::AcceptAll,
            Some(Value::Object(extra)) if is_polymorphic(extra) => Extra::Untouched,
            Some(Value::Object(extra)) if extra.len() == 1 && is_ref(extra) => {
                Extra::Ref(extra.get("$ref").and_then(Value::as_str).unwrap_or_default().to_string())
            }
            Some(Value::Object(extra))
                if !CONSTRAINING_KEYWORDS.iter().any(|k| extra.contains_key(*k)) =>
            {
                Extra::AcceptAll
            }
            Some(extra @ Value::Object(_)) => Extra::Schema(extra.clone()),
            _ => Extra::Untouched,
        };

        match extra {
            Extra::AcceptAll => {
                obj.insert("additionalProperties".to_string(), Value::Bool(true));
            }
            Extra::Ref(reference) => self.log_ref(&reference, RefKind::Ref),
            Extra::Schema(schema) => {
                let result = self.normalize_node(&schema, &scope.child(scope.location.clone()));
                obj.insert("additionalProperties".to_string(), result);
            }
            Extra::Untouched => {}
        }

        if !obj.contains_key("properties")
            && !obj.contains_key("additionalProperties")
            && !is_polymorphic(obj)
        {
            obj.insert("additionalProperties".to_string(), Value::Bool(true));
        }
        ObjectOutcome::Kept
    }

    fn is_hidden(&self, obj: &Map<String, Value>) -> bool {
        let flagged = |key: &str| obj.get(key) == Some(&Value::Bool(true));
        (self.options.hide_read_only_properties && flagged("readOnly"))
            || (self.options.hide_write_only_properties && flagged("writeOnly"))
    }
}

/// What to do with an object's `additionalProperties`.
enum Extra {
    AcceptAll,
    Ref(String),
    Schema(Value),
    Untouched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectOutcome {
    Kept,
    /// Every property was hidden; the whole object collapses to `{}`.
    Emptied,
}

/// Normalize with default hooks. Shorthand for [`Normalizer::normalize`].
pub fn to_json_schema(schema: &Value, options: &NormalizeOptions) -> Value {
    Normalizer::new(options.clone()).normalize(schema)
}

/// Reverse-search the default ancestors for a value this schema may take:
/// `null`, an array for array schemas, or a primitive for the rest.
fn backfilled_default(obj: &Map<String, Value>, scope: &Scope) -> Option<Value> {
    if obj.contains_key("default")
        || !is_schema(obj, scope.polymorphic_all_of_child)
        || is_polymorphic(obj)
        || has_schema_type(obj, "object")
    {
        return None;
    }
    let found = search_by_pointer(AncestorProp::Default, &scope.location, &scope.defaults)?;
    let array_schema = has_schema_type(obj, "array");
    let acceptable = match &found {
        Value::Null => true,
        Value::Array(_) => array_schema,
        Value::String(s) if s.is_empty() => {
            !array_schema && obj.get("allowEmptyValue") == Some(&Value::Bool(true))
        }
        other => !array_schema && is_primitive(other),
    };
    acceptable.then_some(found)
}

/// A primitive leaf that may receive a backfilled example.
fn is_leaf(obj: &Map<String, Value>, scope: &Scope) -> bool {
    is_schema(obj, scope.polymorphic_all_of_child)
        && !is_polymorphic(obj)
        && !has_schema_type(obj, "array")
        && !has_schema_type(obj, "object")
}

/// Wrap a branch as `allOf: [branch, {properties}]` (or `{items}`) when its
/// parent declares those beside `anyOf`/`oneOf`.
fn inline_siblings(parent: &Map<String, Value>, branch: Value) -> Value {
    let sibling = if let Some(properties) = parent.get("properties") {
        ("properties", properties)
    } else if let Some(items) = parent.get("items") {
        ("items", items)
    } else {
        return branch;
    };

    let mut inlined = Map::new();
    inlined.insert(sibling.0.to_string(), sibling.1.clone());

    let mut wrapper = Map::new();
    if sibling.0 == "properties" {
        if let Some(required @ Value::Array(_)) = parent.get("required") {
            wrapper.insert("required".to_string(), required.clone());
        }
    }
    wrapper.insert(
        "allOf".to_string(),
        Value::Array(vec![branch, Value::Object(inlined)]),
    );
    Value::Object(wrapper)
}

fn dedup_enum(obj: &mut Map<String, Value>) {
    if let Some(Value::Array(values)) = obj.get_mut("enum") {
        let mut seen: Vec<Value> = Vec::with_capacity(values.len());
        values.retain(|v| {
            if seen.contains(v) {
                false
            } else {
                seen.push(v.clone());
                true
            }
        });
    }
}

fn add_enum_to_description(obj: &mut Map<String, Value>) {
    let Some(Value::Array(values)) = obj.get("enum") else {
        return;
    };
    let bullets: Vec<String> = values
        .iter()
        .filter(|v| is_truthy(v))
        .map(|v| match v {
            Value::String(s) => format!("- `{s}`"),
            other => format!("- `{other}`"),
        })
        .collect();
    if bullets.is_empty() {
        return;
    }

    let list = bullets.join("\n");
    let description = match obj.get("description").and_then(Value::as_str) {
        Some(existing) if !existing.is_empty() => format!("{existing}\n\n{list}"),
        _ => list,
    };
    obj.insert("description".to_string(), Value::String(description));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn normalize(schema: Value) -> Value {
        to_json_schema(&schema, &NormalizeOptions::default())
    }

    fn normalize_with(schema: Value, options: NormalizeOptions) -> Value {
        to_json_schema(&schema, &options)
    }

    #[test]
    fn test_boolean_schemas() {
        assert_eq!(normalize(json!(true)), json!({}));
        assert_eq!(normalize(json!(false)), json!(false));
        assert_eq!(normalize(json!("junk")), json!({}));
    }

    #[test]
    fn test_bare_ref_keeps_annotations() {
        let mut seen = Vec::new();
        let mut logger = |r: &str, kind: RefKind| seen.push((r.to_string(), kind));
        let schema = json!({
            "$ref": "#/components/schemas/Pet",
            "description": "the pet",
            "example": "ignored"
        });
        let result = Normalizer::new(NormalizeOptions::default())
            .with_ref_logger(&mut logger)
            .normalize(&schema);
        assert_eq!(
            result,
            json!({ "$ref": "#/components/schemas/Pet", "description": "the pet" })
        );
        assert_eq!(seen, vec![("#/components/schemas/Pet".to_string(), RefKind::Ref)]);
    }

    #[test]
    fn test_all_of_merge() {
        let result = normalize(json!({
            "allOf": [
                { "type": "object" },
                { "type": "object", "properties": { "a": { "type": "string" } } }
            ]
        }));
        assert_eq!(
            result,
            json!({ "type": "object", "properties": { "a": { "type": "string" } } })
        );
    }

    #[test]
    fn test_all_of_conflict_drops_all_of() {
        let result = normalize(json!({
            "description": "kept",
            "allOf": [{ "type": "string" }, { "type": "object" }]
        }));
        assert_eq!(result, json!({ "description": "kept" }));
    }

    #[test]
    fn test_all_of_collapsing_to_ref_is_returned() {
        let result = normalize(json!({
            "allOf": [{ "$ref": "#/components/schemas/A" }, { "$ref": "#/components/schemas/A" }],
            "description": "loop"
        }));
        assert_eq!(
            result,
            json!({ "$ref": "#/components/schemas/A", "description": "loop" })
        );
    }

    #[test]
    fn test_one_of_inlines_sibling_properties() {
        let result = normalize(json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "integer" } },
            "oneOf": [
                { "type": "object", "properties": { "a": { "type": "string" } } },
                { "type": "object", "properties": { "b": { "type": "string" } } }
            ]
        }));
        assert_eq!(
            result,
            json!({
                "type": "object",
                "required": ["id"],
                "oneOf": [
                    {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "a": { "type": "string" },
                            "id": { "type": "integer" }
                        }
                    },
                    {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "b": { "type": "string" },
                            "id": { "type": "integer" }
                        }
                    }
                ]
            })
        );
    }

    #[test]
    fn test_discriminator_children_stripped_and_mapping_logged() {
        let mut tracker = RefTracker::default();
        let mut logger = |r: &str, kind: RefKind| tracker.record(r, kind);
        let result = Normalizer::new(NormalizeOptions::default())
            .with_ref_logger(&mut logger)
            .normalize(&json!({
                "discriminator": {
                    "propertyName": "kind",
                    "mapping": { "cat": "#/components/schemas/Cat" }
                },
                "oneOf": [{
                    "type": "object",
                    "properties": { "kind": { "type": "string" } },
                    "discriminator": { "propertyName": "kind" }
                }]
            }));
        assert_eq!(
            result["oneOf"][0],
            json!({ "type": "object", "properties": { "kind": { "type": "string" } } })
        );
        assert!(tracker.has_discriminator_mapping_refs);
        assert!(!tracker.has_circular_refs);
    }

    #[test]
    fn test_mixed_union_split() {
        let result = normalize(json!({
            "type": ["string", "object"],
            "properties": { "a": { "type": "string" } }
        }));
        assert_eq!(
            result,
            json!({
                "oneOf": [
                    { "type": "string" },
                    { "type": "object", "properties": { "a": { "type": "string" } } }
                ]
            })
        );
    }

    #[test]
    fn test_nested_example_backfill() {
        let result = normalize(json!({
            "type": "object",
            "example": { "id": 10, "tags": { "name": "good" } },
            "properties": {
                "id": { "type": "integer" },
                "tags": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                }
            }
        }));
        assert_eq!(result["properties"]["id"]["examples"], json!([10]));
        assert_eq!(
            result["properties"]["tags"]["properties"]["name"]["examples"],
            json!(["good"])
        );
        assert!(result.get("example").is_none());
    }

    #[test]
    fn test_own_example_wins_over_ancestor() {
        let result = normalize(json!({
            "type": "object",
            "example": { "id": 10 },
            "properties": { "id": { "type": "integer", "example": 5 } }
        }));
        assert_eq!(result["properties"]["id"]["examples"], json!([5]));
    }

    #[test]
    fn test_seeded_example_ancestors() {
        let options = NormalizeOptions {
            current_location: "/petId".into(),
            prev_example_schemas: vec![json!({ "example": { "petId": 7 } })],
            ..NormalizeOptions::default()
        };
        let result = normalize_with(json!({ "type": "integer" }), options);
        assert_eq!(result, json!({ "type": "integer", "examples": [7] }));
    }

    #[test]
    fn test_array_repairs() {
        assert_eq!(
            normalize(json!({ "type": "array" })),
            json!({ "type": "array", "items": {} })
        );
        assert_eq!(
            normalize(json!({ "type": "array", "properties": { "a": { "type": "string" } } })),
            json!({ "type": "object", "properties": { "a": { "type": "string" } } })
        );
    }

    #[test]
    fn test_items_ref_left_alone_and_required_stripped() {
        let result = normalize(json!({ "type": "array", "items": { "$ref": "#/x" } }));
        assert_eq!(result, json!({ "type": "array", "items": { "$ref": "#/x" } }));

        let result = normalize(json!({
            "type": "array",
            "items": { "type": "string", "required": true }
        }));
        assert_eq!(result, json!({ "type": "array", "items": { "type": "string" } }));
    }

    #[test]
    fn test_required_boolean_promoted() {
        let result = normalize(json!({
            "type": "object",
            "properties": {
                "a": { "type": "string", "required": true },
                "b": { "type": "string", "required": false }
            }
        }));
        assert_eq!(
            result,
            json!({
                "type": "object",
                "properties": { "a": { "type": "string" }, "b": { "type": "string" } },
                "required": ["a"]
            })
        );
    }

    #[test]
    fn test_object_gets_additional_properties() {
        assert_eq!(
            normalize(json!({ "type": "object" })),
            json!({ "type": "object", "additionalProperties": true })
        );
        assert_eq!(
            normalize(json!({ "type": "object", "additionalProperties": {} })),
            json!({ "type": "object", "additionalProperties": true })
        );
        assert_eq!(
            normalize(json!({
                "type": "object",
                "additionalProperties": { "description": "anything" }
            })),
            json!({ "type": "object", "additionalProperties": true })
        );
        assert_eq!(
            normalize(json!({
                "type": "object",
                "additionalProperties": { "type": "integer", "example": 3 }
            })),
            json!({
                "type": "object",
                "additionalProperties": { "type": "integer", "examples": [3] }
            })
        );
    }

    #[test]
    fn test_polymorphic_additional_properties_untouched() {
        let extra = json!({
            "oneOf": [{ "type": "string", "nullable": true }, { "type": "integer" }]
        });
        assert_eq!(
            normalize(json!({ "type": "object", "additionalProperties": extra.clone() })),
            json!({ "type": "object", "additionalProperties": extra })
        );
    }

    #[test]
    fn test_hide_read_only() {
        let options = NormalizeOptions {
            hide_read_only_properties: true,
            ..NormalizeOptions::default()
        };
        let result = normalize_with(
            json!({
                "type": "object",
                "required": ["id", "name"],
                "properties": {
                    "id": { "type": "integer", "readOnly": true },
                    "name": { "type": "string" },
                    "any": {}
                }
            }),
            options.clone(),
        );
        assert_eq!(
            result,
            json!({
                "type": "object",
                "required": ["name"],
                "properties": { "name": { "type": "string" }, "any": {} }
            })
        );

        let all_hidden = normalize_with(
            json!({
                "type": "object",
                "properties": { "id": { "type": "integer", "readOnly": true } }
            }),
            options,
        );
        assert_eq!(all_hidden, json!({}));
    }

    #[test]
    fn test_global_defaults() {
        let mut defaults = Map::new();
        defaults.insert("petId".into(), json!(4));
        defaults.insert("empty".into(), json!(""));
        let options = NormalizeOptions {
            global_defaults: defaults,
            ..NormalizeOptions::default()
        };
        let result = normalize_with(
            json!({
                "type": "object",
                "properties": {
                    "petId": { "type": "integer" },
                    "empty": { "type": "string", "default": "x" }
                }
            }),
            options,
        );
        assert_eq!(result["properties"]["petId"]["default"], json!(4));
        assert_eq!(result["properties"]["empty"]["default"], json!("x"));
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(
            normalize(json!({ "type": "string", "default": "" })),
            json!({ "type": "string" })
        );
        assert_eq!(
            normalize(json!({ "type": "string", "default": "", "allowEmptyValue": true })),
            json!({ "type": "string", "default": "", "allowEmptyValue": true })
        );
    }

    #[test]
    fn test_default_backfill_from_object_default() {
        let result = normalize(json!({
            "type": "object",
            "default": { "limit": 20, "filter": { "q": "x" } },
            "properties": {
                "limit": { "type": "integer" },
                "filter": { "type": "object", "properties": { "q": { "type": "string" } } }
            }
        }));
        assert!(result.get("default").is_none());
        assert_eq!(result["properties"]["limit"]["default"], json!(20));
        assert!(result["properties"]["filter"].get("default").is_none());
        assert_eq!(
            result["properties"]["filter"]["properties"]["q"]["default"],
            json!("x")
        );
    }

    #[test]
    fn test_enum_dedup_and_description() {
        assert_eq!(
            normalize(json!({ "type": "string", "enum": ["a", "a", "b"] })),
            json!({ "type": "string", "enum": ["a", "b"] })
        );

        let options = NormalizeOptions {
            add_enums_to_descriptions: true,
            ..NormalizeOptions::default()
        };
        let result = normalize_with(
            json!({ "type": "string", "description": "Status.", "enum": ["on", "", "off"] }),
            options,
        );
        assert_eq!(result["description"], json!("Status.\n\n- `on`\n- `off`"));
    }

    #[test]
    fn test_unsupported_keywords_stripped() {
        let result = normalize(json!({
            "type": "string",
            "xml": { "name": "x" },
            "externalDocs": { "url": "https://example.com" },
            "deprecated": true
        }));
        assert_eq!(result, json!({ "type": "string", "deprecated": true }));
    }

    #[test]
    fn test_transformer_applies_to_every_node() {
        let tag = |mut value: Value| {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("x-seen".into(), json!(true));
            }
            value
        };
        let result = Normalizer::new(NormalizeOptions::default())
            .with_transformer(&tag)
            .normalize(&json!({
                "type": "object",
                "properties": { "a": { "type": "string" } }
            }));
        assert_eq!(result["x-seen"], json!(true));
        assert_eq!(result["properties"]["a"]["x-seen"], json!(true));
    }

    #[test]
    fn test_transformer_applies_to_refs_and_hidden_nodes() {
        let tag = |mut value: Value| {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("x-seen".into(), json!(true));
            }
            value
        };
        let options = NormalizeOptions {
            hide_read_only_properties: true,
            ..NormalizeOptions::default()
        };

        let result = Normalizer::new(options.clone())
            .with_transformer(&tag)
            .normalize(&json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "readOnly": true },
                    "parent": { "$ref": "#/components/schemas/Node" },
                    "name": { "type": "string" }
                }
            }));
        assert_eq!(
            result["properties"],
            json!({
                "parent": { "$ref": "#/components/schemas/Node", "x-seen": true },
                "name": { "type": "string", "x-seen": true }
            })
        );

        let emptied = Normalizer::new(options)
            .with_transformer(&tag)
            .normalize(&json!({
                "type": "object",
                "properties": { "id": { "type": "string", "readOnly": true } }
            }));
        assert_eq!(emptied, json!({ "x-seen": true }));
    }

    #[test]
    fn test_array_default_backfilled_onto_array_not_items() {
        let result = normalize(json!({
            "type": "object",
            "default": { "tags": ["a", "b"] },
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));
        assert_eq!(
            result,
            json!({
                "type": "object",
                "properties": {
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "default": ["a", "b"]
                    }
                }
            })
        );
    }

    #[test]
    fn test_primitive_default_not_backfilled_onto_array() {
        let result = normalize(json!({
            "type": "object",
            "default": { "tags": "a" },
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));
        assert!(result["properties"]["tags"].get("default").is_none());
    }

    #[test]
    fn test_boolean_required_on_inlined_branch_is_removed() {
        let result = normalize(json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "oneOf": [{
                "type": "object",
                "required": true,
                "properties": { "x": { "type": "string" } }
            }]
        }));
        assert_eq!(
            result["oneOf"][0],
            json!({
                "type": "object",
                "properties": {
                    "x": { "type": "string" },
                    "id": { "type": "integer" }
                }
            })
        );
    }

    #[test]
    fn test_examples_array_of_objects_backfills_properties() {
        let result = normalize(json!({
            "type": "object",
            "examples": [{ "id": 10 }],
            "properties": { "id": { "type": "integer" } }
        }));
        assert_eq!(
            result,
            json!({
                "type": "object",
                "properties": { "id": { "type": "integer", "examples": [10] } }
            })
        );
    }

    #[test]
    fn test_input_not_mutated_and_idempotent() {
        let input = json!({
            "type": "object",
            "example": { "name": "rex" },
            "properties": {
                "name": { "type": "string", "nullable": true },
                "tags": { "type": "array", "items": { "type": ["integer"] } },
                "kind": { "type": "string", "enum": ["a", "a"] }
            }
        });
        let snapshot = input.clone();
        let once = normalize(input.clone());
        assert_eq!(input, snapshot);
        assert_eq!(normalize(once.clone()), once);
    }
}
