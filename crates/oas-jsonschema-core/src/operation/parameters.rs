//! Request inputs grouped into per-location schema bundles.

use serde_json::{json, Map, Value};

use super::{BundleType, DeprecatedBundle, Operation, SchemaBundle};
use crate::config::{NormalizeOptions, ParameterSchemaOptions};
use crate::mimetype;
use crate::normalize::RefTracker;
use crate::pointer::build_path;

/// Parameter keywords copied onto the parameter's schema.
const PARAMETER_ANNOTATIONS: &[&str] = &["example", "examples", "deprecated", "description"];

/// Swagger 2 parameter keys that are not schema keywords.
const SWAGGER_PARAMETER_KEYS: &[&str] = &["name", "in", "required", "collectionFormat"];

const PARAMETER_BUNDLES: [BundleType; 5] = [
    BundleType::Path,
    BundleType::Query,
    BundleType::Cookie,
    BundleType::FormData,
    BundleType::Header,
];

impl Operation {
    /// Group this operation's inputs into schema bundles, ordered path,
    /// query, body, cookie, formData, header.
    ///
    /// Returns `None` when the operation takes neither parameters nor a body.
    pub fn parameters_as_json_schema(
        &self,
        options: &ParameterSchemaOptions,
    ) -> Option<Vec<SchemaBundle>> {
        let parameters = self.parameters();
        let body = self.request_body();
        let has_location_params = parameters
            .iter()
            .any(|p| p.get("in").and_then(Value::as_str) != Some("body"));
        if !has_location_params && body.is_none() {
            return None;
        }

        let base = options.normalize_options();
        let mut bundles = Vec::new();

        for kind in PARAMETER_BUNDLES {
            let Some(location) = kind.parameter_location() else {
                continue;
            };
            let group: Vec<&Value> = parameters
                .iter()
                .filter(|p| p.get("in").and_then(Value::as_str) == Some(location))
                .collect();
            if group.is_empty() {
                continue;
            }

            let mut tracker = RefTracker::default();
            let mut properties = Map::new();
            let mut required = Vec::new();
            for param in group {
                let Some(name) = param.get("name").and_then(Value::as_str) else {
                    tracing::debug!(location, "skipping parameter without a name");
                    continue;
                };
                let param_options = NormalizeOptions {
                    current_location: build_path("", &[name]),
                    ..base.clone()
                };
                let schema = parameter_schema(param);
                let normalized = self.normalize_tracked(&schema, param_options, &mut tracker);
                properties.insert(name.to_string(), normalized);
                if param.get("required") == Some(&Value::Bool(true)) {
                    required.push(Value::String(name.to_string()));
                }
            }

            let schema = object_schema(properties, required);
            bundles.push(self.bundle(kind, schema, None, tracker, options, &base));
        }

        if let Some(body) = body {
            if let Some(schema) = body.media.get("schema") {
                let kind = if mimetype::is_form_url_encoded(&body.media_type) {
                    BundleType::FormData
                } else {
                    BundleType::Body
                };
                let mut tracker = RefTracker::default();
                let body_options = NormalizeOptions {
                    prev_example_schemas: media_example_seeds(&body.media),
                    ..base.clone()
                };
                let normalized = self.normalize_tracked(schema, body_options, &mut tracker);
                if normalized.as_object().is_some_and(Map::is_empty) {
                    tracing::debug!(media_type = %body.media_type, "request body schema is empty");
                } else {
                    bundles.push(self.bundle(
                        kind,
                        normalized,
                        body.description,
                        tracker,
                        options,
                        &base,
                    ));
                }
            }
        }

        if options.merge_into_body_and_metadata {
            bundles = self.merge_metadata(bundles);
        }
        bundles.sort_by_key(|b| b.kind);
        Some(bundles)
    }

    fn bundle(
        &self,
        kind: BundleType,
        mut schema: Value,
        description: Option<String>,
        tracker: RefTracker,
        options: &ParameterSchemaOptions,
        base: &NormalizeOptions,
    ) -> SchemaBundle {
        let deprecated_props = if options.retain_deprecated_properties {
            None
        } else {
            split_deprecated(&mut schema).map(|split| {
                let mut tracker = RefTracker::default();
                let mut deprecated = self.normalize_tracked(&split, base.clone(), &mut tracker);
                self.finish_schema(
                    &mut deprecated,
                    tracker,
                    options.include_discriminator_mapping_refs,
                    base,
                );
                DeprecatedBundle {
                    kind,
                    schema: deprecated,
                }
            })
        };
        self.finish_schema(
            &mut schema,
            tracker,
            options.include_discriminator_mapping_refs,
            base,
        );

        SchemaBundle {
            kind,
            label: kind.label().to_string(),
            schema,
            description,
            deprecated_props,
        }
    }

    /// Collapse every non-body bundle into one `metadata` bundle.
    fn merge_metadata(&self, bundles: Vec<SchemaBundle>) -> Vec<SchemaBundle> {
        let (mut kept, metadata): (Vec<_>, Vec<_>) = bundles
            .into_iter()
            .partition(|b| matches!(b.kind, BundleType::Body | BundleType::FormData));
        if metadata.is_empty() {
            return kept;
        }

        let schemas: Vec<Value> = metadata
            .into_iter()
            .map(|b| {
                let mut schema = b.schema;
                if let Some(obj) = schema.as_object_mut() {
                    obj.remove("$schema");
                }
                schema
            })
            .collect();
        let mut schema = Map::new();
        schema.insert("allOf".to_string(), Value::Array(schemas));
        schema.insert("$schema".to_string(), Value::String(self.dialect.clone()));

        kept.push(SchemaBundle {
            kind: BundleType::Metadata,
            label: BundleType::Metadata.label().to_string(),
            schema: Value::Object(schema),
            description: None,
            deprecated_props: None,
        });
        kept
    }
}

/// The schema for one parameter, with parameter-level annotations copied on.
fn parameter_schema(param: &Value) -> Value {
    let mut schema = if let Some(schema) = param.get("schema") {
        schema.clone()
    } else if let Some(content) = param.get("content").and_then(Value::as_object) {
        mimetype::preferred(content.keys().map(String::as_str))
            .and_then(|media_type| content.get(media_type))
            .and_then(|media| media.get("schema"))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    } else {
        // Swagger 2: the parameter is its own schema.
        let mut flat = param.as_object().cloned().unwrap_or_default();
        for key in SWAGGER_PARAMETER_KEYS {
            flat.remove(*key);
        }
        Value::Object(flat)
    };

    if let Some(obj) = schema.as_object_mut() {
        for key in PARAMETER_ANNOTATIONS {
            if let Some(value) = param.get(*key) {
                obj.insert(key.to_string(), value.clone());
            }
        }
    }
    schema
}

/// Media-level examples become the body's nearest example ancestor.
pub(super) fn media_example_seeds(media: &Value) -> Vec<Value> {
    if let Some(example) = media.get("example") {
        return vec![json!({ "example": example })];
    }
    media
        .get("examples")
        .and_then(Value::as_object)
        .and_then(|examples| examples.values().find_map(|e| e.get("value")))
        .map(|value| vec![json!({ "example": value })])
        .unwrap_or_default()
}

fn object_schema(properties: Map<String, Value>, required: Vec<Value>) -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Value::Object(schema)
}

/// Move deprecated, optional, writable top-level properties out of `schema`.
///
/// Nothing is split when every property qualifies. The returned object
/// schema still needs normalizing.
fn split_deprecated(schema: &mut Value) -> Option<Value> {
    let obj = schema.as_object_mut()?;
    let required: Vec<String> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let properties = obj.get_mut("properties")?.as_object_mut()?;

    let flagged = |name: &str, prop: &Value| {
        prop.get("deprecated") == Some(&Value::Bool(true))
            && prop.get("readOnly") != Some(&Value::Bool(true))
            && !required.iter().any(|r| r == name)
    };
    let count = properties
        .iter()
        .filter(|(name, prop)| flagged(name.as_str(), *prop))
        .count();
    if count == 0 || count == properties.len() {
        return None;
    }

    let mut deprecated = Map::new();
    for (name, prop) in std::mem::take(properties) {
        if flagged(name.as_str(), &prop) {
            deprecated.insert(name, prop);
        } else {
            properties.insert(name, prop);
        }
    }

    Some(object_schema(deprecated, Vec::new()))
}
