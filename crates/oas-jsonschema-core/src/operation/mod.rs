//! A single API operation and its projection into JSON Schema bundles.
//!
//! - [`parameters`]: request inputs grouped by location
//! - [`response`]: response body and headers for one status code

mod parameters;
mod response;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::NormalizeOptions;
use crate::mimetype;
use crate::normalize::{Normalizer, RefKind, RefTracker};
use crate::pointer;

pub use response::ResponseBundle;

static NULL: Value = Value::Null;

/// Where a bundle's values go in a request. Declaration order is the
/// presentation order of bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleType {
    Path,
    Query,
    Body,
    Cookie,
    FormData,
    Header,
    Metadata,
}

impl BundleType {
    pub fn label(self) -> &'static str {
        match self {
            BundleType::Path => "Path Params",
            BundleType::Query => "Query Params",
            BundleType::Body => "Body Params",
            BundleType::Cookie => "Cookie Params",
            BundleType::FormData => "Form Data",
            BundleType::Header => "Headers",
            BundleType::Metadata => "Metadata",
        }
    }

    /// The parameter `in` value grouped into this bundle.
    fn parameter_location(self) -> Option<&'static str> {
        match self {
            BundleType::Path => Some("path"),
            BundleType::Query => Some("query"),
            BundleType::Cookie => Some("cookie"),
            BundleType::FormData => Some("formData"),
            BundleType::Header => Some("header"),
            BundleType::Body | BundleType::Metadata => None,
        }
    }
}

/// One group of request inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaBundle {
    #[serde(rename = "type")]
    pub kind: BundleType,
    pub label: String,
    pub schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_props: Option<DeprecatedBundle>,
}

/// Deprecated optional properties split out of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeprecatedBundle {
    #[serde(rename = "type")]
    pub kind: BundleType,
    pub schema: Value,
}

/// The request body an operation accepts in its preferred media type.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub media_type: String,
    /// The media type object (`schema`, `example`, `examples`).
    pub media: Value,
    pub description: Option<String>,
}

/// An operation of an [`crate::Oas`] document.
#[derive(Debug, Clone)]
pub struct Operation {
    api: Arc<Value>,
    path: String,
    method: String,
    dialect: String,
}

impl Operation {
    pub(crate) fn new(api: Arc<Value>, path: &str, method: &str, dialect: String) -> Self {
        Self {
            api,
            path: path.to_string(),
            method: method.to_string(),
            dialect,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw operation object.
    pub fn schema(&self) -> &Value {
        self.path_item()
            .and_then(|item| item.get(&self.method))
            .unwrap_or(&NULL)
    }

    fn path_item(&self) -> Option<&Value> {
        self.api.get("paths")?.get(&self.path)
    }

    /// Follow a `$ref` still present on a parameter/response/body.
    fn resolve<'v>(&'v self, value: &'v Value) -> Option<&'v Value> {
        match value.get("$ref").and_then(Value::as_str) {
            Some(reference) => match pointer::resolve_ref(&self.api, reference) {
                Ok(target) => Some(target),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unresolvable reference");
                    None
                }
            },
            None => Some(value),
        }
    }

    /// Path-item parameters merged with the operation's own; the operation
    /// wins on a matching `(name, in)`.
    pub fn parameters(&self) -> Vec<Value> {
        let collect = |value: Option<&Value>| -> Vec<Value> {
            value
                .and_then(|p| p.get("parameters"))
                .and_then(Value::as_array)
                .map(|params| {
                    params
                        .iter()
                        .filter_map(|p| self.resolve(p))
                        .filter(|p| p.is_object())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        let own = collect(Some(self.schema()));
        let key = |p: &Value| (p.get("name").cloned(), p.get("in").cloned());

        let mut merged: Vec<Value> = collect(self.path_item())
            .into_iter()
            .filter(|inherited| !own.iter().any(|p| key(p) == key(inherited)))
            .collect();
        merged.extend(own);
        merged
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters().is_empty()
    }

    pub fn has_request_body(&self) -> bool {
        !self.request_body_media_types().is_empty()
    }

    /// Media types of the request body, in document order. Swagger 2 `body`
    /// parameters report the operation's `consumes` (or `application/json`).
    pub fn request_body_media_types(&self) -> Vec<String> {
        if let Some(content) = self
            .schema()
            .get("requestBody")
            .and_then(|b| self.resolve(b))
            .and_then(|b| b.get("content"))
            .and_then(Value::as_object)
        {
            return content.keys().cloned().collect();
        }

        if self.swagger_body_parameter().is_some() {
            return vec![self.swagger_consumes()];
        }
        Vec::new()
    }

    fn swagger_body_parameter(&self) -> Option<Value> {
        self.parameters()
            .into_iter()
            .find(|p| p.get("in").and_then(Value::as_str) == Some("body"))
    }

    fn swagger_consumes(&self) -> String {
        self.schema()
            .get("consumes")
            .or_else(|| self.api.get("consumes"))
            .and_then(Value::as_array)
            .and_then(|c| mimetype::preferred(c.iter().filter_map(Value::as_str)))
            .unwrap_or("application/json")
            .to_string()
    }

    /// The request body in its preferred media type (JSON-like first).
    pub fn request_body(&self) -> Option<RequestBody> {
        if let Some(body) = self.schema().get("requestBody").and_then(|b| self.resolve(b)) {
            let content = body.get("content")?.as_object()?;
            let media_type = mimetype::preferred(content.keys().map(String::as_str))?;
            return Some(RequestBody {
                media_type: media_type.to_string(),
                media: content.get(media_type)?.clone(),
                description: body
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        let param = self.swagger_body_parameter()?;
        let mut media = Map::new();
        if let Some(schema) = param.get("schema") {
            media.insert("schema".to_string(), schema.clone());
        }
        Some(RequestBody {
            media_type: self.swagger_consumes(),
            media: Value::Object(media),
            description: param
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    pub fn response_by_status_code(&self, status: &str) -> Option<&Value> {
        let response = self.schema().get("responses")?.get(status)?;
        self.resolve(response)
    }

    pub fn response_status_codes(&self) -> Vec<String> {
        self.schema()
            .get("responses")
            .and_then(Value::as_object)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Preferred request content type: JSON-like first, else the first
    /// declared, else `application/json`.
    pub fn content_type(&self) -> String {
        let types = self.request_body_media_types();
        mimetype::preferred(types.iter().map(String::as_str))
            .unwrap_or("application/json")
            .to_string()
    }

    pub fn is_json(&self) -> bool {
        mimetype::is_json(&self.content_type())
    }

    pub fn is_form_urlencoded(&self) -> bool {
        mimetype::is_form_url_encoded(&self.content_type())
    }

    pub fn is_multipart(&self) -> bool {
        mimetype::is_multipart(&self.content_type())
    }

    pub fn is_xml(&self) -> bool {
        mimetype::is_xml(&self.content_type())
    }

    /// Normalize `schema`, recording which references were left in place.
    fn normalize_tracked(
        &self,
        schema: &Value,
        options: NormalizeOptions,
        tracker: &mut RefTracker,
    ) -> Value {
        let mut logger = |reference: &str, kind: RefKind| tracker.record(reference, kind);
        Normalizer::new(options)
            .with_ref_logger(&mut logger)
            .normalize(schema)
    }

    /// Every component, normalized, with empty categories omitted.
    fn normalized_components(&self, options: &NormalizeOptions) -> Option<Value> {
        let components = self.api.get("components")?.as_object()?;
        let mut out = Map::new();
        for (category, entries) in components {
            let Some(entries) = entries.as_object() else {
                continue;
            };
            if entries.is_empty() {
                continue;
            }
            let normalized: Map<String, Value> = entries
                .iter()
                .map(|(name, schema)| {
                    (
                        name.clone(),
                        Normalizer::new(options.clone()).normalize(schema),
                    )
                })
                .collect();
            out.insert(category.clone(), Value::Object(normalized));
        }
        (!out.is_empty()).then_some(Value::Object(out))
    }

    /// Attach `$schema`, and `components` when references into them remain.
    fn finish_schema(
        &self,
        schema: &mut Value,
        tracker: RefTracker,
        include_discriminator_refs: bool,
        options: &NormalizeOptions,
    ) {
        let Some(obj) = schema.as_object_mut() else {
            return;
        };
        obj.insert("$schema".to_string(), Value::String(self.dialect.clone()));

        let include = tracker.has_circular_refs
            || (tracker.has_discriminator_mapping_refs && include_discriminator_refs);
        if include {
            if let Some(components) = self.normalized_components(options) {
                obj.insert("components".to_string(), components);
            }
        }
    }
}
