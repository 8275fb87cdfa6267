//! Response body and headers for one status code.

use serde::Serialize;
use serde_json::{Map, Value};

use super::parameters::media_example_seeds;
use super::Operation;
use crate::config::{NormalizeOptions, ResponseSchemaOptions};
use crate::mimetype;
use crate::normalize::RefTracker;
use crate::pointer::build_path;

/// One part of a response: its body or its headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseBundle {
    /// The schema's root type; `string` when the body has none (an
    /// unexpanded circular reference, for instance).
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
}

impl Operation {
    /// Project the response for `status` (e.g. `"200"` or `"default"`).
    ///
    /// Returns `None` when the status code is not defined or the response
    /// declares neither a body schema nor headers.
    pub fn response_as_json_schema(
        &self,
        status: &str,
        options: &ResponseSchemaOptions,
    ) -> Option<Vec<ResponseBundle>> {
        let response = self.response_by_status_code(status)?;
        let description = response
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let base = NormalizeOptions::default();
        let mut bundles = Vec::new();

        if let Some((mut schema, tracker)) = self.response_body(response) {
            let kind = root_type(&schema);
            self.finish_schema(
                &mut schema,
                tracker,
                options.include_discriminator_mapping_refs,
                &base,
            );
            bundles.push(ResponseBundle {
                kind,
                label: "Response body".to_string(),
                description: description.clone(),
                schema,
            });
        }

        if let Some(headers) = response
            .get("headers")
            .and_then(Value::as_object)
            .filter(|h| !h.is_empty())
        {
            let header_options = NormalizeOptions {
                add_enums_to_descriptions: true,
                ..base.clone()
            };
            let mut tracker = RefTracker::default();
            let mut properties = Map::new();
            for (name, header) in headers {
                let Some(header) = self.resolve(header) else {
                    continue;
                };
                let Some(mut schema) = header_schema(header) else {
                    tracing::debug!(header = %name, "skipping header without a schema");
                    continue;
                };
                if let (Some(obj), Some(text)) =
                    (schema.as_object_mut(), header.get("description"))
                {
                    obj.insert("description".to_string(), text.clone());
                }
                let options = NormalizeOptions {
                    current_location: build_path("", &[name]),
                    ..header_options.clone()
                };
                let normalized = self.normalize_tracked(&schema, options, &mut tracker);
                properties.insert(name.clone(), normalized);
            }

            let mut schema = Map::new();
            schema.insert("type".to_string(), Value::String("object".to_string()));
            schema.insert("properties".to_string(), Value::Object(properties));
            let mut schema = Value::Object(schema);
            self.finish_schema(
                &mut schema,
                tracker,
                options.include_discriminator_mapping_refs,
                &base,
            );
            bundles.push(ResponseBundle {
                kind: "object".to_string(),
                label: "Headers".to_string(),
                description,
                schema,
            });
        }

        (!bundles.is_empty()).then_some(bundles)
    }

    /// The first media type (JSON-like first) whose schema normalizes to
    /// something non-empty, else the first one with a schema at all.
    fn response_body(&self, response: &Value) -> Option<(Value, RefTracker)> {
        let candidates: Vec<&Value> = match response.get("content").and_then(Value::as_object) {
            Some(content) => {
                let preferred = mimetype::preferred(content.keys().map(String::as_str));
                preferred
                    .and_then(|media_type| content.get(media_type))
                    .into_iter()
                    .chain(
                        content
                            .iter()
                            .filter(|(media_type, _)| Some(media_type.as_str()) != preferred)
                            .map(|(_, media)| media),
                    )
                    .collect()
            }
            // Swagger 2 keeps the schema on the response itself.
            None => vec![response],
        };

        let mut fallback = None;
        for media in candidates {
            let Some(schema) = media.get("schema") else {
                continue;
            };
            let options = NormalizeOptions {
                prev_example_schemas: media_example_seeds(media),
                ..NormalizeOptions::default()
            };
            let mut tracker = RefTracker::default();
            let normalized = self.normalize_tracked(schema, options, &mut tracker);
            if !normalized.as_object().is_some_and(Map::is_empty) {
                return Some((normalized, tracker));
            }
            fallback.get_or_insert((normalized, tracker));
        }
        fallback
    }
}

fn header_schema(header: &Value) -> Option<Value> {
    if let Some(schema) = header.get("schema") {
        return Some(schema.clone());
    }
    // Swagger 2 headers are flat schemas.
    header.get("type").map(|_| {
        let mut flat = header.clone();
        if let Some(obj) = flat.as_object_mut() {
            obj.remove("description");
        }
        flat
    })
}

fn root_type(schema: &Value) -> String {
    match schema.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null")
            .unwrap_or("string")
            .to_string(),
        _ => "string".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Oas;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn oas() -> Oas {
        Oas::new(json!({
            "openapi": "3.0.3",
            "paths": { "/pets": { "get": { "responses": {
                "200": {
                    "description": "A list of pets",
                    "headers": {
                        "X-Tier": {
                            "description": "Rate limit tier",
                            "schema": { "type": "string", "enum": ["free", "pro", "free"] }
                        },
                        "X-Rate": { "$ref": "#/components/headers/Rate" }
                    },
                    "content": {
                        "application/xml": { "schema": { "type": "string" } },
                        "application/json": {
                            "schema": {
                                "type": "array",
                                "items": { "type": "object", "properties": { "id": { "type": "integer" } } }
                            },
                            "example": [{ "id": 1 }]
                        }
                    }
                },
                "204": { "description": "Nothing" },
                "default": {
                    "description": "A node",
                    "content": {
                        "text/plain": { "schema": {} },
                        "application/vnd.api+json": { "schema": { "$ref": "#/components/schemas/Node" } }
                    }
                }
            } } } },
            "components": {
                "headers": { "Rate": { "schema": { "type": "integer" } } },
                "schemas": { "Node": { "type": "object", "properties": { "id": { "type": "string" } } } }
            }
        }))
    }

    #[test]
    fn test_body_and_headers() {
        let op = oas().operation("/pets", "get").unwrap();
        let bundles = op
            .response_as_json_schema("200", &ResponseSchemaOptions::default())
            .unwrap();
        assert_eq!(bundles.len(), 2);

        let body = &bundles[0];
        assert_eq!(body.kind, "array");
        assert_eq!(body.label, "Response body");
        assert_eq!(body.description.as_deref(), Some("A list of pets"));
        assert_eq!(
            body.schema["items"]["properties"]["id"],
            json!({ "type": "integer", "examples": [1] })
        );
        assert_eq!(body.schema["$schema"], "http://json-schema.org/draft-04/schema#");

        let headers = &bundles[1];
        assert_eq!(headers.kind, "object");
        assert_eq!(headers.label, "Headers");
        assert_eq!(headers.description.as_deref(), Some("A list of pets"));
        assert_eq!(
            headers.schema["properties"]["X-Tier"],
            json!({
                "type": "string",
                "enum": ["free", "pro"],
                "description": "Rate limit tier\n\n- `free`\n- `pro`"
            })
        );
        assert_eq!(headers.schema["properties"]["X-Rate"], json!({ "type": "integer" }));
    }

    #[test]
    fn test_undefined_or_empty_response() {
        let op = oas().operation("/pets", "get").unwrap();
        let options = ResponseSchemaOptions::default();
        assert!(op.response_as_json_schema("404", &options).is_none());
        assert!(op.response_as_json_schema("204", &options).is_none());
    }

    #[test]
    fn test_circular_body_reports_string_and_components() {
        let op = oas().operation("/pets", "get").unwrap();
        let bundles = op
            .response_as_json_schema("default", &ResponseSchemaOptions::default())
            .unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].kind, "string");
        assert_eq!(bundles[0].schema["$ref"], "#/components/schemas/Node");
        assert_eq!(
            bundles[0].schema["components"]["schemas"]["Node"],
            json!({ "type": "object", "properties": { "id": { "type": "string" } } })
        );
    }

    #[test]
    fn test_swagger_response_schema() {
        let oas = Oas::new(json!({
            "swagger": "2.0",
            "paths": { "/pets": { "get": { "responses": { "200": {
                "description": "ok",
                "schema": { "type": "object", "properties": { "name": { "type": "string" } } },
                "headers": { "X-Count": { "type": "integer", "description": "Total" } }
            } } } } }
        }));
        let bundles = oas
            .operation("/pets", "get")
            .unwrap()
            .response_as_json_schema("200", &ResponseSchemaOptions::default())
            .unwrap();
        assert_eq!(bundles[0].kind, "object");
        assert_eq!(
            bundles[1].schema["properties"]["X-Count"],
            json!({ "type": "integer", "description": "Total" })
        );
    }

    #[test]
    fn test_root_type() {
        assert_eq!(root_type(&json!({ "type": ["null", "integer"] })), "integer");
        assert_eq!(root_type(&json!({ "oneOf": [] })), "string");
    }
}
