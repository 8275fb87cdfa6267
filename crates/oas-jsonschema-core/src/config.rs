//! Configuration for schema normalization and operation projection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options for [`crate::Normalizer`].
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `hide-read-only-properties`).
/// The `ref_logger` and `transformer` hooks are not options; they are attached
/// to the `Normalizer` directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NormalizeOptions {
    /// JSON Pointer of the schema being normalized, relative to the value that
    /// examples and defaults are looked up in (e.g. `/petId`).
    pub current_location: String,
    /// Initial example-bearing ancestors, each an object with an `example` or
    /// `examples` key.
    pub prev_example_schemas: Vec<Value>,
    /// Initial default-bearing ancestors, each an object with a `default` key.
    pub prev_default_schemas: Vec<Value>,
    pub hide_read_only_properties: bool,
    pub hide_write_only_properties: bool,
    /// Treat the root schema as a bare `allOf` child: no type inference.
    pub is_polymorphic_all_of_child: bool,
    /// Append a Markdown list of `enum` values to `description`.
    pub add_enums_to_descriptions: bool,
    /// Caller-supplied defaults keyed by pointer location, e.g.
    /// `{ "petId": 4 }` pre-fills the schema at `/petId`.
    pub global_defaults: Map<String, Value>,
}

/// Options for [`crate::Operation::parameters_as_json_schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ParameterSchemaOptions {
    pub global_defaults: Map<String, Value>,
    pub hide_read_only_properties: bool,
    pub hide_write_only_properties: bool,
    /// Attach `components` when discriminator mappings reference them.
    pub include_discriminator_mapping_refs: bool,
    /// Collapse every non-body bundle into a single `metadata` bundle.
    pub merge_into_body_and_metadata: bool,
    /// Keep deprecated properties inline instead of splitting them out.
    pub retain_deprecated_properties: bool,
}

/// Options for [`crate::Operation::response_as_json_schema`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ResponseSchemaOptions {
    pub include_discriminator_mapping_refs: bool,
}

impl ParameterSchemaOptions {
    /// Base normalization options shared by every parameter and body schema.
    pub(crate) fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            global_defaults: self.global_defaults.clone(),
            hide_read_only_properties: self.hide_read_only_properties,
            hide_write_only_properties: self.hide_write_only_properties,
            ..NormalizeOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_options_serde_round_trip() {
        let mut defaults = Map::new();
        defaults.insert("petId".into(), json!(4));
        let opts = NormalizeOptions {
            current_location: "/body".into(),
            hide_read_only_properties: true,
            add_enums_to_descriptions: true,
            global_defaults: defaults,
            ..NormalizeOptions::default()
        };

        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains("\"hide-read-only-properties\""));
        assert!(json.contains("\"add-enums-to-descriptions\""));
        assert!(json.contains("\"global-defaults\""));

        let deserialized: NormalizeOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_partial_options_fill_defaults() {
        let opts: ParameterSchemaOptions =
            serde_json::from_value(json!({ "retain-deprecated-properties": true })).unwrap();
        assert!(opts.retain_deprecated_properties);
        assert!(!opts.merge_into_body_and_metadata);
        assert!(opts.global_defaults.is_empty());
    }
}
