//! Dereference OpenAPI / Swagger documents and normalize their schemas into
//! JSON Schema that form renderers and documentation UIs can consume directly.
//!
//! The pieces:
//!
//! - [`Oas`] wraps a document: versions, servers, operation lookup, URL
//!   matching, and single-flight [`Oas::dereference`].
//! - [`Normalizer`] repairs and canonicalizes one schema tree.
//! - [`Operation::parameters_as_json_schema`] and
//!   [`Operation::response_as_json_schema`] group an operation's inputs and
//!   outputs into labelled schema bundles.
//!
//! ```
//! use oas_jsonschema_core::{Oas, ParameterSchemaOptions};
//! use serde_json::json;
//!
//! let oas = Oas::new(json!({
//!     "openapi": "3.0.3",
//!     "paths": { "/pets/{petId}": { "get": {
//!         "parameters": [{ "name": "petId", "in": "path", "required": true, "schema": { "type": "integer" } }]
//!     } } }
//! }));
//! let op = oas.operation("/pets/{petId}", "get").unwrap();
//! let bundles = op.parameters_as_json_schema(&ParameterSchemaOptions::default()).unwrap();
//! assert_eq!(bundles[0].label, "Path Params");
//! assert_eq!(bundles[0].schema["required"], json!(["petId"]));
//! ```

pub mod config;
pub mod dereference;
pub mod document;
pub mod error;
pub mod mimetype;
pub mod normalize;
pub mod operation;
pub mod pointer;
pub mod routes;

pub use config::{NormalizeOptions, ParameterSchemaOptions, ResponseSchemaOptions};
pub use dereference::{DereferencePass, Dereferencer, LocalRefResolver};
pub use document::{Oas, OasVersion};
pub use error::{DereferenceError, OasError, PointerError};
pub use normalize::{to_json_schema, Normalizer, RefKind, RefLogger, RefTracker};
pub use operation::{
    BundleType, DeprecatedBundle, Operation, RequestBody, ResponseBundle, SchemaBundle,
};
pub use pointer::build_path;
pub use routes::FoundOperation;
