//! The OpenAPI document wrapper.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::dereference::{DereferencePass, Dereferencer, LocalRefResolver};
use crate::error::{DereferenceError, OasError};
use crate::operation::Operation;
use crate::routes::{self, FoundOperation};

const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";
const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema#";

/// Which OpenAPI or Swagger version a document declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OasVersion {
    Swagger2,
    V3_0,
    V3_1,
    Unknown,
}

/// An OpenAPI (or Swagger 2) document.
///
/// Cheap to share: the document is held behind an `Arc`, and dereferencing
/// replaces it with the dereferenced snapshot once a pass succeeds.
#[derive(Debug, Clone)]
pub struct Oas {
    document: Arc<Value>,
    dereferencer: Dereferencer,
}

impl Oas {
    pub fn new(document: Value) -> Self {
        Self::with_pass(document, Arc::new(LocalRefResolver))
    }

    /// Use a custom dereference pass instead of [`LocalRefResolver`].
    pub fn with_pass(document: Value, pass: Arc<dyn DereferencePass>) -> Self {
        Self {
            document: Arc::new(document),
            dereferencer: Dereferencer::new(pass),
        }
    }

    /// Parse a JSON document. The root must be an object.
    pub fn from_json(text: &str) -> Result<Self, OasError> {
        let document: Value = serde_json::from_str(text)?;
        if !document.is_object() {
            return Err(OasError::InvalidDocument {
                message: "document root must be a JSON object".to_string(),
            });
        }
        Ok(Self::new(document))
    }

    /// The current document: dereferenced once [`Oas::dereference`] has succeeded.
    pub fn api(&self) -> Arc<Value> {
        self.dereferencer
            .completed()
            .unwrap_or_else(|| Arc::clone(&self.document))
    }

    pub fn version(&self) -> OasVersion {
        if self.document.get("swagger").is_some() {
            return OasVersion::Swagger2;
        }
        match self.document.get("openapi").and_then(Value::as_str) {
            Some(v) if v.starts_with("3.0") => OasVersion::V3_0,
            Some(v) if v.starts_with("3.1") => OasVersion::V3_1,
            _ => OasVersion::Unknown,
        }
    }

    /// The JSON Schema dialect schemas in this document are written in.
    pub fn schema_version_string(&self) -> String {
        match self.version() {
            OasVersion::V3_1 => self
                .document
                .get("jsonSchemaDialect")
                .and_then(Value::as_str)
                .unwrap_or(DRAFT_2020_12)
                .to_string(),
            _ => DRAFT_04.to_string(),
        }
    }

    /// Declared servers. Swagger 2 documents get one synthesized from
    /// `schemes`/`host`/`basePath`; documents without servers get `/`.
    pub fn servers(&self) -> Vec<Value> {
        if let Some(Value::Array(servers)) = self.document.get("servers") {
            if !servers.is_empty() {
                return servers.clone();
            }
        }

        if self.version() == OasVersion::Swagger2 {
            if let Some(host) = self.document.get("host").and_then(Value::as_str) {
                let scheme = self
                    .document
                    .get("schemes")
                    .and_then(Value::as_array)
                    .and_then(|s| s.first())
                    .and_then(Value::as_str)
                    .unwrap_or("https");
                let base_path = self
                    .document
                    .get("basePath")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let mut server = Map::new();
                server.insert(
                    "url".to_string(),
                    Value::String(format!("{scheme}://{host}{base_path}")),
                );
                return vec![Value::Object(server)];
            }
        }

        let mut server = Map::new();
        server.insert("url".to_string(), Value::String("/".to_string()));
        vec![Value::Object(server)]
    }

    /// Default value of every variable declared on server `index`.
    pub fn default_variables(&self, index: usize) -> Map<String, Value> {
        let servers = self.servers();
        let Some(Value::Object(variables)) = servers.get(index).and_then(|s| s.get("variables"))
        else {
            return Map::new();
        };
        variables
            .iter()
            .filter_map(|(name, variable)| {
                variable
                    .get("default")
                    .map(|default| (name.clone(), default.clone()))
            })
            .collect()
    }

    /// Server `index` with `{var}` replaced by `variables`, falling back to
    /// each variable's default. Unknown variables are left as written.
    pub fn server_url(&self, index: usize, variables: &Map<String, Value>) -> Option<String> {
        let servers = self.servers();
        let template = servers.get(index)?.get("url")?.as_str()?;
        let defaults = self.default_variables(index);

        let url = routes::fill_template(template, |name| {
            variables
                .get(name)
                .or_else(|| defaults.get(name))
                .map(|value| match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        });
        Some(url.trim_end_matches('/').to_string())
    }

    /// Look up an operation. `method` is case-insensitive.
    pub fn operation(&self, path: &str, method: &str) -> Option<Operation> {
        let api = self.api();
        let method = method.to_ascii_lowercase();
        if !api.get("paths")?.get(path)?.get(&method)?.is_object() {
            return None;
        }
        Some(Operation::new(api, path, &method, self.schema_version_string()))
    }

    /// Like [`Oas::operation`], but a missing operation is an error.
    pub fn get_operation(&self, path: &str, method: &str) -> Result<Operation, OasError> {
        self.operation(path, method)
            .ok_or_else(|| OasError::OperationNotFound {
                path: path.to_string(),
                method: method.to_string(),
            })
    }

    /// Dereference the document. Concurrent calls share one pass; once it has
    /// succeeded, further calls return immediately.
    pub async fn dereference(&self) -> Result<Arc<Value>, DereferenceError> {
        self.dereferencer.dereference(&self.document).await
    }

    pub fn is_dereferenced(&self) -> bool {
        self.dereferencer.is_complete()
    }

    /// Match a concrete request URL against the document's servers and paths.
    pub fn find_operation(&self, url: &str, method: &str) -> Option<FoundOperation> {
        let api = self.api();
        let servers: Vec<String> = self
            .servers()
            .iter()
            .filter_map(|s| s.get("url").and_then(Value::as_str).map(str::to_string))
            .collect();
        routes::find_operation(&api, &servers, url, method)
    }
}
