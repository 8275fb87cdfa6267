//! Full-document `$ref` dereferencing with single-flight execution.
//!
//! A [`DereferencePass`] turns a document into its dereferenced form. The
//! built-in [`LocalRefResolver`] inlines every local `#/...` reference and
//! leaves circular ones as `{"$ref": ...}` markers.
//!
//! [`Dereferencer`] runs at most one pass per document. Concurrent callers
//! subscribe to the same in-flight pass and observe the same outcome:
//!
//! ```text
//! NotStarted ──► Processing ──► Complete
//!      ▲              │
//!      └── failure ───┘
//! ```
//!
//! A failed pass resets to `NotStarted`, so a later call retries; the callers
//! already waiting on the failed pass all receive its error.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::DereferenceError;
use crate::pointer::{self, build_path};

/// Annotation keywords that override the target's values when written beside
/// a `$ref`.
const ANNOTATION_KEYWORDS: &[&str] = &[
    "description",
    "title",
    "summary",
    "$comment",
    "example",
    "examples",
    "default",
    "deprecated",
    "readOnly",
    "writeOnly",
];

/// One full-document dereference.
pub trait DereferencePass: Send + Sync {
    fn run(&self, document: &Value) -> Result<Value, DereferenceError>;
}

/// Inlines local `#/...` references.
///
/// A reference whose target encloses the location being resolved (directly or
/// through a chain of references) is circular and kept as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRefResolver;

impl DereferencePass for LocalRefResolver {
    fn run(&self, document: &Value) -> Result<Value, DereferenceError> {
        let mut ctx = RefContext {
            root: document,
            jump_points: Vec::new(),
        };
        resolve_refs(document, "#", &mut ctx)
    }
}

/// Traversal state for one pass.
struct RefContext<'a> {
    root: &'a Value,
    /// Document locations of the `$ref` nodes currently being followed.
    jump_points: Vec<String>,
}

impl RefContext<'_> {
    fn is_circular(&self, reference: &str, here: &str) -> bool {
        self.jump_points
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(here))
            .any(|location| encloses(reference, location))
    }
}

/// `ancestor` is `location` or one of its parents.
fn encloses(ancestor: &str, location: &str) -> bool {
    location == ancestor
        || location
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn resolve_refs(node: &Value, path: &str, ctx: &mut RefContext<'_>) -> Result<Value, DereferenceError> {
    match node {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                return resolve_single_ref(obj, reference, path, ctx);
            }
            let mut result = Map::new();
            for (key, child) in obj {
                let child_path = build_path(path, &[key]);
                result.insert(key.clone(), resolve_refs(child, &child_path, ctx)?);
            }
            Ok(Value::Object(result))
        }
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let child_path = build_path(path, &[&i.to_string()]);
                result.push(resolve_refs(item, &child_path, ctx)?);
            }
            Ok(Value::Array(result))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_single_ref(
    obj: &Map<String, Value>,
    reference: &str,
    path: &str,
    ctx: &mut RefContext<'_>,
) -> Result<Value, DereferenceError> {
    if !reference.starts_with("#/") {
        return Err(DereferenceError::UnsupportedRef {
            path: path.to_string(),
            reference: reference.to_string(),
        });
    }

    if ctx.is_circular(reference, path) {
        tracing::debug!(path, reference, "keeping circular $ref");
        return Ok(Value::Object(obj.clone()));
    }

    let target = pointer::resolve_ref(ctx.root, reference).map_err(|_| {
        DereferenceError::UnresolvableRef {
            path: path.to_string(),
            reference: reference.to_string(),
        }
    })?;

    // Resolve the target where it lives, so refs inside it see the right
    // enclosing locations.
    ctx.jump_points.push(path.to_string());
    let resolved = resolve_refs(target, reference, ctx);
    ctx.jump_points.pop();
    let resolved = resolved?;

    let mut annotations = Map::new();
    let mut structural = Map::new();
    for (k, v) in obj.iter().filter(|(k, _)| k.as_str() != "$ref") {
        if ANNOTATION_KEYWORDS.contains(&k.as_str()) {
            annotations.insert(k.clone(), v.clone());
        } else {
            structural.insert(k.clone(), v.clone());
        }
    }
    if annotations.is_empty() && structural.is_empty() {
        return Ok(resolved);
    }

    let Value::Object(mut merged) = resolved else {
        return Ok(resolved);
    };
    merged.extend(annotations);

    if structural.is_empty() {
        return Ok(Value::Object(merged));
    }

    let mut siblings = Map::new();
    for (k, v) in structural {
        let child_path = build_path(path, &[&k]);
        siblings.insert(k, resolve_refs(&v, &child_path, ctx)?);
    }
    Ok(Value::Object(Map::from_iter([(
        "allOf".to_string(),
        Value::Array(vec![Value::Object(merged), Value::Object(siblings)]),
    )])))
}

// ---------------------------------------------------------------------------
// Single-flight
// ---------------------------------------------------------------------------

type Outcome = Result<Arc<Value>, DereferenceError>;

enum DerefState {
    NotStarted,
    Processing(watch::Receiver<Option<Outcome>>),
    Complete(Arc<Value>),
}

enum Next {
    Done(Arc<Value>),
    Wait(watch::Receiver<Option<Outcome>>),
    Start,
}

/// Runs a [`DereferencePass`] at most once at a time and caches its result.
#[derive(Clone)]
pub struct Dereferencer {
    pass: Arc<dyn DereferencePass>,
    state: Arc<Mutex<DerefState>>,
}

impl std::fmt::Debug for Dereferencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dereferencer")
            .field("complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

impl Dereferencer {
    pub fn new(pass: Arc<dyn DereferencePass>) -> Self {
        Self {
            pass,
            state: Arc::new(Mutex::new(DerefState::NotStarted)),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(*self.state.lock(), DerefState::Complete(_))
    }

    /// The dereferenced document, once a pass has succeeded.
    pub fn completed(&self) -> Option<Arc<Value>> {
        match &*self.state.lock() {
            DerefState::Complete(doc) => Some(Arc::clone(doc)),
            _ => None,
        }
    }

    /// Dereference `document`, joining an in-flight pass if there is one.
    ///
    /// Must be awaited inside a Tokio runtime: the pass runs on the blocking
    /// thread pool.
    pub async fn dereference(&self, document: &Arc<Value>) -> Outcome {
        let mut rx = {
            let mut state = self.state.lock();
            let next = match &*state {
                DerefState::Complete(doc) => Next::Done(Arc::clone(doc)),
                DerefState::Processing(rx) => Next::Wait(rx.clone()),
                DerefState::NotStarted => Next::Start,
            };
            match next {
                Next::Done(doc) => return Ok(doc),
                Next::Wait(rx) => rx,
                Next::Start => {
                    let (tx, rx) = watch::channel(None);
                    *state = DerefState::Processing(rx.clone());
                    self.start(Arc::clone(document), tx);
                    rx
                }
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(published) => (*published).clone(),
            Err(_) => None,
        };
        match outcome {
            Some(outcome) => outcome,
            None => {
                // The pass died without publishing (it panicked).
                let mut state = self.state.lock();
                if matches!(*state, DerefState::Processing(_)) {
                    *state = DerefState::NotStarted;
                }
                Err(DereferenceError::Task {
                    message: "dereference pass aborted".to_string(),
                })
            }
        }
    }

    fn start(&self, document: Arc<Value>, tx: watch::Sender<Option<Outcome>>) {
        let pass = Arc::clone(&self.pass);
        let state = Arc::clone(&self.state);
        tracing::debug!("starting dereference pass");

        tokio::task::spawn_blocking(move || {
            let outcome = pass.run(&document).map(Arc::new);
            {
                let mut state = state.lock();
                *state = match &outcome {
                    Ok(doc) => DerefState::Complete(Arc::clone(doc)),
                    Err(err) => {
                        tracing::warn!(error = %err, "dereference pass failed");
                        DerefState::NotStarted
                    }
                };
            }
            tx.send_replace(Some(outcome));
        });
    }
}

impl Default for Dereferencer {
    fn default() -> Self {
        Self::new(Arc::new(LocalRefResolver))
    }
}
