//! JSON Pointer utilities (RFC 6901).
//!
//! Provides three concerns:
//! 1. **Segment escaping** for property names containing `/` or `~`
//! 2. **`$ref` resolution** of local `#/...` references against a document root
//! 3. **Plain pointer lookup** (`/a/b`) used by the reverse example/default search
//!    and by global-default injection

use std::borrow::Cow;

use serde_json::Value;

use crate::error::PointerError;

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Unescape a single path segment per RFC 6901.
///
/// Order matters: `~1` first, then `~0`, so `~01` decodes to `~1`.
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a JSON Pointer path by appending escaped segments to a parent path.
///
/// # Example
/// ```
/// use oas_jsonschema_core::build_path;
/// assert_eq!(build_path("/body", &["a/b"]), "/body/a~1b");
/// assert_eq!(build_path("#", &["properties", "x"]), "#/properties/x");
/// ```
pub fn build_path(parent: &str, segments: &[&str]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment));
    }
    path
}

// ---------------------------------------------------------------------------
// $ref resolution
// ---------------------------------------------------------------------------

/// Resolve a local `$ref` (`#/a/b~1c`) against a document root.
///
/// # Errors
///
/// `PointerError::DefinitionNotFound` when the reference is not of the
/// `#/...` form or any segment along the way is absent.
pub fn resolve_ref<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, PointerError> {
    let not_found = || PointerError::DefinitionNotFound {
        reference: reference.to_string(),
    };

    let Some(path) = reference.strip_prefix("#/") else {
        return Err(not_found());
    };

    let mut current = root;
    for segment in path.split('/') {
        let key = unescape_pointer_segment(segment);
        current = match current {
            Value::Object(obj) => obj.get(key.as_ref()).ok_or_else(not_found)?,
            Value::Array(arr) => key
                .parse::<usize>()
                .ok()
                .and_then(|idx| arr.get(idx))
                .ok_or_else(not_found)?,
            _ => return Err(not_found()),
        };
    }

    Ok(current)
}

// ---------------------------------------------------------------------------
// Plain pointer lookup
// ---------------------------------------------------------------------------

/// Look up a plain JSON Pointer (`/a/b`) inside a value.
///
/// Missing keys yield `Ok(None)`. Indexing into a scalar or `null` is an
/// error, which callers doing best-effort lookups treat as "not found".
pub fn get<'a>(value: &'a Value, pointer: &str) -> Result<Option<&'a Value>, PointerError> {
    if pointer.is_empty() {
        return Ok(Some(value));
    }
    let Some(path) = pointer.strip_prefix('/') else {
        return Err(PointerError::InvalidPointer {
            pointer: pointer.to_string(),
        });
    };

    let mut current = value;
    for segment in path.split('/') {
        let key = unescape_pointer_segment(segment);
        let next = match current {
            Value::Object(obj) => obj.get(key.as_ref()),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|idx| arr.get(idx)),
            _ => {
                return Err(PointerError::NonContainer {
                    segment: key.into_owned(),
                })
            }
        };
        match next {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}
