//! Ancestor example/default chains and the reverse pointer search.
//!
//! While descending into a schema, object-valued examples and defaults are
//! recorded on an [`AncestorChain`]. A primitive leaf without its own example
//! can then look its value up in those ancestors by JSON Pointer.
//!
//! The chain is a persistent cons list: pushing returns a new chain that
//! shares its tail, so a value recorded inside one subtree is never visible
//! to siblings or to a concurrent normalization.
//!
//! ## Suffix matching
//!
//! The lookup tries every suffix of the current location, longest first
//! (`/tags/name`, then `/name`). Because a suffix can match an unrelated
//! same-named property higher up in an ancestor value, a deeply nested
//! property may pick up a sibling's example. This is accepted behavior.

use std::sync::Arc;

use serde_json::Value;

use crate::pointer;

#[derive(Debug)]
struct Link {
    value: Value,
    parent: Option<Arc<Link>>,
}

/// Persistent list of ancestor fragments, most recent first.
#[derive(Debug, Clone, Default)]
pub(crate) struct AncestorChain {
    head: Option<Arc<Link>>,
}

impl AncestorChain {
    /// Build a chain from caller-supplied seeds; the last seed is the nearest.
    pub(crate) fn from_seeds(seeds: &[Value]) -> Self {
        seeds
            .iter()
            .fold(Self::default(), |chain, seed| chain.push(seed.clone()))
    }

    pub(crate) fn push(&self, value: Value) -> Self {
        Self {
            head: Some(Arc::new(Link {
                value,
                parent: self.head.clone(),
            })),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate from the nearest ancestor to the furthest.
    pub(crate) fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

pub(crate) struct Iter<'a> {
    next: Option<&'a Link>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.next?;
        self.next = link.parent.as_deref();
        Some(&link.value)
    }
}

/// Which keyword an ancestor fragment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AncestorProp {
    Example,
    Default,
}

impl AncestorProp {
    /// The value to search inside, if this ancestor carries one.
    fn source<'a>(&self, ancestor: &'a Value) -> Option<&'a Value> {
        match self {
            AncestorProp::Example => ancestor.get("example").or_else(|| {
                ancestor
                    .get("examples")
                    .and_then(Value::as_array)
                    .and_then(|examples| examples.first())
            }),
            AncestorProp::Default => ancestor.get("default"),
        }
    }
}

/// Suffixes of `location`, longest first.
fn pointer_suffixes(location: &str) -> Vec<String> {
    let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
    (0..segments.len())
        .map(|start| format!("/{}", segments[start..].join("/")))
        .collect()
}

/// Reverse pointer search. Returns the first hit (which may be `null`).
///
/// Lookups that index into a scalar or `null` count as misses.
pub(crate) fn search_by_pointer(
    prop: AncestorProp,
    location: &str,
    chain: &AncestorChain,
) -> Option<Value> {
    if chain.is_empty() || location.is_empty() {
        return None;
    }

    for suffix in pointer_suffixes(location) {
        for ancestor in chain.iter() {
            let Some(source) = prop.source(ancestor) else {
                continue;
            };
            if let Ok(Some(found)) = pointer::get(source, &suffix) {
                return Some(found.clone());
            }
        }
    }

    None
}
