//! Error types for dereferencing and schema projection.
//!
//! Normalization itself never fails: malformed schema fragments are repaired
//! or dropped. Only pointer lookups and the document-level dereference pass
//! surface errors to callers.

use thiserror::Error;

/// Failures from walking a JSON Pointer through a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// The `$ref` is not a local `#/...` pointer, or a segment is missing.
    #[error("definition not found: {reference}")]
    DefinitionNotFound { reference: String },

    #[error("invalid JSON pointer: {pointer}")]
    InvalidPointer { pointer: String },

    /// A segment tried to index into a scalar (including `null`).
    #[error("cannot read segment '{segment}' of a non-container value")]
    NonContainer { segment: String },
}

/// Failures from a full-document dereference pass.
///
/// `Clone` because a single failed pass is reported to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DereferenceError {
    #[error("unresolvable $ref at {path}: {reference}")]
    UnresolvableRef { path: String, reference: String },

    #[error("unsupported $ref at {path}: {reference} (only local #/ pointers are resolved)")]
    UnsupportedRef { path: String, reference: String },

    #[error("dereference pass did not complete: {message}")]
    Task { message: String },
}

/// Top-level error for document operations.
#[derive(Debug, Error)]
pub enum OasError {
    #[error(transparent)]
    Dereference(#[from] DereferenceError),

    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("operation not found: {method} {path}")]
    OperationNotFound { path: String, method: String },

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
