//! Cross-cutting error types for dealflow.
//!
//! Domain-specific errors (`DatabaseError`, `FilterError`, ...) live in their
//! own crates. The errors raised at collaborator seams live in
//! [`crate::capabilities`].

use thiserror::Error;

/// Errors that can be raised by any dealflow crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A URL could not be parsed or normalized.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
