//! Error types for a3s-crossview

use crate::types::RecordId;
use thiserror::Error;

/// Errors that can occur while maintaining truth, configuring views, or auditing
#[derive(Debug, Error)]
pub enum CrossViewError {
    /// A record with this id is already part of the authority
    #[error("Duplicate record id: {id}")]
    DuplicateId { id: RecordId },

    /// No record with this id exists in the authority
    #[error("Record not found: {id}")]
    NotFound { id: RecordId },

    /// A substitution tried to fill a slot with a record of another identity
    #[error("Identity mismatch: cannot substitute slot '{slot}' with record '{replacement}'")]
    IdentityMismatch { slot: RecordId, replacement: RecordId },

    /// A view reported an identity that ground truth does not contain
    #[error("Integrity invariant violated by view '{view}' at id '{id}': {reason}")]
    IntegrityViolation {
        view: String,
        id: RecordId,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Audit monitor failure (task join, shutdown)
    #[error("Monitor error: {0}")]
    Monitor(String),
}

impl CrossViewError {
    /// Whether the caller can reasonably retry or adjust input and carry on
    ///
    /// Integrity violations and identity mismatches are bugs, not conditions.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CrossViewError::DuplicateId { .. } | CrossViewError::NotFound { .. }
        )
    }
}

/// Result type alias for crossview operations
pub type Result<T> = std::result::Result<T, CrossViewError>;
