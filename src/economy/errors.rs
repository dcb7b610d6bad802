use thiserror::Error;

use crate::economy::registry::EntityKind;

/// Errors raised by structural edits on the economy graph and the hook manager.
///
/// "No such entity" lookups are not errors; they come back as `None`.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An id is already registered for this entity kind by a different owner.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    /// A move target index lies outside `[0, len)`.
    #[error("index {index} out of range for collection of size {len}")]
    OutOfRange { index: usize, len: usize },

    /// The referenced member is not present where the operation expected it.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Caller logic error, e.g. equipping a good that is not owned.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A JSON document parsed but describes an inconsistent graph.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Wrapper around serde_json errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn duplicate(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            kind,
            id: id.into(),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
