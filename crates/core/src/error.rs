//! Domain error taxonomy shared by every crate in the workspace.

use crate::types::DbId;

/// Per-request domain error. Nothing here is fatal at the process level;
/// the HTTP layer maps each variant onto a status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced entity does not exist (or is not visible).
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The request payload or a precondition check failed. No mutation
    /// happened.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request conflicts with existing state (duplicate open audit,
    /// duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role/ownership check failed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::Validation`] with a formatted message.
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Shorthand for a [`CoreError::Forbidden`] with a formatted message.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        CoreError::Forbidden(msg.into())
    }
}
