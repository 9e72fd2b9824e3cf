//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Errors reported by the tree engine.
///
/// The engine logs every error where it is raised and returns it without
/// touching the tree any further, so callers may safely ignore it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("no node matches relation prefix [{prefix}]")]
    NoMatch { prefix: String },
}

impl TreeError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
