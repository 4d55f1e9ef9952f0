//! Error types for the local store.

use snipvault_model::SnippetId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the local persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No snippet with the given ID exists.
    #[error("snippet not found: {0}")]
    NotFound(SnippetId),

    /// Inserting an ID that already exists.
    #[error("snippet already exists: {0}")]
    AlreadyExists(SnippetId),

    /// The backing store failed to persist.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let id = SnippetId::new();
        let err = StoreError::NotFound(id);
        assert!(err.to_string().contains("not found"));
    }
}
