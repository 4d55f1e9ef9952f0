//! Error types for the remote client.

use snipvault_model::RecordId;
use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failures surfaced by the remote record client.
///
/// Network, auth and quota failures are the client's failure surface; the
/// sync engine maps them into its own closed taxonomy.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// No account is signed in on this device.
    #[error("no account signed in")]
    NotAuthenticated,

    /// The network is unreachable or the request timed out.
    #[error("network unavailable: {0}")]
    Network(String),

    /// The account's storage quota is exhausted.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The account is restricted or lacks permission.
    #[error("permission denied")]
    PermissionDenied,

    /// The referenced record does not exist remotely.
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// A batch call exceeded the per-call record limit.
    #[error("batch of {size} records exceeds limit of {limit}")]
    BatchTooLarge {
        /// Records in the rejected batch.
        size: usize,
        /// Per-call limit.
        limit: usize,
    },

    /// Any other server-side failure.
    #[error("server error: {0}")]
    Server(String),
}

impl RemoteError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    /// Returns true if a later attempt may succeed without user action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Server(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(RemoteError::network("offline").is_retryable());
        assert!(RemoteError::server("500").is_retryable());
        assert!(!RemoteError::NotAuthenticated.is_retryable());
        assert!(!RemoteError::QuotaExceeded.is_retryable());
        assert!(!RemoteError::PermissionDenied.is_retryable());
    }
}
