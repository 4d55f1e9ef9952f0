//! The sync engine's closed error taxonomy.

use snipvault_remote::{AccountStatus, RemoteError};
use snipvault_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the sync engine and coordinator.
///
/// The taxonomy is deliberately closed: every collaborator failure maps
/// into one of these five cases so callers can react uniformly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No account is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// The network is unreachable; a later sync may succeed.
    #[error("network unavailable")]
    NetworkUnavailable,

    /// The account's remote storage quota is exhausted.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The account is restricted or lacks permission.
    #[error("permission denied")]
    PermissionDenied,

    /// Anything else, with the underlying cause.
    #[error("sync failed: {0}")]
    Unknown(String),
}

impl SyncError {
    /// Returns true if the next externally-triggered sync may succeed
    /// without user action.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::NetworkUnavailable | SyncError::Unknown(_))
    }
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotAuthenticated => SyncError::NotSignedIn,
            RemoteError::Network(_) => SyncError::NetworkUnavailable,
            RemoteError::QuotaExceeded => SyncError::QuotaExceeded,
            RemoteError::PermissionDenied => SyncError::PermissionDenied,
            other => SyncError::Unknown(other.to_string()),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(error: StoreError) -> Self {
        SyncError::Unknown(error.to_string())
    }
}

/// Gates a full sync on account availability.
///
/// Any status other than `Available` aborts before local mutation.
pub fn account_gate(status: AccountStatus) -> SyncResult<()> {
    match status {
        AccountStatus::Available => Ok(()),
        AccountStatus::NoAccount => Err(SyncError::NotSignedIn),
        AccountStatus::Restricted => Err(SyncError::PermissionDenied),
        AccountStatus::NetworkUnavailable => Err(SyncError::NetworkUnavailable),
        AccountStatus::Indeterminate => {
            Err(SyncError::Unknown("account status indeterminate".into()))
        }
    }
}
