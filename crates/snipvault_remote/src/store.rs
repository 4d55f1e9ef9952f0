//! The remote client trait and its request/response types.

use crate::error::RemoteResult;
use crate::record::RemoteRecord;
use snipvault_model::RecordId;

/// Maximum number of records a single batch save or fetch may carry.
pub const MAX_RECORDS_PER_BATCH: usize = 400;

/// Availability of the signed-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    /// Account is usable.
    Available,
    /// No account is signed in.
    NoAccount,
    /// The account exists but is restricted.
    Restricted,
    /// The account status could not be fetched because of the network.
    NetworkUnavailable,
    /// The remote could not determine the status.
    Indeterminate,
}

/// Opaque pagination token for full-scan queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A record that could not be materialized inside an otherwise
/// successful page or batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// The affected record, when known.
    pub record_id: Option<RecordId>,
    /// Human-readable reason.
    pub reason: String,
}

impl RecordFailure {
    /// Creates a failure for a known record.
    pub fn for_record(record_id: RecordId, reason: impl Into<String>) -> Self {
        Self {
            record_id: Some(record_id),
            reason: reason.into(),
        }
    }
}

/// One page of a cursor-paginated full scan.
///
/// Per-record materialization failures travel inside the page so one bad
/// record never fails the page. `cursor` is `Some` while more pages
/// remain. Record order within a page is unspecified; callers sort
/// client-side once the scan completes.
#[derive(Debug, Clone)]
pub struct RecordPage {
    /// Fetched records, or per-record failures.
    pub records: Vec<Result<RemoteRecord, RecordFailure>>,
    /// Token for the next page, if any.
    pub cursor: Option<Cursor>,
}

/// The remote record client.
///
/// Implementations own transport, auth and quota concerns; the sync
/// engine only sees this trait. Batch calls accept at most
/// [`MAX_RECORDS_PER_BATCH`] records and report per-record outcomes in
/// input order; one record's failure must not discard sibling successes.
pub trait RemoteStore: Send + Sync {
    /// Checks whether the signed-in account can be used.
    fn account_status(&self) -> RemoteResult<AccountStatus>;

    /// Fetches one page of the full record scan.
    fn query_page(&self, cursor: Option<&Cursor>, limit: usize) -> RemoteResult<RecordPage>;

    /// Saves a batch of records, creating those with blank record IDs.
    /// Returns per-record outcomes in input order.
    fn save_batch(
        &self,
        records: &[RemoteRecord],
    ) -> RemoteResult<Vec<Result<RemoteRecord, RecordFailure>>>;

    /// Fetches a batch of records by ID, outcomes in input order.
    fn fetch_batch(
        &self,
        ids: &[RecordId],
    ) -> RemoteResult<Vec<Result<RemoteRecord, RecordFailure>>>;

    /// Fetches a single record.
    fn fetch(&self, id: &RecordId) -> RemoteResult<RemoteRecord>;

    /// Saves a single record, returning the stored copy (with the
    /// remote-assigned record ID for creates).
    fn save(&self, record: RemoteRecord) -> RemoteResult<RemoteRecord>;

    /// Deletes a single record.
    fn delete(&self, id: &RecordId) -> RemoteResult<()>;

    /// Releases the session-scoped handle. Safe to call repeatedly.
    fn close(&self) -> RemoteResult<()> {
        Ok(())
    }
}
