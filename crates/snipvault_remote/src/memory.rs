//! In-memory remote store with fault injection.

use crate::error::{RemoteError, RemoteResult};
use crate::record::RemoteRecord;
use crate::store::{
    AccountStatus, Cursor, RecordFailure, RecordPage, RemoteStore, MAX_RECORDS_PER_BATCH,
};
use parking_lot::RwLock;
use snipvault_model::RecordId;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<RecordId, RemoteRecord>,
    next_id: u64,
    status: Option<AccountStatus>,
    fail_next_save: Option<RemoteError>,
    fail_next_fetch: Option<RemoteError>,
    fail_next_delete: Option<RemoteError>,
    fail_next_query: Option<RemoteError>,
    rejected_snippet_ids: HashSet<String>,
    poisoned_record_ids: HashSet<RecordId>,
}

impl Inner {
    fn assign_id(&mut self) -> RecordId {
        // Skip identifiers already taken by explicitly seeded records.
        loop {
            self.next_id += 1;
            let id = RecordId::new(format!("rec-{}", self.next_id));
            if !self.records.contains_key(&id) {
                return id;
            }
        }
    }

    fn store(&mut self, mut record: RemoteRecord) -> RemoteRecord {
        if record.record_id.is_blank() {
            record.record_id = self.assign_id();
        }
        self.records.insert(record.record_id.clone(), record.clone());
        record
    }
}

/// An in-memory [`RemoteStore`] for tests and examples.
///
/// Behaves like a small eventually-consistent record service: blank
/// record IDs are assigned on save, full scans paginate in an order
/// unrelated to creation time, and batch calls report per-record
/// outcomes. Fault injection hooks script the failures the sync engine
/// has to survive.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    inner: RwLock<Inner>,
    closed: AtomicBool,
}

impl InMemoryRemote {
    /// Creates an empty remote with an available account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record, assigning a record ID if blank. Returns the ID.
    pub fn seed(&self, record: RemoteRecord) -> RecordId {
        self.inner.write().store(record).record_id
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns a stored record by ID.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<RemoteRecord> {
        self.inner.read().records.get(id).cloned()
    }

    /// Returns the record carrying the given snippet ID, if any.
    #[must_use]
    pub fn find_by_snippet_id(&self, snippet_id: &str) -> Option<RemoteRecord> {
        self.inner
            .read()
            .records
            .values()
            .find(|r| r.snippet_id == snippet_id)
            .cloned()
    }

    /// Scripts the next account-status answer.
    pub fn set_account_status(&self, status: AccountStatus) {
        self.inner.write().status = Some(status);
    }

    /// Fails the next whole-call save with the given error.
    pub fn fail_next_save(&self, error: RemoteError) {
        self.inner.write().fail_next_save = Some(error);
    }

    /// Fails the next whole-call fetch with the given error.
    pub fn fail_next_fetch(&self, error: RemoteError) {
        self.inner.write().fail_next_fetch = Some(error);
    }

    /// Fails the next delete with the given error.
    pub fn fail_next_delete(&self, error: RemoteError) {
        self.inner.write().fail_next_delete = Some(error);
    }

    /// Fails the next page query with the given error.
    pub fn fail_next_query(&self, error: RemoteError) {
        self.inner.write().fail_next_query = Some(error);
    }

    /// Rejects every save of the record carrying this snippet ID, while
    /// siblings in the same batch still succeed.
    pub fn reject_snippet(&self, snippet_id: impl Into<String>) {
        self.inner.write().rejected_snippet_ids.insert(snippet_id.into());
    }

    /// Makes the record fail per-record materialization inside pages and
    /// batch fetches.
    pub fn poison_record(&self, record_id: RecordId) {
        self.inner.write().poisoned_record_ids.insert(record_id);
    }

    /// Returns true if `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn sorted_ids(inner: &Inner) -> Vec<RecordId> {
        // Pagination order is record-id order: stable across calls but
        // deliberately unrelated to creation time, so clients must sort.
        let mut ids: Vec<RecordId> = inner.records.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl RemoteStore for InMemoryRemote {
    fn account_status(&self) -> RemoteResult<AccountStatus> {
        Ok(self.inner.read().status.unwrap_or(AccountStatus::Available))
    }

    fn query_page(&self, cursor: Option<&Cursor>, limit: usize) -> RemoteResult<RecordPage> {
        let mut inner = self.inner.write();
        if let Some(error) = inner.fail_next_query.take() {
            return Err(error);
        }

        let start: usize = cursor
            .map(|c| c.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        let ids = Self::sorted_ids(&inner);
        let limit = limit.max(1);
        let end = (start + limit).min(ids.len());

        let records = ids[start..end]
            .iter()
            .map(|id| {
                if inner.poisoned_record_ids.contains(id) {
                    Err(RecordFailure::for_record(id.clone(), "record unreadable"))
                } else {
                    Ok(inner.records[id].clone())
                }
            })
            .collect();

        let next = (end < ids.len()).then(|| Cursor::new(end.to_string()));
        Ok(RecordPage {
            records,
            cursor: next,
        })
    }

    fn save_batch(
        &self,
        records: &[RemoteRecord],
    ) -> RemoteResult<Vec<Result<RemoteRecord, RecordFailure>>> {
        if records.len() > MAX_RECORDS_PER_BATCH {
            return Err(RemoteError::BatchTooLarge {
                size: records.len(),
                limit: MAX_RECORDS_PER_BATCH,
            });
        }

        let mut inner = self.inner.write();
        if let Some(error) = inner.fail_next_save.take() {
            return Err(error);
        }

        Ok(records
            .iter()
            .map(|record| {
                if inner.rejected_snippet_ids.contains(&record.snippet_id) {
                    Err(RecordFailure {
                        record_id: None,
                        reason: format!("save rejected for snippet {}", record.snippet_id),
                    })
                } else {
                    Ok(inner.store(record.clone()))
                }
            })
            .collect())
    }

    fn fetch_batch(
        &self,
        ids: &[RecordId],
    ) -> RemoteResult<Vec<Result<RemoteRecord, RecordFailure>>> {
        if ids.len() > MAX_RECORDS_PER_BATCH {
            return Err(RemoteError::BatchTooLarge {
                size: ids.len(),
                limit: MAX_RECORDS_PER_BATCH,
            });
        }

        let mut inner = self.inner.write();
        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(error);
        }

        Ok(ids
            .iter()
            .map(|id| {
                if inner.poisoned_record_ids.contains(id) {
                    return Err(RecordFailure::for_record(id.clone(), "record unreadable"));
                }
                inner
                    .records
                    .get(id)
                    .cloned()
                    .ok_or_else(|| RecordFailure::for_record(id.clone(), "record not found"))
            })
            .collect())
    }

    fn fetch(&self, id: &RecordId) -> RemoteResult<RemoteRecord> {
        let mut inner = self.inner.write();
        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(error);
        }
        inner
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::RecordNotFound(id.clone()))
    }

    fn save(&self, record: RemoteRecord) -> RemoteResult<RemoteRecord> {
        let mut inner = self.inner.write();
        if let Some(error) = inner.fail_next_save.take() {
            return Err(error);
        }
        if inner.rejected_snippet_ids.contains(&record.snippet_id) {
            return Err(RemoteError::server(format!(
                "save rejected for snippet {}",
                record.snippet_id
            )));
        }
        Ok(inner.store(record))
    }

    fn delete(&self, id: &RecordId) -> RemoteResult<()> {
        let mut inner = self.inner.write();
        if let Some(error) = inner.fail_next_delete.take() {
            return Err(error);
        }
        inner
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::RecordNotFound(id.clone()))
    }

    fn close(&self) -> RemoteResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
