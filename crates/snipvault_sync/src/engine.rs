//! The sync engine: full reconciliation and single-item remote ops.

use crate::config::SyncConfig;
use crate::error::{account_gate, SyncResult};
use crate::merge::{self, MergeOutcome};
use snipvault_model::{Snippet, SnippetId};
use snipvault_remote::{RemoteError, RemoteRecord, RemoteStore};
use snipvault_store::{SignalHub, SnippetStore, StoreSignal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one full sync did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Snippets pushed to the remote (creates and updates).
    pub uploaded: u64,
    /// Remote records that overwrote or materialized a local snippet.
    pub downloaded: u64,
    /// Remote records discarded as same-content duplicates.
    pub skipped: u64,
    /// Shortcut keys dropped during merge because of collisions.
    pub cleared_shortcuts: u64,
    /// Snippets removed (single-item deletes only; full sync never
    /// deletes).
    pub deleted: u64,
}

impl SyncReport {
    /// Returns true if the sync touched nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        *self == SyncReport::default()
    }
}

/// Orchestrates downloads, merges and uploads between a [`SnippetStore`]
/// and a [`RemoteStore`].
///
/// At most one full sync runs at a time; a trigger arriving while one is
/// in flight returns a zero-effect report instead of queueing. Account
/// availability is checked before any local mutation.
pub struct SyncEngine<S: SnippetStore, R: RemoteStore> {
    store: Arc<S>,
    remote: Arc<R>,
    signals: Arc<SignalHub>,
    config: SyncConfig,
    sync_in_flight: AtomicBool,
}

impl<S: SnippetStore, R: RemoteStore> SyncEngine<S, R> {
    /// Creates an engine over the given collaborators.
    pub fn new(store: Arc<S>, remote: Arc<R>, signals: Arc<SignalHub>, config: SyncConfig) -> Self {
        Self {
            store,
            remote,
            signals,
            config,
            sync_in_flight: AtomicBool::new(false),
        }
    }

    /// The local store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The remote client.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// The signal hub.
    pub fn signals(&self) -> &Arc<SignalHub> {
        &self.signals
    }

    /// Runs one full sync: account check, full download, merge, then
    /// upload of everything still pending.
    ///
    /// Drops the trigger with a zero report if a sync is already in
    /// flight.
    pub fn perform_full_sync(&self) -> SyncResult<SyncReport> {
        if self
            .sync_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("full sync already in flight, dropping trigger");
            return Ok(SyncReport::default());
        }
        let result = self.full_sync_inner();
        self.sync_in_flight.store(false, Ordering::SeqCst);
        result
    }

    fn full_sync_inner(&self) -> SyncResult<SyncReport> {
        account_gate(self.remote.account_status()?)?;

        let remote_records = self.download_all()?;
        let local = self.store.all()?;
        let outcome = merge::resolve(&local, &remote_records);
        self.apply_merge(&outcome)?;

        let mut report = SyncReport {
            downloaded: outcome.counters.downloaded,
            skipped: outcome.counters.skipped,
            cleared_shortcuts: outcome.counters.cleared_shortcuts,
            ..SyncReport::default()
        };
        report.uploaded = self.upload_pending()?;

        info!(
            uploaded = report.uploaded,
            downloaded = report.downloaded,
            skipped = report.skipped,
            cleared_shortcuts = report.cleared_shortcuts,
            "full sync complete"
        );
        Ok(report)
    }

    /// Walks the cursor-paginated full scan. Unreadable records are
    /// logged and dropped; the scan continues. The result is sorted by
    /// creation time since the remote guarantees no order.
    fn download_all(&self) -> SyncResult<Vec<RemoteRecord>> {
        let mut records = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.remote.query_page(cursor.as_ref(), self.config.page_size)?;
            for outcome in page.records {
                match outcome {
                    Ok(record) => records.push(record),
                    Err(failure) => warn!(
                        record = ?failure.record_id,
                        reason = %failure.reason,
                        "skipping unreadable remote record"
                    ),
                }
            }
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.snippet_id.cmp(&b.snippet_id))
        });
        Ok(records)
    }

    fn apply_merge(&self, outcome: &MergeOutcome) -> SyncResult<()> {
        if outcome.is_noop() {
            return Ok(());
        }
        for snippet in &outcome.changes {
            self.store.upsert(snippet.clone())?;
        }
        self.store.save()?;

        if outcome.hotkeys_changed {
            self.signals.emit(StoreSignal::HotkeysChanged);
        }
        if outcome.menu_changed {
            self.signals.emit(StoreSignal::MenuChanged);
        }
        Ok(())
    }

    /// Uploads everything dirty or unlinked: creates for unlinked
    /// snippets, fetch-modify-save for linked dirty ones.
    fn upload_pending(&self) -> SyncResult<u64> {
        let pending = self.store.fetch(&|s| s.dirty || !s.is_linked())?;
        let (new_items, changed): (Vec<Snippet>, Vec<Snippet>) =
            pending.into_iter().partition(|s| !s.is_linked());

        let mut uploaded = self.upload_new(&new_items)?;
        uploaded += self.upload_changed(&changed)?;
        if uploaded > 0 {
            self.store.save()?;
        }
        Ok(uploaded)
    }

    fn upload_new(&self, snippets: &[Snippet]) -> SyncResult<u64> {
        let mut uploaded = 0;
        for chunk in snippets.chunks(self.config.save_batch_limit) {
            let records: Vec<RemoteRecord> = chunk.iter().map(RemoteRecord::from_snippet).collect();
            let outcomes = self.remote.save_batch(&records)?;
            for (snippet, outcome) in chunk.iter().zip(outcomes) {
                match outcome {
                    Ok(saved) => {
                        let mut updated = snippet.clone();
                        updated.mark_synced(saved.record_id);
                        self.store.upsert(updated)?;
                        uploaded += 1;
                    }
                    Err(failure) => warn!(
                        snippet = %snippet.id,
                        reason = %failure.reason,
                        "record create rejected, snippet stays pending"
                    ),
                }
            }
        }
        Ok(uploaded)
    }

    fn upload_changed(&self, snippets: &[Snippet]) -> SyncResult<u64> {
        let mut uploaded = 0;
        for chunk in snippets.chunks(self.config.save_batch_limit) {
            let ids: Vec<_> = chunk.iter().filter_map(|s| s.remote_id.clone()).collect();
            let fetched = self.remote.fetch_batch(&ids)?;

            let mut to_save = Vec::new();
            let mut sources = Vec::new();
            for (snippet, outcome) in chunk.iter().zip(fetched) {
                match outcome {
                    Ok(mut record) => {
                        record.copy_fields_from(snippet);
                        to_save.push(record);
                        sources.push(snippet);
                    }
                    Err(failure) => warn!(
                        snippet = %snippet.id,
                        reason = %failure.reason,
                        "record fetch failed, snippet stays dirty"
                    ),
                }
            }
            if to_save.is_empty() {
                continue;
            }

            let outcomes = self.remote.save_batch(&to_save)?;
            for (snippet, outcome) in sources.into_iter().zip(outcomes) {
                match outcome {
                    Ok(saved) => {
                        let mut updated = snippet.clone();
                        updated.mark_synced(saved.record_id);
                        self.store.upsert(updated)?;
                        uploaded += 1;
                    }
                    Err(failure) => warn!(
                        snippet = %snippet.id,
                        reason = %failure.reason,
                        "record update rejected, snippet stays dirty"
                    ),
                }
            }
        }
        Ok(uploaded)
    }

    /// Persists a new snippet locally, then pushes it remotely.
    ///
    /// The local write always happens first. A remote failure surfaces to
    /// the caller while the snippet survives locally, unlinked and dirty,
    /// so the next full sync uploads it.
    pub fn create_and_upload(&self, snippet: Snippet) -> SyncResult<()> {
        let has_shortcut = snippet.shortcut_key().is_some();
        self.store.insert(snippet.clone())?;
        self.store.save()?;
        self.signals.emit(StoreSignal::MenuChanged);
        if has_shortcut {
            self.signals.emit(StoreSignal::HotkeysChanged);
        }

        let saved = self.remote.save(RemoteRecord::from_snippet(&snippet))?;
        let mut updated = snippet;
        updated.mark_synced(saved.record_id);
        self.store.upsert(updated)?;
        self.store.save()?;
        Ok(())
    }

    /// Pushes one snippet's pending changes remotely.
    ///
    /// A missing or clean snippet is a no-op (the debounced trigger may
    /// outlive a delete or be obsoleted by a full sync). A linked snippet
    /// whose record has vanished is unlinked and re-created.
    pub fn push_update(&self, id: &SnippetId) -> SyncResult<()> {
        let Some(snippet) = self.store.get(id)? else {
            debug!(snippet = %id, "push skipped, snippet deleted");
            return Ok(());
        };
        if !snippet.dirty && snippet.is_linked() {
            debug!(snippet = %id, "push skipped, snippet already synced");
            return Ok(());
        }

        let saved = match snippet.remote_id.as_ref().filter(|r| !r.is_blank()) {
            Some(remote_id) => match self.remote.fetch(remote_id) {
                Ok(mut record) => {
                    record.copy_fields_from(&snippet);
                    self.remote.save(record)?
                }
                Err(RemoteError::RecordNotFound(_)) => {
                    debug!(snippet = %id, "remote record vanished, re-creating");
                    self.remote.save(RemoteRecord::from_snippet(&snippet))?
                }
                Err(error) => return Err(error.into()),
            },
            None => self.remote.save(RemoteRecord::from_snippet(&snippet))?,
        };

        let mut updated = snippet;
        updated.mark_synced(saved.record_id);
        self.store.upsert(updated)?;
        self.store.save()?;
        Ok(())
    }

    /// Deletes a snippet, remote side first when it is linked and sync is
    /// enabled. Returns a report with `deleted` counted.
    ///
    /// An already-gone remote record counts as success. Any other remote
    /// failure aborts before the local delete so the pair can be retried.
    /// Deleting a missing snippet is a zero-effect no-op.
    pub fn delete_snippet(&self, id: &SnippetId, sync_enabled: bool) -> SyncResult<SyncReport> {
        let Some(snippet) = self.store.get(id)? else {
            debug!(snippet = %id, "delete skipped, snippet missing");
            return Ok(SyncReport::default());
        };

        if sync_enabled && snippet.is_linked() {
            if let Some(remote_id) = &snippet.remote_id {
                match self.remote.delete(remote_id) {
                    Ok(()) => {}
                    Err(RemoteError::RecordNotFound(_)) => {
                        debug!(snippet = %id, "remote record already gone");
                    }
                    Err(error) => return Err(error.into()),
                }
            }
        }

        self.store.delete(id)?;
        self.store.save()?;
        self.signals.emit(StoreSignal::MenuChanged);
        if snippet.shortcut_key().is_some() {
            self.signals.emit(StoreSignal::HotkeysChanged);
        }
        Ok(SyncReport {
            deleted: 1,
            ..SyncReport::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use snipvault_model::{RecordId, Timestamp};
    use snipvault_remote::{AccountStatus, InMemoryRemote};
    use snipvault_store::MemoryStore;

    fn engine_with(
        store: MemoryStore,
        remote: InMemoryRemote,
    ) -> SyncEngine<MemoryStore, InMemoryRemote> {
        SyncEngine::new(
            Arc::new(store),
            Arc::new(remote),
            Arc::new(SignalHub::new()),
            SyncConfig::new().with_page_size(3).with_save_batch_limit(2),
        )
    }

    fn local(content: &str, updated_at: i64) -> Snippet {
        let mut s = Snippet::new(content, content);
        s.created_at = Timestamp::from_millis(updated_at);
        s.updated_at = Timestamp::from_millis(updated_at);
        s
    }

    fn remote_record(snippet_id: &str, content: &str, updated_at: i64) -> RemoteRecord {
        RemoteRecord {
            record_id: RecordId::new(""),
            snippet_id: snippet_id.into(),
            title: content.into(),
            content: content.into(),
            shortcut: None,
            show_in_menu: 1,
            created_at: Timestamp::from_millis(updated_at),
            updated_at: Timestamp::from_millis(updated_at),
        }
    }

    #[test]
    fn first_sync_uploads_local_collection() {
        let store = MemoryStore::with_snippets([local("a", 1), local("b", 2), local("c", 3)]);
        let engine = engine_with(store, InMemoryRemote::new());

        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.uploaded, 3);
        assert_eq!(report.downloaded, 0);
        assert_eq!(engine.remote().record_count(), 3);

        for snippet in engine.store().all().unwrap() {
            assert!(snippet.is_linked());
            assert!(!snippet.dirty);
            assert!(snippet.last_synced.is_some());
        }
    }

    #[test]
    fn fresh_install_downloads_remote_collection() {
        let remote = InMemoryRemote::new();
        for i in 0..5 {
            remote.seed(remote_record(&format!("u{i}"), &format!("body {i}"), i));
        }
        let engine = engine_with(MemoryStore::new(), remote);

        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.downloaded, 5);
        assert_eq!(report.uploaded, 0);
        assert_eq!(engine.store().len(), 5);
    }

    #[test]
    fn second_sync_is_a_noop() {
        let store = MemoryStore::with_snippets([local("a", 1), local("b", 2)]);
        let engine = engine_with(store, InMemoryRemote::new());

        engine.perform_full_sync().unwrap();
        let report = engine.perform_full_sync().unwrap();
        assert!(report.is_noop());
    }

    #[test]
    fn account_gate_blocks_before_local_mutation() {
        let store = MemoryStore::with_snippets([local("a", 1)]);
        let remote = InMemoryRemote::new();
        remote.set_account_status(AccountStatus::NoAccount);
        let engine = engine_with(store, remote);

        assert_eq!(engine.perform_full_sync(), Err(SyncError::NotSignedIn));
        assert_eq!(engine.remote().record_count(), 0);
        assert!(engine.store().all().unwrap()[0].dirty);
    }

    #[test]
    fn rejected_record_does_not_block_batch_siblings() {
        let a = local("a", 1);
        let b = local("b", 2);
        let rejected_id = b.id.to_string();
        let store = MemoryStore::with_snippets([a.clone(), b.clone()]);
        let remote = InMemoryRemote::new();
        remote.reject_snippet(rejected_id);
        let engine = engine_with(store, remote);

        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.uploaded, 1);

        let kept_a = engine.store().get(&a.id).unwrap().unwrap();
        assert!(kept_a.is_linked() && !kept_a.dirty);
        let kept_b = engine.store().get(&b.id).unwrap().unwrap();
        assert!(!kept_b.is_linked() && kept_b.dirty);
    }

    #[test]
    fn unreadable_page_record_is_skipped_not_fatal() {
        let remote = InMemoryRemote::new();
        let good = remote.seed(remote_record("u1", "good", 1));
        let bad = remote.seed(remote_record("u2", "bad", 2));
        remote.poison_record(bad);
        let engine = engine_with(MemoryStore::new(), remote);

        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.downloaded, 1);
        let all = engine.store().all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].remote_id, Some(good));
    }

    #[test]
    fn linked_dirty_snippet_updates_existing_record() {
        let store = MemoryStore::with_snippets([local("v1", 1)]);
        let engine = engine_with(store, InMemoryRemote::new());
        engine.perform_full_sync().unwrap();

        let mut edited = engine.store().all().unwrap().remove(0);
        edited.content = "v2".into();
        edited.touch();
        let remote_id = edited.remote_id.clone().unwrap();
        engine.store().upsert(edited).unwrap();

        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.uploaded, 1);
        assert_eq!(engine.remote().record_count(), 1);
        assert_eq!(engine.remote().get(&remote_id).unwrap().content, "v2");
    }

    #[test]
    fn rejected_update_keeps_changed_batch_siblings() {
        let a = local("a", 1);
        let b = local("b", 2);
        let rejected_id = b.id;
        let store = MemoryStore::with_snippets([a.clone(), b]);
        let engine = engine_with(store, InMemoryRemote::new());
        engine.perform_full_sync().unwrap();

        // Edit both linked snippets, then reject the next save of b's
        // record so one update in the batch fails.
        for mut snippet in engine.store().all().unwrap() {
            snippet.content = format!("{} v2", snippet.content);
            snippet.updated_at = snippet.updated_at.plus_millis(10);
            snippet.dirty = true;
            engine.store().upsert(snippet).unwrap();
        }
        engine.remote().reject_snippet(rejected_id.to_string());

        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.uploaded, 1);

        let sibling = engine.store().get(&a.id).unwrap().unwrap();
        assert!(!sibling.dirty);
        let sibling_record = engine
            .remote()
            .get(sibling.remote_id.as_ref().unwrap())
            .unwrap();
        assert_eq!(sibling_record.content, "a v2");

        let victim = engine.store().get(&rejected_id).unwrap().unwrap();
        assert!(victim.dirty && victim.is_linked());
        let victim_record = engine
            .remote()
            .get(victim.remote_id.as_ref().unwrap())
            .unwrap();
        assert_eq!(victim_record.content, "b");
    }

    #[test]
    fn concurrent_trigger_returns_zero_report() {
        let engine = engine_with(MemoryStore::new(), InMemoryRemote::new());
        engine.sync_in_flight.store(true, Ordering::SeqCst);
        assert!(engine.perform_full_sync().unwrap().is_noop());

        engine.sync_in_flight.store(false, Ordering::SeqCst);
        engine.perform_full_sync().unwrap();
    }

    #[test]
    fn failed_sync_releases_the_flight_flag() {
        let store = MemoryStore::with_snippets([local("a", 1)]);
        let remote = InMemoryRemote::new();
        remote.fail_next_query(RemoteError::network("offline"));
        let engine = engine_with(store, remote);

        assert_eq!(
            engine.perform_full_sync(),
            Err(SyncError::NetworkUnavailable)
        );
        // The next trigger runs instead of being dropped.
        let report = engine.perform_full_sync().unwrap();
        assert_eq!(report.uploaded, 1);
    }

    #[test]
    fn create_and_upload_links_on_success() {
        let engine = engine_with(MemoryStore::new(), InMemoryRemote::new());
        let snippet = Snippet::new("t", "c");
        let id = snippet.id;

        engine.create_and_upload(snippet).unwrap();
        let stored = engine.store().get(&id).unwrap().unwrap();
        assert!(stored.is_linked() && !stored.dirty);
        assert_eq!(engine.remote().record_count(), 1);
    }

    #[test]
    fn create_and_upload_keeps_local_copy_on_remote_failure() {
        let remote = InMemoryRemote::new();
        remote.fail_next_save(RemoteError::QuotaExceeded);
        let engine = engine_with(MemoryStore::new(), remote);
        let snippet = Snippet::new("t", "c");
        let id = snippet.id;

        assert_eq!(
            engine.create_and_upload(snippet),
            Err(SyncError::QuotaExceeded)
        );
        let stored = engine.store().get(&id).unwrap().unwrap();
        assert!(!stored.is_linked() && stored.dirty);
    }

    #[test]
    fn push_update_is_noop_for_missing_or_clean() {
        let engine = engine_with(MemoryStore::new(), InMemoryRemote::new());
        engine.push_update(&SnippetId::new()).unwrap();

        let mut clean = local("a", 1);
        clean.mark_synced(RecordId::new("rec-1"));
        let id = clean.id;
        engine.store().upsert(clean).unwrap();
        engine.push_update(&id).unwrap();
        assert_eq!(engine.remote().record_count(), 0);
    }

    #[test]
    fn push_update_recreates_vanished_record() {
        let engine = engine_with(MemoryStore::new(), InMemoryRemote::new());
        let mut snippet = local("a", 1);
        snippet.remote_id = Some(RecordId::new("rec-gone"));
        snippet.dirty = true;
        let id = snippet.id;
        engine.store().upsert(snippet).unwrap();

        engine.push_update(&id).unwrap();
        let stored = engine.store().get(&id).unwrap().unwrap();
        assert!(stored.is_linked() && !stored.dirty);
        assert_ne!(stored.remote_id, Some(RecordId::new("rec-gone")));
        assert_eq!(engine.remote().record_count(), 1);
    }

    #[test]
    fn delete_removes_remote_record_first() {
        let store = MemoryStore::with_snippets([local("a", 1)]);
        let engine = engine_with(store, InMemoryRemote::new());
        engine.perform_full_sync().unwrap();
        let id = engine.store().all().unwrap()[0].id;

        let report = engine.delete_snippet(&id, true).unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(engine.remote().record_count(), 0);
        assert!(engine.store().is_empty());

        // Deleting a missing snippet reports nothing removed.
        assert!(engine.delete_snippet(&id, true).unwrap().is_noop());
    }

    #[test]
    fn delete_tolerates_already_gone_remote_record() {
        let mut snippet = local("a", 1);
        snippet.remote_id = Some(RecordId::new("rec-404"));
        let id = snippet.id;
        let engine = engine_with(MemoryStore::with_snippets([snippet]), InMemoryRemote::new());

        engine.delete_snippet(&id, true).unwrap();
        assert!(engine.store().is_empty());
    }

    #[test]
    fn delete_keeps_local_copy_when_remote_fails() {
        let store = MemoryStore::with_snippets([local("a", 1)]);
        let engine = engine_with(store, InMemoryRemote::new());
        engine.perform_full_sync().unwrap();
        let id = engine.store().all().unwrap()[0].id;

        engine.remote().fail_next_delete(RemoteError::network("offline"));
        assert_eq!(
            engine.delete_snippet(&id, true),
            Err(SyncError::NetworkUnavailable)
        );
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.remote().record_count(), 1);
    }

    #[test]
    fn delete_with_sync_disabled_is_local_only() {
        let store = MemoryStore::with_snippets([local("a", 1)]);
        let engine = engine_with(store, InMemoryRemote::new());
        engine.perform_full_sync().unwrap();
        let id = engine.store().all().unwrap()[0].id;

        engine.delete_snippet(&id, false).unwrap();
        assert!(engine.store().is_empty());
        assert_eq!(engine.remote().record_count(), 1);
    }

    #[test]
    fn merge_signals_reach_subscribers() {
        let remote = InMemoryRemote::new();
        let mut seeded = remote_record("u1", "fresh", 1);
        seeded.shortcut = Some("cmd-n".into());
        remote.seed(seeded);
        let engine = engine_with(MemoryStore::new(), remote);
        let rx = engine.signals().subscribe();

        engine.perform_full_sync().unwrap();
        let mut got: Vec<StoreSignal> = rx.try_iter().collect();
        got.sort_by_key(|s| format!("{s:?}"));
        assert_eq!(got, vec![StoreSignal::HotkeysChanged, StoreSignal::MenuChanged]);
    }
}
