//! Deterministic fixtures for sync tests.
//!
//! Everything here is clock-free: timestamps come from the caller so
//! assertions about last-writer-wins outcomes stay reproducible.

use snipvault_model::{RecordId, Snippet, SnippetId, Timestamp};
use snipvault_remote::{InMemoryRemote, RemoteRecord};
use snipvault_store::MemoryStore;

/// Builds a locally-authored snippet (dirty, unlinked) with both
/// timestamps pinned to `millis`.
#[must_use]
pub fn snippet_at(title: &str, content: &str, millis: i64) -> Snippet {
    let mut snippet = Snippet::new(title, content);
    snippet.created_at = Timestamp::from_millis(millis);
    snippet.updated_at = Timestamp::from_millis(millis);
    snippet
}

/// Builds a snippet that has already been uploaded: linked to
/// `record_id`, clean, `last_synced` pinned to its update time.
#[must_use]
pub fn synced_snippet(title: &str, content: &str, millis: i64, record_id: &str) -> Snippet {
    let mut snippet = snippet_at(title, content, millis);
    snippet.remote_id = Some(RecordId::new(record_id));
    snippet.last_synced = Some(snippet.updated_at);
    snippet.dirty = false;
    snippet
}

/// Builds a remote record with a blank record ID, for seeding into an
/// [`InMemoryRemote`] (which assigns the ID) or for batch-save inputs.
#[must_use]
pub fn record_at(snippet_id: &str, content: &str, millis: i64) -> RemoteRecord {
    RemoteRecord {
        record_id: RecordId::new(""),
        snippet_id: snippet_id.to_string(),
        title: content.to_string(),
        content: content.to_string(),
        shortcut: None,
        show_in_menu: 1,
        created_at: Timestamp::from_millis(millis),
        updated_at: Timestamp::from_millis(millis),
    }
}

/// Builds the remote counterpart of a snippet, with its own update time.
#[must_use]
pub fn record_for(snippet: &Snippet, millis: i64) -> RemoteRecord {
    let mut record = RemoteRecord::from_snippet(snippet);
    record.updated_at = Timestamp::from_millis(millis);
    record
}

/// Builds a local store with `local_count` unlinked snippets and a remote
/// with `remote_count` unrelated records. Contents are distinct on both
/// sides so merges neither id-match nor content-match across them.
#[must_use]
pub fn seeded_pair(local_count: usize, remote_count: usize) -> (MemoryStore, InMemoryRemote) {
    let store = MemoryStore::with_snippets(
        (0..local_count).map(|i| snippet_at(&format!("local {i}"), &format!("local body {i}"), i as i64 + 1)),
    );
    let remote = InMemoryRemote::new();
    for i in 0..remote_count {
        remote.seed(record_at(
            &format!("remote-{i}"),
            &format!("remote body {i}"),
            i as i64 + 1,
        ));
    }
    (store, remote)
}

/// The local identity a remote `snippet_id` string maps to.
#[must_use]
pub fn adopted_id(snippet_id: &str) -> SnippetId {
    SnippetId::from_remote_str(snippet_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipvault_store::SnippetStore;

    #[test]
    fn snippet_at_is_pending() {
        let snippet = snippet_at("t", "c", 42);
        assert!(snippet.dirty);
        assert!(!snippet.is_linked());
        assert_eq!(snippet.updated_at, Timestamp::from_millis(42));
    }

    #[test]
    fn synced_snippet_is_clean_and_linked() {
        let snippet = synced_snippet("t", "c", 42, "rec-1");
        assert!(!snippet.dirty);
        assert!(snippet.is_linked());
        assert_eq!(snippet.last_synced, Some(snippet.updated_at));
    }

    #[test]
    fn seeded_pair_has_disjoint_content() {
        let (store, remote) = seeded_pair(2, 3);
        assert_eq!(store.all().unwrap().len(), 2);
        assert_eq!(remote.record_count(), 3);
    }
}
