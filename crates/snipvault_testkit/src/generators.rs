//! Property-based generators using proptest.
//!
//! Contents and shortcut keys are drawn from small pools so generated
//! snapshots actually collide on the secondary identity and on shortcut
//! ownership, which is where merge behavior gets interesting.

use proptest::prelude::*;
use snipvault_model::{RecordId, Snippet, SnippetId, Timestamp};
use snipvault_remote::RemoteRecord;
use std::collections::HashSet;

/// Strategy for generating snippet IDs.
pub fn snippet_id_strategy() -> impl Strategy<Value = SnippetId> {
    prop::array::uniform16(any::<u8>()).prop_map(SnippetId::from_bytes)
}

/// Strategy for generating timestamps inside a small window, so
/// last-writer-wins comparisons and exact ties both occur.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (0i64..2_000).prop_map(Timestamp::from_millis)
}

/// Strategy for generating contents from a colliding pool.
pub fn content_strategy() -> impl Strategy<Value = String> {
    (0usize..12).prop_map(|i| format!("body {i}"))
}

/// Strategy for generating optional shortcut keys from a colliding pool.
pub fn shortcut_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        3 => Just(None),
        2 => (0usize..4).prop_map(|i| Some(format!("cmd-{i}"))),
    ]
}

/// Strategy for generating a single snippet with consistent timestamps.
pub fn snippet_strategy() -> impl Strategy<Value = Snippet> {
    (
        snippet_id_strategy(),
        "[a-z]{1,8}",
        content_strategy(),
        shortcut_strategy(),
        any::<bool>(),
        timestamp_strategy(),
        timestamp_strategy(),
        any::<bool>(),
    )
        .prop_map(
            |(id, title, content, shortcut, show_in_menu, a, b, dirty)| Snippet {
                id,
                title,
                content,
                shortcut,
                show_in_menu,
                created_at: a.min(b),
                updated_at: a.max(b),
                remote_id: None,
                last_synced: None,
                dirty,
            },
        )
}

/// Strategy for generating a local snapshot: up to `max` snippets with
/// distinct ids.
pub fn local_set_strategy(max: usize) -> impl Strategy<Value = Vec<Snippet>> {
    prop::collection::vec(snippet_strategy(), 0..=max).prop_map(|snippets| {
        let mut seen = HashSet::new();
        snippets
            .into_iter()
            .filter(|s| seen.insert(s.id))
            .collect()
    })
}

/// Strategy for generating a remote snapshot: up to `max` records with
/// distinct record IDs and snippet IDs drawn from a mixed pool of UUID
/// strings and legacy identifiers.
pub fn remote_set_strategy(max: usize) -> impl Strategy<Value = Vec<RemoteRecord>> {
    let record = (
        (0usize..16),
        content_strategy(),
        shortcut_strategy(),
        any::<bool>(),
        timestamp_strategy(),
        timestamp_strategy(),
    )
        .prop_map(|(sid, content, shortcut, show, a, b)| RemoteRecord {
            record_id: RecordId::new(""),
            snippet_id: format!("device-{sid}"),
            title: content.clone(),
            content,
            shortcut,
            show_in_menu: i64::from(show),
            created_at: a.min(b),
            updated_at: a.max(b),
        });

    prop::collection::vec(record, 0..=max).prop_map(|records| {
        records
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.record_id = RecordId::new(format!("rec-{i}"));
                r
            })
            .collect()
    })
}

/// Strategy for generating a correlated (local, remote) snapshot pair.
///
/// Some records mirror local identities, some locals carry remote links
/// (valid, blank or orphaned), so every merge pass and the repair pass
/// see traffic.
pub fn sync_snapshot_strategy(
    max_local: usize,
    max_remote: usize,
) -> impl Strategy<Value = (Vec<Snippet>, Vec<RemoteRecord>)> {
    (local_set_strategy(max_local), remote_set_strategy(max_remote)).prop_flat_map(
        |(locals, records)| {
            let id_targets = prop::collection::vec(
                prop::option::of(any::<prop::sample::Index>()),
                records.len(),
            );
            let links = prop::collection::vec(
                (0u8..4, any::<prop::sample::Index>()),
                locals.len(),
            );
            (Just(locals), Just(records), id_targets, links).prop_map(
                |(mut locals, mut records, id_targets, links)| {
                    for (record, target) in records.iter_mut().zip(id_targets) {
                        if let (Some(index), false) = (target, locals.is_empty()) {
                            record.snippet_id = locals[index.index(locals.len())].id.to_string();
                        }
                    }
                    for (snippet, (choice, index)) in locals.iter_mut().zip(links) {
                        snippet.remote_id = match choice {
                            1 => Some(RecordId::new("  ")),
                            2 if !records.is_empty() => {
                                Some(records[index.index(records.len())].record_id.clone())
                            }
                            3 => Some(RecordId::new(format!("orphan-{}", index.index(50)))),
                            _ => None,
                        };
                    }
                    (locals, records)
                },
            )
        },
    )
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn snippet_timestamps_are_ordered(snippet in snippet_strategy()) {
            prop_assert!(snippet.created_at <= snippet.updated_at);
        }

        #[test]
        fn local_set_ids_are_distinct(snippets in local_set_strategy(8)) {
            let ids: HashSet<_> = snippets.iter().map(|s| s.id).collect();
            prop_assert_eq!(ids.len(), snippets.len());
        }

        #[test]
        fn remote_set_record_ids_are_distinct(records in remote_set_strategy(8)) {
            let ids: HashSet<_> = records.iter().map(|r| r.record_id.clone()).collect();
            prop_assert_eq!(ids.len(), records.len());
        }
    }
}
