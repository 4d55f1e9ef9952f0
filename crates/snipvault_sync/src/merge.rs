//! The merge resolver.
//!
//! A pure function of a (local, remote) snapshot pair. Resolution is
//! whole-record last-writer-wins by `updated_at`; an exact tie keeps the
//! local payload. Two ordered passes match by identity and then by
//! content, followed by a repair pass over remote links. Re-running the
//! resolver on its own output reaches a fixed point.

use snipvault_model::{RecordId, Snippet, SnippetId};
use snipvault_remote::RemoteRecord;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Counters accumulated during one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounters {
    /// Remote records that overwrote or materialized a local snippet.
    pub downloaded: u64,
    /// Remote records discarded as same-content duplicates.
    pub skipped: u64,
    /// Incoming shortcut keys dropped because another snippet owns them.
    pub cleared_shortcuts: u64,
}

/// Result of one merge resolution.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The full resulting local set, ordered by (created_at, id).
    pub snippets: Vec<Snippet>,
    /// Snippets that differ from the input snapshot (new or mutated).
    /// Empty when the merge was a no-op.
    pub changes: Vec<Snippet>,
    /// Merge counters.
    pub counters: MergeCounters,
    /// True if any shortcut assignment changed.
    pub hotkeys_changed: bool,
    /// True if menu-visible contents changed (new snippets, display
    /// flags, titles or bodies).
    pub menu_changed: bool,
}

impl MergeOutcome {
    /// Returns true if the merge mutated nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Candidate ordering shared by both passes: `updated_at` descending,
/// ties broken by `snippet_id` ascending. This makes shortcut ownership
/// deterministic when timestamps tie exactly.
fn candidate_order(a: &RemoteRecord, b: &RemoteRecord) -> std::cmp::Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.snippet_id.cmp(&b.snippet_id))
}

/// Index collision rule: keep the record with the later `updated_at`;
/// exact ties keep the smaller `record_id`.
fn keep_later<'a>(current: &'a RemoteRecord, incoming: &'a RemoteRecord) -> &'a RemoteRecord {
    match incoming
        .updated_at
        .cmp(&current.updated_at)
        .then_with(|| current.record_id.cmp(&incoming.record_id))
    {
        std::cmp::Ordering::Greater => incoming,
        _ => current,
    }
}

/// Claims or drops a winner's shortcut key against the single-owner map.
fn renegotiate_shortcut(
    snippet: &mut Snippet,
    owners: &mut HashMap<String, SnippetId>,
    cleared: &mut u64,
) {
    if let Some(key) = snippet.shortcut_key() {
        match owners.get(&key) {
            Some(owner) if *owner != snippet.id => {
                debug!(snippet = %snippet.id, key = %key, "shortcut already owned, dropping");
                snippet.shortcut = None;
                // The clear must reach the remote side too.
                snippet.dirty = true;
                *cleared += 1;
            }
            _ => {
                owners.insert(key, snippet.id);
            }
        }
    }
}

/// Applies last-writer-wins between a matched pair. Returns true if the
/// remote side won. The local identity is never touched.
fn apply_lww(
    snippet: &mut Snippet,
    record: &RemoteRecord,
    owners: &mut HashMap<String, SnippetId>,
    cleared: &mut u64,
) -> bool {
    if snippet.updated_at >= record.updated_at {
        // Local wins. Correct a remote link pointing elsewhere, and queue
        // a future overwrite of the remote side when payloads differ.
        if snippet.remote_id.as_ref() != Some(&record.record_id) {
            snippet.remote_id = Some(record.record_id.clone());
        }
        if !record.payload_matches(snippet) {
            snippet.dirty = true;
        }
        false
    } else {
        let old_key = snippet.shortcut_key();
        record.apply_to(snippet);
        // Release stale ownership before renegotiating the incoming key.
        if let Some(old) = old_key {
            if snippet.shortcut_key().as_deref() != Some(old.as_str())
                && owners.get(&old) == Some(&snippet.id)
            {
                owners.remove(&old);
            }
        }
        renegotiate_shortcut(snippet, owners, cleared);
        true
    }
}

/// Reconciles a remote snapshot into a local snapshot.
#[must_use]
pub fn resolve(local: &[Snippet], remote: &[RemoteRecord]) -> MergeOutcome {
    let original: HashMap<SnippetId, Snippet> =
        local.iter().map(|s| (s.id, s.clone())).collect();
    let mut snippets: BTreeMap<SnippetId, Snippet> =
        local.iter().map(|s| (s.id, s.clone())).collect();

    // Indexes over the input snapshots. The collision rule keeps the
    // entry with the later updated_at.
    let mut remote_by_id: HashMap<SnippetId, &RemoteRecord> = HashMap::new();
    for record in remote {
        remote_by_id
            .entry(record.local_id())
            .and_modify(|held| *held = keep_later(held, record))
            .or_insert(record);
    }

    // Locals with an identity match are resolved in pass A and excluded
    // from content matching entirely; without the exclusion a record
    // could match them on content pass A is about to rewrite, and the
    // resolver would stop being a fixed point.
    let mut local_by_content: HashMap<&str, SnippetId> = HashMap::new();
    for s in local.iter().filter(|s| !remote_by_id.contains_key(&s.id)) {
        local_by_content
            .entry(s.content.as_str())
            .and_modify(|held| {
                if let Some(h) = original.get(held) {
                    // Later updated_at wins; exact ties keep the smaller
                    // id so the index is independent of input order.
                    if (s.updated_at, h.id) > (h.updated_at, s.id) {
                        *held = s.id;
                    }
                }
            })
            .or_insert(s.id);
    }

    let mut canonical_by_content: HashMap<&str, &RemoteRecord> = HashMap::new();
    for record in remote {
        canonical_by_content
            .entry(record.content.as_str())
            .and_modify(|held| *held = keep_later(held, record))
            .or_insert(record);
    }

    let mut counters = MergeCounters {
        skipped: (remote.len() - canonical_by_content.len()) as u64,
        ..MergeCounters::default()
    };

    // Single-owner shortcut map, seeded from the local snapshot. Seeding
    // walks the same deterministic order as the passes so pre-existing
    // duplicate keys resolve to the most recently updated holder.
    let mut owners: HashMap<String, SnippetId> = HashMap::new();
    let mut seed_order: Vec<SnippetId> = local.iter().map(|s| s.id).collect();
    seed_order.sort_by(|a, b| {
        let (sa, sb) = (&original[a], &original[b]);
        sb.updated_at.cmp(&sa.updated_at).then_with(|| a.cmp(b))
    });
    for id in seed_order {
        if let Some(snippet) = snippets.get_mut(&id) {
            renegotiate_shortcut(snippet, &mut owners, &mut counters.cleared_shortcuts);
        }
    }

    // Pass A: identity match.
    let mut pass_a: Vec<&RemoteRecord> = remote_by_id
        .values()
        .filter(|r| original.contains_key(&r.local_id()))
        .copied()
        .collect();
    pass_a.sort_by(|a, b| candidate_order(a, b));
    for record in pass_a {
        if let Some(snippet) = snippets.get_mut(&record.local_id()) {
            if apply_lww(snippet, record, &mut owners, &mut counters.cleared_shortcuts) {
                counters.downloaded += 1;
            }
        }
    }

    // Pass B: content match, over canonical records not consumed above.
    let mut pass_b: Vec<&RemoteRecord> = canonical_by_content
        .values()
        .filter(|r| !original.contains_key(&r.local_id()))
        .copied()
        .collect();
    pass_b.sort_by(|a, b| candidate_order(a, b));
    for record in pass_b {
        let adopted_id = record.local_id();
        if snippets.contains_key(&adopted_id) {
            // A same-identity snippet was materialized earlier in this
            // pass; this record lost the identity-index collision and is
            // superseded.
            debug!(record = %record.record_id, "dropping superseded same-identity record");
            continue;
        }

        match local_by_content.get(record.content.as_str()).copied() {
            Some(local_id) => {
                if let Some(snippet) = snippets.get_mut(&local_id) {
                    if apply_lww(snippet, record, &mut owners, &mut counters.cleared_shortcuts) {
                        counters.downloaded += 1;
                    }
                }
            }
            None => {
                let mut snippet = record.to_snippet();
                renegotiate_shortcut(&mut snippet, &mut owners, &mut counters.cleared_shortcuts);
                debug!(snippet = %snippet.id, "materializing snippet from remote record");
                snippets.insert(snippet.id, snippet);
                counters.downloaded += 1;
            }
        }
    }

    // Repair pass: normalize blank links, unlink orphans so they are
    // re-uploaded instead of stuck forever.
    let remote_ids: HashSet<&RecordId> = remote.iter().map(|r| &r.record_id).collect();
    for snippet in snippets.values_mut() {
        let Some(remote_id) = snippet.remote_id.clone() else {
            continue;
        };
        if remote_id.is_blank() {
            snippet.remote_id = None;
        } else if !remote_ids.contains(&remote_id) {
            debug!(snippet = %snippet.id, link = %remote_id, "remote link orphaned, unlinking");
            snippet.unlink();
        }
    }

    // Diff against the input snapshot for change application and signals.
    let mut changes = Vec::new();
    let mut hotkeys_changed = false;
    let mut menu_changed = false;
    for snippet in snippets.values() {
        match original.get(&snippet.id) {
            Some(before) => {
                if before != snippet {
                    changes.push(snippet.clone());
                }
                if before.shortcut_key() != snippet.shortcut_key() {
                    hotkeys_changed = true;
                }
                if before.show_in_menu != snippet.show_in_menu
                    || before.title != snippet.title
                    || before.content != snippet.content
                {
                    menu_changed = true;
                }
            }
            None => {
                changes.push(snippet.clone());
                menu_changed = true;
                if snippet.shortcut_key().is_some() {
                    hotkeys_changed = true;
                }
            }
        }
    }

    let mut snippets: Vec<Snippet> = snippets.into_values().collect();
    snippets.sort_by_key(|s| (s.created_at, s.id));

    MergeOutcome {
        snippets,
        changes,
        counters,
        hotkeys_changed,
        menu_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipvault_model::Timestamp;

    fn snippet(content: &str, updated_at: i64) -> Snippet {
        let mut s = Snippet::new(content, content);
        s.title = content.to_string();
        s.created_at = Timestamp::from_millis(updated_at);
        s.updated_at = Timestamp::from_millis(updated_at);
        s
    }

    fn record(snippet_id: &str, content: &str, updated_at: i64) -> RemoteRecord {
        RemoteRecord {
            record_id: RecordId::new(format!("rec-{snippet_id}")),
            snippet_id: snippet_id.to_string(),
            title: content.to_string(),
            content: content.to_string(),
            shortcut: None,
            show_in_menu: 1,
            created_at: Timestamp::from_millis(updated_at),
            updated_at: Timestamp::from_millis(updated_at),
        }
    }

    fn record_for(snippet: &Snippet, updated_at: i64) -> RemoteRecord {
        let mut r = record(&snippet.id.to_string(), &snippet.content, updated_at);
        r.title = snippet.title.clone();
        r.created_at = snippet.created_at;
        r
    }

    #[test]
    fn empty_inputs_are_a_noop() {
        let outcome = resolve(&[], &[]);
        assert!(outcome.is_noop());
        assert_eq!(outcome.counters, MergeCounters::default());
    }

    #[test]
    fn identity_match_remote_later_overwrites_local() {
        let local = snippet("foo", 1_000);
        let mut remote = record_for(&local, 2_000);
        remote.content = "foo v2".into();

        let outcome = resolve(&[local.clone()], &[remote.clone()]);
        assert_eq!(outcome.snippets.len(), 1);
        let merged = &outcome.snippets[0];
        assert_eq!(merged.id, local.id);
        assert_eq!(merged.content, "foo v2");
        assert_eq!(merged.updated_at, Timestamp::from_millis(2_000));
        assert!(!merged.dirty);
        assert_eq!(merged.remote_id, Some(remote.record_id));
        assert_eq!(outcome.counters.downloaded, 1);
    }

    #[test]
    fn identity_match_exact_tie_keeps_local_payload() {
        let mut local = snippet("foo", 1_000);
        local.title = "local title".into();
        let mut remote = record_for(&local, 1_000);
        remote.title = "remote title".into();

        let outcome = resolve(&[local.clone()], &[remote.clone()]);
        let merged = &outcome.snippets[0];
        assert_eq!(merged.title, "local title");
        // Payload differs, so the local side queues a future overwrite.
        assert!(merged.dirty);
        assert_eq!(merged.remote_id, Some(remote.record_id));
        assert_eq!(outcome.counters.downloaded, 0);
    }

    #[test]
    fn identity_match_local_later_corrects_stray_link() {
        let mut local = snippet("foo", 3_000);
        local.remote_id = Some(RecordId::new("rec-elsewhere"));
        local.dirty = false;
        let remote = record_for(&local, 1_000);

        let outcome = resolve(&[local.clone()], &[remote.clone()]);
        let merged = &outcome.snippets[0];
        assert_eq!(merged.remote_id, Some(remote.record_id));
        // Payload matched, so no overwrite is queued.
        assert!(!merged.dirty);
        assert_eq!(merged.updated_at, local.updated_at);
    }

    #[test]
    fn timestamp_law_result_is_max_of_pair() {
        for (local_ms, remote_ms) in [(1_000, 2_000), (2_000, 1_000), (1_500, 1_500)] {
            let local = snippet("foo", local_ms);
            let remote = record_for(&local, remote_ms);
            let outcome = resolve(&[local], &[remote]);
            assert_eq!(
                outcome.snippets[0].updated_at,
                Timestamp::from_millis(local_ms.max(remote_ms))
            );
        }
    }

    #[test]
    fn content_match_never_overwrites_local_id() {
        let local = snippet("shared content", 1_000);
        let remote = record("other-device-id", "shared content", 2_000);

        let outcome = resolve(&[local.clone()], &[remote.clone()]);
        assert_eq!(outcome.snippets.len(), 1);
        let merged = &outcome.snippets[0];
        assert_eq!(merged.id, local.id);
        assert_eq!(merged.remote_id, Some(remote.record_id));
        assert!(!merged.dirty);
    }

    #[test]
    fn unmatched_remote_record_materializes_with_adopted_id() {
        let remote = record("u1", "bar", 1_000);
        let outcome = resolve(&[], &[remote.clone()]);

        assert_eq!(outcome.snippets.len(), 1);
        let merged = &outcome.snippets[0];
        assert_eq!(merged.id, SnippetId::from_remote_str("u1"));
        assert_eq!(merged.content, "bar");
        assert!(merged.remote_id.is_some());
        assert!(!merged.dirty);
        assert_eq!(outcome.counters.downloaded, 1);
        assert!(outcome.menu_changed);
    }

    #[test]
    fn duplicate_content_records_canonicalize_to_latest() {
        let mut older = record("u1", "dup", 1_000);
        older.title = "older".into();
        let mut newer = record("u2", "dup", 2_000);
        newer.title = "newer".into();

        let outcome = resolve(&[], &[older, newer]);
        assert_eq!(outcome.snippets.len(), 1);
        assert_eq!(outcome.snippets[0].title, "newer");
        assert_eq!(outcome.counters.skipped, 1);
    }

    #[test]
    fn shortcut_collision_drops_incoming_key() {
        let mut holder = snippet("holder", 5_000);
        holder.shortcut = Some("cmd-a".into());
        let mut incoming = record("u9", "newcomer", 1_000);
        incoming.shortcut = Some("cmd-a".into());

        let outcome = resolve(&[holder.clone()], &[incoming]);
        assert_eq!(outcome.snippets.len(), 2);

        let holders: Vec<_> = outcome
            .snippets
            .iter()
            .filter(|s| s.shortcut_key() == Some("cmd-a".into()))
            .collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].id, holder.id);
        assert_eq!(outcome.counters.cleared_shortcuts, 1);
    }

    #[test]
    fn preexisting_duplicate_local_shortcuts_resolve_to_latest_holder() {
        let mut a = snippet("a", 1_000);
        a.shortcut = Some("cmd-x".into());
        let mut b = snippet("b", 2_000);
        b.shortcut = Some("cmd-x".into());

        let outcome = resolve(&[a.clone(), b.clone()], &[]);
        let holders: Vec<_> = outcome
            .snippets
            .iter()
            .filter(|s| s.shortcut_key() == Some("cmd-x".into()))
            .collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].id, b.id);
        assert!(outcome.hotkeys_changed);
    }

    #[test]
    fn orphaned_link_is_unlinked_and_dirtied() {
        let mut local = snippet("foo", 1_000);
        local.remote_id = Some(RecordId::new("rec-gone"));
        local.dirty = false;

        let outcome = resolve(&[local], &[]);
        let merged = &outcome.snippets[0];
        assert!(merged.remote_id.is_none());
        assert!(merged.dirty);
    }

    #[test]
    fn blank_link_is_normalized_without_dirtying() {
        let mut local = snippet("foo", 1_000);
        local.remote_id = Some(RecordId::new("   "));
        local.dirty = false;

        let outcome = resolve(&[local], &[]);
        let merged = &outcome.snippets[0];
        assert!(merged.remote_id.is_none());
        assert!(!merged.dirty);
    }

    #[test]
    fn resolver_is_idempotent() {
        let mut linked = snippet("keep", 1_000);
        linked.shortcut = Some("cmd-k".into());
        let unlinked = snippet("mine only", 500);
        let mut orphan = snippet("orphan", 700);
        orphan.remote_id = Some(RecordId::new("rec-gone"));
        orphan.dirty = false;

        let remote = vec![
            record_for(&linked, 2_000),
            record("u1", "fresh", 900),
            record("u2", "fresh", 800), // duplicate content, skipped
        ];

        let first = resolve(&[linked, unlinked, orphan], &remote);
        let second = resolve(&first.snippets, &remote);

        assert!(second.is_noop());
        assert_eq!(second.snippets, first.snippets);
        assert_eq!(second.counters.downloaded, 0);
        assert_eq!(second.counters.cleared_shortcuts, 0);
        // Duplicate-content skips are observational and recur per run.
        assert_eq!(second.counters.skipped, 1);
    }

    #[test]
    fn cleared_shortcut_is_queued_for_upload() {
        let mut holder = snippet("holder", 5_000);
        holder.shortcut = Some("cmd-a".into());
        let mut incoming = record("u9", "newcomer", 1_000);
        incoming.shortcut = Some("cmd-a".into());

        let outcome = resolve(&[holder], &[incoming]);
        let loser = outcome
            .snippets
            .iter()
            .find(|s| s.content == "newcomer")
            .unwrap();
        assert!(loser.shortcut.is_none());
        assert!(loser.dirty);
    }

    #[test]
    fn identity_match_shields_the_local_from_content_matching() {
        let local = snippet("shared", 1_000);
        let by_id = record_for(&local, 2_000);
        // Another device holds the same content under its own identity,
        // updated even later. It must not steal the identity-matched
        // snippet's link; it materializes on its own.
        let by_content = record("other-device", "shared", 3_000);

        let first = resolve(&[local.clone()], &[by_id.clone(), by_content.clone()]);
        assert_eq!(first.snippets.len(), 2);
        let kept = first.snippets.iter().find(|s| s.id == local.id).unwrap();
        assert_eq!(kept.remote_id, Some(by_id.record_id.clone()));
        let materialized = first
            .snippets
            .iter()
            .find(|s| s.id == SnippetId::from_remote_str("other-device"))
            .unwrap();
        assert_eq!(materialized.remote_id, Some(by_content.record_id.clone()));

        let second = resolve(&first.snippets, &[by_id, by_content]);
        assert!(second.is_noop());
    }

    #[test]
    fn tie_with_shortcut_collision_is_deterministic() {
        // Two unmatched remote records with equal timestamps contending
        // for one key: the smaller snippet_id claims it.
        let mut a = record("u-b", "content b", 1_000);
        a.shortcut = Some("cmd-t".into());
        let mut b = record("u-a", "content a", 1_000);
        b.shortcut = Some("cmd-t".into());

        let outcome = resolve(&[], &[a, b]);
        let holders: Vec<_> = outcome
            .snippets
            .iter()
            .filter(|s| s.shortcut_key() == Some("cmd-t".into()))
            .collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].id, SnippetId::from_remote_str("u-a"));
        assert_eq!(outcome.counters.cleared_shortcuts, 1);
    }
}
