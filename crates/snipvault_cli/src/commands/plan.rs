//! Plan command implementation.
//!
//! Runs the merge resolver over two snapshot files and prints what a
//! full sync would change, without touching either side.

use serde::Serialize;
use snipvault_model::Snippet;
use snipvault_sync::{resolve, MergeOutcome};
use std::path::Path;
use tracing::debug;

/// A dry-run summary of one merge.
#[derive(Debug, Serialize)]
pub struct PlanSummary {
    /// Snippets in the resulting local set.
    pub total: usize,
    /// Snippets that would be created locally.
    pub created: usize,
    /// Snippets that would be mutated locally.
    pub updated: usize,
    /// Snippets that would still need uploading after the merge.
    pub pending_upload: usize,
    /// Remote records that would overwrite or materialize local state.
    pub downloaded: u64,
    /// Remote records discarded as same-content duplicates.
    pub skipped: u64,
    /// Shortcut keys that would be dropped.
    pub cleared_shortcuts: u64,
    /// Whether hotkey registrations would change.
    pub hotkeys_changed: bool,
    /// Whether menu contents would change.
    pub menu_changed: bool,
}

impl PlanSummary {
    fn from_outcome(local: &[Snippet], outcome: &MergeOutcome) -> Self {
        let local_ids: std::collections::HashSet<_> = local.iter().map(|s| s.id).collect();
        let created = outcome
            .changes
            .iter()
            .filter(|s| !local_ids.contains(&s.id))
            .count();
        Self {
            total: outcome.snippets.len(),
            created,
            updated: outcome.changes.len() - created,
            pending_upload: outcome
                .snippets
                .iter()
                .filter(|s| s.dirty || !s.is_linked())
                .count(),
            downloaded: outcome.counters.downloaded,
            skipped: outcome.counters.skipped,
            cleared_shortcuts: outcome.counters.cleared_shortcuts,
            hotkeys_changed: outcome.hotkeys_changed,
            menu_changed: outcome.menu_changed,
        }
    }
}

/// Runs the plan command.
pub fn run(local: &Path, remote: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let local_snapshot = super::load_local(local)?;
    let remote_snapshot = super::load_remote(remote)?;
    debug!(
        snippets = local_snapshot.len(),
        records = remote_snapshot.len(),
        "snapshots loaded"
    );

    let outcome = resolve(&local_snapshot, &remote_snapshot);
    let summary = PlanSummary::from_outcome(&local_snapshot, &outcome);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print_text(&summary, &outcome),
    }
    Ok(())
}

fn print_text(summary: &PlanSummary, outcome: &MergeOutcome) {
    println!(
        "Merge plan: {} snippets after merge ({} created, {} updated)",
        summary.total, summary.created, summary.updated
    );
    println!(
        "  download: {}, duplicates skipped: {}, shortcuts cleared: {}",
        summary.downloaded, summary.skipped, summary.cleared_shortcuts
    );
    println!("  still pending upload: {}", summary.pending_upload);
    if summary.hotkeys_changed {
        println!("  hotkey registrations would change");
    }
    if summary.menu_changed {
        println!("  menu contents would change");
    }
    for snippet in &outcome.changes {
        println!(
            "  ~ {} {:?} (dirty: {}, linked: {})",
            snippet.id,
            snippet.title,
            snippet.dirty,
            snippet.is_linked()
        );
    }
    if outcome.is_noop() {
        println!("  nothing to do");
    }
}
