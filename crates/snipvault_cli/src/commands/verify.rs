//! Verify command implementation.
//!
//! Checks a local snapshot against the invariants the sync engine
//! maintains: unique shortcut ownership, no blank remote links, and,
//! when a remote snapshot is given, no links into thin air.

use snipvault_model::Snippet;
use snipvault_remote::RemoteRecord;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of snippets checked.
    pub snippets_checked: usize,
    /// Problems found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks the invariants over a snapshot pair.
pub fn check(local: &[Snippet], remote: Option<&[RemoteRecord]>) -> VerifyResult {
    let mut result = VerifyResult {
        snippets_checked: local.len(),
        ..VerifyResult::default()
    };

    let mut owners: HashMap<String, Vec<String>> = HashMap::new();
    for snippet in local {
        if let Some(key) = snippet.shortcut_key() {
            owners.entry(key).or_default().push(snippet.id.to_string());
        }
    }
    for (key, holders) in owners {
        if holders.len() > 1 {
            result.errors.push(format!(
                "shortcut {:?} held by {} snippets: {}",
                key,
                holders.len(),
                holders.join(", ")
            ));
        }
    }

    for snippet in local {
        if let Some(link) = &snippet.remote_id {
            if link.is_blank() {
                result
                    .errors
                    .push(format!("snippet {} has a blank remote link", snippet.id));
            }
        }
        if snippet.created_at > snippet.updated_at {
            result.errors.push(format!(
                "snippet {} was created after its last update",
                snippet.id
            ));
        }
    }

    if let Some(records) = remote {
        let remote_ids: HashSet<&str> = records.iter().map(|r| r.record_id.as_str()).collect();
        for snippet in local {
            if let Some(link) = &snippet.remote_id {
                if !link.is_blank() && !remote_ids.contains(link.as_str()) {
                    result.errors.push(format!(
                        "snippet {} links to missing record {}",
                        snippet.id, link
                    ));
                }
            }
        }
    }

    result
}

/// Runs the verify command.
pub fn run(local: &Path, remote: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let local_snapshot = super::load_local(local)?;
    let remote_snapshot = remote.map(super::load_remote).transpose()?;
    debug!(
        snippets = local_snapshot.len(),
        with_remote = remote_snapshot.is_some(),
        "snapshots loaded"
    );

    let result = check(&local_snapshot, remote_snapshot.as_deref());
    println!("Checked {} snippets", result.snippets_checked);
    for error in &result.errors {
        println!("  ERROR: {error}");
    }

    if result.is_ok() {
        println!("✓ Snapshot verification passed");
        Ok(())
    } else {
        println!("✗ Snapshot verification failed");
        Err("Verification failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipvault_model::RecordId;

    #[test]
    fn clean_snapshot_passes() {
        let snippets = vec![Snippet::new("a", "x"), Snippet::new("b", "y")];
        assert!(check(&snippets, None).is_ok());
    }

    #[test]
    fn duplicate_shortcuts_are_reported() {
        let mut a = Snippet::new("a", "x");
        a.shortcut = Some("cmd-a".into());
        let mut b = Snippet::new("b", "y");
        b.shortcut = Some(" cmd-a ".into());

        let result = check(&[a, b], None);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("cmd-a"));
    }

    #[test]
    fn blank_links_are_reported() {
        let mut snippet = Snippet::new("a", "x");
        snippet.remote_id = Some(RecordId::new("   "));
        let result = check(&[snippet], None);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn orphaned_links_need_a_remote_snapshot() {
        let mut snippet = Snippet::new("a", "x");
        snippet.remote_id = Some(RecordId::new("rec-gone"));

        assert!(check(std::slice::from_ref(&snippet), None).is_ok());
        let result = check(&[snippet], Some(&[]));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("rec-gone"));
    }

    #[test]
    fn run_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        let snippets = vec![Snippet::new("a", "x")];
        std::fs::write(&path, serde_json::to_string(&snippets).unwrap()).unwrap();

        run(&path, None).unwrap();
    }
}
