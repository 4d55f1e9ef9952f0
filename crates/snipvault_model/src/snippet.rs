//! The local snippet entity.

use crate::{RecordId, SnippetId, Timestamp};
use serde::{Deserialize, Serialize};

/// A snippet as stored on this device.
///
/// Beyond the user-visible fields (title, content, shortcut, display flag)
/// a snippet carries the bookkeeping the sync engine needs: a remote link,
/// the last successful sync time, and a dirty flag marking changes the
/// remote side has not seen yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Stable 128-bit identity, shared with the remote record.
    pub id: SnippetId,
    /// Display title.
    pub title: String,
    /// Snippet body; also the secondary dedup key during merge.
    pub content: String,
    /// Optional global shortcut key owning this snippet.
    pub shortcut: Option<String>,
    /// Whether the snippet is shown in the menu bar.
    pub show_in_menu: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time; drives last-writer-wins.
    pub updated_at: Timestamp,
    /// Link to the remote record, when one exists.
    pub remote_id: Option<RecordId>,
    /// Time of the last acknowledged upload.
    pub last_synced: Option<Timestamp>,
    /// True if local changes have not reached the remote yet.
    pub dirty: bool,
}

impl Snippet {
    /// Creates a new locally-authored snippet: dirty and unlinked.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: SnippetId::new(),
            title: title.into(),
            content: content.into(),
            shortcut: None,
            show_in_menu: true,
            created_at: now,
            updated_at: now,
            remote_id: None,
            last_synced: None,
            dirty: true,
        }
    }

    /// Returns true if the snippet holds a non-blank remote link.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.remote_id.as_ref().is_some_and(|id| !id.is_blank())
    }

    /// Returns the normalized shortcut key, if any.
    #[must_use]
    pub fn shortcut_key(&self) -> Option<String> {
        normalize_shortcut(self.shortcut.as_deref())
    }

    /// Records a user edit: bumps `updated_at` and marks the snippet dirty.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
        self.dirty = true;
    }

    /// Marks an acknowledged upload: links the snippet, clears the dirty
    /// flag and stamps `last_synced`.
    pub fn mark_synced(&mut self, remote_id: RecordId) {
        self.remote_id = Some(remote_id);
        self.dirty = false;
        self.last_synced = Some(Timestamp::now());
    }

    /// Drops the remote link and marks the snippet dirty so it is
    /// re-uploaded on the next sync.
    pub fn unlink(&mut self) {
        self.remote_id = None;
        self.dirty = true;
    }
}

/// Normalizes a shortcut key: trims whitespace, treats blank as none.
#[must_use]
pub fn normalize_shortcut(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
