//! The remote record schema and conversions to/from local snippets.

use serde::{Deserialize, Serialize};
use snipvault_model::{normalize_shortcut, RecordId, Snippet, SnippetId, Timestamp};

/// A snippet as stored in the per-account remote record store.
///
/// `snippet_id` mirrors the local snippet identity; `record_id` is the
/// remote store's own opaque identifier and doubles as the local side's
/// remote link. The display flag travels as a 0/1 integer on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Remote-assigned record identifier. Blank until first save.
    pub record_id: RecordId,
    /// Mirror of the local snippet identity.
    pub snippet_id: String,
    /// Display title.
    pub title: String,
    /// Snippet body.
    pub content: String,
    /// Optional shortcut key.
    pub shortcut: Option<String>,
    /// Display flag, 0 or 1.
    pub show_in_menu: i64,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

impl RemoteRecord {
    /// Builds a fresh record from a local snippet, with a blank record ID
    /// for the remote side to assign on save.
    #[must_use]
    pub fn from_snippet(snippet: &Snippet) -> Self {
        Self {
            record_id: RecordId::new(""),
            snippet_id: snippet.id.to_string(),
            title: snippet.title.clone(),
            content: snippet.content.clone(),
            shortcut: snippet.shortcut_key(),
            show_in_menu: i64::from(snippet.show_in_menu),
            created_at: snippet.created_at,
            updated_at: snippet.updated_at,
        }
    }

    /// The local identity this record maps to.
    #[must_use]
    pub fn local_id(&self) -> SnippetId {
        SnippetId::from_remote_str(&self.snippet_id)
    }

    /// Wire display flag as a bool.
    #[must_use]
    pub fn shows_in_menu(&self) -> bool {
        self.show_in_menu != 0
    }

    /// Normalized shortcut key, if any.
    #[must_use]
    pub fn shortcut_key(&self) -> Option<String> {
        normalize_shortcut(self.shortcut.as_deref())
    }

    /// Copies the local payload fields into this record, leaving the
    /// remote-owned metadata (`record_id`, `snippet_id`, `created_at`)
    /// untouched. Used by the fetch-modify-save update path.
    pub fn copy_fields_from(&mut self, snippet: &Snippet) {
        self.title = snippet.title.clone();
        self.content = snippet.content.clone();
        self.shortcut = snippet.shortcut_key();
        self.show_in_menu = i64::from(snippet.show_in_menu);
        self.updated_at = snippet.updated_at;
    }

    /// Materializes a new local snippet from this record: linked, clean,
    /// adopting the record's snippet identity.
    #[must_use]
    pub fn to_snippet(&self) -> Snippet {
        Snippet {
            id: self.local_id(),
            title: self.title.clone(),
            content: self.content.clone(),
            shortcut: self.shortcut_key(),
            show_in_menu: self.shows_in_menu(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            remote_id: Some(self.record_id.clone()),
            last_synced: Some(self.updated_at),
            dirty: false,
        }
    }

    /// Overwrites a local snippet with this record's payload and
    /// timestamps, links it and clears the dirty flag. The local identity
    /// is never touched.
    pub fn apply_to(&self, snippet: &mut Snippet) {
        snippet.title = self.title.clone();
        snippet.content = self.content.clone();
        snippet.shortcut = self.shortcut_key();
        snippet.show_in_menu = self.shows_in_menu();
        snippet.created_at = self.created_at;
        snippet.updated_at = self.updated_at;
        snippet.remote_id = Some(self.record_id.clone());
        snippet.last_synced = Some(self.updated_at);
        snippet.dirty = false;
    }

    /// Returns true if the user-visible payload equals the snippet's.
    #[must_use]
    pub fn payload_matches(&self, snippet: &Snippet) -> bool {
        self.title == snippet.title
            && self.content == snippet.content
            && self.shortcut_key() == snippet.shortcut_key()
            && self.shows_in_menu() == snippet.show_in_menu
    }
}
