//! In-memory store implementation.

use crate::error::{StoreError, StoreResult};
use crate::store::SnippetStore;
use parking_lot::RwLock;
use snipvault_model::{Snippet, SnippetId};
use std::collections::HashMap;

/// A thread-safe in-memory snippet store.
///
/// One RwLock guards the whole collection, making it the "single logical
/// owner" of local mutations. `save` is a no-op flush.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snippets: RwLock<HashMap<SnippetId, Snippet>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given snippets.
    #[must_use]
    pub fn with_snippets(snippets: impl IntoIterator<Item = Snippet>) -> Self {
        let map = snippets.into_iter().map(|s| (s.id, s)).collect();
        Self {
            snippets: RwLock::new(map),
        }
    }

    /// Returns the number of stored snippets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snippets.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snippets.read().is_empty()
    }
}

impl SnippetStore for MemoryStore {
    fn insert(&self, snippet: Snippet) -> StoreResult<()> {
        let mut snippets = self.snippets.write();
        if snippets.contains_key(&snippet.id) {
            return Err(StoreError::AlreadyExists(snippet.id));
        }
        snippets.insert(snippet.id, snippet);
        Ok(())
    }

    fn upsert(&self, snippet: Snippet) -> StoreResult<()> {
        self.snippets.write().insert(snippet.id, snippet);
        Ok(())
    }

    fn delete(&self, id: &SnippetId) -> StoreResult<()> {
        self.snippets
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(*id))
    }

    fn get(&self, id: &SnippetId) -> StoreResult<Option<Snippet>> {
        Ok(self.snippets.read().get(id).cloned())
    }

    fn fetch(&self, predicate: &dyn Fn(&Snippet) -> bool) -> StoreResult<Vec<Snippet>> {
        let mut matched: Vec<Snippet> = self
            .snippets
            .read()
            .values()
            .filter(|s| predicate(s))
            .cloned()
            .collect();
        // Stable order for callers that iterate.
        matched.sort_by_key(|s| (s.created_at, s.id));
        Ok(matched)
    }

    fn save(&self) -> StoreResult<()> {
        Ok(())
    }
}
