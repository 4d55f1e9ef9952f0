//! The local persistence trait.

use crate::error::StoreResult;
use snipvault_model::{Snippet, SnippetId};

/// Typed CRUD and predicate query over the local snippet collection.
///
/// Implementations are synchronous and durable from the engine's point of
/// view: when a call returns `Ok` the mutation has been accepted by the
/// local store. All writes to a given snippet happen on a single logical
/// owner; implementations serialize concurrent callers internally.
pub trait SnippetStore: Send + Sync {
    /// Inserts a new snippet. Fails if the ID already exists.
    fn insert(&self, snippet: Snippet) -> StoreResult<()>;

    /// Inserts or replaces a snippet by ID.
    fn upsert(&self, snippet: Snippet) -> StoreResult<()>;

    /// Deletes a snippet by ID. Fails if it does not exist.
    fn delete(&self, id: &SnippetId) -> StoreResult<()>;

    /// Fetches a single snippet by ID.
    fn get(&self, id: &SnippetId) -> StoreResult<Option<Snippet>>;

    /// Fetches all snippets matching the predicate.
    fn fetch(&self, predicate: &dyn Fn(&Snippet) -> bool) -> StoreResult<Vec<Snippet>>;

    /// Fetches every snippet.
    fn all(&self) -> StoreResult<Vec<Snippet>> {
        self.fetch(&|_| true)
    }

    /// Flushes pending writes to durable storage.
    fn save(&self) -> StoreResult<()>;
}
