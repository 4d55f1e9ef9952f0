//! Per-snippet debounced upload scheduling.

use parking_lot::Mutex;
use snipvault_model::SnippetId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Debounces remote pushes per snippet.
///
/// Each `schedule` call for a snippet cancels that snippet's pending
/// timer and starts a new one; timers for different snippets are
/// independent. When a timer expires uncancelled, the scheduler runs its
/// action with the snippet ID on a background thread.
pub struct UploadScheduler {
    delay: Duration,
    generations: Arc<Mutex<HashMap<SnippetId, u64>>>,
    counter: AtomicU64,
    action: Arc<dyn Fn(SnippetId) + Send + Sync>,
}

impl UploadScheduler {
    /// Creates a scheduler running `action` after `delay` of quiet time
    /// per snippet.
    pub fn new(delay: Duration, action: impl Fn(SnippetId) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            generations: Arc::new(Mutex::new(HashMap::new())),
            counter: AtomicU64::new(0),
            action: Arc::new(action),
        }
    }

    /// Schedules (or reschedules) the snippet's push.
    pub fn schedule(&self, id: SnippetId) {
        // Generations are globally unique so a timer orphaned by
        // cancel-then-reschedule can never match again.
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.generations.lock().insert(id, generation);

        let delay = self.delay;
        let generations = Arc::clone(&self.generations);
        let action = Arc::clone(&self.action);
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let still_current = {
                let mut pending = generations.lock();
                match pending.get(&id) {
                    Some(current) if *current == generation => {
                        pending.remove(&id);
                        true
                    }
                    _ => false,
                }
            };
            if still_current {
                action(id);
            }
        });
    }

    /// Cancels the snippet's pending push, if any.
    pub fn cancel(&self, id: &SnippetId) {
        self.generations.lock().remove(id);
    }

    /// Cancels every pending push.
    pub fn cancel_all(&self) {
        self.generations.lock().clear();
    }

    /// Number of snippets with a pending push.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.generations.lock().len()
    }
}
