//! Change signals for out-of-scope collaborators.
//!
//! Merges, imports and bulk clears can change shortcut assignments and the
//! set of menu-visible snippets. The hotkey registrar and the menu
//! renderer live outside this workspace; the hub is the narrow interface
//! they subscribe to.

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A signal raised after the local collection changed in a way a
/// collaborator cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSignal {
    /// One or more shortcut assignments changed; re-register hotkeys.
    HotkeysChanged,
    /// Menu-visible snippets or display flags changed; re-render the menu.
    MenuChanged,
}

/// Distributes [`StoreSignal`]s to subscribers.
///
/// Signals are emitted after mutations have been applied to the store.
/// Disconnected subscribers are dropped on the next emit.
#[derive(Debug, Default)]
pub struct SignalHub {
    subscribers: RwLock<Vec<Sender<StoreSignal>>>,
}

impl SignalHub {
    /// Creates a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to future signals.
    pub fn subscribe(&self) -> Receiver<StoreSignal> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits a signal to all live subscribers.
    pub fn emit(&self, signal: StoreSignal) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(signal).is_ok());
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn emit_and_receive() {
        let hub = SignalHub::new();
        let rx = hub.subscribe();

        hub.emit(StoreSignal::HotkeysChanged);
        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, StoreSignal::HotkeysChanged);
    }

    #[test]
    fn multiple_subscribers() {
        let hub = SignalHub::new();
        let rx1 = hub.subscribe();
        let rx2 = hub.subscribe();

        hub.emit(StoreSignal::MenuChanged);
        assert_eq!(rx1.recv().unwrap(), StoreSignal::MenuChanged);
        assert_eq!(rx2.recv().unwrap(), StoreSignal::MenuChanged);
    }

    #[test]
    fn subscriber_cleanup() {
        let hub = SignalHub::new();
        let rx = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);

        drop(rx);
        hub.emit(StoreSignal::MenuChanged);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
