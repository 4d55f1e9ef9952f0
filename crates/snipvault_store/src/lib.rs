//! # SnipVault Store
//!
//! Local persistence boundary for SnipVault.
//!
//! This crate provides:
//! - [`SnippetStore`] - the typed CRUD + predicate-query trait the sync
//!   engine talks to (synchronous and durable from the caller's view)
//! - [`MemoryStore`] - a thread-safe in-memory implementation used by the
//!   engine's tests and by hosts without their own backing store
//! - [`SignalHub`] - fan-out of "hotkeys changed" / "menu contents
//!   changed" signals to collaborators such as the hotkey registrar and
//!   the menu renderer

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod signal;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use signal::{SignalHub, StoreSignal};
pub use store::SnippetStore;
