//! # SnipVault Sync Engine
//!
//! Bidirectional synchronization between the local snippet collection and
//! the per-account remote record store.
//!
//! This crate provides:
//! - The merge resolver: a pure last-writer-wins reconciliation of a
//!   (local, remote) snapshot pair with identity repair and shortcut
//!   renegotiation
//! - The sync engine: full reconciliation (download → merge → upload)
//!   plus single-item create/update/delete
//! - The upload scheduler: per-snippet debounced remote pushes
//! - The sync coordinator: the enablement state machine that serializes
//!   triggers from all call sites
//!
//! ## Key invariants
//!
//! - A full sync never mutates local state before the account check passes
//! - At most one full sync is in flight process-wide; concurrent triggers
//!   return a zero-effect report, they are never queued
//! - The merge resolver is a pure function of its snapshots and reaches a
//!   fixed point when re-run on its own output
//! - Per-record failures inside batches are isolated; the affected
//!   snippet stays dirty for the next externally-triggered sync

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod coordinator;
mod debounce;
mod engine;
mod error;
mod merge;

pub use config::SyncConfig;
pub use coordinator::{SyncActivation, SyncCoordinator};
pub use debounce::UploadScheduler;
pub use engine::{SyncEngine, SyncReport};
pub use error::{account_gate, SyncError, SyncResult};
pub use merge::{resolve, MergeCounters, MergeOutcome};
