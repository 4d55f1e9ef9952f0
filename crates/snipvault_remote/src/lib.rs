//! # SnipVault Remote
//!
//! The remote record store boundary.
//!
//! This crate provides:
//! - [`RemoteRecord`] - the per-account record schema mirrored by local
//!   snippets
//! - [`RemoteStore`] - the client trait: account status, cursor-paginated
//!   full scan, batch save/fetch (≤[`MAX_RECORDS_PER_BATCH`] per call),
//!   and single-record fetch/save/delete
//! - [`RemoteError`] - the client's failure surface, with retryability
//!   classification
//! - [`InMemoryRemote`] - a full in-memory implementation with fault
//!   injection, used by the sync engine's tests
//!
//! The remote is eventually consistent and guarantees no server-side
//! ordering on full scans; callers sort client-side after download.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod record;
mod store;

pub use error::{RemoteError, RemoteResult};
pub use memory::InMemoryRemote;
pub use record::RemoteRecord;
pub use store::{
    AccountStatus, Cursor, RecordFailure, RecordPage, RemoteStore, MAX_RECORDS_PER_BATCH,
};
