//! # SnipVault Model
//!
//! Domain types shared by the SnipVault store, remote and sync crates.
//!
//! This crate provides:
//! - [`SnippetId`] - stable 128-bit snippet identity
//! - [`RecordId`] - opaque remote record identifier (the "remote link")
//! - [`Timestamp`] - unix-millisecond timestamps used for last-writer-wins
//! - [`Snippet`] - the local snippet entity with its sync bookkeeping

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod id;
mod snippet;
mod time;

pub use id::{RecordId, SnippetId};
pub use snippet::{normalize_shortcut, Snippet};
pub use time::Timestamp;
