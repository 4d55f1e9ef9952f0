//! # SnipVault Testkit
//!
//! Test utilities for SnipVault.
//!
//! This crate provides:
//! - Deterministic snippet and remote-record fixtures
//! - Pre-seeded store pairs for sync tests
//! - Property-based generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use snipvault_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_seeded_pair() {
//!     let (store, remote) = seeded_pair(3, 3);
//!     // ... sync and assert
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
