//! # watchdb Testkit
//!
//! Test utilities for watchdb.
//!
//! This crate provides:
//! - Store fixtures backed by memory or a temporary directory, with fault
//!   injection on the memory backend
//! - Property-based generators for records, selectors and Blob frames
//! - Fuzz harnesses for the frame decoder, the timeline parser and store ops
//!
//! ## Usage
//!
//! ```rust
//! use watchdb_testkit::prelude::*;
//! use watchdb_core::DatabaseId;
//!
//! with_temp_store(|store| {
//!     store.insert(DatabaseId::Pin, b"k", b"v").unwrap();
//!     assert_eq!(store.record_count(DatabaseId::Pin).unwrap(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
