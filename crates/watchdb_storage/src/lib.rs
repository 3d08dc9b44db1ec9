//! # watchdb storage
//!
//! Backing resources for the watchdb record store.
//!
//! The record store treats durable media as an **opaque byte-addressable
//! resource**. A backend reads, appends, flushes and truncates bytes; it has
//! no idea that those bytes hold a log of records for several databases.
//! The flash block layer that sits below a real device backend is somebody
//! else's problem.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - ephemeral stores and tests (supports fault injection)
//! - [`FileBackend`] - a single OS file, used by the host tools and simulators
//!
//! ## Example
//!
//! ```rust
//! use watchdb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"record bytes").unwrap();
//! assert_eq!(backend.read_at(offset, 6).unwrap(), b"record");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::{FaultMode, InMemoryBackend};
