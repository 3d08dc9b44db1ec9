//! # watchdb core
//!
//! The record store of the watch firmware: several independent logical
//! databases (notifications, pins, reminders, apps, app glances) kept in one
//! append-only log, queried through a schema-less selector engine.
//!
//! ## Overview
//!
//! - [`RecordStore`] owns every database. Open one with
//!   [`RecordStore::open`] to read, or [`RecordStore::open_writer`] to
//!   mutate it.
//! - A [`SelectorChain`] filters and projects raw values by byte offset, so
//!   one engine serves every record layout.
//! - [`select`](select::select) collects results. Projected spans borrow the
//!   store; full loads are owned [`LoadedRecord`]s.
//! - The [`EffectRouter`] runs per-database reactions to remote writes.
//! - [`timeline`] decodes notification values for the list UI.
//!
//! ## Example
//!
//! ```rust
//! use watchdb_core::{DatabaseId, RecordStore, SelectorChain, StoreConfig};
//!
//! let store = RecordStore::open_in_memory(StoreConfig::default()).unwrap();
//! store.insert(DatabaseId::Pin, b"pin-1", b"\x01payload").unwrap();
//! store.insert(DatabaseId::Pin, b"pin-2", b"\x02payload").unwrap();
//!
//! let handle = store.open(DatabaseId::Pin).unwrap();
//! let chain = SelectorChain::new().filter(0, [0x02_u8]).project(1, 7);
//! let (count, results) = handle.select(&chain).unwrap();
//! assert_eq!(count, 1);
//! assert_eq!(results.get(0).unwrap().field(0), Some(&b"payload"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
#[cfg(feature = "std")]
mod dir;
pub mod effects;
mod error;
pub mod record;
pub mod select;
pub mod selector;
mod store;
pub mod timeline;
mod types;

pub use config::StoreConfig;
#[cfg(feature = "std")]
pub use dir::StoreDir;
pub use effects::{ChangeKind, EffectRouter, RecordChanged, WriteHandler};
pub use error::{CoreError, CoreResult};
pub use select::{find_one, Column, LoadedRecord, Lookup, SelectResult, SelectResultList};
pub use selector::{Selector, SelectorChain};
pub use store::{
    CompactionResult, DatabaseHandle, DatabaseStats, DatabaseWriter, Record, RecordIter,
    RecordStore, StoreStats, MAX_KEY_SIZE,
};
pub use timeline::{DisplayText, Notification, NotificationFeed, TimelineItem};
pub use types::DatabaseId;
