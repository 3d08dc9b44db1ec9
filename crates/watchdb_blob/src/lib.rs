//! # watchdb blob
//!
//! Serves the Blob protocol against a [`RecordStore`](watchdb_core::RecordStore).
//!
//! - [`BlobDispatcher`] decodes a frame, applies it to the store, fires the
//!   side effects registered for the target database and builds the
//!   response. Every well-formed frame gets exactly one response with the
//!   frame's token; malformed frames get none.
//! - [`BlobEndpoint`] runs the dispatcher behind tokio channels.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use watchdb_blob::BlobDispatcher;
//! use watchdb_core::{DatabaseId, EffectRouter, RecordStore, StoreConfig};
//! use watchdb_protocol::{BlobCommand, StatusCode};
//!
//! let store = Arc::new(RecordStore::open_in_memory(StoreConfig::default()).unwrap());
//! let dispatcher = BlobDispatcher::new(Arc::clone(&store), Arc::new(EffectRouter::new()));
//!
//! let frame = BlobCommand::Insert {
//!     token: 7,
//!     database: DatabaseId::Pin.as_u8(),
//!     key: Bytes::from_static(b"pin-1"),
//!     value: Bytes::from_static(b"lunch"),
//! }
//! .encode()
//! .unwrap();
//!
//! let response = dispatcher.handle_frame(&frame).unwrap();
//! assert_eq!((response.token, response.status), (7, StatusCode::Success));
//! assert_eq!(store.get(DatabaseId::Pin, b"pin-1").unwrap(), Some(b"lunch".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatcher;
mod endpoint;
mod error;

pub use config::BlobConfig;
pub use dispatcher::{status_for, BlobDispatcher, DispatchStats};
pub use endpoint::{BlobEndpoint, EndpointHandle, EndpointStats};
pub use error::{BlobError, BlobResult};
