//! # watchdb protocol
//!
//! Frames of the Blob protocol, by which a paired host inserts and deletes
//! records in the watch's store.
//!
//! This crate provides:
//! - [`BlobCommand`] with bounds-checked decoding and encoding
//! - [`BlobResponse`] and its [`StatusCode`]
//!
//! It is a pure codec crate with no I/O; the dispatcher lives in
//! `watchdb_blob`.
//!
//! ```rust
//! use bytes::Bytes;
//! use watchdb_protocol::{BlobCommand, BlobResponse, StatusCode};
//!
//! let command = BlobCommand::Insert {
//!     token: 0x1234,
//!     database: 0x04,
//!     key: Bytes::from_static(&[7; 16]),
//!     value: Bytes::from(vec![0; 300]),
//! };
//! let frame = command.encode().unwrap();
//! assert_eq!(BlobCommand::decode(&frame).unwrap(), command);
//!
//! let reply = BlobResponse::new(command.token(), StatusCode::Success).encode();
//! assert_eq!(reply.as_ref(), &[0x34, 0x12, 0x01]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod error;
mod response;

pub use command::{BlobCommand, CMD_DELETE, CMD_INSERT, HEADER_SIZE, MAX_KEY_SIZE, MAX_VALUE_SIZE};
pub use error::{ProtocolError, ProtocolResult};
pub use response::{BlobResponse, StatusCode};
