//! Error types for the record store.

use crate::types::DatabaseId;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in record store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backing resource error.
    #[error("storage error: {0}")]
    Storage(#[from] watchdb_storage::StorageError),

    /// I/O error outside the backing resource (directory handling).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No database with this id exists, or it is not enabled.
    #[error("database not found: 0x{id:02x}")]
    DatabaseNotFound {
        /// The raw database id that was requested.
        id: u8,
    },

    /// Key length outside `1..=255`.
    #[error("invalid key length {len}: keys must be 1 to 255 bytes")]
    InvalidKey {
        /// The offending key length.
        len: usize,
    },

    /// Value larger than the configured maximum.
    #[error("value of {len} bytes exceeds the {max} byte limit")]
    ValueTooLarge {
        /// The offending value length.
        len: usize,
        /// The configured maximum.
        max: usize,
    },

    /// The database already holds its maximum number of records.
    #[error("database {database} is full ({capacity} records)")]
    DatabaseFull {
        /// The database that rejected the insert.
        database: DatabaseId,
        /// The configured record cap.
        capacity: usize,
    },

    /// The record log is damaged beyond the recoverable tail.
    #[error("record log corruption at offset {offset}: {message}")]
    Corruption {
        /// Log offset of the damaged record.
        offset: u64,
        /// Description of the damage.
        message: String,
    },

    /// A stored record failed its checksum.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored with the record.
        expected: u32,
        /// Checksum computed over the record.
        actual: u32,
    },

    /// A record value does not follow the layout its database expects.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the layout problem.
        message: String,
    },

    /// Another process holds the store directory.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,

    /// The store was shut down.
    #[error("store is closed")]
    StoreClosed,

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Why the operation was refused.
        message: String,
    },
}

impl CoreError {
    /// Creates a log corruption error.
    pub fn corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::Corruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for failures of the backing resource rather than of
    /// the caller's input.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::Storage(_)
                | Self::Io(_)
                | Self::Corruption { .. }
                | Self::ChecksumMismatch { .. }
                | Self::StoreClosed
        )
    }
}
