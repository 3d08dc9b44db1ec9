//! Error types for backing resource operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a backing resource.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the resource.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current resource size.
        size: u64,
    },

    /// Attempted to truncate to a size larger than the resource.
    #[error("cannot truncate to {requested} bytes, resource holds {size}")]
    TruncatePastEnd {
        /// The requested size.
        requested: u64,
        /// The current resource size.
        size: u64,
    },

    /// The resource refuses writes (worn out, full, or write-protected).
    #[error("storage is read-only")]
    ReadOnly,
}
