//! Error types for the Blob dispatcher.

use thiserror::Error;
use watchdb_protocol::ProtocolError;

/// Result type for dispatcher operations.
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur while serving Blob frames.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The frame could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The response channel was closed by the transport.
    #[error("response channel closed")]
    ChannelClosed,

    /// The endpoint task panicked or was cancelled.
    #[error("endpoint task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
