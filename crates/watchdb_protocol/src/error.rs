//! Error types for Blob frame codecs.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while decoding or encoding Blob frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame ends before a declared field does.
    #[error("frame truncated reading {field}: need {needed} bytes, {available} left")]
    Truncated {
        /// The field being read.
        field: &'static str,
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the frame.
        available: usize,
    },

    /// A field does not fit its length prefix.
    #[error("{field} of {len} bytes exceeds the {max} byte limit")]
    FieldTooLarge {
        /// The field being written.
        field: &'static str,
        /// Its length.
        len: usize,
        /// The largest length its prefix can express.
        max: usize,
    },

    /// A response carries a status byte outside the known set.
    #[error("unknown status code 0x{0:02x}")]
    UnknownStatus(u8),
}

impl ProtocolError {
    pub(crate) fn truncated(field: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            field,
            needed,
            available,
        }
    }
}
