//! Blob response frames.
//!
//! ```text
//! | token (2) | status (1) |
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// Outcome reported to the host for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    /// The command was applied.
    Success = 0x01,
    /// The store failed to read or write its backing resource.
    GeneralFailure = 0x02,
    /// The command id is not supported.
    InvalidOperation = 0x03,
    /// The database does not exist.
    InvalidDatabaseId = 0x04,
    /// Key or value size is out of range.
    InvalidData = 0x05,
    /// The key is not present.
    KeyDoesNotExist = 0x06,
    /// The database has no room for another record.
    DatabaseFull = 0x07,
}

impl StatusCode {
    /// Returns the wire byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Looks up a status by wire byte.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Success),
            0x02 => Some(Self::GeneralFailure),
            0x03 => Some(Self::InvalidOperation),
            0x04 => Some(Self::InvalidDatabaseId),
            0x05 => Some(Self::InvalidData),
            0x06 => Some(Self::KeyDoesNotExist),
            0x07 => Some(Self::DatabaseFull),
            _ => None,
        }
    }

    /// Returns true for [`StatusCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::GeneralFailure => "general failure",
            Self::InvalidOperation => "invalid operation",
            Self::InvalidDatabaseId => "invalid database id",
            Self::InvalidData => "invalid data",
            Self::KeyDoesNotExist => "key does not exist",
            Self::DatabaseFull => "database full",
        };
        f.write_str(name)
    }
}

/// The reply to one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobResponse {
    /// Token of the command this answers.
    pub token: u16,
    /// Outcome.
    pub status: StatusCode,
}

impl BlobResponse {
    /// Encoded size.
    pub const SIZE: usize = 3;

    /// Creates a response.
    #[must_use]
    pub const fn new(token: u16, status: StatusCode) -> Self {
        Self { token, status }
    }

    /// Encodes the response.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u16_le(self.token);
        buf.put_u8(self.status.as_u8());
        buf.freeze()
    }

    /// Decodes a response.
    ///
    /// # Errors
    ///
    /// Returns `Truncated` for short frames and `UnknownStatus` for status
    /// bytes outside the known set.
    pub fn decode(mut frame: &[u8]) -> ProtocolResult<Self> {
        if frame.remaining() < Self::SIZE {
            return Err(ProtocolError::truncated("response", Self::SIZE, frame.remaining()));
        }
        let token = frame.get_u16_le();
        let byte = frame.get_u8();
        let status = StatusCode::from_u8(byte).ok_or(ProtocolError::UnknownStatus(byte))?;
        Ok(Self { token, status })
    }
}
