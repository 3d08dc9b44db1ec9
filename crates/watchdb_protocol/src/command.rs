//! Blob command frames.
//!
//! ```text
//! | command (1) | token (2) | database_id (1) |                  header
//! | key_size (1) | key |                                        insert, delete
//! | value_size (2) | value |                                    insert
//! ```
//!
//! Multi-byte fields are little-endian. Command ids other than insert and
//! delete carry only the header.

use crate::error::{ProtocolError, ProtocolResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the fixed header shared by every command.
pub const HEADER_SIZE: usize = 4;
/// Command id of insert.
pub const CMD_INSERT: u8 = 0x01;
/// Command id of delete.
pub const CMD_DELETE: u8 = 0x02;
/// Longest key a frame can carry.
pub const MAX_KEY_SIZE: usize = u8::MAX as usize;
/// Longest value a frame can carry.
pub const MAX_VALUE_SIZE: usize = u16::MAX as usize;

/// A decoded Blob command.
///
/// Key and value share the frame's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobCommand {
    /// Upsert one record.
    Insert {
        /// Correlation token, echoed in the response.
        token: u16,
        /// Raw target database id.
        database: u8,
        /// Record key.
        key: Bytes,
        /// Record value.
        value: Bytes,
    },
    /// Remove one record.
    Delete {
        /// Correlation token, echoed in the response.
        token: u16,
        /// Raw target database id.
        database: u8,
        /// Record key.
        key: Bytes,
    },
    /// A reserved or unsupported command id.
    Unknown {
        /// The raw command id.
        command: u8,
        /// Correlation token, echoed in the response.
        token: u16,
        /// Raw target database id.
        database: u8,
    },
}

impl BlobCommand {
    /// Returns the correlation token.
    #[must_use]
    pub fn token(&self) -> u16 {
        match self {
            Self::Insert { token, .. } | Self::Delete { token, .. } | Self::Unknown { token, .. } => {
                *token
            }
        }
    }

    /// Returns the raw database id.
    #[must_use]
    pub fn database(&self) -> u8 {
        match self {
            Self::Insert { database, .. }
            | Self::Delete { database, .. }
            | Self::Unknown { database, .. } => *database,
        }
    }

    /// Returns the command id.
    #[must_use]
    pub fn command_id(&self) -> u8 {
        match self {
            Self::Insert { .. } => CMD_INSERT,
            Self::Delete { .. } => CMD_DELETE,
            Self::Unknown { command, .. } => *command,
        }
    }

    /// Returns the record key, if the command has one.
    #[must_use]
    pub fn key(&self) -> Option<&Bytes> {
        match self {
            Self::Insert { key, .. } | Self::Delete { key, .. } => Some(key),
            Self::Unknown { .. } => None,
        }
    }

    /// Decodes a frame, copying it into a shared buffer first.
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if a declared field runs past the frame.
    pub fn decode(frame: &[u8]) -> ProtocolResult<Self> {
        Self::decode_bytes(Bytes::copy_from_slice(frame)).map(|(command, _)| command)
    }

    /// Decodes a frame without copying. Returns the command together with
    /// the number of trailing bytes after its last field, which are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Truncated` if a declared field runs past the frame.
    pub fn decode_bytes(mut frame: Bytes) -> ProtocolResult<(Self, usize)> {
        ensure(&frame, HEADER_SIZE, "header")?;
        let command = frame.get_u8();
        let token = frame.get_u16_le();
        let database = frame.get_u8();

        let decoded = match command {
            CMD_INSERT | CMD_DELETE => {
                ensure(&frame, 1, "key size")?;
                let key_size = usize::from(frame.get_u8());
                ensure(&frame, key_size, "key")?;
                let key = frame.split_to(key_size);

                if command == CMD_DELETE {
                    Self::Delete {
                        token,
                        database,
                        key,
                    }
                } else {
                    ensure(&frame, 2, "value size")?;
                    let value_size = usize::from(frame.get_u16_le());
                    ensure(&frame, value_size, "value")?;
                    let value = frame.split_to(value_size);
                    Self::Insert {
                        token,
                        database,
                        key,
                        value,
                    }
                }
            }
            _ => Self::Unknown {
                command,
                token,
                database,
            },
        };

        Ok((decoded, frame.remaining()))
    }

    /// Encodes the command into a frame.
    ///
    /// # Errors
    ///
    /// Returns `FieldTooLarge` if the key exceeds 255 bytes or the value
    /// exceeds 65535 bytes.
    pub fn encode(&self) -> ProtocolResult<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_size());
        buf.put_u8(self.command_id());
        buf.put_u16_le(self.token());
        buf.put_u8(self.database());

        match self {
            Self::Insert { key, value, .. } => {
                put_key(&mut buf, key)?;
                let value_size = u16::try_from(value.len()).map_err(|_| {
                    ProtocolError::FieldTooLarge {
                        field: "value",
                        len: value.len(),
                        max: MAX_VALUE_SIZE,
                    }
                })?;
                buf.put_u16_le(value_size);
                buf.put_slice(value);
            }
            Self::Delete { key, .. } => put_key(&mut buf, key)?,
            Self::Unknown { .. } => {}
        }

        Ok(buf.freeze())
    }

    /// Returns the size of the encoded frame.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        match self {
            Self::Insert { key, value, .. } => HEADER_SIZE + 1 + key.len() + 2 + value.len(),
            Self::Delete { key, .. } => HEADER_SIZE + 1 + key.len(),
            Self::Unknown { .. } => HEADER_SIZE,
        }
    }
}

fn ensure(frame: &Bytes, needed: usize, field: &'static str) -> ProtocolResult<()> {
    if frame.remaining() < needed {
        return Err(ProtocolError::truncated(field, needed, frame.remaining()));
    }
    Ok(())
}

fn put_key(buf: &mut BytesMut, key: &[u8]) -> ProtocolResult<()> {
    let key_size = u8::try_from(key.len()).map_err(|_| ProtocolError::FieldTooLarge {
        field: "key",
        len: key.len(),
        max: MAX_KEY_SIZE,
    })?;
    buf.put_u8(key_size);
    buf.put_slice(key);
    Ok(())
}
