//! Frame command implementation.

use bytes::Bytes;
use clap::Subcommand;
use watchdb_core::DatabaseId;
use watchdb_protocol::BlobCommand;

/// Which frame to build.
#[derive(Debug, Subcommand)]
pub enum FrameKind {
    /// Insert one record
    Insert {
        /// Correlation token (decimal or 0x-prefixed hex)
        #[arg(short, long, value_parser = parse_token)]
        token: u16,

        /// Target database name
        #[arg(short, long)]
        database: DatabaseId,

        /// Key, hex-encoded
        #[arg(short, long)]
        key: String,

        /// Value, hex-encoded
        #[arg(long)]
        value: String,
    },

    /// Delete one record
    Delete {
        /// Correlation token (decimal or 0x-prefixed hex)
        #[arg(short, long, value_parser = parse_token)]
        token: u16,

        /// Target database name
        #[arg(short, long)]
        database: DatabaseId,

        /// Key, hex-encoded
        #[arg(short, long)]
        key: String,
    },
}

fn parse_token(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid token '{s}': {e}"))
}

/// Encodes the frame and returns it as hex.
pub fn build(kind: FrameKind) -> Result<String, Box<dyn std::error::Error>> {
    let command = match kind {
        FrameKind::Insert {
            token,
            database,
            key,
            value,
        } => BlobCommand::Insert {
            token,
            database: database.as_u8(),
            key: Bytes::from(hex::decode(key)?),
            value: Bytes::from(hex::decode(value)?),
        },
        FrameKind::Delete {
            token,
            database,
            key,
        } => BlobCommand::Delete {
            token,
            database: database.as_u8(),
            key: Bytes::from(hex::decode(key)?),
        },
    };

    Ok(hex::encode(command.encode()?))
}
