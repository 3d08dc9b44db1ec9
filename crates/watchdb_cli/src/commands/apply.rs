//! Apply command implementation.

use super::open_store;
use std::path::Path;
use std::sync::Arc;
use watchdb_blob::BlobDispatcher;
use watchdb_core::EffectRouter;
use watchdb_protocol::BlobResponse;

/// What happened to one frame line.
#[derive(Debug)]
pub struct ApplyOutcome {
    /// 1-based line number in the input file.
    pub line: usize,
    /// The response, or `None` if the frame was dropped as malformed.
    pub response: Option<BlobResponse>,
}

/// Dispatches every frame in `input` against the store at `path`, creating
/// the store if needed.
pub fn apply(path: &Path, input: &str) -> Result<Vec<ApplyOutcome>, Box<dyn std::error::Error>> {
    let store = Arc::new(open_store(path, true)?);
    let dispatcher = BlobDispatcher::new(Arc::clone(&store), Arc::new(EffectRouter::new()));

    let mut outcomes = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let frame = hex::decode(line).map_err(|e| format!("line {}: {e}", index + 1))?;
        outcomes.push(ApplyOutcome {
            line: index + 1,
            response: dispatcher.handle_frame(&frame),
        });
    }

    store.shutdown()?;
    Ok(outcomes)
}

/// Runs the apply command.
pub fn run(path: &Path, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let input = std::fs::read_to_string(file)?;
    let outcomes = apply(path, &input)?;

    for outcome in &outcomes {
        match outcome.response {
            Some(response) => println!(
                "line {}: token 0x{:04x} {}",
                outcome.line, response.token, response.status
            ),
            None => println!("line {}: dropped (malformed frame)", outcome.line),
        }
    }
    println!("{} frames applied", outcomes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tempfile::tempdir;
    use watchdb_core::{DatabaseId, RecordStore, StoreConfig};
    use watchdb_protocol::{BlobCommand, StatusCode};

    #[test]
    fn frames_are_applied_in_order() {
        let dir = tempdir().unwrap();
        let insert = BlobCommand::Insert {
            token: 0x0102,
            database: DatabaseId::Reminder.as_u8(),
            key: Bytes::from_static(b"r1"),
            value: Bytes::from_static(b"stretch"),
        };
        let input = format!(
            "# reminders\n{}\n\n0100\n{}\n",
            hex::encode(insert.encode().unwrap()),
            hex::encode([0x05, 0x03, 0x00, 0x03]),
        );

        let outcomes = apply(dir.path(), &input).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].line, 2);
        assert_eq!(outcomes[0].response.unwrap().status, StatusCode::Success);
        assert!(outcomes[1].response.is_none());
        assert_eq!(
            outcomes[2].response.unwrap().status,
            StatusCode::InvalidOperation
        );

        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(
            store.get(DatabaseId::Reminder, b"r1").unwrap(),
            Some(b"stretch".to_vec())
        );
    }

    #[test]
    fn bad_hex_names_the_line() {
        let dir = tempdir().unwrap();
        let err = apply(dir.path(), "\nzz\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2"));
    }
}
