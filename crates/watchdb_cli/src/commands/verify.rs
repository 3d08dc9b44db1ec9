//! Verify command implementation.

use std::path::Path;
use watchdb_core::record::scan_log;
use watchdb_core::StoreDir;
use watchdb_storage::{FileBackend, StorageBackend};

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Size of the record log in bytes.
    pub log_bytes: u64,
    /// Number of intact records.
    pub valid_records: usize,
    /// Number of intact tombstones among them.
    pub tombstones: usize,
    /// Offset of a torn final record, which the store cuts off on open.
    pub torn_tail: Option<u64>,
    /// Damage that prevents the store from opening.
    pub error: Option<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Scans the record log of the store at `path`.
pub fn verify(path: &Path) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let log_path = StoreDir::records_path_in(path);
    if !log_path.exists() {
        return Err(format!("No record log found at {}", log_path.display()).into());
    }

    let backend = FileBackend::open(&log_path)?;
    let mut result = VerifyResult {
        log_bytes: backend.size()?,
        ..VerifyResult::default()
    };

    let mut tombstones = 0;
    match scan_log(&backend, |_, record| {
        if record.is_tombstone() {
            tombstones += 1;
        }
    }) {
        Ok(outcome) => {
            result.valid_records = outcome.records;
            result.torn_tail = outcome.torn_tail;
        }
        Err(err) => result.error = Some(err.to_string()),
    }
    result.tombstones = tombstones;

    Ok(result)
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying store at {}", path.display());
    println!();

    let result = verify(path)?;
    println!("Record log: {} bytes", result.log_bytes);
    println!("Valid records: {}", result.valid_records);
    println!("Tombstones: {}", result.tombstones);
    if let Some(offset) = result.torn_tail {
        println!(
            "Torn record at offset {offset}; {} bytes will be discarded on next open",
            result.log_bytes - offset
        );
    }

    println!();
    if let Some(error) = &result.error {
        println!("  Error: {error}");
    }
    if result.is_ok() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err("Verification failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use watchdb_core::{DatabaseId, RecordStore, StoreConfig};

    fn populated() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        store.insert(DatabaseId::Pin, b"a", b"1").unwrap();
        store.insert(DatabaseId::Pin, b"b", b"2").unwrap();
        store.delete(DatabaseId::Pin, b"a").unwrap();
        dir
    }

    #[test]
    fn clean_log_passes() {
        let dir = populated();
        let result = verify(dir.path()).unwrap();
        assert!(result.is_ok());
        assert_eq!(result.valid_records, 3);
        assert_eq!(result.tombstones, 1);
        assert_eq!(result.torn_tail, None);
    }

    #[test]
    fn torn_tail_is_reported_but_passes() {
        let dir = populated();
        let log = StoreDir::records_path_in(dir.path());
        let bytes = std::fs::read(&log).unwrap();
        std::fs::write(&log, &bytes[..bytes.len() - 2]).unwrap();

        let result = verify(dir.path()).unwrap();
        assert!(result.is_ok());
        assert_eq!(result.valid_records, 2);
        assert!(result.torn_tail.is_some());
    }

    #[test]
    fn early_damage_fails() {
        let dir = populated();
        let log = StoreDir::records_path_in(dir.path());
        let mut bytes = std::fs::read(&log).unwrap();
        bytes[8] ^= 0xFF;
        std::fs::write(&log, &bytes).unwrap();

        let result = verify(dir.path()).unwrap();
        assert!(!result.is_ok());
    }
}
