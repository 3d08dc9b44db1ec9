//! Compact command implementation.

use std::path::Path;
use watchdb_core::{CompactionResult, RecordStore, StoreConfig};

/// Rewrites the log of the store at `path`, or with `dry_run` only measures
/// what a rewrite would reclaim.
pub fn compact(path: &Path, dry_run: bool) -> Result<CompactionResult, Box<dyn std::error::Error>> {
    // Automatic compaction would otherwise run during open.
    let config = StoreConfig::new()
        .create_if_missing(false)
        .compaction_threshold(u64::MAX);
    let store = RecordStore::open_at(path, config)?;

    if dry_run {
        let stats = store.stats()?;
        return Ok(CompactionResult {
            input_bytes: stats.log_bytes,
            output_bytes: stats.log_bytes - stats.dead_bytes,
            live_records: stats.databases.iter().map(|db| db.records).sum(),
            bytes_saved: stats.dead_bytes,
        });
    }
    Ok(store.compact()?)
}

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compacting record log at {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let result = compact(path, dry_run)?;
    println!("  Live records: {}", result.live_records);
    println!("  Size before:  {} bytes", result.input_bytes);
    println!("  Size after:   {} bytes", result.output_bytes);
    println!(
        "  Space saved:  {} bytes ({:.1}%)",
        result.bytes_saved,
        if result.input_bytes > 0 {
            result.bytes_saved as f64 / result.input_bytes as f64 * 100.0
        } else {
            0.0
        }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use watchdb_core::DatabaseId;

    fn bloated_store(path: &Path) -> u64 {
        let config = StoreConfig::new().compaction_threshold(u64::MAX);
        let store = RecordStore::open_at(path, config).unwrap();
        for i in 0..50u8 {
            store.insert(DatabaseId::Reminder, b"daily", &[i; 64]).unwrap();
        }
        store.insert(DatabaseId::Pin, b"pin", b"kept").unwrap();
        store.stats().unwrap().log_bytes
    }

    #[test]
    fn dry_run_reports_without_rewriting() {
        let dir = tempdir().unwrap();
        let before = bloated_store(dir.path());

        let result = compact(dir.path(), true).unwrap();
        assert_eq!(result.input_bytes, before);
        assert_eq!(result.live_records, 2);
        assert!(result.bytes_saved > 0);

        let again = compact(dir.path(), true).unwrap();
        assert_eq!(again.input_bytes, before);
    }

    #[test]
    fn compact_shrinks_log_and_keeps_records() {
        let dir = tempdir().unwrap();
        let before = bloated_store(dir.path());
        let estimate = compact(dir.path(), true).unwrap();

        let result = compact(dir.path(), false).unwrap();
        assert_eq!(result.input_bytes, before);
        assert_eq!(result.output_bytes, estimate.output_bytes);
        assert_eq!(result.live_records, 2);

        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        assert_eq!(store.stats().unwrap().log_bytes, result.output_bytes);
        assert_eq!(store.get(DatabaseId::Reminder, b"daily").unwrap(), Some(vec![49; 64]));
        assert_eq!(store.get(DatabaseId::Pin, b"pin").unwrap(), Some(b"kept".to_vec()));
    }

    #[test]
    fn missing_store_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(compact(&dir.path().join("nothing-here"), false).is_err());
    }
}
