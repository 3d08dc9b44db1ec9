//! Store configuration.

use crate::types::DatabaseId;

/// Configuration for opening a record store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Databases the store serves. Opening any other id fails with
    /// `DatabaseNotFound`.
    pub databases: Vec<DatabaseId>,

    /// Largest value accepted by `insert`, in bytes.
    pub max_value_size: usize,

    /// Record cap per database. Overwriting an existing key is always
    /// allowed.
    pub max_records_per_database: usize,

    /// Whether to sync the backing resource after every mutation.
    pub sync_on_write: bool,

    /// Dead log bytes (overwritten values and tombstones) above which the
    /// store compacts its log. Checked on open and after each write made
    /// through `RecordStore::insert` or `RecordStore::delete`. `u64::MAX`
    /// turns automatic compaction off.
    pub compaction_threshold: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            databases: DatabaseId::ALL.to_vec(),
            max_value_size: 4096,
            max_records_per_database: 256,
            sync_on_write: true,
            compaction_threshold: 64 * 1024,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Restricts the store to the given databases.
    #[must_use]
    pub fn databases(mut self, databases: impl IntoIterator<Item = DatabaseId>) -> Self {
        self.databases = databases.into_iter().collect();
        self.databases.sort_unstable();
        self.databases.dedup();
        self
    }

    /// Sets the largest accepted value size.
    #[must_use]
    pub const fn max_value_size(mut self, size: usize) -> Self {
        self.max_value_size = size;
        self
    }

    /// Sets the per-database record cap.
    #[must_use]
    pub const fn max_records_per_database(mut self, count: usize) -> Self {
        self.max_records_per_database = count;
        self
    }

    /// Sets whether to sync after every mutation.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Sets the dead-byte count that triggers automatic compaction.
    #[must_use]
    pub const fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.compaction_threshold = bytes;
        self
    }
}
