//! The record store service.
//!
//! [`RecordStore`] owns every logical database. It is constructed once and
//! shared (usually behind an `Arc`) with the protocol dispatcher and any
//! consumer that queries it.
//!
//! # Locking
//!
//! Each database has its own reader/writer lock:
//!
//! - [`DatabaseHandle`] holds the read lock. Any number may be open at once.
//! - [`DatabaseWriter`] holds the write lock for mutations.
//!
//! A thread must not ask for a writer on a database while it still holds a
//! handle to the same database.
//!
//! [`RecordStore::compact`] takes every database's write lock, in id order,
//! and then the backend lock. Writers take one database lock and then the
//! backend lock, so the two never wait on each other in a cycle.
//!
//! # Compaction
//!
//! Overwrites and deletes append to the log, so it grows past the size of
//! the live records. Compaction rewrites the log with one put per live
//! record and MUST NOT change logical state: record order within each
//! database, values and records of databases this store does not serve
//! all survive.
//!
//! # Result lifetimes
//!
//! Records yielded by [`DatabaseHandle::iterate`] borrow the store's cached
//! copy and cannot outlive the handle. Closing the handle while results
//! from it are still alive does not compile:
//!
//! ```rust,compile_fail
//! use watchdb_core::{DatabaseId, RecordStore, SelectorChain, StoreConfig};
//!
//! let store = RecordStore::open_in_memory(StoreConfig::default()).unwrap();
//! let handle = store.open(DatabaseId::Notification).unwrap();
//! let (_, results) = handle.select(&SelectorChain::new().project(0, 16)).unwrap();
//! handle.close();
//! println!("{}", results.len());
//! ```
//!
//! Owned results are moved out first instead:
//!
//! ```rust
//! use watchdb_core::{DatabaseId, RecordStore, SelectorChain, StoreConfig};
//!
//! let store = RecordStore::open_in_memory(StoreConfig::default()).unwrap();
//! store.insert(DatabaseId::Notification, &[1; 16], b"hello").unwrap();
//!
//! let handle = store.open(DatabaseId::Notification).unwrap();
//! let (_, results) = handle.select(&SelectorChain::new().project_full()).unwrap();
//! let loaded = results.into_loaded();
//! handle.close();
//! assert_eq!(loaded[0].value(), b"hello");
//! ```

use crate::config::StoreConfig;
#[cfg(feature = "std")]
use crate::dir::StoreDir;
use crate::error::{CoreError, CoreResult};
use crate::record::{scan_log, LogRecord, ScanOutcome};
use crate::select::{self, SelectResultList};
use crate::selector::SelectorChain;
use crate::types::DatabaseId;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};
use watchdb_storage::{InMemoryBackend, StorageBackend};

/// Longest key the store accepts.
pub const MAX_KEY_SIZE: usize = u8::MAX as usize;

#[derive(Debug)]
struct StoredRecord {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Cached contents of one database, in insertion order.
#[derive(Debug, Default)]
struct DatabaseState {
    records: Vec<StoredRecord>,
    positions: HashMap<Vec<u8>, usize>,
    value_bytes: usize,
    /// Bytes the live records take up once encoded.
    log_bytes: u64,
}

fn encoded_len(key: &[u8], value: &[u8]) -> u64 {
    (LogRecord::MIN_SIZE + key.len() + value.len()) as u64
}

impl DatabaseState {
    fn get(&self, key: &[u8]) -> Option<&StoredRecord> {
        self.positions.get(key).map(|&i| &self.records[i])
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.positions.contains_key(key)
    }

    /// Upserts; an overwrite keeps the record's position. Returns true if a
    /// value was replaced.
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> bool {
        self.value_bytes += value.len();
        self.log_bytes += encoded_len(&key, &value);
        if let Some(&i) = self.positions.get(&key) {
            let old = std::mem::replace(&mut self.records[i].value, value);
            self.value_bytes -= old.len();
            self.log_bytes -= encoded_len(&key, &old);
            return true;
        }

        self.positions.insert(key.clone(), self.records.len());
        self.records.push(StoredRecord { key, value });
        false
    }

    fn remove(&mut self, key: &[u8]) -> bool {
        let Some(index) = self.positions.remove(key) else {
            return false;
        };

        let removed = self.records.remove(index);
        self.value_bytes -= removed.value.len();
        self.log_bytes -= encoded_len(&removed.key, &removed.value);
        for position in self.positions.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        true
    }
}

/// Per-database figures reported by [`RecordStore::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// The database.
    pub database: DatabaseId,
    /// Number of live records.
    pub records: usize,
    /// Sum of live value sizes in bytes.
    pub value_bytes: usize,
}

/// Store-wide figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Size of the record log on the backing resource.
    pub log_bytes: u64,
    /// Log bytes that back no live record and would go away on compaction.
    pub dead_bytes: u64,
    /// One entry per served database, in id order.
    pub databases: Vec<DatabaseStats>,
}

/// Result of a [`RecordStore::compact`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionResult {
    /// Log size before the rewrite.
    pub input_bytes: u64,
    /// Log size after the rewrite.
    pub output_bytes: u64,
    /// Records written to the new log.
    pub live_records: usize,
    /// Bytes saved (input size - output size).
    pub bytes_saved: u64,
}

/// The record store.
pub struct RecordStore {
    config: StoreConfig,
    /// Store directory (holds the lock). None for in-memory stores.
    #[cfg(feature = "std")]
    dir: Option<StoreDir>,
    backend: Mutex<Box<dyn StorageBackend>>,
    databases: BTreeMap<DatabaseId, RwLock<DatabaseState>>,
    /// Log records of databases this store does not serve. Kept so that
    /// compaction writes them back.
    retained: BTreeMap<u8, DatabaseState>,
    is_open: RwLock<bool>,
}

impl RecordStore {
    /// Opens a persistent store in the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is locked by another process, the
    /// record log is corrupt before its tail, or I/O fails.
    #[cfg(feature = "std")]
    pub fn open_at(path: &std::path::Path, config: StoreConfig) -> CoreResult<Self> {
        use watchdb_storage::FileBackend;

        let dir = StoreDir::open(path, config.create_if_missing)?;
        let backend = FileBackend::open_with_create_dirs(&dir.records_path())?;
        let mut store = Self::open_with_backend(config, Box::new(backend))?;
        store.dir = Some(dir);
        Ok(store)
    }

    /// Opens an empty store held in RAM.
    ///
    /// # Errors
    ///
    /// Infallible in practice; the signature matches the other constructors.
    pub fn open_in_memory(config: StoreConfig) -> CoreResult<Self> {
        Self::open_with_backend(config, Box::new(InMemoryBackend::new()))
    }

    /// Opens a store on an arbitrary backing resource, replaying whatever
    /// record log it already holds.
    ///
    /// A torn final record is cut off with a warning. If the log carries
    /// more than `compaction_threshold` dead bytes it is compacted before
    /// the store is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is damaged before its tail or the
    /// backend fails.
    pub fn open_with_backend(
        config: StoreConfig,
        mut backend: Box<dyn StorageBackend>,
    ) -> CoreResult<Self> {
        let mut states: BTreeMap<DatabaseId, DatabaseState> = config
            .databases
            .iter()
            .map(|&db| (db, DatabaseState::default()))
            .collect();

        let mut retained = BTreeMap::new();
        let outcome = replay(backend.as_ref(), &mut states, &mut retained)?;
        if let Some(offset) = outcome.torn_tail {
            warn!(
                offset,
                valid_len = outcome.valid_len,
                "discarding torn record at end of log"
            );
            backend.truncate(outcome.valid_len)?;
        }

        info!(
            records = outcome.records,
            databases = states.len(),
            log_bytes = outcome.valid_len,
            "record store opened"
        );

        let store = Self {
            config,
            #[cfg(feature = "std")]
            dir: None,
            backend: Mutex::new(backend),
            databases: states
                .into_iter()
                .map(|(db, state)| (db, RwLock::new(state)))
                .collect(),
            retained,
            is_open: RwLock::new(true),
        };
        store.compact_if_needed();
        Ok(store)
    }

    /// Opens a database for reading.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the store does not serve `id`, or
    /// `StoreClosed` after [`shutdown`](Self::shutdown).
    pub fn open(&self, id: DatabaseId) -> CoreResult<DatabaseHandle<'_>> {
        self.ensure_open()?;
        let lock = self.lock_for(id)?;
        Ok(DatabaseHandle {
            id,
            store: self,
            state: lock.read(),
        })
    }

    /// Opens a database by raw wire id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` for ids outside the known set.
    pub fn open_raw(&self, id: u8) -> CoreResult<DatabaseHandle<'_>> {
        self.open(DatabaseId::try_from(id)?)
    }

    /// Opens a database for writing, waiting for readers to finish.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn open_writer(&self, id: DatabaseId) -> CoreResult<DatabaseWriter<'_>> {
        self.ensure_open()?;
        let lock = self.lock_for(id)?;
        Ok(DatabaseWriter {
            id,
            store: self,
            state: lock.write(),
        })
    }

    /// Closes a handle. Equivalent to dropping it.
    pub fn close(&self, handle: DatabaseHandle<'_>) {
        handle.close();
    }

    /// Upserts one record.
    ///
    /// # Errors
    ///
    /// See [`DatabaseWriter::insert`].
    pub fn insert(&self, id: DatabaseId, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.open_writer(id)?.insert(key, value)?;
        self.compact_if_needed();
        Ok(())
    }

    /// Deletes one record, returning whether it existed.
    ///
    /// # Errors
    ///
    /// See [`DatabaseWriter::delete`].
    pub fn delete(&self, id: DatabaseId, key: &[u8]) -> CoreResult<bool> {
        let removed = self.open_writer(id)?.delete(key)?;
        if removed {
            self.compact_if_needed();
        }
        Ok(removed)
    }

    /// Returns a copy of one value.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn get(&self, id: DatabaseId, key: &[u8]) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.open(id)?.get(key).map(<[u8]>::to_vec))
    }

    /// Returns the number of records in one database.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn record_count(&self, id: DatabaseId) -> CoreResult<usize> {
        Ok(self.open(id)?.len())
    }

    /// Returns the databases this store serves, in id order.
    pub fn databases(&self) -> impl Iterator<Item = DatabaseId> + '_ {
        self.databases.keys().copied()
    }

    /// Collects record counts and sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the backend fails.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        self.ensure_open()?;
        let databases = self
            .databases
            .iter()
            .map(|(&database, lock)| {
                let state = lock.read();
                DatabaseStats {
                    database,
                    records: state.records.len(),
                    value_bytes: state.value_bytes,
                }
            })
            .collect();

        let live_bytes = self.live_bytes();
        let log_bytes = self.backend.lock().size()?;
        Ok(StoreStats {
            log_bytes,
            dead_bytes: log_bytes.saturating_sub(live_bytes),
            databases,
        })
    }

    /// Returns the number of log bytes that back no live record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed or the backend fails.
    pub fn dead_bytes(&self) -> CoreResult<u64> {
        self.ensure_open()?;
        let live_bytes = self.live_bytes();
        let log_bytes = self.backend.lock().size()?;
        Ok(log_bytes.saturating_sub(live_bytes))
    }

    /// Rewrites the record log so it holds exactly one put per live record.
    ///
    /// Blocks every reader and writer for the duration of the rewrite. The
    /// backend swaps the contents in one step, so a failure leaves the old
    /// log in place.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after shutdown, or a storage error if the new
    /// log cannot be written.
    pub fn compact(&self) -> CoreResult<CompactionResult> {
        self.ensure_open()?;
        let guards: Vec<_> = self
            .databases
            .iter()
            .map(|(db, lock)| (db.as_u8(), lock.write()))
            .collect();
        self.rewrite_log(&guards)
    }

    fn rewrite_log(
        &self,
        guards: &[(u8, RwLockWriteGuard<'_, DatabaseState>)],
    ) -> CoreResult<CompactionResult> {
        let mut backend = self.backend.lock();
        let input_bytes = backend.size()?;

        let served = guards.iter().map(|(db, state)| (*db, &**state));
        let retained = self.retained.iter().map(|(db, state)| (*db, state));
        let mut output = Vec::new();
        let mut live_records = 0usize;
        for (database, state) in served.chain(retained) {
            for record in &state.records {
                let encoded =
                    LogRecord::put(database, record.key.clone(), record.value.clone()).encode()?;
                output.extend_from_slice(&encoded);
                live_records += 1;
            }
        }

        backend.replace(&output)?;
        let output_bytes = output.len() as u64;
        let result = CompactionResult {
            input_bytes,
            output_bytes,
            live_records,
            bytes_saved: input_bytes.saturating_sub(output_bytes),
        };
        info!(
            input_bytes,
            output_bytes,
            live_records,
            "record log compacted"
        );
        Ok(result)
    }

    /// Syncs the backing resource and refuses all further operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the final sync fails; the store is closed anyway.
    pub fn shutdown(&self) -> CoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }
        *is_open = false;

        self.backend.lock().sync()?;
        info!("record store shut down");
        Ok(())
    }

    /// Returns whether the store accepts operations.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    /// Returns the configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the store directory, if the store is persistent.
    #[cfg(feature = "std")]
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.dir.as_ref().map(StoreDir::path)
    }

    /// Sum of the encoded sizes of every live record. Takes each database's
    /// read lock in turn, so it must run before the backend lock is taken.
    fn live_bytes(&self) -> u64 {
        let served: u64 = self.databases.values().map(|lock| lock.read().log_bytes).sum();
        let retained: u64 = self.retained.values().map(|state| state.log_bytes).sum();
        served + retained
    }

    /// Compacts once the dead bytes pass the configured threshold. Never
    /// waits on a database lock: if any database is busy the rewrite is left
    /// for a later write.
    fn compact_if_needed(&self) {
        let dead_bytes = match self.dead_bytes() {
            Ok(dead_bytes) => dead_bytes,
            Err(err) => {
                warn!(error = %err, "could not measure dead log bytes");
                return;
            }
        };
        if dead_bytes <= self.config.compaction_threshold {
            return;
        }

        let guards: Option<Vec<_>> = self
            .databases
            .iter()
            .map(|(db, lock)| lock.try_write().map(|guard| (db.as_u8(), guard)))
            .collect();
        let Some(guards) = guards else {
            debug!(dead_bytes, "compaction deferred, a database is in use");
            return;
        };

        debug!(dead_bytes, threshold = self.config.compaction_threshold, "compacting record log");
        if let Err(err) = self.rewrite_log(&guards) {
            warn!(error = %err, dead_bytes, "automatic compaction failed");
        }
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::StoreClosed)
        }
    }

    fn lock_for(&self, id: DatabaseId) -> CoreResult<&RwLock<DatabaseState>> {
        self.databases
            .get(&id)
            .ok_or(CoreError::DatabaseNotFound { id: id.as_u8() })
    }

    /// Appends one record to the log. On failure the log is cut back to its
    /// previous length, so no partial record stays visible.
    fn append(&self, record: &LogRecord) -> CoreResult<()> {
        let encoded = record.encode()?;
        let mut backend = self.backend.lock();
        let rollback_to = backend.size()?;

        let written = backend.append(&encoded).and_then(|_| {
            if self.config.sync_on_write {
                backend.sync()
            } else {
                backend.flush()
            }
        });

        if let Err(err) = written {
            if let Err(rollback_err) = backend.truncate(rollback_to) {
                warn!(error = %rollback_err, rollback_to, "failed to roll back partial record");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

fn replay(
    backend: &dyn StorageBackend,
    states: &mut BTreeMap<DatabaseId, DatabaseState>,
    retained: &mut BTreeMap<u8, DatabaseState>,
) -> CoreResult<ScanOutcome> {
    let mut ignored = 0usize;
    let outcome = scan_log(backend, |_, record| {
        let served = DatabaseId::from_u8(record.database).and_then(|db| states.get_mut(&db));
        let state = match served {
            Some(state) => state,
            None => {
                ignored += 1;
                retained.entry(record.database).or_default()
            }
        };

        if record.is_tombstone() {
            state.remove(&record.key);
        } else {
            state.put(record.key, record.value);
        }
    })?;

    if ignored > 0 {
        debug!(ignored, "retained log records for databases this store does not serve");
    }
    Ok(outcome)
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("databases", &self.databases.keys().collect::<Vec<_>>())
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

/// One record as seen through a [`DatabaseHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'h> {
    database: DatabaseId,
    key: &'h [u8],
    value: &'h [u8],
}

impl<'h> Record<'h> {
    /// The database the record belongs to.
    #[must_use]
    pub fn database(&self) -> DatabaseId {
        self.database
    }

    /// The record key.
    #[must_use]
    pub fn key(&self) -> &'h [u8] {
        self.key
    }

    /// The record value.
    #[must_use]
    pub fn value(&self) -> &'h [u8] {
        self.value
    }
}

/// Read access to one database.
///
/// Holds the database's read lock until closed or dropped.
pub struct DatabaseHandle<'s> {
    id: DatabaseId,
    store: &'s RecordStore,
    state: RwLockReadGuard<'s, DatabaseState>,
}

impl<'s> DatabaseHandle<'s> {
    /// The database this handle reads.
    #[must_use]
    pub fn id(&self) -> DatabaseId {
        self.id
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.records.len()
    }

    /// Returns true if the database holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.records.is_empty()
    }

    /// Looks up one value by key.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.state.get(key).map(|r| r.value.as_slice())
    }

    /// Starts a forward-only pass over every record, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` if the store was shut down after this handle
    /// was opened.
    pub fn iterate(&self) -> CoreResult<RecordIter<'_>> {
        self.store.ensure_open()?;
        Ok(RecordIter {
            database: self.id,
            inner: self.state.records.iter(),
        })
    }

    /// Runs `chain` over every record. Shorthand for
    /// [`iterate`](Self::iterate) followed by [`select`](crate::select::select).
    ///
    /// # Errors
    ///
    /// Same as [`iterate`](Self::iterate).
    pub fn select(&self, chain: &SelectorChain) -> CoreResult<(usize, SelectResultList<'_>)> {
        Ok(select::select(self.iterate()?, chain))
    }

    /// Releases the read lock.
    pub fn close(self) {}
}

impl std::fmt::Debug for DatabaseHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("id", &self.id)
            .field("records", &self.len())
            .finish()
    }
}

/// Iterator over the records of an open database.
#[derive(Debug, Clone)]
pub struct RecordIter<'h> {
    database: DatabaseId,
    inner: std::slice::Iter<'h, StoredRecord>,
}

impl<'h> RecordIter<'h> {
    /// The database being iterated.
    #[must_use]
    pub fn database(&self) -> DatabaseId {
        self.database
    }
}

impl<'h> Iterator for RecordIter<'h> {
    type Item = Record<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|r| Record {
            database: self.database,
            key: &r.key,
            value: &r.value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RecordIter<'_> {}

/// Exclusive access to one database for mutations.
pub struct DatabaseWriter<'s> {
    id: DatabaseId,
    store: &'s RecordStore,
    state: RwLockWriteGuard<'s, DatabaseState>,
}

impl DatabaseWriter<'_> {
    /// The database this writer mutates.
    #[must_use]
    pub fn id(&self) -> DatabaseId {
        self.id
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.records.len()
    }

    /// Returns true if the database holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.records.is_empty()
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.state.contains(key)
    }

    /// Upserts one record. The log is written first; the cached view only
    /// changes once the backing resource accepted the record.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `InvalidKey` for keys outside `1..=255` bytes
    /// - `ValueTooLarge` above `max_value_size`
    /// - `DatabaseFull` when a new key would exceed the record cap
    /// - a storage error if the backing resource rejects the write
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> CoreResult<()> {
        self.store.ensure_open()?;
        let config = &self.store.config;

        if key.is_empty() || key.len() > MAX_KEY_SIZE {
            return Err(CoreError::InvalidKey { len: key.len() });
        }
        if value.len() > config.max_value_size {
            return Err(CoreError::ValueTooLarge {
                len: value.len(),
                max: config.max_value_size,
            });
        }
        let replacing = self.state.contains(key);
        if !replacing && self.state.records.len() >= config.max_records_per_database {
            return Err(CoreError::DatabaseFull {
                database: self.id,
                capacity: config.max_records_per_database,
            });
        }

        let record = LogRecord::put(self.id.as_u8(), key.to_vec(), value.to_vec());
        self.store.append(&record)?;
        self.state.put(record.key, record.value);

        debug!(
            database = %self.id,
            key_len = key.len(),
            value_len = value.len(),
            replaced = replacing,
            "record written"
        );
        Ok(())
    }

    /// Removes one record. Deleting a missing key writes nothing and
    /// returns `false`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the tombstone cannot be written; the
    /// record then stays in place.
    pub fn delete(&mut self, key: &[u8]) -> CoreResult<bool> {
        self.store.ensure_open()?;
        if !self.state.contains(key) {
            return Ok(false);
        }

        self.store
            .append(&LogRecord::tombstone(self.id.as_u8(), key.to_vec()))?;
        self.state.remove(key);

        debug!(database = %self.id, key_len = key.len(), "record deleted");
        Ok(true)
    }
}

impl std::fmt::Debug for DatabaseWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseWriter")
            .field("id", &self.id)
            .field("records", &self.len())
            .finish()
    }
}
