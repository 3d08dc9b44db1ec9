//! Test fixtures and store helpers.

use std::ops::Deref;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;
use watchdb_blob::BlobDispatcher;
use watchdb_core::timeline::AttributeId;
use watchdb_core::{DatabaseId, EffectRouter, RecordStore, StoreConfig, TimelineItem};
use watchdb_storage::{FaultMode, InMemoryBackend};

/// A store that cleans up after itself.
///
/// File-backed stores keep their temporary directory alive for as long as
/// the fixture lives. Stores built with [`TestStore::backed`] keep a handle
/// to their memory backend for fault injection and log inspection.
pub struct TestStore {
    store: Arc<RecordStore>,
    dir: Option<TempDir>,
    backend: Option<InMemoryBackend>,
    config: StoreConfig,
}

impl TestStore {
    /// Creates an in-memory store with the default configuration.
    pub fn memory() -> Self {
        Self::memory_with(StoreConfig::default())
    }

    /// Creates an in-memory store with `config`.
    pub fn memory_with(config: StoreConfig) -> Self {
        let store = RecordStore::open_in_memory(config.clone())
            .expect("Failed to open in-memory store");
        Self {
            store: Arc::new(store),
            dir: None,
            backend: None,
            config,
        }
    }

    /// Opens a store over `backend`, replaying whatever log it holds.
    pub fn backed(backend: InMemoryBackend, config: StoreConfig) -> Self {
        let store = RecordStore::open_with_backend(config.clone(), Box::new(backend.clone()))
            .expect("Failed to open store on backend");
        Self {
            store: Arc::new(store),
            dir: None,
            backend: Some(backend),
            config,
        }
    }

    /// Returns the memory backend of a store built with
    /// [`backed`](Self::backed).
    pub fn backend(&self) -> Option<&InMemoryBackend> {
        self.backend.as_ref()
    }

    /// Makes later writes to the backend fail in the given way.
    ///
    /// Panics unless the store was built with [`backed`](Self::backed).
    pub fn inject_fault(&self, mode: FaultMode) {
        self.backend
            .as_ref()
            .expect("Only backed stores accept faults")
            .set_fault(mode);
    }

    /// Returns the raw record log of a backed store.
    ///
    /// Panics unless the store was built with [`backed`](Self::backed).
    pub fn log(&self) -> Vec<u8> {
        self.backend
            .as_ref()
            .expect("Only backed stores expose their log")
            .data()
    }

    /// Creates a store in a fresh temporary directory.
    pub fn file() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = StoreConfig::default();
        let store = RecordStore::open_at(dir.path(), config.clone()).expect("Failed to open store");
        Self {
            store: Arc::new(store),
            dir: Some(dir),
            backend: None,
            config,
        }
    }

    /// Returns a shared handle to the store.
    pub fn shared(&self) -> Arc<RecordStore> {
        Arc::clone(&self.store)
    }

    /// Returns the temporary directory of a file-backed store.
    pub fn dir(&self) -> Option<&std::path::Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    /// Closes the store and opens it again from its directory or backend,
    /// with the same configuration.
    ///
    /// Panics for plain in-memory stores and if another clone of the shared
    /// handle is still alive.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            dir,
            backend,
            config,
        } = self;
        let store = Arc::try_unwrap(store).expect("Store is still shared");
        store.shutdown().expect("Failed to shut down store");
        drop(store);

        if let Some(backend) = backend {
            return Self::backed(backend, config);
        }
        let dir = dir.expect("Only file-backed or backed stores can be reopened");
        let store = RecordStore::open_at(dir.path(), config.clone())
            .expect("Failed to reopen store");
        Self {
            store: Arc::new(store),
            dir: Some(dir),
            backend: None,
            config,
        }
    }

    /// Builds a dispatcher over this store with a fresh router.
    pub fn dispatcher(&self) -> BlobDispatcher {
        BlobDispatcher::new(self.shared(), Arc::new(EffectRouter::new()))
    }
}

impl Deref for TestStore {
    type Target = RecordStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs `f` against a file-backed store in a temporary directory.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&RecordStore) -> R,
{
    let store = TestStore::file();
    f(&store)
}

/// Runs `f` against an in-memory store.
pub fn with_memory_store<F, R>(f: F) -> R
where
    F: FnOnce(&RecordStore) -> R,
{
    let store = TestStore::memory();
    f(&store)
}

/// Encodes a notification with the given text attributes, in the order
/// sender, subject, message. `None` leaves the attribute out.
pub fn notification_value(
    uuid: Uuid,
    sender: Option<&str>,
    subject: Option<&str>,
    message: Option<&str>,
) -> Vec<u8> {
    let mut item = TimelineItem::notification(uuid, 1_700_000_000);
    for (id, text) in [
        (AttributeId::Sender, sender),
        (AttributeId::Subject, subject),
        (AttributeId::Message, message),
    ] {
        if let Some(text) = text {
            item = item.with_attribute(id, text);
        }
    }
    item.encode().expect("Failed to encode notification")
}

/// Pre-built store scenarios.
pub mod scenarios {
    use super::*;

    /// A store with `count` records in `database`, keyed `key-{i}` with
    /// a one-byte value of `i % 256`.
    pub fn populated_store(database: DatabaseId, count: usize) -> TestStore {
        let store = TestStore::memory();
        for i in 0..count {
            store
                .insert(database, format!("key-{i}").as_bytes(), &[(i % 256) as u8])
                .expect("Failed to insert record");
        }
        store
    }

    /// A store with one notification per `(sender, subject, message)`
    /// triple. Returns the store and the uuids in insertion order.
    pub fn notification_store(
        notifications: &[(Option<&str>, Option<&str>, Option<&str>)],
    ) -> (TestStore, Vec<Uuid>) {
        let store = TestStore::memory();
        let mut uuids = Vec::with_capacity(notifications.len());
        for &(sender, subject, message) in notifications {
            let uuid = Uuid::new_v4();
            store
                .insert(
                    DatabaseId::Notification,
                    uuid.as_bytes(),
                    &notification_value(uuid, sender, subject, message),
                )
                .expect("Failed to insert notification");
            uuids.push(uuid);
        }
        (store, uuids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdb_core::Notification;

    #[test]
    fn test_memory_store() {
        let store = TestStore::memory();
        assert!(store.is_open());
        assert!(store.dir().is_none());
    }

    #[test]
    fn test_with_temp_store() {
        let count = with_temp_store(|store| {
            store.insert(DatabaseId::App, b"a", b"1").unwrap();
            store.record_count(DatabaseId::App).unwrap()
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn test_reopen_keeps_records() {
        let store = TestStore::file();
        store.insert(DatabaseId::Pin, b"p", b"pin").unwrap();
        let store = store.reopen();
        assert_eq!(store.get(DatabaseId::Pin, b"p").unwrap(), Some(b"pin".to_vec()));
    }

    #[test]
    fn test_backed_store_survives_reopen() {
        let config = StoreConfig::new().compaction_threshold(u64::MAX);
        let store = TestStore::backed(InMemoryBackend::new(), config);
        store.insert(DatabaseId::App, b"a", b"1").unwrap();
        store.insert(DatabaseId::App, b"a", b"2").unwrap();
        let log = store.log();

        let store = store.reopen();
        assert_eq!(store.log(), log);
        assert_eq!(store.get(DatabaseId::App, b"a").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_injected_fault_rejects_writes() {
        let store = TestStore::backed(InMemoryBackend::new(), StoreConfig::default());
        store.insert(DatabaseId::Pin, b"p", b"1").unwrap();
        let log = store.log();

        store.inject_fault(FaultMode::RejectWrites);
        assert!(store.insert(DatabaseId::Pin, b"q", b"2").is_err());
        assert_eq!(store.log(), log);
        assert_eq!(store.record_count(DatabaseId::Pin).unwrap(), 1);
    }

    #[test]
    fn test_notification_value_decodes() {
        let uuid = Uuid::new_v4();
        let value = notification_value(uuid, Some("Alice"), None, Some("hi"));
        let notification = Notification::from_value(&value).unwrap();
        assert_eq!(notification.uuid(), uuid);
        assert_eq!(notification.display_text().title, "Alice");
    }

    #[test]
    fn test_populated_scenario() {
        let store = scenarios::populated_store(DatabaseId::Reminder, 10);
        assert_eq!(store.record_count(DatabaseId::Reminder).unwrap(), 10);
    }
}
