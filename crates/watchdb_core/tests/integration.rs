//! Integration tests for the record store, selector engine and notification
//! accessors.

use std::sync::Arc;
use std::thread;
use tempfile::tempdir;
use uuid::Uuid;
use watchdb_core::timeline::{AttributeId, UUID_OFFSET, UUID_SIZE};
use watchdb_core::{
    find_one, CoreError, DatabaseId, Lookup, NotificationFeed, RecordStore, SelectorChain,
    StoreConfig, StoreDir, TimelineItem,
};

fn notification_value(uuid: Uuid, sender: &str, message: &str) -> Vec<u8> {
    TimelineItem::notification(uuid, 1_700_000_000)
        .with_attribute(AttributeId::Sender, sender)
        .with_attribute(AttributeId::Message, message)
        .encode()
        .unwrap()
}

#[test]
fn exact_key_lookup_returns_one_full_record() {
    let store = RecordStore::open_in_memory(StoreConfig::default()).unwrap();
    let uuid = Uuid::new_v4();
    let value = notification_value(uuid, "Ann", "Lunch?");
    store.insert(DatabaseId::Notification, uuid.as_bytes(), &value).unwrap();
    store
        .insert(DatabaseId::Notification, Uuid::new_v4().as_bytes(), &notification_value(Uuid::new_v4(), "Bo", "Hey"))
        .unwrap();

    let handle = store.open(DatabaseId::Notification).unwrap();
    let chain = SelectorChain::new()
        .filter(UUID_OFFSET, uuid.as_bytes().to_vec())
        .project_full();
    let (count, results) = handle.select(&chain).unwrap();

    assert_eq!(count, 1);
    let record = results.get(0).unwrap().record().unwrap();
    assert_eq!(record.key(), uuid.as_bytes());
    assert_eq!(record.value(), value.as_slice());
}

#[test]
fn no_match_is_empty_not_an_error() {
    let store = RecordStore::open_in_memory(StoreConfig::default()).unwrap();
    store.insert(DatabaseId::Pin, b"pin", &[1; 32]).unwrap();

    let handle = store.open(DatabaseId::Pin).unwrap();
    let (count, mut results) = handle
        .select(&SelectorChain::new().filter(0, vec![2; 16]).project_full())
        .unwrap();

    assert_eq!(count, 0);
    assert!(results.is_empty());
    results.release();
    results.release();
    assert!(matches!(
        find_one(&handle, &SelectorChain::new().filter(0, vec![2; 16])),
        Lookup::NotFound
    ));

    let (_, empty) = store
        .open(DatabaseId::Reminder)
        .unwrap()
        .select(&SelectorChain::new())
        .map(|(n, list)| (n, list.into_loaded()))
        .unwrap();
    assert!(empty.is_empty());
}

#[test]
fn records_survive_reopen() {
    let dir = tempdir().unwrap();
    let uuid = Uuid::new_v4();
    let value = notification_value(uuid, "Ann", "Lunch?");

    {
        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        store.insert(DatabaseId::Notification, uuid.as_bytes(), &value).unwrap();
        store.insert(DatabaseId::App, b"app-1", b"watchface").unwrap();
        store.insert(DatabaseId::App, b"app-2", b"weather").unwrap();
        assert!(store.delete(DatabaseId::App, b"app-1").unwrap());
        store.shutdown().unwrap();
    }

    let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
    assert_eq!(store.path(), Some(dir.path()));
    assert_eq!(
        store.get(DatabaseId::Notification, uuid.as_bytes()).unwrap(),
        Some(value)
    );
    assert_eq!(store.get(DatabaseId::App, b"app-1").unwrap(), None);
    assert_eq!(store.get(DatabaseId::App, b"app-2").unwrap(), Some(b"weather".to_vec()));
}

#[test]
fn store_directory_is_exclusive() {
    let dir = tempdir().unwrap();
    let _first = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();

    assert!(matches!(
        RecordStore::open_at(dir.path(), StoreConfig::default()),
        Err(CoreError::StoreLocked)
    ));
}

#[test]
fn torn_tail_in_file_is_recovered() {
    let dir = tempdir().unwrap();
    {
        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        store.insert(DatabaseId::Reminder, b"r1", b"take out bins").unwrap();
        store.insert(DatabaseId::Reminder, b"r2", b"call mum").unwrap();
    }

    let log = StoreDir::records_path_in(dir.path());
    let bytes = std::fs::read(&log).unwrap();
    std::fs::write(&log, &bytes[..bytes.len() - 5]).unwrap();

    let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
    assert_eq!(store.record_count(DatabaseId::Reminder).unwrap(), 1);
    assert_eq!(
        store.get(DatabaseId::Reminder, b"r1").unwrap(),
        Some(b"take out bins".to_vec())
    );
    store.insert(DatabaseId::Reminder, b"r3", b"water plants").unwrap();
    assert_eq!(store.record_count(DatabaseId::Reminder).unwrap(), 2);
}

#[test]
fn damage_before_the_tail_refuses_to_open() {
    let dir = tempdir().unwrap();
    {
        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        store.insert(DatabaseId::Pin, b"p1", b"first").unwrap();
        store.insert(DatabaseId::Pin, b"p2", b"second").unwrap();
    }

    let log = StoreDir::records_path_in(dir.path());
    let mut bytes = std::fs::read(&log).unwrap();
    bytes[9] ^= 0xFF;
    std::fs::write(&log, &bytes).unwrap();

    assert!(matches!(
        RecordStore::open_at(dir.path(), StoreConfig::default()),
        Err(CoreError::ChecksumMismatch { .. })
    ));
}

#[test]
fn disabled_database_records_are_kept_but_hidden() {
    let dir = tempdir().unwrap();
    {
        let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
        store.insert(DatabaseId::AppGlance, b"g", b"slice").unwrap();
        store.insert(DatabaseId::Pin, b"p", b"pin").unwrap();
    }

    {
        let config = StoreConfig::new().databases([DatabaseId::Pin]);
        let store = RecordStore::open_at(dir.path(), config).unwrap();
        assert!(matches!(
            store.open(DatabaseId::AppGlance),
            Err(CoreError::DatabaseNotFound { id: 0x0B })
        ));
        assert_eq!(store.record_count(DatabaseId::Pin).unwrap(), 1);
    }

    let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
    assert_eq!(store.get(DatabaseId::AppGlance, b"g").unwrap(), Some(b"slice".to_vec()));
}

#[test]
fn concurrent_readers_and_writers() {
    let store = Arc::new(RecordStore::open_in_memory(StoreConfig::default().sync_on_write(false)).unwrap());

    let writers: Vec<_> = (0u8..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0u8..32 {
                    let key = [t, i];
                    store.insert(DatabaseId::Pin, &key, &[t; 24]).unwrap();
                }
            })
        })
        .collect();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..50 {
                let handle = store.open(DatabaseId::Pin).unwrap();
                let (count, results) = handle.select(&SelectorChain::new().project(0, 1)).unwrap();
                assert_eq!(count, results.len());
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    assert_eq!(store.record_count(DatabaseId::Pin).unwrap(), 128);
    for t in 0u8..4 {
        let handle = store.open(DatabaseId::Pin).unwrap();
        let (count, _) = handle.select(&SelectorChain::new().filter(0, vec![t; 24])).unwrap();
        assert_eq!(count, 32);
    }
}

#[test]
fn notification_feed_end_to_end() {
    let store = Arc::new(RecordStore::open_in_memory(StoreConfig::default()).unwrap());
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    store
        .insert(DatabaseId::Notification, first.as_bytes(), &notification_value(first, "Meeting", ""))
        .unwrap();
    store
        .insert(DatabaseId::Notification, second.as_bytes(), &notification_value(second, "", "Hi"))
        .unwrap();
    store.insert(DatabaseId::Notification, b"stray", &[0; UUID_SIZE - 1]).unwrap();

    let mut feed = NotificationFeed::new(Arc::clone(&store));
    assert_eq!(feed.refresh().unwrap(), 2);
    assert_eq!(feed.keys(), &[first, second]);

    let rows: Vec<_> = (0..feed.len())
        .map(|row| feed.load_at(row).found().unwrap().display_text())
        .collect();
    assert_eq!(rows[0].title, "Meeting");
    assert_eq!(rows[0].subtitle, None);
    assert_eq!(rows[1].title, "Hi");
}
