//! Integration tests for the Blob dispatcher against a real record store.

use bytes::Bytes;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;
use uuid::Uuid;
use watchdb_blob::{BlobDispatcher, BlobEndpoint};
use watchdb_core::timeline::{AttributeId, UUID_OFFSET};
use watchdb_core::{
    DatabaseId, EffectRouter, Lookup, NotificationFeed, RecordStore, SelectorChain, StoreConfig,
    TimelineItem,
};
use watchdb_protocol::{BlobCommand, BlobResponse, StatusCode};

fn dispatcher() -> BlobDispatcher {
    let store = Arc::new(RecordStore::open_in_memory(StoreConfig::default()).unwrap());
    BlobDispatcher::new(store, Arc::new(EffectRouter::new()))
}

fn insert(token: u16, database: DatabaseId, key: &[u8], value: &[u8]) -> Bytes {
    BlobCommand::Insert {
        token,
        database: database.as_u8(),
        key: Bytes::copy_from_slice(key),
        value: Bytes::copy_from_slice(value),
    }
    .encode()
    .unwrap()
}

#[test]
fn values_longer_than_255_bytes_are_stored_whole() {
    let dispatcher = dispatcher();
    let key = [0x11; 16];
    let value: Vec<u8> = (0..300u16).map(|i| (i % 251) as u8).collect();

    let response = dispatcher
        .handle_frame(&insert(0x1234, DatabaseId::Notification, &key, &value))
        .unwrap();
    assert_eq!(response.encode().as_ref(), &[0x34, 0x12, 0x01]);

    let handle = dispatcher.store().open(DatabaseId::Notification).unwrap();
    let (count, results) = handle
        .select(&SelectorChain::new().filter(0, value[..16].to_vec()).project_full())
        .unwrap();
    assert_eq!(count, 1);
    let record = results.get(0).unwrap().record().unwrap();
    assert_eq!(record.key(), &key);
    assert_eq!(record.value().len(), 300);
    assert_eq!(record.value(), value.as_slice());
}

#[test]
fn concurrent_frames_get_their_own_tokens() {
    let dispatcher = Arc::new(dispatcher());

    let workers: Vec<_> = (0u16..8)
        .map(|worker| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                (0u16..25)
                    .map(|i| {
                        let token = worker * 100 + i;
                        let key = token.to_be_bytes();
                        let response = dispatcher
                            .handle_frame(&insert(token, DatabaseId::App, &key, &[worker as u8; 8]))
                            .unwrap();
                        (token, response)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for worker in workers {
        for (token, response) in worker.join().unwrap() {
            assert_eq!(response, BlobResponse::new(token, StatusCode::Success));
        }
    }
    assert_eq!(dispatcher.store().record_count(DatabaseId::App).unwrap(), 200);
}

#[test]
fn unknown_command_gets_one_response_and_changes_nothing() {
    let dispatcher = dispatcher();
    dispatcher.handle_frame(&insert(1, DatabaseId::Pin, b"pin", b"v"));
    let stats_before = dispatcher.store().stats().unwrap();

    let mut frame = vec![0x7F, 0xEF, 0xBE, DatabaseId::Pin.as_u8()];
    frame.extend_from_slice(&[3, b'p', b'i', b'n']);
    let response = dispatcher.handle_frame(&frame);

    assert_eq!(response, Some(BlobResponse::new(0xBEEF, StatusCode::InvalidOperation)));
    assert_eq!(dispatcher.store().stats().unwrap(), stats_before);
}

#[test]
fn notification_round_trip_through_the_wire() {
    let store = Arc::new(RecordStore::open_in_memory(StoreConfig::default()).unwrap());
    let router = Arc::new(EffectRouter::new());
    let arrivals = NotificationFeed::subscribe(&router);
    let dispatcher = BlobDispatcher::new(Arc::clone(&store), router);

    let uuid = Uuid::new_v4();
    let value = TimelineItem::notification(uuid, 1_700_000_000)
        .with_attribute(AttributeId::Subject, "Meeting")
        .with_attribute(AttributeId::Message, "Room 4")
        .encode()
        .unwrap();
    let response = dispatcher
        .handle_frame(&insert(5, DatabaseId::Notification, uuid.as_bytes(), &value))
        .unwrap();
    assert!(response.status.is_success());

    assert_eq!(arrivals.try_recv().unwrap(), uuid);

    let handle = store.open(DatabaseId::Notification).unwrap();
    let (_, results) = handle
        .select(
            &SelectorChain::new()
                .filter(UUID_OFFSET, uuid.as_bytes().to_vec())
                .project_full(),
        )
        .unwrap();
    let loaded = results.into_loaded();
    handle.close();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].key(), uuid.as_bytes());
    assert_eq!(loaded[0].value(), value.as_slice());

    let feed = NotificationFeed::new(store);
    let Lookup::Found(notification) = feed.load(uuid) else {
        panic!("notification should load");
    };
    let text = notification.display_text();
    assert_eq!(text.title, "Meeting");
    assert_eq!(text.subtitle.as_deref(), Some("Room 4"));
}

#[test]
fn remote_writes_persist() {
    let dir = tempdir().unwrap();
    {
        let store = Arc::new(RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap());
        let dispatcher = BlobDispatcher::new(Arc::clone(&store), Arc::new(EffectRouter::new()));
        dispatcher.handle_frame(&insert(1, DatabaseId::AppGlance, b"glance", b"slice-1"));
        dispatcher.handle_frame(&insert(2, DatabaseId::AppGlance, b"glance", b"slice-2"));
        store.shutdown().unwrap();
    }

    let store = RecordStore::open_at(dir.path(), StoreConfig::default()).unwrap();
    assert_eq!(
        store.get(DatabaseId::AppGlance, b"glance").unwrap(),
        Some(b"slice-2".to_vec())
    );
}

#[test]
fn closed_store_reports_general_failure() {
    let dispatcher = dispatcher();
    dispatcher.store().shutdown().unwrap();

    let response = dispatcher
        .handle_frame(&insert(3, DatabaseId::Pin, b"pin", b"v"))
        .unwrap();
    assert_eq!(response.status, StatusCode::GeneralFailure);
}

#[tokio::test]
async fn endpoint_serves_a_mixed_stream() {
    let dispatcher = Arc::new(dispatcher());
    let mut handle = BlobEndpoint::new(Arc::clone(&dispatcher)).spawn();

    handle.send(insert(10, DatabaseId::Pin, b"a", b"1")).await.unwrap();
    handle.send(Bytes::from_static(&[0x01])).await.unwrap();
    handle.send(Bytes::from_static(&[0x09, 11, 0, 0x01])).await.unwrap();

    let first = BlobResponse::decode(&handle.recv().await.unwrap()).unwrap();
    let second = BlobResponse::decode(&handle.recv().await.unwrap()).unwrap();
    assert_eq!(first, BlobResponse::new(10, StatusCode::Success));
    assert_eq!(second, BlobResponse::new(11, StatusCode::InvalidOperation));

    let stats = handle.shutdown().await.unwrap();
    assert_eq!((stats.frames, stats.responses, stats.dropped), (3, 2, 1));
    assert_eq!(dispatcher.stats().dropped, 1);
}
