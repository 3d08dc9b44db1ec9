//! Fuzz testing harnesses for watchdb.
//!
//! This module provides fuzz targets that can be used with cargo-fuzz
//! or other fuzzing frameworks.

use bytes::Bytes;
use std::collections::HashMap;
use watchdb_core::selector::evaluate;
use watchdb_core::{
    DatabaseId, Notification, RecordStore, Selector, SelectorChain, StoreConfig, TimelineItem,
};
use watchdb_protocol::{BlobCommand, BlobResponse};

use crate::fixtures::TestStore;

/// Fuzz target for Blob frame decoding.
///
/// Arbitrary bytes either decode or return an error. A decoded insert or
/// delete encodes back to the bytes it was read from.
pub fn fuzz_blob_frame(data: &[u8]) {
    let Ok((command, trailing)) = BlobCommand::decode_bytes(Bytes::copy_from_slice(data)) else {
        return;
    };

    if !matches!(command, BlobCommand::Unknown { .. }) {
        let encoded = command.encode().expect("decoded command must encode");
        assert_eq!(&encoded[..], &data[..data.len() - trailing], "Roundtrip mismatch");
    }
}

/// Fuzz target for Blob response decoding.
pub fn fuzz_blob_response(data: &[u8]) {
    if let Ok(response) = BlobResponse::decode(data) {
        assert_eq!(&response.encode()[..], &data[..BlobResponse::SIZE]);
    }
}

/// Fuzz target for timeline item parsing.
///
/// Parsing never panics, and a parsed notification always yields a title.
pub fn fuzz_timeline_item(data: &[u8]) {
    if TimelineItem::parse(data).is_ok() {
        let notification = Notification::from_value(data).expect("parsed item must load");
        let _ = notification.display_text();
    }
}

/// Fuzz target for selector evaluation.
///
/// The first byte picks how many selectors to read; each selector takes
/// three bytes. The rest of the input is the record value.
pub fn fuzz_selector(data: &[u8]) {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let count = usize::from(count % 8);
    if rest.len() < count * 3 {
        return;
    }

    let (selectors, value) = rest.split_at(count * 3);
    let mut chain = SelectorChain::new();
    for entry in selectors.chunks_exact(3) {
        let offset = usize::from(entry[1]);
        chain.push(match entry[0] % 3 {
            0 => Selector::Filter {
                offset,
                operand: vec![entry[2]; usize::from(entry[2] % 4)],
            },
            1 => Selector::Project {
                offset,
                size: usize::from(entry[2]),
            },
            _ => Selector::ProjectFull,
        });
    }

    let outcome = evaluate(value, &chain);
    if !outcome.matches {
        assert!(outcome.projections.is_empty());
    }
}

/// Fuzz target for frame dispatch.
///
/// Splits the input on `0xFF` and dispatches each piece as a frame against
/// a fresh in-memory store. Every piece that decodes gets one response.
pub fn fuzz_dispatch(data: &[u8]) {
    let store = TestStore::memory();
    let dispatcher = store.dispatcher();

    for frame in data.split(|&b| b == 0xFF) {
        let decodes = BlobCommand::decode(frame).is_ok();
        let response = dispatcher.handle_frame(frame);
        assert_eq!(decodes, response.is_some());
    }
}

/// Structured fuzzing input for store operations.
#[derive(Debug, Clone)]
pub enum FuzzOp {
    /// Insert a record.
    Insert {
        /// Database wire id.
        database: u8,
        /// Record key.
        key: Vec<u8>,
        /// Record value.
        value: Vec<u8>,
    },
    /// Delete a record.
    Delete {
        /// Database wire id.
        database: u8,
        /// Record key.
        key: Vec<u8>,
    },
    /// Look up a record.
    Get {
        /// Database wire id.
        database: u8,
        /// Record key.
        key: Vec<u8>,
    },
}

impl FuzzOp {
    /// Parse operations from fuzzer input.
    ///
    /// Each op is a type byte, a database byte, a key length byte and the
    /// key; inserts add a value length byte and the value.
    pub fn parse_sequence(data: &[u8]) -> Vec<FuzzOp> {
        let mut ops = Vec::new();
        let mut rest = data;

        while rest.len() >= 3 {
            let op_type = rest[0];
            let database = rest[1] % 0x0C;
            let key_len = usize::from(rest[2] % 8);
            rest = &rest[3..];
            if rest.len() < key_len {
                break;
            }
            let (key, tail) = rest.split_at(key_len);
            rest = tail;
            let key = key.to_vec();

            let op = match op_type % 3 {
                0 => {
                    let Some((&value_len, tail)) = rest.split_first() else {
                        break;
                    };
                    let value_len = usize::from(value_len % 32);
                    if tail.len() < value_len {
                        break;
                    }
                    let (value, tail) = tail.split_at(value_len);
                    rest = tail;
                    FuzzOp::Insert {
                        database,
                        key,
                        value: value.to_vec(),
                    }
                }
                1 => FuzzOp::Delete { database, key },
                _ => FuzzOp::Get { database, key },
            };
            ops.push(op);
        }

        ops
    }

    /// Execute operations on a store, checking every lookup against a
    /// plain map of what should be there.
    pub fn execute_sequence(ops: &[FuzzOp], store: &RecordStore) {
        let mut model: HashMap<(u8, Vec<u8>), Vec<u8>> = HashMap::new();

        for op in ops {
            match op {
                FuzzOp::Insert {
                    database,
                    key,
                    value,
                } => {
                    let Some(id) = DatabaseId::from_u8(*database) else {
                        continue;
                    };
                    if store.insert(id, key, value).is_ok() {
                        model.insert((*database, key.clone()), value.clone());
                    }
                }
                FuzzOp::Delete { database, key } => {
                    let Some(id) = DatabaseId::from_u8(*database) else {
                        continue;
                    };
                    if let Ok(existed) = store.delete(id, key) {
                        let modelled = model.remove(&(*database, key.clone())).is_some();
                        assert_eq!(existed, modelled, "delete disagrees with model");
                    }
                }
                FuzzOp::Get { database, key } => {
                    let Some(id) = DatabaseId::from_u8(*database) else {
                        continue;
                    };
                    if let Ok(found) = store.get(id, key) {
                        assert_eq!(
                            found.as_ref(),
                            model.get(&(*database, key.clone())),
                            "get disagrees with model"
                        );
                    }
                }
            }
        }
    }
}

/// Fuzz target for store operations.
///
/// Tests that arbitrary operation sequences don't cause panics and agree
/// with a simple map.
pub fn fuzz_store_operations(data: &[u8]) {
    let Ok(store) = RecordStore::open_in_memory(StoreConfig::default()) else {
        return;
    };
    FuzzOp::execute_sequence(&FuzzOp::parse_sequence(data), &store);
}
