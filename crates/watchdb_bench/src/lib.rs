//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use watchdb_core::{DatabaseId, RecordStore, StoreConfig};

/// Generate random record data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` distinct 16-byte keys.
pub fn generate_keys(count: usize) -> Vec<Vec<u8>> {
    (0..count as u128).map(|i| i.to_be_bytes().to_vec()).collect()
}

/// Opens an in-memory store holding `count` records of `value_size`
/// bytes in `database`. The first byte of every value is `i % 4`, so a
/// filter on offset 0 matches a quarter of the records.
pub fn populated_store(database: DatabaseId, count: usize, value_size: usize) -> RecordStore {
    let config = StoreConfig::default()
        .sync_on_write(false)
        .max_records_per_database(count.max(1));
    let store = RecordStore::open_in_memory(config).expect("open in-memory store");
    for (i, key) in generate_keys(count).iter().enumerate() {
        let mut value = random_data(value_size.max(1));
        value[0] = (i % 4) as u8;
        store.insert(database, key, &value).expect("insert record");
    }
    store
}
