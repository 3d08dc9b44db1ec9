//! CLI command implementations.

pub mod apply;
pub mod compact;
pub mod dump;
pub mod frame;
pub mod inspect;
pub mod verify;

use std::path::Path;
use watchdb_core::{RecordStore, StoreConfig};

/// Opens the store at `path`.
///
/// Read-only commands pass `create = false` so a mistyped path is reported
/// instead of creating an empty store.
pub fn open_store(path: &Path, create: bool) -> Result<RecordStore, Box<dyn std::error::Error>> {
    let config = StoreConfig::new().create_if_missing(create);
    Ok(RecordStore::open_at(path, config)?)
}
