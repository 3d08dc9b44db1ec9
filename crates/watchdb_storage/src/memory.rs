//! In-memory backing resource.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// How an [`InMemoryBackend`] misbehaves on `append`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultMode {
    /// Appends succeed.
    #[default]
    None,
    /// Appends fail without writing anything.
    RejectWrites,
    /// Appends write the first half of the data, then fail.
    TornWrites,
}

#[derive(Debug, Default)]
struct Shared {
    data: RwLock<Vec<u8>>,
    fault: RwLock<FaultMode>,
}

/// A backing resource held entirely in RAM.
///
/// Clones share the same bytes, so a test can keep one clone to inspect or
/// sabotage the resource after handing another to a record store.
///
/// # Example
///
/// ```rust
/// use watchdb_storage::{FaultMode, InMemoryBackend, StorageBackend};
///
/// let backend = InMemoryBackend::new();
/// let mut writer = backend.clone();
/// writer.append(b"abc").unwrap();
/// assert_eq!(backend.data(), b"abc");
///
/// backend.set_fault(FaultMode::RejectWrites);
/// assert!(writer.append(b"def").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    shared: Arc<Shared>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend preloaded with `data`, e.g. a captured record log.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        let backend = Self::default();
        *backend.shared.data.write() = data;
        backend
    }

    /// Returns a copy of every byte in the backend.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.shared.data.read().clone()
    }

    /// Changes how subsequent appends behave.
    pub fn set_fault(&self, mode: FaultMode) {
        *self.shared.fault.write() = mode;
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.shared.data.read();
        let size = data.len() as u64;
        let start = usize::try_from(offset).map_err(|_| StorageError::ReadPastEnd {
            offset,
            len,
            size,
        })?;

        match start.checked_add(len) {
            Some(end) if end <= data.len() => Ok(data[start..end].to_vec()),
            _ => Err(StorageError::ReadPastEnd { offset, len, size }),
        }
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        let fault = *self.shared.fault.read();
        let mut data = self.shared.data.write();
        let offset = data.len() as u64;

        match fault {
            FaultMode::None => {
                data.extend_from_slice(new_data);
                Ok(offset)
            }
            FaultMode::RejectWrites => Err(StorageError::ReadOnly),
            FaultMode::TornWrites => {
                data.extend_from_slice(&new_data[..new_data.len() / 2]);
                Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write torn by injected fault",
                )))
            }
        }
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.shared.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.shared.data.write();
        let size = data.len() as u64;

        if new_size > size {
            return Err(StorageError::TruncatePastEnd {
                requested: new_size,
                size,
            });
        }

        data.truncate(new_size as usize);
        Ok(())
    }

    fn replace(&mut self, new_data: &[u8]) -> StorageResult<()> {
        match *self.shared.fault.read() {
            FaultMode::None => {
                *self.shared.data.write() = new_data.to_vec();
                Ok(())
            }
            FaultMode::RejectWrites => Err(StorageError::ReadOnly),
            FaultMode::TornWrites => Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "replace abandoned by injected fault",
            ))),
        }
    }
}
