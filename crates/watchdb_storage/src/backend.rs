//! Backing resource trait.

use crate::error::StorageResult;

/// An opaque, append-oriented byte store.
///
/// The record store keeps one append-only log per backend and interprets
/// every byte itself. Backends only move bytes around.
///
/// # Invariants
///
/// - `append` returns the offset where the data begins
/// - `read_at` returns exactly the bytes previously written at that offset
/// - after `flush` returns, appended data survives a crash of the process
/// - `truncate` discards everything at and after `new_size`
/// - `replace` leaves either the old or the new contents, never a mix
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// if the range is not fully inside the resource, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource refuses the write.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes pending writes to the durable medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes (the offset of the next append).
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Like [`flush`](Self::flush), but also makes metadata durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Cuts the resource back to `new_size` bytes.
    ///
    /// Used to roll back a partially written record and to drop a torn
    /// tail found during replay.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` exceeds the current size or the
    /// truncation fails.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Replaces the whole resource with `data`, as one step.
    ///
    /// Used to rewrite the record log during compaction. The default cuts
    /// the resource to zero and appends, which is not crash-safe;
    /// implementations that can swap atomically override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents cannot be written. Overriding
    /// implementations leave the old contents in place on failure.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        self.truncate(0)?;
        self.append(data)?;
        self.sync()
    }
}
