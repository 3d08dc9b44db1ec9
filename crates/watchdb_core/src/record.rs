//! Record log format.
//!
//! The store keeps every database in one append-only log on the backing
//! resource. Each mutation appends one record:
//!
//! ```text
//! | record_len (4) | database_id (1) | flags (1) | key_len (1) | key | value | crc32 (4) |
//! ```
//!
//! `record_len` counts the whole record including itself and the checksum.
//! The checksum (CRC32, IEEE) covers every byte before it. Replaying the log
//! from the start, last write wins and tombstones remove.

use crate::error::{CoreError, CoreResult};
use watchdb_storage::StorageBackend;

/// Flags stored with a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFlags(u8);

impl RecordFlags {
    /// A plain put.
    pub const NONE: Self = Self(0);
    /// The key was deleted.
    pub const TOMBSTONE: Self = Self(0x01);

    /// Creates flags from the raw byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        Self(b)
    }

    /// Returns the raw byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Checks the tombstone bit.
    #[must_use]
    pub const fn is_tombstone(self) -> bool {
        self.0 & 0x01 != 0
    }
}

/// One entry of the record log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Raw database id (kept raw so logs written by newer firmware replay).
    pub database: u8,
    /// Record flags.
    pub flags: RecordFlags,
    /// Record key, 1 to 255 bytes.
    pub key: Vec<u8>,
    /// Record value, empty for tombstones.
    pub value: Vec<u8>,
}

impl LogRecord {
    /// record_len (4) + database_id (1) + flags (1) + key_len (1)
    pub const HEADER_SIZE: usize = 7;
    /// Trailing checksum size.
    pub const CRC_SIZE: usize = 4;
    /// Smallest possible encoded record.
    pub const MIN_SIZE: usize = Self::HEADER_SIZE + Self::CRC_SIZE;
    /// Largest value a record can carry.
    pub const MAX_VALUE_SIZE: usize = u16::MAX as usize;
    /// Largest possible encoded record. A `record_len` above this can only
    /// come from damage, never from an interrupted append.
    pub const MAX_SIZE: usize = Self::MIN_SIZE + u8::MAX as usize + Self::MAX_VALUE_SIZE;

    /// Creates a put record.
    #[must_use]
    pub fn put(database: u8, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            database,
            flags: RecordFlags::NONE,
            key,
            value,
        }
    }

    /// Creates a tombstone record.
    #[must_use]
    pub fn tombstone(database: u8, key: Vec<u8>) -> Self {
        Self {
            database,
            flags: RecordFlags::TOMBSTONE,
            key,
            value: Vec::new(),
        }
    }

    /// Returns whether this record deletes its key.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.flags.is_tombstone()
    }

    /// Returns the encoded size.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        Self::MIN_SIZE + self.key.len() + self.value.len()
    }

    /// Encodes the record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key does not fit its one-byte length and
    /// `ValueTooLarge` above [`MAX_VALUE_SIZE`](Self::MAX_VALUE_SIZE).
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let key_len = u8::try_from(self.key.len())
            .ok()
            .filter(|len| *len > 0)
            .ok_or(CoreError::InvalidKey {
                len: self.key.len(),
            })?;
        if self.value.len() > Self::MAX_VALUE_SIZE {
            return Err(CoreError::ValueTooLarge {
                len: self.value.len(),
                max: Self::MAX_VALUE_SIZE,
            });
        }
        let record_len = u32::try_from(self.encoded_size())
            .map_err(|_| CoreError::invalid_operation("record exceeds 4 GiB"))?;

        let mut buf = Vec::with_capacity(self.encoded_size());
        buf.extend_from_slice(&record_len.to_le_bytes());
        buf.push(self.database);
        buf.push(self.flags.as_byte());
        buf.push(key_len);
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Decodes one record that starts at `data[0]`.
    ///
    /// # Errors
    ///
    /// Returns `ChecksumMismatch` if the checksum fails and `Corruption`
    /// (at offset 0) if the lengths are inconsistent.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(CoreError::corruption(0, "record too short"));
        }

        let record_len = read_len(data);
        if record_len < Self::MIN_SIZE || data.len() < record_len {
            return Err(CoreError::corruption(0, "record length out of range"));
        }

        let body = &data[..record_len - Self::CRC_SIZE];
        let expected = u32::from_le_bytes([
            data[record_len - 4],
            data[record_len - 3],
            data[record_len - 2],
            data[record_len - 1],
        ]);
        let actual = compute_crc32(body);
        if expected != actual {
            return Err(CoreError::ChecksumMismatch { expected, actual });
        }

        let key_len = usize::from(data[6]);
        let key_end = Self::HEADER_SIZE + key_len;
        if key_len == 0 || key_end > body.len() {
            return Err(CoreError::corruption(0, "key length out of range"));
        }

        Ok(Self {
            database: data[4],
            flags: RecordFlags::from_byte(data[5]),
            key: body[Self::HEADER_SIZE..key_end].to_vec(),
            value: body[key_end..].to_vec(),
        })
    }
}

fn read_len(data: &[u8]) -> usize {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize
}

/// Summary of one pass over the record log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Number of intact records visited.
    pub records: usize,
    /// Length of the intact prefix of the log.
    pub valid_len: u64,
    /// Offset where an incomplete final record begins, if any.
    pub torn_tail: Option<u64>,
}

/// Walks the record log from the start, calling `visit` for every intact
/// record in order.
///
/// An incomplete final record, or a final record whose checksum fails, is
/// reported as a torn tail rather than an error: it is what a power cut in
/// the middle of an append leaves behind.
///
/// # Errors
///
/// Returns `Corruption` or `ChecksumMismatch` for damage before the tail,
/// and any backing resource error.
pub fn scan_log<F>(backend: &dyn StorageBackend, mut visit: F) -> CoreResult<ScanOutcome>
where
    F: FnMut(u64, LogRecord),
{
    let size = backend.size()?;
    let mut outcome = ScanOutcome::default();
    let mut offset = 0u64;

    while offset < size {
        if size - offset < 4 {
            outcome.torn_tail = Some(offset);
            break;
        }

        let len_bytes = backend.read_at(offset, 4)?;
        let record_len = read_len(&len_bytes);
        if record_len < LogRecord::MIN_SIZE {
            return Err(CoreError::corruption(offset, "record length below minimum"));
        }
        if record_len > LogRecord::MAX_SIZE {
            return Err(CoreError::corruption(offset, "record length above maximum"));
        }
        let end = offset + record_len as u64;
        if end > size {
            check_torn_header(backend, offset, size, record_len)?;
            outcome.torn_tail = Some(offset);
            break;
        }

        let data = backend.read_at(offset, record_len)?;
        match LogRecord::decode(&data) {
            Ok(record) => visit(offset, record),
            Err(CoreError::ChecksumMismatch { .. }) if end == size => {
                outcome.torn_tail = Some(offset);
                break;
            }
            Err(CoreError::Corruption { message, .. }) => {
                return Err(CoreError::corruption(offset, message));
            }
            Err(err) => return Err(err),
        }

        outcome.records += 1;
        offset = end;
        outcome.valid_len = offset;
    }

    Ok(outcome)
}

/// A record running past the end of the log is only a torn append if the
/// part that did land is a plausible header.
fn check_torn_header(
    backend: &dyn StorageBackend,
    offset: u64,
    size: u64,
    record_len: usize,
) -> CoreResult<()> {
    if size - offset < LogRecord::HEADER_SIZE as u64 {
        return Ok(());
    }

    let header = backend.read_at(offset, LogRecord::HEADER_SIZE)?;
    let key_len = usize::from(header[6]);
    if key_len == 0 || LogRecord::MIN_SIZE + key_len > record_len {
        return Err(CoreError::corruption(offset, "record header inconsistent with its length"));
    }
    Ok(())
}

/// Computes the CRC32 (IEEE) checksum of `data`.
pub fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdb_storage::InMemoryBackend;

    fn log_of(records: &[LogRecord]) -> InMemoryBackend {
        let mut bytes = Vec::new();
        for record in records {
            bytes.extend(record.encode().unwrap());
        }
        InMemoryBackend::with_data(bytes)
    }

    #[test]
    fn crc32_known_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(compute_crc32(b""), 0);
    }

    #[test]
    fn put_and_tombstone_decode() {
        let put = LogRecord::put(0x04, vec![7; 16], b"payload".to_vec());
        assert_eq!(LogRecord::decode(&put.encode().unwrap()).unwrap(), put);

        let tombstone = LogRecord::tombstone(0x01, vec![9; 4]);
        let decoded = LogRecord::decode(&tombstone.encode().unwrap()).unwrap();
        assert!(decoded.is_tombstone());
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn encoded_size_matches() {
        let record = LogRecord::put(0x02, vec![1, 2, 3], vec![0; 300]);
        assert_eq!(record.encode().unwrap().len(), record.encoded_size());
    }

    #[test]
    fn empty_or_oversized_key_is_rejected() {
        assert!(matches!(
            LogRecord::put(0, Vec::new(), vec![1]).encode(),
            Err(CoreError::InvalidKey { len: 0 })
        ));
        assert!(matches!(
            LogRecord::put(0, vec![0; 256], vec![1]).encode(),
            Err(CoreError::InvalidKey { len: 256 })
        ));
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut encoded = LogRecord::put(0x04, vec![1; 16], vec![2; 8]).encode().unwrap();
        encoded[12] ^= 0xFF;
        assert!(matches!(
            LogRecord::decode(&encoded),
            Err(CoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn scan_visits_records_in_order() {
        let records = vec![
            LogRecord::put(0x04, vec![1; 16], vec![10]),
            LogRecord::put(0x01, vec![2; 16], vec![20]),
            LogRecord::tombstone(0x04, vec![1; 16]),
        ];
        let backend = log_of(&records);

        let mut seen = Vec::new();
        let outcome = scan_log(&backend, |_, record| seen.push(record)).unwrap();

        assert_eq!(seen, records);
        assert_eq!(outcome.records, 3);
        assert_eq!(outcome.valid_len, backend.data().len() as u64);
        assert_eq!(outcome.torn_tail, None);
    }

    #[test]
    fn scan_reports_incomplete_tail() {
        let first = LogRecord::put(0x04, vec![1; 16], vec![1; 4]);
        let mut bytes = first.encode().unwrap();
        let intact = bytes.len() as u64;
        let second = LogRecord::put(0x04, vec![2; 16], vec![2; 40]).encode().unwrap();
        bytes.extend_from_slice(&second[..20]);

        let outcome = scan_log(&InMemoryBackend::with_data(bytes), |_, _| {}).unwrap();
        assert_eq!(outcome.records, 1);
        assert_eq!(outcome.valid_len, intact);
        assert_eq!(outcome.torn_tail, Some(intact));
    }

    #[test]
    fn oversized_length_is_corruption_not_a_torn_tail() {
        let records = vec![
            LogRecord::put(0x01, vec![1; 4], vec![1]),
            LogRecord::put(0x01, vec![2; 4], vec![2]),
        ];
        let mut bytes = log_of(&records).data();
        bytes[3] = 0x7F;

        let mut seen = 0;
        let result = scan_log(&InMemoryBackend::with_data(bytes), |_, _| seen += 1);
        assert!(matches!(result, Err(CoreError::Corruption { offset: 0, .. })));
        assert_eq!(seen, 0);
    }

    #[test]
    fn implausible_header_past_the_end_is_corruption() {
        let mut bytes = log_of(&[LogRecord::put(0x01, vec![1; 4], vec![1; 8])]).data();
        // Length grows past the end but stays under the maximum.
        bytes[1] = 0x01;
        bytes[6] = 0;

        let result = scan_log(&InMemoryBackend::with_data(bytes), |_, _| {});
        assert!(matches!(result, Err(CoreError::Corruption { offset: 0, .. })));
    }

    #[test]
    fn oversized_value_is_rejected() {
        let record = LogRecord::put(0x01, vec![1], vec![0; LogRecord::MAX_VALUE_SIZE + 1]);
        assert!(matches!(record.encode(), Err(CoreError::ValueTooLarge { .. })));
        let largest = LogRecord::put(0x01, vec![1; 255], vec![0; LogRecord::MAX_VALUE_SIZE]);
        assert_eq!(largest.encode().unwrap().len(), LogRecord::MAX_SIZE);
    }

    #[test]
    fn scan_rejects_damage_before_the_tail() {
        let mut bytes = LogRecord::put(0x04, vec![1; 16], vec![1; 4]).encode().unwrap();
        bytes[10] ^= 0xFF;
        bytes.extend(LogRecord::put(0x04, vec![2; 16], vec![2]).encode().unwrap());

        let result = scan_log(&InMemoryBackend::with_data(bytes), |_, _| {});
        assert!(matches!(result, Err(CoreError::ChecksumMismatch { .. })));
    }
}
