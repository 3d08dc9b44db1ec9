//! Query results.
//!
//! [`select`] runs a selector chain over a database and collects one
//! [`SelectResult`] per matching record. Columns come in two kinds:
//!
//! - [`Column::Field`] borrows a span of the stored value. It cannot outlive
//!   the [`DatabaseHandle`](crate::DatabaseHandle) it was read through.
//! - [`Column::Record`] is an owned [`LoadedRecord`]. It survives the handle
//!   once moved out with [`SelectResultList::into_loaded`].

use crate::error::CoreError;
use crate::selector::{evaluate, Projection, Selector, SelectorChain};
use crate::store::{DatabaseHandle, Record, RecordIter};
use crate::types::DatabaseId;
use tracing::trace;

/// An owned copy of one record.
///
/// Not `Clone`: each copy has exactly one owner, which releases it by
/// dropping it.
#[derive(Debug, PartialEq, Eq)]
pub struct LoadedRecord {
    database: DatabaseId,
    key: Vec<u8>,
    value: Vec<u8>,
}

impl LoadedRecord {
    /// Creates a loaded record from its parts.
    #[must_use]
    pub fn new(database: DatabaseId, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            database,
            key,
            value,
        }
    }

    /// The database the record came from.
    #[must_use]
    pub fn database(&self) -> DatabaseId {
        self.database
    }

    /// The record key.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The record value.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Splits the record into key and value.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.key, self.value)
    }
}

impl From<Record<'_>> for LoadedRecord {
    fn from(record: Record<'_>) -> Self {
        Self::new(record.database(), record.key().to_vec(), record.value().to_vec())
    }
}

/// One output column of a matching record.
#[derive(Debug, PartialEq, Eq)]
pub enum Column<'h> {
    /// A projected span, aliasing the store.
    Field(&'h [u8]),
    /// A full owned copy of the record.
    Record(LoadedRecord),
}

/// The columns produced by one matching record, in chain order.
#[derive(Debug, PartialEq, Eq)]
pub struct SelectResult<'h> {
    columns: Vec<Column<'h>>,
}

impl<'h> SelectResult<'h> {
    /// All columns.
    #[must_use]
    pub fn columns(&self) -> &[Column<'h>] {
        &self.columns
    }

    /// The projected span at column `index`, if that column is a span.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&'h [u8]> {
        match self.columns.get(index)? {
            Column::Field(bytes) => Some(*bytes),
            Column::Record(_) => None,
        }
    }

    /// The first full copy among the columns.
    #[must_use]
    pub fn record(&self) -> Option<&LoadedRecord> {
        self.columns.iter().find_map(|c| match c {
            Column::Record(record) => Some(record),
            Column::Field(_) => None,
        })
    }

    /// Moves the first full copy out of the result.
    #[must_use]
    pub fn into_record(self) -> Option<LoadedRecord> {
        self.columns.into_iter().find_map(|c| match c {
            Column::Record(record) => Some(record),
            Column::Field(_) => None,
        })
    }
}

/// The results of one query, in store iteration order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SelectResultList<'h> {
    results: Vec<SelectResult<'h>>,
}

impl<'h> SelectResultList<'h> {
    /// Number of results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if nothing matched (or the list was released).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The result at `row`.
    #[must_use]
    pub fn get(&self, row: usize) -> Option<&SelectResult<'h>> {
        self.results.get(row)
    }

    /// Iterates over the results.
    pub fn iter(&self) -> std::slice::Iter<'_, SelectResult<'h>> {
        self.results.iter()
    }

    /// Drops every result and the owned copies they hold. Calling it again
    /// does nothing.
    pub fn release(&mut self) {
        self.results.clear();
        self.results.shrink_to_fit();
    }

    /// Moves every owned copy out, dropping borrowed spans. The returned
    /// records do not borrow the handle.
    #[must_use]
    pub fn into_loaded(self) -> Vec<LoadedRecord> {
        self.results
            .into_iter()
            .flat_map(|r| r.columns)
            .filter_map(|c| match c {
                Column::Record(record) => Some(record),
                Column::Field(_) => None,
            })
            .collect()
    }
}

impl<'h> IntoIterator for SelectResultList<'h> {
    type Item = SelectResult<'h>;
    type IntoIter = std::vec::IntoIter<SelectResult<'h>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, 'h> IntoIterator for &'a SelectResultList<'h> {
    type Item = &'a SelectResult<'h>;
    type IntoIter = std::slice::Iter<'a, SelectResult<'h>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Runs `chain` over every record `records` yields.
///
/// Returns the number of matching records together with their results; the
/// two always agree. Filters that do not fit a record's value reject it.
#[must_use]
pub fn select<'h>(records: RecordIter<'h>, chain: &SelectorChain) -> (usize, SelectResultList<'h>) {
    let database = records.database();
    let mut scanned = 0usize;
    let mut results = Vec::new();

    for record in records {
        scanned += 1;
        let outcome = evaluate(record.value(), chain);
        if !outcome.matches {
            continue;
        }

        let value = record.value();
        let columns = outcome
            .projections
            .into_iter()
            .map(|projection| match projection {
                Projection::Span(span) => Column::Field(&value[span]),
                Projection::Full => Column::Record(LoadedRecord::from(record)),
            })
            .collect();
        results.push(SelectResult { columns });
    }

    trace!(%database, scanned, matched = results.len(), "select finished");
    (results.len(), SelectResultList { results })
}

/// Outcome of a single-record lookup.
#[derive(Debug)]
pub enum Lookup<T> {
    /// The record was found.
    Found(T),
    /// No record matched.
    NotFound,
    /// The store could not be read.
    IoError(CoreError),
}

impl<T> Lookup<T> {
    /// Converts into an `Option`, discarding the error.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::IoError(_) => None,
        }
    }

    /// Returns true for `Found`.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Maps the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::IoError(err) => Lookup::IoError(err),
        }
    }
}

/// Loads the first record `chain` matches as an owned copy.
///
/// A full projection is appended to `chain` if it has none.
pub fn find_one(handle: &DatabaseHandle<'_>, chain: &SelectorChain) -> Lookup<LoadedRecord> {
    let mut chain = chain.clone();
    if !chain.loads_fully() {
        chain.push(Selector::ProjectFull);
    }

    let (count, results) = match handle.select(&chain) {
        Ok(selected) => selected,
        Err(err) => return Lookup::IoError(err),
    };
    if count > 1 {
        trace!(database = %handle.id(), count, "lookup matched several records, using first");
    }

    results
        .into_iter()
        .next()
        .and_then(SelectResult::into_record)
        .map_or(Lookup::NotFound, Lookup::Found)
}
