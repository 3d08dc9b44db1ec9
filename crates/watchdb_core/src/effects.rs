//! Per-database side effects of remote writes.
//!
//! When the Blob dispatcher changes a record it reports a [`RecordChanged`]
//! event to the [`EffectRouter`]. The router keeps a table of handlers per
//! database, so a new database reaction is one [`register`] call:
//!
//! ```rust
//! use std::sync::Arc;
//! use watchdb_core::{ChangeKind, DatabaseId, EffectRouter, RecordChanged};
//! use watchdb_core::effects::ChannelHandler;
//!
//! let router = EffectRouter::new();
//! let (handler, arrivals) = ChannelHandler::new();
//! router.register(DatabaseId::Notification, Arc::new(handler));
//!
//! router.on_write(DatabaseId::Notification, &[7; 16], ChangeKind::Written);
//! assert_eq!(arrivals.recv().unwrap().key, vec![7; 16]);
//! ```
//!
//! Handlers run on the dispatching thread and must not block. Heavy work is
//! handed off, as [`ChannelHandler`] does.
//!
//! [`register`]: EffectRouter::register

use crate::types::DatabaseId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::trace;

/// How a record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Inserted or overwritten.
    Written,
    /// Removed.
    Deleted,
}

/// One record change, reported after the store accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChanged {
    /// The database that changed.
    pub database: DatabaseId,
    /// Key of the changed record.
    pub key: Vec<u8>,
    /// What happened to it.
    pub kind: ChangeKind,
}

impl RecordChanged {
    /// Creates a write event.
    #[must_use]
    pub fn written(database: DatabaseId, key: impl Into<Vec<u8>>) -> Self {
        Self {
            database,
            key: key.into(),
            kind: ChangeKind::Written,
        }
    }

    /// Creates a delete event.
    #[must_use]
    pub fn deleted(database: DatabaseId, key: impl Into<Vec<u8>>) -> Self {
        Self {
            database,
            key: key.into(),
            kind: ChangeKind::Deleted,
        }
    }
}

/// Reaction to record changes in one database.
pub trait WriteHandler: Send + Sync {
    /// Called once per change, in the order changes were applied.
    fn on_record_changed(&self, event: &RecordChanged);
}

impl<F> WriteHandler for F
where
    F: Fn(&RecordChanged) + Send + Sync,
{
    fn on_record_changed(&self, event: &RecordChanged) {
        self(event);
    }
}

/// Table of write handlers keyed by database.
#[derive(Default)]
pub struct EffectRouter {
    handlers: RwLock<HashMap<DatabaseId, Vec<Arc<dyn WriteHandler>>>>,
}

impl EffectRouter {
    /// Creates a router with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for `database`. Handlers of one database run in
    /// registration order.
    pub fn register(&self, database: DatabaseId, handler: Arc<dyn WriteHandler>) {
        self.handlers.write().entry(database).or_default().push(handler);
    }

    /// Returns the number of handlers registered for `database`.
    #[must_use]
    pub fn handler_count(&self, database: DatabaseId) -> usize {
        self.handlers.read().get(&database).map_or(0, Vec::len)
    }

    /// Delivers `events` in order to the handlers of their databases.
    /// Events for databases without handlers are dropped.
    pub fn dispatch<I>(&self, events: I)
    where
        I: IntoIterator<Item = RecordChanged>,
    {
        let handlers = self.handlers.read();
        for event in events {
            let Some(targets) = handlers.get(&event.database) else {
                trace!(database = %event.database, "no side effects registered");
                continue;
            };
            for handler in targets {
                handler.on_record_changed(&event);
            }
        }
    }

    /// Delivers a single change.
    pub fn on_write(&self, database: DatabaseId, key: &[u8], kind: ChangeKind) {
        self.dispatch([RecordChanged {
            database,
            key: key.to_vec(),
            kind,
        }]);
    }
}

impl std::fmt::Debug for EffectRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let mut counts: Vec<_> = handlers.iter().map(|(db, h)| (*db, h.len())).collect();
        counts.sort_unstable();
        f.debug_struct("EffectRouter")
            .field("handlers", &counts)
            .finish()
    }
}

/// Forwards every event over a channel.
///
/// Sending never blocks. Once the receiver is dropped, events are discarded.
#[derive(Debug)]
pub struct ChannelHandler {
    sender: parking_lot::Mutex<Sender<RecordChanged>>,
}

impl ChannelHandler {
    /// Creates a handler and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, Receiver<RecordChanged>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                sender: parking_lot::Mutex::new(tx),
            },
            rx,
        )
    }
}

impl WriteHandler for ChannelHandler {
    fn on_record_changed(&self, event: &RecordChanged) {
        if self.sender.lock().send(event.clone()).is_err() {
            trace!(database = %event.database, "change receiver gone, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn handlers_see_only_their_database() {
        let router = EffectRouter::new();
        let (handler, rx) = ChannelHandler::new();
        router.register(DatabaseId::Notification, Arc::new(handler));

        router.on_write(DatabaseId::Pin, b"pin", ChangeKind::Written);
        router.on_write(DatabaseId::Notification, b"n1", ChangeKind::Written);

        assert_eq!(rx.try_recv().unwrap(), RecordChanged::written(DatabaseId::Notification, *b"n1"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dispatch_preserves_order_across_handlers() {
        let router = EffectRouter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            router.register(
                DatabaseId::Reminder,
                Arc::new(move |event: &RecordChanged| {
                    seen.lock().push((tag, event.key.clone(), event.kind));
                }),
            );
        }

        router.dispatch([
            RecordChanged::written(DatabaseId::Reminder, *b"a"),
            RecordChanged::deleted(DatabaseId::Reminder, *b"b"),
        ]);

        assert_eq!(
            *seen.lock(),
            vec![
                ("first", b"a".to_vec(), ChangeKind::Written),
                ("second", b"a".to_vec(), ChangeKind::Written),
                ("first", b"b".to_vec(), ChangeKind::Deleted),
                ("second", b"b".to_vec(), ChangeKind::Deleted),
            ]
        );
        assert_eq!(router.handler_count(DatabaseId::Reminder), 2);
        assert_eq!(router.handler_count(DatabaseId::Pin), 0);
    }

    #[test]
    fn dropped_receiver_does_not_fail_dispatch() {
        let router = EffectRouter::new();
        let (handler, rx) = ChannelHandler::new();
        router.register(DatabaseId::App, Arc::new(handler));
        drop(rx);

        router.on_write(DatabaseId::App, b"app", ChangeKind::Deleted);
    }
}
