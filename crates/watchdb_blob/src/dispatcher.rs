//! Frame dispatch.
//!
//! [`BlobDispatcher`] turns one inbound frame into one store mutation and
//! one response carrying the frame's token. It is `Sync`; transports may
//! call it from several threads at once.

use crate::config::BlobConfig;
use crate::error::BlobResult;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use watchdb_core::{CoreError, DatabaseId, EffectRouter, RecordChanged, RecordStore};
use watchdb_protocol::{BlobCommand, BlobResponse, StatusCode};

/// Maps a store error to the status reported to the host.
#[must_use]
pub fn status_for(err: &CoreError) -> StatusCode {
    match err {
        CoreError::DatabaseNotFound { .. } => StatusCode::InvalidDatabaseId,
        CoreError::InvalidKey { .. }
        | CoreError::ValueTooLarge { .. }
        | CoreError::InvalidRecord { .. } => StatusCode::InvalidData,
        CoreError::DatabaseFull { .. } => StatusCode::DatabaseFull,
        CoreError::InvalidOperation { .. } => StatusCode::InvalidOperation,
        CoreError::Storage(_)
        | CoreError::Io(_)
        | CoreError::Corruption { .. }
        | CoreError::ChecksumMismatch { .. }
        | CoreError::StoreLocked
        | CoreError::StoreClosed => StatusCode::GeneralFailure,
    }
}

#[derive(Debug, Default)]
struct Counters {
    frames: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

/// Frame counts since the dispatcher was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    /// Frames received.
    pub frames: u64,
    /// Malformed frames dropped without a response.
    pub dropped: u64,
    /// Commands answered with a status other than success.
    pub failed: u64,
}

/// Applies Blob commands to a record store.
#[derive(Debug)]
pub struct BlobDispatcher {
    store: Arc<RecordStore>,
    router: Arc<EffectRouter>,
    config: BlobConfig,
    counters: Counters,
}

impl BlobDispatcher {
    /// Creates a dispatcher with the default configuration.
    #[must_use]
    pub fn new(store: Arc<RecordStore>, router: Arc<EffectRouter>) -> Self {
        Self::with_config(store, router, BlobConfig::default())
    }

    /// Creates a dispatcher.
    #[must_use]
    pub fn with_config(store: Arc<RecordStore>, router: Arc<EffectRouter>, config: BlobConfig) -> Self {
        Self {
            store,
            router,
            config,
            counters: Counters::default(),
        }
    }

    /// The store commands are applied to.
    #[must_use]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// The router side effects are sent to.
    #[must_use]
    pub fn router(&self) -> &Arc<EffectRouter> {
        &self.router
    }

    /// The dispatcher configuration.
    #[must_use]
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    /// Handles one frame. Returns `None` for frames too short for their
    /// declared fields; those are logged and dropped.
    pub fn handle_frame(&self, frame: &[u8]) -> Option<BlobResponse> {
        self.handle_bytes(Bytes::copy_from_slice(frame))
    }

    /// Handles one frame without copying it.
    pub fn handle_bytes(&self, frame: Bytes) -> Option<BlobResponse> {
        let len = frame.len();
        match self.try_handle(frame) {
            Ok(response) => Some(response),
            Err(err) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, len, "dropping malformed blob frame");
                None
            }
        }
    }

    /// Handles one frame, returning decode failures to the caller.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the frame is truncated. Store failures
    /// are not errors; they become the response status.
    pub fn try_handle(&self, frame: Bytes) -> BlobResult<BlobResponse> {
        self.counters.frames.fetch_add(1, Ordering::Relaxed);
        if self.config.log_frames {
            trace!(frame = %hex::encode(&frame), "blob frame");
        }

        let (command, trailing) = BlobCommand::decode_bytes(frame)?;
        if trailing > 0 {
            debug!(token = command.token(), trailing, "ignoring bytes after blob command");
        }
        Ok(self.execute(command))
    }

    /// Applies a decoded command and reports its side effects once the
    /// command is done.
    pub fn execute(&self, command: BlobCommand) -> BlobResponse {
        let token = command.token();
        let mut effects = Vec::new();

        let status = match self.apply(&command, &mut effects) {
            Ok(status) => status,
            Err(err) => {
                let status = status_for(&err);
                if status == StatusCode::GeneralFailure {
                    warn!(token, error = %err, "blob command failed");
                } else {
                    debug!(token, error = %err, "blob command rejected");
                }
                status
            }
        };

        if !status.is_success() {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.router.dispatch(effects);

        debug!(
            token,
            command = command.command_id(),
            database = command.database(),
            %status,
            "blob command handled"
        );
        BlobResponse::new(token, status)
    }

    /// Returns frame counts.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            frames: self.counters.frames.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    fn apply(
        &self,
        command: &BlobCommand,
        effects: &mut Vec<RecordChanged>,
    ) -> Result<StatusCode, CoreError> {
        match command {
            BlobCommand::Insert {
                database,
                key,
                value,
                ..
            } => {
                let database = DatabaseId::try_from(*database)?;
                self.store.insert(database, key, value)?;
                effects.push(RecordChanged::written(database, key.to_vec()));
                Ok(StatusCode::Success)
            }
            BlobCommand::Delete { database, key, .. } => {
                let database = DatabaseId::try_from(*database)?;
                if self.store.delete(database, key)? {
                    effects.push(RecordChanged::deleted(database, key.to_vec()));
                }
                Ok(StatusCode::Success)
            }
            BlobCommand::Unknown { command, .. } => {
                debug!(command, "unsupported blob command");
                Ok(StatusCode::InvalidOperation)
            }
        }
    }
}
