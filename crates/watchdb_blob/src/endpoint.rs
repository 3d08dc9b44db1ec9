//! Async frame loop.
//!
//! The transport hands frames to a [`BlobEndpoint`] over a tokio channel
//! and reads encoded responses from another. Frames are handled one at a
//! time, in arrival order; store work runs on the blocking pool so the
//! loop never stalls the runtime.

use crate::dispatcher::BlobDispatcher;
use crate::error::{BlobError, BlobResult};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Frame counts for one endpoint run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndpointStats {
    /// Frames received.
    pub frames: u64,
    /// Responses sent.
    pub responses: u64,
    /// Frames dropped without a response.
    pub dropped: u64,
}

/// Serves Blob frames from a channel.
#[derive(Debug, Clone)]
pub struct BlobEndpoint {
    dispatcher: Arc<BlobDispatcher>,
}

impl BlobEndpoint {
    /// Creates an endpoint over a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<BlobDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serves `inbound` until it closes, sending one encoded response per
    /// well-formed frame on `outbound`.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if `outbound` is dropped while frames are
    /// still arriving, and `Task` if a dispatch panics.
    pub async fn run(
        &self,
        mut inbound: mpsc::Receiver<Bytes>,
        outbound: mpsc::Sender<Bytes>,
    ) -> BlobResult<EndpointStats> {
        let mut stats = EndpointStats::default();
        info!("blob endpoint started");

        while let Some(frame) = inbound.recv().await {
            stats.frames += 1;
            let dispatcher = Arc::clone(&self.dispatcher);
            let response = tokio::task::spawn_blocking(move || dispatcher.handle_bytes(frame)).await?;

            let Some(response) = response else {
                stats.dropped += 1;
                continue;
            };
            outbound
                .send(response.encode())
                .await
                .map_err(|_| BlobError::ChannelClosed)?;
            stats.responses += 1;
        }

        info!(
            frames = stats.frames,
            responses = stats.responses,
            dropped = stats.dropped,
            "blob endpoint stopped"
        );
        Ok(stats)
    }

    /// Spawns the loop on the current runtime with channels sized by the
    /// dispatcher's `endpoint_buffer`.
    #[must_use]
    pub fn spawn(self) -> EndpointHandle {
        let capacity = self.dispatcher.config().endpoint_buffer.max(1);
        let (frames, inbound) = mpsc::channel(capacity);
        let (outbound, responses) = mpsc::channel(capacity);
        let task = tokio::spawn(async move { self.run(inbound, outbound).await });

        EndpointHandle {
            frames,
            responses,
            task,
        }
    }
}

/// The transport side of a spawned endpoint.
#[derive(Debug)]
pub struct EndpointHandle {
    frames: mpsc::Sender<Bytes>,
    responses: mpsc::Receiver<Bytes>,
    task: JoinHandle<BlobResult<EndpointStats>>,
}

impl EndpointHandle {
    /// Returns a sender for frames, for transports that feed from several
    /// tasks.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<Bytes> {
        self.frames.clone()
    }

    /// Queues one frame.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the loop has stopped.
    pub async fn send(&self, frame: Bytes) -> BlobResult<()> {
        self.frames
            .send(frame)
            .await
            .map_err(|_| BlobError::ChannelClosed)
    }

    /// Waits for the next encoded response.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.responses.recv().await
    }

    /// Stops accepting frames, discards unread responses and waits for the
    /// loop to finish.
    ///
    /// # Errors
    ///
    /// Returns the loop's error, if it failed.
    pub async fn shutdown(self) -> BlobResult<EndpointStats> {
        let Self {
            frames,
            mut responses,
            task,
        } = self;
        drop(frames);
        while responses.recv().await.is_some() {}
        task.await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdb_core::{DatabaseId, EffectRouter, RecordStore, StoreConfig};
    use watchdb_protocol::{BlobCommand, BlobResponse, StatusCode};

    fn endpoint() -> (BlobEndpoint, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::open_in_memory(StoreConfig::default()).unwrap());
        let dispatcher = BlobDispatcher::new(Arc::clone(&store), Arc::new(EffectRouter::new()));
        (BlobEndpoint::new(Arc::new(dispatcher)), store)
    }

    fn insert(token: u16, key: &[u8]) -> Bytes {
        BlobCommand::Insert {
            token,
            database: 0x03,
            key: Bytes::copy_from_slice(key),
            value: Bytes::from_static(b"remind me"),
        }
        .encode()
        .unwrap()
    }

    #[tokio::test]
    async fn responses_follow_arrival_order() {
        let (endpoint, store) = endpoint();
        let mut handle = endpoint.spawn();

        for token in 1..=5u16 {
            handle.send(insert(token, &token.to_le_bytes())).await.unwrap();
        }
        for token in 1..=5u16 {
            let response = BlobResponse::decode(&handle.recv().await.unwrap()).unwrap();
            assert_eq!(response, BlobResponse::new(token, StatusCode::Success));
        }

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.responses, 5);
        assert_eq!(store.record_count(DatabaseId::Reminder).unwrap(), 5);
    }

    #[tokio::test]
    async fn malformed_frames_get_no_response() {
        let (endpoint, _store) = endpoint();
        let (frames, inbound) = mpsc::channel(4);
        let (outbound, mut responses) = mpsc::channel(4);

        frames.send(Bytes::from_static(&[0x01, 0x07])).await.unwrap();
        frames.send(insert(9, b"key")).await.unwrap();
        drop(frames);

        let stats = endpoint.run(inbound, outbound).await.unwrap();
        assert_eq!(stats, EndpointStats { frames: 2, responses: 1, dropped: 1 });

        let only = BlobResponse::decode(&responses.recv().await.unwrap()).unwrap();
        assert_eq!(only.token, 9);
        assert!(responses.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_response_channel_stops_the_loop() {
        let (endpoint, _store) = endpoint();
        let (frames, inbound) = mpsc::channel(4);
        let (outbound, responses) = mpsc::channel(4);
        drop(responses);

        frames.send(insert(1, b"key")).await.unwrap();
        drop(frames);

        assert!(matches!(
            endpoint.run(inbound, outbound).await,
            Err(BlobError::ChannelClosed)
        ));
    }
}
