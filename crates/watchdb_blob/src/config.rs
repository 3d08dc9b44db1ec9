//! Dispatcher configuration.

/// Configuration for the Blob dispatcher and endpoint.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Capacity of the channels created by [`BlobEndpoint::channels`].
    ///
    /// [`BlobEndpoint::channels`]: crate::BlobEndpoint::channels
    pub endpoint_buffer: usize,

    /// Whether to hex-dump every frame at `trace` level.
    pub log_frames: bool,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            endpoint_buffer: 32,
            log_frames: false,
        }
    }
}

impl BlobConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint channel capacity. Zero is raised to one.
    #[must_use]
    pub const fn endpoint_buffer(mut self, capacity: usize) -> Self {
        self.endpoint_buffer = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Sets whether to hex-dump frames.
    #[must_use]
    pub const fn log_frames(mut self, value: bool) -> Self {
        self.log_frames = value;
        self
    }
}
