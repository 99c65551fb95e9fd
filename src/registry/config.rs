//! Registry configuration

use std::time::Duration;

/// Configuration for mount pumps and subscriber sinks
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum bytes read from a publisher in one pump iteration
    pub chunk_size: usize,

    /// Subscriber sink capacity in chunks; a sink that fills up is evicted
    pub subscriber_capacity: usize,

    /// Maximum silence from a publisher before its mount goes offline
    pub read_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4096,
            subscriber_capacity: 32,
            read_timeout: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    /// Set the pump chunk size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Set the subscriber sink capacity in chunks
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.max(1);
        self
    }

    /// Set the publisher read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
