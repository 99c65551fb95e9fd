//! Subscriber side of a mount
//!
//! A `Subscription` owns the receiving half of one bounded sink. The
//! mount holds only the sender; the back-pointer here is weak so a
//! removed mount cannot be kept alive by lingering subscribers.

use std::sync::Weak;

use bytes::Bytes;
use tokio::sync::mpsc;

use super::entry::Mount;

/// An open byte stream from one online mount
///
/// Yields published chunks in publisher order until either side closes.
/// Dropping the subscription deregisters its sink from the mount.
pub struct Subscription {
    id: u64,
    mount: Weak<Mount>,
    mount_name: String,
    rx: mpsc::Receiver<Bytes>,
}

impl Subscription {
    pub(super) fn new(
        id: u64,
        mount: Weak<Mount>,
        mount_name: String,
        rx: mpsc::Receiver<Bytes>,
    ) -> Self {
        Self {
            id,
            mount,
            mount_name,
            rx,
        }
    }

    /// Name of the subscribed mount
    pub fn mount_name(&self) -> &str {
        &self.mount_name
    }

    /// Receive the next chunk
    ///
    /// Returns `None` once the publisher has detached (or the mount was
    /// removed) and all buffered chunks have been drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(mount) = self.mount.upgrade() {
            mount.deregister_subscriber(self.id);
            tracing::debug!(
                mount = %self.mount_name,
                subscriber_id = self.id,
                "Subscriber removed"
            );
        }
    }
}
