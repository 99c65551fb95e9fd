//! The mount pump
//!
//! A `Publisher` is the exclusive writer for one online mount. Its pump
//! loop reads chunks from the publisher source and fans them out to every
//! subscriber sink without ever blocking on one: a sink that is full or
//! closed is evicted on the spot.
//!
//! Detach is synchronous and happens before `run` returns (and again,
//! idempotently, on drop), so the mount name reads as free exactly when
//! the pump has fully cleared. A competing publish therefore sees either
//! `MountInUse` or a clean mount, never a half-dead pump.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::config::RegistryConfig;
use super::entry::Mount;

/// Why a pump loop exited
#[derive(Debug)]
pub enum PumpExit {
    /// Publisher source reached end of stream
    SourceClosed,
    /// I/O error reading from the publisher source
    SourceError(std::io::Error),
    /// No data within the configured read timeout
    IdleTimeout,
    /// Cancelled by mount removal or server shutdown
    Cancelled,
}

impl std::fmt::Display for PumpExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PumpExit::SourceClosed => write!(f, "source closed connection"),
            PumpExit::SourceError(err) => write!(f, "source read error: {err}"),
            PumpExit::IdleTimeout => write!(f, "timeout reading from source"),
            PumpExit::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Exclusive writer into an online mount
///
/// Returned by [`MountRegistry::open_publisher`]; holding it keeps the
/// mount online. Dropping it (or letting [`run`] return) takes the mount
/// offline and closes every subscriber sink exactly once.
///
/// [`MountRegistry::open_publisher`]: super::MountRegistry::open_publisher
/// [`run`]: Publisher::run
pub struct Publisher {
    mount: Arc<Mount>,
    publisher_id: u64,
    cancel: CancellationToken,
    chunk_size: usize,
    read_timeout: Duration,
}

impl Publisher {
    pub(super) fn new(
        mount: Arc<Mount>,
        publisher_id: u64,
        cancel: CancellationToken,
        config: &RegistryConfig,
    ) -> Self {
        Self {
            mount,
            publisher_id,
            cancel,
            chunk_size: config.chunk_size,
            read_timeout: config.read_timeout,
        }
    }

    /// Name of the mount this publisher feeds
    pub fn mount_name(&self) -> &str {
        self.mount.name()
    }

    /// Drive the pump until the source ends, errors, stalls past the read
    /// timeout, or the mount is cancelled
    ///
    /// The unit of fan-out is whatever a single read returns (up to the
    /// configured chunk size); chunk boundaries are not preserved.
    pub async fn run<R>(self, mut source: R) -> PumpExit
    where
        R: AsyncRead + Unpin,
    {
        let exit = loop {
            let mut chunk = BytesMut::with_capacity(self.chunk_size);

            let read = tokio::select! {
                _ = self.cancel.cancelled() => break PumpExit::Cancelled,
                read = timeout(self.read_timeout, source.read_buf(&mut chunk)) => read,
            };

            match read {
                Err(_) => break PumpExit::IdleTimeout,
                Ok(Ok(0)) => break PumpExit::SourceClosed,
                Ok(Ok(_)) => self.send(chunk.freeze()),
                Ok(Err(err)) => break PumpExit::SourceError(err),
            }
        };

        tracing::info!(
            mount = %self.mount.name(),
            publisher_id = self.publisher_id,
            reason = %exit,
            "Pump stopped"
        );

        self.detach();
        exit
    }

    /// Fan one chunk out to the current subscriber set
    ///
    /// Non-blocking per sink: a full sink means the subscriber cannot keep
    /// up and it is evicted along with closed ones. The chunk is shared by
    /// reference count, not copied per subscriber.
    pub fn send(&self, data: Bytes) {
        let mut state = self.mount.state.lock().expect("mount lock poisoned");
        let Some(online) = state.online.as_mut() else {
            return;
        };

        online.last_active = Instant::now();
        online.bytes_received += data.len() as u64;

        let mount = self.mount.name();
        online.subscribers.retain(|sub| match sub.tx.try_send(data.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    mount = %mount,
                    subscriber_id = sub.id,
                    "Evicting slow subscriber"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(
                    mount = %mount,
                    subscriber_id = sub.id,
                    "Dropping closed subscriber"
                );
                false
            }
        });
    }

    /// Take the mount offline if this publisher still owns it
    fn detach(&self) {
        let mut state = self.mount.state.lock().expect("mount lock poisoned");
        let owned = state
            .online
            .as_ref()
            .is_some_and(|online| online.publisher_id == self.publisher_id);

        if owned {
            // Dropping OnlineState drops every sink sender; subscribers
            // observe end-of-stream
            state.online = None;
            tracing::info!(
                mount = %self.mount.name(),
                publisher_id = self.publisher_id,
                "Mount offline"
            );
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.detach();
    }
}
