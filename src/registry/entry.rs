//! Per-mount state
//!
//! A `Mount` exists for every `STR` record in the configured sourcetable,
//! online or not. `OnlineState` exists iff a publisher is attached; it
//! owns the subscriber sinks, so dropping it closes every subscriber
//! exactly once.

use std::sync::Mutex;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::sourcetable::StreamEntry;

/// A configured mountpoint, keyed uniquely by name in the registry
pub(crate) struct Mount {
    pub(super) name: String,
    /// Never held across an await; lock order is registry map, then mount
    pub(super) state: Mutex<MountState>,
}

pub(super) struct MountState {
    /// Advertised metadata, updated in place on sourcetable reconciliation
    pub(super) config: StreamEntry,
    pub(super) online: Option<OnlineState>,
}

/// Runtime state of a mount with an attached publisher
pub(super) struct OnlineState {
    /// Identity of the attached publisher; detach only clears state when
    /// the ids match
    pub(super) publisher_id: u64,
    /// Trigger that forces the publisher pump to exit
    pub(super) cancel: CancellationToken,
    pub(super) subscribers: Vec<SubscriberHandle>,
    pub(super) last_active: Instant,
    pub(super) bytes_received: u64,
}

/// Registry-side end of one subscriber sink
pub(super) struct SubscriberHandle {
    pub(super) id: u64,
    pub(super) tx: mpsc::Sender<Bytes>,
}

impl Mount {
    pub(super) fn new(config: StreamEntry) -> Self {
        let name = config.name.clone();
        Self {
            name,
            state: Mutex::new(MountState {
                config,
                online: None,
            }),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Remove one subscriber sink by identity token
    ///
    /// Called from `Subscription` teardown; a no-op if the mount has gone
    /// offline (the sink was already closed with the online state).
    pub(super) fn deregister_subscriber(&self, id: u64) {
        let mut state = self.state.lock().expect("mount lock poisoned");
        if let Some(online) = state.online.as_mut() {
            online.subscribers.retain(|sub| sub.id != id);
        }
    }

    pub(super) fn stats(&self) -> MountStats {
        let state = self.state.lock().expect("mount lock poisoned");
        match &state.online {
            Some(online) => MountStats {
                online: true,
                subscribers: online.subscribers.len(),
                last_active: Some(online.last_active),
                bytes_received: online.bytes_received,
            },
            None => MountStats {
                online: false,
                subscribers: 0,
                last_active: None,
                bytes_received: 0,
            },
        }
    }
}

/// Point-in-time statistics for a mount
#[derive(Debug, Clone)]
pub struct MountStats {
    /// Whether a publisher is attached
    pub online: bool,
    /// Number of active subscriber sinks
    pub subscribers: usize,
    /// Time of the most recent successful publish
    pub last_active: Option<Instant>,
    /// Bytes fanned out since the publisher attached
    pub bytes_received: u64,
}
