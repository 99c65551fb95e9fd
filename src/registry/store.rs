//! Mount registry implementation
//!
//! The central registry that maps mount names to their runtime state and
//! hands out the publisher/subscriber ends of each mount.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::sourcetable::{CasterEntry, NetworkEntry, Sourcetable};

use super::config::RegistryConfig;
use super::entry::{Mount, MountStats, OnlineState, SubscriberHandle};
use super::error::RegistryError;
use super::publisher::Publisher;
use super::subscription::Subscription;

/// Process-wide mapping of mount name to mount state
///
/// The map is guarded by an `RwLock` (read-mostly); each mount's online
/// state sits behind its own lock, which is never held while a pump is
/// reading. The registry is an owned value threaded through request
/// handlers, so tests can run several casters in one process.
pub struct MountRegistry {
    inner: RwLock<Inner>,
    config: RegistryConfig,
    next_id: AtomicU64,
}

struct Inner {
    casters: Vec<CasterEntry>,
    networks: Vec<NetworkEntry>,
    /// BTreeMap so sourcetable snapshots come out in a stable order
    mounts: BTreeMap<String, Arc<Mount>>,
}

impl MountRegistry {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                casters: Vec::new(),
                networks: Vec::new(),
                mounts: BTreeMap::new(),
            }),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Reconcile the known-mount set with a new configuration snapshot
    ///
    /// Casters and networks are replaced verbatim. Mounts are keyed by
    /// `STR` name: new names are created offline, removed names are
    /// cancelled (their pump terminates and drains its subscribers), and
    /// surviving names have their advertised config updated in place
    /// without disturbing a live pump.
    pub async fn update_sourcetable(&self, table: Sourcetable) {
        let mut inner = self.inner.write().await;

        inner.casters = table.casters;
        inner.networks = table.networks;

        let mut mounts = BTreeMap::new();
        for entry in table.streams {
            let name = entry.name.clone();
            match inner.mounts.remove(&name) {
                Some(mount) => {
                    mount.state.lock().expect("mount lock poisoned").config = entry;
                    mounts.insert(name, mount);
                }
                None => {
                    tracing::info!(mount = %name, "Mount configured");
                    mounts.insert(name, Arc::new(Mount::new(entry)));
                }
            }
        }

        // Whatever is left was dropped from the configuration
        for (name, mount) in std::mem::replace(&mut inner.mounts, mounts) {
            let state = mount.state.lock().expect("mount lock poisoned");
            if let Some(online) = &state.online {
                online.cancel.cancel();
            }
            tracing::info!(mount = %name, "Mount removed");
        }
    }

    /// Snapshot the sourcetable, advertising only online mounts
    ///
    /// Casters and networks are included verbatim.
    pub async fn snapshot_sourcetable(&self) -> Sourcetable {
        let inner = self.inner.read().await;

        let streams = inner
            .mounts
            .values()
            .filter_map(|mount| {
                let state = mount.state.lock().expect("mount lock poisoned");
                state.online.is_some().then(|| state.config.clone())
            })
            .collect();

        Sourcetable {
            casters: inner.casters.clone(),
            networks: inner.networks.clone(),
            streams,
        }
    }

    /// Attach a publisher to a mount
    ///
    /// Atomically transitions the mount from offline to online. Fails
    /// with `MountInUse` while another publisher is attached and with
    /// `MountNotFound` for names outside the configured sourcetable.
    pub async fn open_publisher(&self, name: &str) -> Result<Publisher, RegistryError> {
        let inner = self.inner.read().await;

        let mount = inner
            .mounts
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::MountNotFound(name.to_string()))?;

        let mut state = mount.state.lock().expect("mount lock poisoned");
        if state.online.is_some() {
            return Err(RegistryError::MountInUse(name.to_string()));
        }

        let publisher_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        state.online = Some(OnlineState {
            publisher_id,
            cancel: cancel.clone(),
            subscribers: Vec::new(),
            last_active: Instant::now(),
            bytes_received: 0,
        });
        drop(state);

        tracing::info!(mount = %name, publisher_id, "Publisher attached");

        Ok(Publisher::new(mount.clone(), publisher_id, cancel, &self.config))
    }

    /// Register a subscriber sink on an online mount
    ///
    /// Fails with `MountOffline` when no publisher is attached and with
    /// `MountNotFound` for unknown names; both surface to clients as
    /// not-found.
    pub async fn open_subscriber(&self, name: &str) -> Result<Subscription, RegistryError> {
        let inner = self.inner.read().await;

        let mount = inner
            .mounts
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::MountNotFound(name.to_string()))?;

        let mut state = mount.state.lock().expect("mount lock poisoned");
        let Some(online) = state.online.as_mut() else {
            return Err(RegistryError::MountOffline(name.to_string()));
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.config.subscriber_capacity);
        online.subscribers.push(SubscriberHandle { id, tx });

        tracing::info!(
            mount = %name,
            subscriber_id = id,
            subscribers = online.subscribers.len(),
            "Subscriber added"
        );

        Ok(Subscription::new(
            id,
            Arc::downgrade(&mount),
            mount.name().to_string(),
            rx,
        ))
    }

    /// Get point-in-time statistics for a mount
    pub async fn mount_stats(&self, name: &str) -> Option<MountStats> {
        let inner = self.inner.read().await;
        inner.mounts.get(name).map(|mount| mount.stats())
    }

    /// Total number of configured mounts, online or not
    pub async fn mount_count(&self) -> usize {
        self.inner.read().await.mounts.len()
    }

    /// Cancel every online pump
    ///
    /// Used on graceful server shutdown; subscribers observe end-of-stream.
    pub async fn shutdown(&self) {
        let inner = self.inner.read().await;
        for mount in inner.mounts.values() {
            let state = mount.state.lock().expect("mount lock poisoned");
            if let Some(online) = &state.online {
                online.cancel.cancel();
            }
        }
    }
}

impl Default for MountRegistry {
    fn default() -> Self {
        Self::new()
    }
}
