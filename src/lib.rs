//! NTRIP caster in Rust
//!
//! A network broker for GNSS correction data: base stations publish a
//! byte stream into a named mountpoint, rover clients subscribe to it.
//! Both NTRIP dialects are spoken over one listening socket — the legacy
//! ICY/HTTP-0.9 style (v1) and conformant chunked HTTP/1.1 (v2) — plus
//! the plain-TCP SOURCE dialect for legacy uploaders on a second port.
//!
//! # Architecture
//!
//! ```text
//!   base station ──POST /MOUNT──┐            ┌──GET /MOUNT── rover
//!   base station ──SOURCE pw M──┤            ├──GET /MOUNT── rover
//!                               ▼            ▼
//!                        ┌─────────────────────────┐
//!                        │       Caster /          │
//!                        │     SourceServer        │  transport (server)
//!                        ├─────────────────────────┤
//!                        │      Authorizer         │  admission (auth)
//!                        ├─────────────────────────┤
//!                        │     MountRegistry       │  pub/sub core (registry)
//!                        │  one pump per mount,    │
//!                        │  bounded sinks, evict   │
//!                        │  slow subscribers       │
//!                        ├─────────────────────────┤
//!                        │      Sourcetable        │  catalog at / (sourcetable)
//!                        └─────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ntrip_rs::auth::StaticAuth;
//! use ntrip_rs::registry::MountRegistry;
//! use ntrip_rs::server::{Caster, CasterConfig};
//! use ntrip_rs::sourcetable::{Sourcetable, StreamEntry};
//!
//! #[tokio::main]
//! async fn main() -> ntrip_rs::Result<()> {
//!     let registry = Arc::new(MountRegistry::new());
//!     registry
//!         .update_sourcetable(Sourcetable {
//!             streams: vec![StreamEntry {
//!                 name: "TEST00AUS0".into(),
//!                 ..Default::default()
//!             }],
//!             ..Default::default()
//!         })
//!         .await;
//!
//!     let auth = StaticAuth::new().user("username", "password");
//!     let caster = Caster::new(CasterConfig::default(), registry, auth);
//!     caster.run().await
//! }
//! ```
//!
//! # Delivery guarantees
//!
//! Best effort: within one subscriber, bytes arrive in publisher order;
//! there is no replay buffer, and a subscriber that cannot keep up is
//! disconnected rather than allowed to stall the publisher. Chunk
//! boundaries are not preserved — RTCM parsers downstream are
//! self-framing.

pub mod auth;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod sourcetable;

pub use error::{Error, Result};
pub use registry::{MountRegistry, RegistryConfig};
pub use server::{Caster, CasterConfig, SourceConfig, SourceServer};
pub use sourcetable::Sourcetable;
