//! Mount registry for pub/sub routing
//!
//! The registry manages the configured mountpoints and routes correction
//! data from the single publisher of each online mount to its subscribers.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<MountRegistry>
//!                  ┌───────────────────────────┐
//!                  │ mounts: BTreeMap<Name,    │
//!                  │   Arc<Mount> {            │
//!                  │     config: StreamEntry,  │
//!                  │     online: OnlineState?, │
//!                  │   }                       │
//!                  │ >                         │
//!                  └────────────┬──────────────┘
//!                               │
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!   [Publisher]           [Subscription]         [Subscription]
//!   run(body)             recv()                 recv()
//!        │                      │                      │
//!        └──► fan-out ──► bounded sink ──► client socket
//! ```
//!
//! # Single-writer discipline
//!
//! Only the publisher pump writes to subscriber sinks; subscribers only
//! read. Fan-out is a non-blocking `try_send` per sink, so a slow or dead
//! subscriber is evicted instead of applying backpressure to the
//! publisher. `bytes::Bytes` chunks are reference counted, so all sinks
//! share one allocation per read.

mod config;
mod entry;
mod error;
mod publisher;
mod store;
mod subscription;

pub use config::RegistryConfig;
pub use entry::MountStats;
pub use error::RegistryError;
pub use publisher::{Publisher, PumpExit};
pub use store::MountRegistry;
pub use subscription::Subscription;
