//! Transport adapters
//!
//! Two listeners: [`Caster`] serves NTRIP v1 and v2 over one HTTP-shaped
//! socket, [`SourceServer`] serves the legacy plain-TCP SOURCE dialect on
//! its own port. Each accepted connection runs on its own tokio task.

mod config;
mod connection;
mod listener;
mod source;

pub use config::{CasterConfig, SourceConfig};
pub use listener::Caster;
pub use source::SourceServer;
