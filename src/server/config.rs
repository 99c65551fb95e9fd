//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::constants::{DEFAULT_CASTER_PORT, DEFAULT_SOURCE_PORT};

/// Configuration for the v1/v2 HTTP listener
#[derive(Debug, Clone)]
pub struct CasterConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Time a connection may take to deliver its request head
    ///
    /// Applies only before the head completes; established streams carry
    /// no whole-connection deadline (publishers do not read, subscribers
    /// do not write).
    pub idle_timeout: Duration,

    /// Per-chunk write deadline for v1 subscribers
    pub write_timeout: Duration,

    /// How long a graceful shutdown waits for connections to drain
    pub shutdown_timeout: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for CasterConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_CASTER_PORT)),
            max_connections: 0, // Unlimited
            idle_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(10),
            tcp_nodelay: true, // Corrections are latency sensitive
        }
    }
}

impl CasterConfig {
    /// Create a config with a custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the request-head idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the v1 per-chunk write deadline
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the graceful shutdown drain window
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Configuration for the plain-TCP SOURCE listener
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Time a connection may take to deliver its SOURCE preamble
    pub idle_timeout: Duration,

    /// How long a graceful shutdown waits for connections to drain
    pub shutdown_timeout: Duration,

    /// Enable TCP_NODELAY
    pub tcp_nodelay: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_SOURCE_PORT)),
            idle_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(10),
            tcp_nodelay: true,
        }
    }
}

impl SourceConfig {
    /// Create a config with a custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the preamble idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caster_config() {
        let config = CasterConfig::default();

        assert_eq!(config.bind_addr.port(), 2101);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_default_source_config() {
        let config = SourceConfig::default();

        assert_eq!(config.bind_addr.port(), 2102);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:2111".parse().unwrap();
        let config = CasterConfig::default()
            .bind(addr)
            .max_connections(50)
            .idle_timeout(Duration::from_secs(5))
            .write_timeout(Duration::from_secs(3))
            .shutdown_timeout(Duration::from_secs(1));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }
}
