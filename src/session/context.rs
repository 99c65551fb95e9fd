//! Per-request context
//!
//! Created when a request head has been classified, destroyed when the
//! socket closes. Carried into authorizer calls and every log line so a
//! request can be traced across the broker.

use std::net::SocketAddr;
use std::time::Instant;

use uuid::Uuid;

use crate::auth::Credentials;
use crate::protocol::ProtocolVersion;

/// Identity and metadata of one in-flight request
#[derive(Debug)]
pub struct RequestContext {
    /// Unique id, echoed as `X-Request-Id` where the dialect permits
    pub request_id: Uuid,

    /// Negotiated dialect
    pub version: ProtocolVersion,

    /// Remote peer address
    pub remote_addr: SocketAddr,

    /// When the request head was accepted
    pub received_at: Instant,

    /// Credentials from the `Authorization` header; may be anonymous
    pub credentials: Credentials,

    /// NMEA GGA sentence attached to a subscribe request, if any
    ///
    /// Recorded for inspection; no nearest-base selection happens here.
    pub gga: Option<String>,
}

impl RequestContext {
    pub fn new(version: ProtocolVersion, remote_addr: SocketAddr) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            version,
            remote_addr,
            received_at: Instant::now(),
            credentials: Credentials::Anonymous,
            gga: None,
        }
    }

    /// Attach parsed credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Attach the request's GGA sentence
    pub fn with_gga(mut self, gga: Option<String>) -> Self {
        self.gga = gga;
        self
    }

    /// Time since the request head was accepted
    pub fn elapsed(&self) -> std::time::Duration {
        self.received_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let addr: SocketAddr = "127.0.0.1:2101".parse().unwrap();
        let a = RequestContext::new(ProtocolVersion::V2, addr);
        let b = RequestContext::new(ProtocolVersion::V2, addr);

        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_context_builders() {
        let addr: SocketAddr = "127.0.0.1:2101".parse().unwrap();
        let ctx = RequestContext::new(ProtocolVersion::V1, addr)
            .with_credentials(Credentials::Basic {
                username: "username".into(),
                password: "password".into(),
            })
            .with_gga(Some("$GPGGA,dummy".into()));

        assert_eq!(ctx.credentials.username(), "username");
        assert_eq!(ctx.gga.as_deref(), Some("$GPGGA,dummy"));
    }
}
