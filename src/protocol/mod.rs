//! NTRIP wire protocol
//!
//! Request-head parsing, body framing, response preludes, and the literal
//! tokens both dialects put on the wire. The caster speaks v2 (conformant
//! HTTP/1.1) and v1 (ICY-style, not valid HTTP) over one listener, plus
//! the plain-TCP SOURCE dialect; everything here works directly on the
//! socket so the v1 preludes can be written without an HTTP framework in
//! the way.

pub mod body;
pub mod constants;
pub mod request;
pub mod response;

use constants::NTRIP_VERSION_V2;

/// Negotiated NTRIP dialect for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Legacy ICY/HTTP-0.9 style
    V1,
    /// Conformant HTTP/1.1
    V2,
}

impl ProtocolVersion {
    /// Classify from the `Ntrip-Version` header value, if any
    ///
    /// Input is case-insensitive; anything other than `NTRIP/2.0` is v1.
    pub fn from_header(value: Option<&str>) -> ProtocolVersion {
        match value {
            Some(value) if value.eq_ignore_ascii_case(NTRIP_VERSION_V2) => ProtocolVersion::V2,
            _ => ProtocolVersion::V1,
        }
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "1"),
            ProtocolVersion::V2 => write!(f, "2"),
        }
    }
}
