//! Wire protocol constants
//!
//! Bit-exact tokens: clients match these byte-for-byte.

/// Header carrying the NTRIP dialect; absent on v1 requests
pub const NTRIP_VERSION_HEADER: &str = "Ntrip-Version";

/// The literal emitted on v2 responses (input matching is case-insensitive)
pub const NTRIP_VERSION_V2: &str = "Ntrip/2.0";

/// Request id echoed on v2 responses
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Optional NMEA GGA sentence on subscribe requests (inspection hook only)
pub const GGA_HEADER: &str = "Ntrip-Gga";

/// `Server` header value on v2 responses
pub const SERVER_NAME: &str = concat!("ntrip-rs/", env!("CARGO_PKG_VERSION"));

/// v2 stream content type
pub const CONTENT_TYPE_GNSS_DATA: &str = "gnss/data";

/// v2 sourcetable content type (v1 uses `text/plain` in its fixed prelude)
pub const CONTENT_TYPE_SOURCETABLE: &str = "gnss/sourcetable";

/// Sourcetable terminator token (one line of the table)
pub const ENDSOURCETABLE: &str = "ENDSOURCETABLE";

/// Sourcetable terminator as rendered, CRLF included
pub const ENDSOURCETABLE_LINE: &str = "ENDSOURCETABLE\r\n";

/// v1 subscribe success prelude, in place of an HTTP status line
pub const ICY_200_OK: &[u8] = b"ICY 200 OK\r\n";

/// v1 SOURCE success reply
pub const SOURCE_OK: &[u8] = b"OK\r\n";

/// v1 SOURCE failure replies, exact reason strings
pub const SOURCE_ERR_BAD_REQUEST: &[u8] = b"ERROR - Bad Request\r\n";
pub const SOURCE_ERR_NOT_AUTHORIZED: &[u8] = b"ERROR - Not Authorized\r\n";
pub const SOURCE_ERR_NOT_FOUND: &[u8] = b"ERROR - Mount Point Does Not Exist\r\n";
pub const SOURCE_ERR_CONFLICT: &[u8] = b"ERROR - Mount Point Already In Use\r\n";
pub const SOURCE_ERR_INTERNAL: &[u8] = b"ERROR - Internal Server Error\r\n";

/// Conventional caster port for the v1/v2 HTTP listener
pub const DEFAULT_CASTER_PORT: u16 = 2101;

/// Conventional port for the v1 SOURCE listener
pub const DEFAULT_SOURCE_PORT: u16 = 2102;
