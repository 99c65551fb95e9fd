//! Sourcetable record types
//!
//! One struct per record kind (`CAS`, `NET`, `STR`) with `Display` impls
//! that render the `;`-joined wire form. Booleans render as `0`/`1` for
//! nmea/solution and `N`/`Y` for fee; latitudes and longitudes print with
//! four fractional digits.

use std::fmt;

/// `CAS` record: a caster known to this one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CasterEntry {
    pub host: String,
    pub port: u16,
    pub identifier: String,
    pub operator: String,
    pub nmea: bool,
    pub country: String,
    pub latitude: f32,
    pub longitude: f32,
    pub fallback_host: String,
    pub fallback_port: u16,
    pub misc: String,
}

impl fmt::Display for CasterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CAS;{};{};{};{};{};{};{:.4};{:.4};{};{};{}",
            self.host,
            self.port,
            self.identifier,
            self.operator,
            bool01(self.nmea),
            self.country,
            self.latitude,
            self.longitude,
            self.fallback_host,
            self.fallback_port,
            self.misc,
        )
    }
}

/// `NET` record: a network of streams
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkEntry {
    pub identifier: String,
    pub operator: String,
    /// `B`, `D`, `N`, or a comma separated list of these
    pub authentication: String,
    pub fee: bool,
    pub network_info_url: String,
    pub stream_info_url: String,
    /// URL or email address
    pub registration: String,
    pub misc: String,
}

impl fmt::Display for NetworkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NET;{};{};{};{};{};{};{};{}",
            self.identifier,
            self.operator,
            self.authentication,
            boolny(self.fee),
            self.network_info_url,
            self.stream_info_url,
            self.registration,
            self.misc,
        )
    }
}

/// `STR` record: a mountpoint advertised by this caster
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamEntry {
    pub name: String,
    pub identifier: String,
    pub format: String,
    pub format_details: String,
    pub carrier: String,
    pub nav_system: String,
    pub network: String,
    pub country_code: String,
    pub latitude: f32,
    pub longitude: f32,
    /// Whether the caster requires NMEA position from subscribers
    pub nmea: bool,
    /// Network solution stream (as opposed to a single base)
    pub solution: bool,
    pub generator: String,
    pub compression: String,
    pub authentication: String,
    pub fee: bool,
    pub bitrate: i32,
    pub misc: String,
}

impl fmt::Display for StreamEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STR;{};{};{};{};{};{};{};{};{:.4};{:.4};{};{};{};{};{};{};{};{}",
            self.name,
            self.identifier,
            self.format,
            self.format_details,
            self.carrier,
            self.nav_system,
            self.network,
            self.country_code,
            self.latitude,
            self.longitude,
            bool01(self.nmea),
            bool01(self.solution),
            self.generator,
            self.compression,
            self.authentication,
            boolny(self.fee),
            self.bitrate,
            self.misc,
        )
    }
}

fn bool01(v: bool) -> &'static str {
    if v {
        "1"
    } else {
        "0"
    }
}

fn boolny(v: bool) -> &'static str {
    if v {
        "Y"
    } else {
        "N"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caster_entry_render() {
        let cas = CasterEntry {
            host: "caster.example.com".into(),
            port: 2101,
            identifier: "EXAMPLE".into(),
            operator: "Example Operator".into(),
            nmea: false,
            country: "DEU".into(),
            latitude: 50.1,
            longitude: 8.5,
            fallback_host: "fallback.example.com".into(),
            fallback_port: 2101,
            misc: "none".into(),
        };

        assert_eq!(
            cas.to_string(),
            "CAS;caster.example.com;2101;EXAMPLE;Example Operator;0;DEU;50.1000;8.5000;fallback.example.com;2101;none"
        );
    }

    #[test]
    fn test_network_entry_render() {
        let net = NetworkEntry {
            identifier: "NET1".into(),
            operator: "Example Operator".into(),
            authentication: "B".into(),
            fee: true,
            network_info_url: "http://example.com".into(),
            stream_info_url: "http://example.com/streams".into(),
            registration: "register@example.com".into(),
            misc: String::new(),
        };

        assert_eq!(
            net.to_string(),
            "NET;NET1;Example Operator;B;Y;http://example.com;http://example.com/streams;register@example.com;"
        );
    }

    #[test]
    fn test_stream_entry_render() {
        let str_ = StreamEntry {
            name: "TEST00AUS0".into(),
            identifier: "Test".into(),
            format: "RTCM 3.2".into(),
            format_details: "1004(1),1005(5)".into(),
            carrier: "2".into(),
            nav_system: "GPS+GLO".into(),
            network: "NET1".into(),
            country_code: "AUS".into(),
            latitude: -25.0,
            longitude: 133.0,
            nmea: true,
            solution: false,
            generator: "NetR9".into(),
            compression: "none".into(),
            authentication: "B".into(),
            fee: false,
            bitrate: 9600,
            misc: String::new(),
        };

        assert_eq!(
            str_.to_string(),
            "STR;TEST00AUS0;Test;RTCM 3.2;1004(1),1005(5);2;GPS+GLO;NET1;AUS;-25.0000;133.0000;1;0;NetR9;none;B;N;9600;"
        );
    }
}
