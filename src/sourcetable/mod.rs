//! NTRIP sourcetable: model, codec, and query filter
//!
//! The sourcetable is the catalog document served at `/`, listing casters,
//! networks, and streams in a `;`-delimited line format terminated by
//! `ENDSOURCETABLE`. Rendering is bit-exact: clients diff these tables.

mod entry;
mod filter;
mod parse;

pub use entry::{CasterEntry, NetworkEntry, StreamEntry};
pub use filter::FilterError;
pub use parse::ParseWarning;

use crate::protocol::constants::ENDSOURCETABLE_LINE;

/// Immutable snapshot of the three record sequences
///
/// Order is preserved exactly as constructed; `render` performs no sorting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sourcetable {
    pub casters: Vec<CasterEntry>,
    pub networks: Vec<NetworkEntry>,
    pub streams: Vec<StreamEntry>,
}

impl Sourcetable {
    /// Render the table in NTRIP wire format
    ///
    /// Records are emitted in the order casters, networks, streams, one per
    /// line, `\r\n`-separated, ending with the literal `ENDSOURCETABLE\r\n`.
    pub fn render(&self) -> String {
        let mut lines =
            Vec::with_capacity(self.casters.len() + self.networks.len() + self.streams.len() + 1);

        for cas in &self.casters {
            lines.push(cas.to_string());
        }
        for net in &self.networks {
            lines.push(net.to_string());
        }
        for str_ in &self.streams {
            lines.push(str_.to_string());
        }

        lines.push(ENDSOURCETABLE_LINE.to_string());
        lines.join("\r\n")
    }
}

impl std::fmt::Display for Sourcetable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Sourcetable {
        Sourcetable {
            casters: vec![CasterEntry {
                host: "localhost".into(),
                port: 2101,
                identifier: "local".into(),
                country: "AUS".into(),
                latitude: -1.0,
                longitude: 1.0,
                ..Default::default()
            }],
            networks: vec![NetworkEntry {
                identifier: "NET1".into(),
                operator: "Example Operator".into(),
                authentication: "B".into(),
                fee: false,
                network_info_url: "http://example.com/net1".into(),
                ..Default::default()
            }],
            streams: vec![StreamEntry {
                name: "TEST00AUS0".into(),
                format: "RTCM 3.2".into(),
                country_code: "AUS".into(),
                latitude: -25.0,
                longitude: 133.0,
                nmea: true,
                bitrate: 9600,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_render_order_and_terminator() {
        let rendered = table().render();

        let lines: Vec<&str> = rendered.split("\r\n").collect();
        assert!(lines[0].starts_with("CAS;"));
        assert!(lines[1].starts_with("NET;"));
        assert!(lines[2].starts_with("STR;"));
        assert_eq!(lines[3], "ENDSOURCETABLE");
        // The terminator line itself is CRLF-terminated
        assert!(rendered.ends_with("ENDSOURCETABLE\r\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let st = table();
        assert_eq!(st.render(), st.render());
    }

    #[test]
    fn test_empty_table() {
        let st = Sourcetable::default();
        assert_eq!(st.render(), "ENDSOURCETABLE\r\n");
    }

    #[test]
    fn test_roundtrip() {
        let st = table();
        let (parsed, warnings) = Sourcetable::parse(&st.render());
        assert!(warnings.is_empty());
        assert_eq!(parsed, st);
    }
}
