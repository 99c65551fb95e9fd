//! Sourcetable parsing
//!
//! Tolerant line-oriented parser: records with a recognized leading tag are
//! always kept, per-field failures are reported as warnings and the field
//! defaults to zero/empty. Unknown tags and blank lines are skipped.

use super::{CasterEntry, NetworkEntry, Sourcetable, StreamEntry};
use crate::protocol::constants::ENDSOURCETABLE;

/// A non-fatal problem encountered while parsing a sourcetable
///
/// The record the warning refers to is still present in the output, with
/// the offending field defaulted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: parsing {field}")]
pub struct ParseWarning {
    /// Zero-based line number in the input
    pub line: usize,
    /// Canonical name of the field that failed to parse
    pub field: &'static str,
}

impl Sourcetable {
    /// Parse a sourcetable from its wire form
    ///
    /// Stops at `ENDSOURCETABLE`. Returns the table along with any
    /// warnings; callers may treat warnings as log-only.
    pub fn parse(text: &str) -> (Sourcetable, Vec<ParseWarning>) {
        let mut table = Sourcetable::default();
        let mut warnings = Vec::new();

        for (line_no, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.trim();

            if line.is_empty() {
                continue;
            }

            if line == ENDSOURCETABLE {
                break;
            }

            if line.starts_with("CAS") {
                let mut fields = Fields::new(line, line_no);
                table.casters.push(CasterEntry {
                    host: fields.string(1, "host"),
                    port: fields.int(2, "port"),
                    identifier: fields.string(3, "identifier"),
                    operator: fields.string(4, "operator"),
                    nmea: fields.boolean(5, "0", "nmea"),
                    country: fields.string(6, "country"),
                    latitude: fields.float(7, "latitude"),
                    longitude: fields.float(8, "longitude"),
                    fallback_host: fields.string(9, "fallback host address"),
                    fallback_port: fields.int(10, "fallback host port"),
                    misc: fields.string(11, "misc"),
                });
                warnings.append(&mut fields.warnings);
            } else if line.starts_with("NET") {
                let mut fields = Fields::new(line, line_no);
                table.networks.push(NetworkEntry {
                    identifier: fields.string(1, "identifier"),
                    operator: fields.string(2, "operator"),
                    authentication: fields.string(3, "authentication"),
                    fee: fields.boolean(4, "N", "fee"),
                    network_info_url: fields.string(5, "network info url"),
                    stream_info_url: fields.string(6, "stream info url"),
                    registration: fields.string(7, "registration address"),
                    misc: fields.string(8, "misc"),
                });
                warnings.append(&mut fields.warnings);
            } else if line.starts_with("STR") {
                let mut fields = Fields::new(line, line_no);
                table.streams.push(StreamEntry {
                    name: fields.string(1, "name"),
                    identifier: fields.string(2, "identifier"),
                    format: fields.string(3, "format"),
                    format_details: fields.string(4, "format details"),
                    carrier: fields.string(5, "carrier"),
                    nav_system: fields.string(6, "nav system"),
                    network: fields.string(7, "network"),
                    country_code: fields.string(8, "country code"),
                    latitude: fields.float(9, "latitude"),
                    longitude: fields.float(10, "longitude"),
                    nmea: fields.boolean(11, "0", "nmea"),
                    solution: fields.boolean(12, "0", "solution"),
                    generator: fields.string(13, "generator"),
                    compression: fields.string(14, "compression"),
                    authentication: fields.string(15, "authentication"),
                    fee: fields.boolean(16, "N", "fee"),
                    bitrate: fields.int(17, "bitrate"),
                    misc: fields.string(18, "misc"),
                });
                warnings.append(&mut fields.warnings);
            }
            // Unrecognized leading tags are skipped without a warning
        }

        (table, warnings)
    }
}

/// Positional field accessor over one `;`-split record line
struct Fields<'a> {
    parts: Vec<&'a str>,
    line: usize,
    warnings: Vec<ParseWarning>,
}

impl<'a> Fields<'a> {
    fn new(line_text: &'a str, line: usize) -> Self {
        Self {
            parts: line_text.split(';').collect(),
            line,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, field: &'static str) {
        self.warnings.push(ParseWarning {
            line: self.line,
            field,
        });
    }

    fn string(&mut self, index: usize, field: &'static str) -> String {
        match self.parts.get(index) {
            Some(part) => (*part).to_string(),
            None => {
                self.warn(field);
                String::new()
            }
        }
    }

    fn float(&mut self, index: usize, field: &'static str) -> f32 {
        let Some(part) = self.parts.get(index) else {
            self.warn(field);
            return 0.0;
        };
        match part.parse::<f32>() {
            Ok(v) => v,
            Err(_) => {
                self.warn(field);
                0.0
            }
        }
    }

    fn int<T: std::str::FromStr + Default>(&mut self, index: usize, field: &'static str) -> T {
        let Some(part) = self.parts.get(index) else {
            self.warn(field);
            return T::default();
        };
        match part.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                self.warn(field);
                T::default()
            }
        }
    }

    /// Only the canonical false token parses as false; anything else,
    /// including garbage, is true.
    fn boolean(&mut self, index: usize, false_token: &str, field: &'static str) -> bool {
        let Some(part) = self.parts.get(index) else {
            self.warn(field);
            return false;
        };
        *part != false_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let text = "CAS;localhost;2101;local;op;0;AUS;-1.0000;1.0000;;0;\r\n\
                    NET;NET1;op;B;N;;;;\r\n\
                    STR;TEST00AUS0;Test;RTCM 3.2;;2;GPS;NET1;AUS;-25.0000;133.0000;1;0;;;B;N;9600;\r\n\
                    ENDSOURCETABLE\r\n";

        let (table, warnings) = Sourcetable::parse(text);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(table.casters.len(), 1);
        assert_eq!(table.networks.len(), 1);
        assert_eq!(table.streams.len(), 1);

        let cas = &table.casters[0];
        assert_eq!(cas.host, "localhost");
        assert_eq!(cas.port, 2101);
        assert!(!cas.nmea);
        assert_eq!(cas.latitude, -1.0);

        let str_ = &table.streams[0];
        assert_eq!(str_.name, "TEST00AUS0");
        assert!(str_.nmea);
        assert!(!str_.solution);
        assert_eq!(str_.bitrate, 9600);
        assert!(!str_.fee);
    }

    #[test]
    fn test_parse_stops_at_terminator() {
        let text = "STR;A;;;;;;;;0;0;0;0;;;;N;0;\r\n\
                    ENDSOURCETABLE\r\n\
                    STR;B;;;;;;;;0;0;0;0;;;;N;0;\r\n";

        let (table, _) = Sourcetable::parse(text);
        assert_eq!(table.streams.len(), 1);
        assert_eq!(table.streams[0].name, "A");
    }

    #[test]
    fn test_parse_skips_blank_lines_and_unknown_tags() {
        let text = "\r\n\
                    XXX;not;a;record\r\n\
                    STR;A;;;;;;;;0;0;0;0;;;;N;0;\r\n\
                    ENDSOURCETABLE\r\n";

        let (table, warnings) = Sourcetable::parse(text);
        assert!(warnings.is_empty());
        assert_eq!(table.streams.len(), 1);
    }

    #[test]
    fn test_parse_bad_field_warns_but_keeps_record() {
        // Latitude is not a number
        let text = "STR;A;;;;;;;;abc;0;0;0;;;;N;0;\r\nENDSOURCETABLE\r\n";

        let (table, warnings) = Sourcetable::parse(text);
        assert_eq!(table.streams.len(), 1);
        assert_eq!(table.streams[0].latitude, 0.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "latitude");
    }

    #[test]
    fn test_parse_short_record_defaults_missing_fields() {
        let text = "STR;A;ident\r\nENDSOURCETABLE\r\n";

        let (table, warnings) = Sourcetable::parse(text);
        assert_eq!(table.streams.len(), 1);
        assert_eq!(table.streams[0].name, "A");
        assert_eq!(table.streams[0].identifier, "ident");
        assert_eq!(table.streams[0].format, "");
        assert_eq!(table.streams[0].bitrate, 0);
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_parse_non_canonical_bool_is_true() {
        let text = "STR;A;;;;;;;;0;0;X;1;;;;Y;0;\r\nENDSOURCETABLE\r\n";

        let (table, _) = Sourcetable::parse(text);
        assert!(table.streams[0].nmea);
        assert!(table.streams[0].solution);
        assert!(table.streams[0].fee);
    }
}
