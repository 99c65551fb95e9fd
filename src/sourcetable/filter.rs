//! Sourcetable query filter
//!
//! A query is optional, begins with `?`, and is a conjunction of conditions
//! joined by `&`. The first part may use the NTRIP positional form
//! (`STR;v1;v2;…`) where each non-empty position expands to an equality on
//! the canonical field at that index; any part may use the explicit
//! `Field OP Value` form with OP one of `=`, `!=`, `>`, `>=`, `<`, `<=`,
//! `~` (substring). A condition on a field a record kind does not have
//! rejects every record of that kind.

use super::{CasterEntry, NetworkEntry, Sourcetable, StreamEntry};

/// A filter query that could not be parsed
///
/// Callers typically log this and serve the unfiltered table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid condition format: {0}")]
    InvalidCondition(String),
}

impl Sourcetable {
    /// Filter the table by a raw query string (including the leading `?`)
    ///
    /// An empty query, a bare `?`, or a query that expands to zero
    /// conditions returns the table unchanged. Filtering is idempotent.
    pub fn filter(&self, query: &str) -> Result<Sourcetable, FilterError> {
        let parsed = Query::parse(query)?;

        if parsed.conditions.is_empty() {
            return Ok(self.clone());
        }

        Ok(Sourcetable {
            casters: self
                .casters
                .iter()
                .filter(|c| parsed.matches(*c))
                .cloned()
                .collect(),
            networks: self
                .networks
                .iter()
                .filter(|n| parsed.matches(*n))
                .cloned()
                .collect(),
            streams: self
                .streams
                .iter()
                .filter(|s| parsed.matches(*s))
                .cloned()
                .collect(),
        })
    }
}

/// Operators in match precedence order; two-character operators first so
/// `>=` is not read as `>`.
const OPERATORS: [&str; 7] = ["!=", ">=", "<=", "=", ">", "<", "~"];

struct Condition {
    field: String,
    operator: &'static str,
    value: String,
}

struct Query {
    conditions: Vec<Condition>,
}

impl Query {
    fn parse(query: &str) -> Result<Query, FilterError> {
        let mut q = Query {
            conditions: Vec::new(),
        };

        let Some(query) = query.strip_prefix('?') else {
            return Ok(q);
        };
        if query.is_empty() {
            return Ok(q);
        }

        for (i, part) in query.split('&').enumerate() {
            // The first part may be the NTRIP positional form
            if i == 0 && part.contains(';') {
                let fields: Vec<&str> = part.split(';').collect();
                let kind = fields[0];
                for (j, value) in fields[1..].iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    // Positions past the field list, or an unknown record
                    // kind, expand to nothing
                    if let Some(field) = positional_field(kind, j) {
                        q.conditions.push(Condition {
                            field: field.to_string(),
                            operator: "=",
                            value: (*value).to_string(),
                        });
                    }
                }
                continue;
            }

            let Some((op, idx)) = OPERATORS
                .iter()
                .find_map(|op| part.find(op).map(|idx| (*op, idx)))
            else {
                return Err(FilterError::InvalidCondition(part.to_string()));
            };

            q.conditions.push(Condition {
                field: part[..idx].to_string(),
                operator: op,
                value: part[idx + op.len()..].to_string(),
            });
        }

        Ok(q)
    }

    fn matches(&self, record: &dyn FilterRecord) -> bool {
        self.conditions.iter().all(|cond| cond.matches(record))
    }
}

impl Condition {
    fn matches(&self, record: &dyn FilterRecord) -> bool {
        let Some(field_value) = record.field(&self.field) else {
            return false;
        };

        match self.operator {
            "=" => field_value == self.value,
            "!=" => field_value != self.value,
            "~" => field_value.contains(&self.value),
            op => compare(op, &field_value, &self.value),
        }
    }
}

/// Ordered comparison: numeric when both sides parse as decimals,
/// lexicographic otherwise.
fn compare(op: &str, field: &str, value: &str) -> bool {
    match (field.parse::<f64>(), value.parse::<f64>()) {
        (Ok(f), Ok(v)) => match op {
            ">" => f > v,
            ">=" => f >= v,
            "<" => f < v,
            "<=" => f <= v,
            _ => false,
        },
        _ => match op {
            ">" => field > value,
            ">=" => field >= value,
            "<" => field < value,
            "<=" => field <= value,
            _ => false,
        },
    }
}

/// Canonical field name at a positional index, per record kind
fn positional_field(kind: &str, index: usize) -> Option<&'static str> {
    let fields: &[&'static str] = match kind {
        "STR" => &STR_FIELDS,
        "CAS" => &CAS_FIELDS,
        "NET" => &NET_FIELDS,
        _ => return None,
    };
    fields.get(index).copied()
}

const STR_FIELDS: [&str; 18] = [
    "Name",
    "Identifier",
    "Format",
    "FormatDetails",
    "Carrier",
    "NavSystem",
    "Network",
    "CountryCode",
    "Latitude",
    "Longitude",
    "NMEA",
    "Solution",
    "Generator",
    "Compression",
    "Authentication",
    "Fee",
    "Bitrate",
    "Misc",
];

const CAS_FIELDS: [&str; 11] = [
    "Host",
    "Port",
    "Identifier",
    "Operator",
    "NMEA",
    "Country",
    "Latitude",
    "Longitude",
    "FallbackHostAddress",
    "FallbackHostPort",
    "Misc",
];

const NET_FIELDS: [&str; 8] = [
    "Identifier",
    "Operator",
    "Authentication",
    "Fee",
    "NetworkInfoURL",
    "StreamInfoURL",
    "RegistrationAddress",
    "Misc",
];

/// Filter-level view of a record: canonical field name to its logical
/// string value (`true`/`false` for booleans, shortest decimal for
/// numbers — not the wire rendering).
trait FilterRecord {
    fn field(&self, name: &str) -> Option<String>;
}

impl FilterRecord for CasterEntry {
    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "Host" => self.host.clone(),
            "Port" => self.port.to_string(),
            "Identifier" => self.identifier.clone(),
            "Operator" => self.operator.clone(),
            "NMEA" => self.nmea.to_string(),
            "Country" => self.country.clone(),
            "Latitude" => self.latitude.to_string(),
            "Longitude" => self.longitude.to_string(),
            "FallbackHostAddress" => self.fallback_host.clone(),
            "FallbackHostPort" => self.fallback_port.to_string(),
            "Misc" => self.misc.clone(),
            _ => return None,
        })
    }
}

impl FilterRecord for NetworkEntry {
    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "Identifier" => self.identifier.clone(),
            "Operator" => self.operator.clone(),
            "Authentication" => self.authentication.clone(),
            "Fee" => self.fee.to_string(),
            "NetworkInfoURL" => self.network_info_url.clone(),
            "StreamInfoURL" => self.stream_info_url.clone(),
            "RegistrationAddress" => self.registration.clone(),
            "Misc" => self.misc.clone(),
            _ => return None,
        })
    }
}

impl FilterRecord for StreamEntry {
    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "Name" => self.name.clone(),
            "Identifier" => self.identifier.clone(),
            "Format" => self.format.clone(),
            "FormatDetails" => self.format_details.clone(),
            "Carrier" => self.carrier.clone(),
            "NavSystem" => self.nav_system.clone(),
            "Network" => self.network.clone(),
            "CountryCode" => self.country_code.clone(),
            "Latitude" => self.latitude.to_string(),
            "Longitude" => self.longitude.to_string(),
            "NMEA" => self.nmea.to_string(),
            "Solution" => self.solution.to_string(),
            "Generator" => self.generator.clone(),
            "Compression" => self.compression.clone(),
            "Authentication" => self.authentication.clone(),
            "Fee" => self.fee.to_string(),
            "Bitrate" => self.bitrate.to_string(),
            "Misc" => self.misc.clone(),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Sourcetable {
        Sourcetable {
            casters: vec![
                CasterEntry {
                    host: "caster1.example.com".into(),
                    port: 2101,
                    identifier: "CASTER1".into(),
                    operator: "Example Operator".into(),
                    nmea: false,
                    country: "DEU".into(),
                    latitude: 50.1,
                    longitude: 8.5,
                    fallback_host: "fallback.example.com".into(),
                    fallback_port: 2101,
                    misc: "misc1".into(),
                },
                CasterEntry {
                    host: "caster2.example.com".into(),
                    port: 2101,
                    identifier: "CASTER2".into(),
                    operator: "Example Operator".into(),
                    nmea: true,
                    country: "USA".into(),
                    latitude: 37.7,
                    longitude: -122.4,
                    fallback_host: "fallback.example.com".into(),
                    fallback_port: 2101,
                    misc: "misc2".into(),
                },
            ],
            networks: vec![
                NetworkEntry {
                    identifier: "NET1".into(),
                    operator: "Example Operator".into(),
                    authentication: "B".into(),
                    fee: false,
                    network_info_url: "http://example.com/net1".into(),
                    stream_info_url: "http://example.com/net1/streams".into(),
                    registration: "register@example.com".into(),
                    misc: "misc1".into(),
                },
                NetworkEntry {
                    identifier: "NET2".into(),
                    operator: "Example Operator".into(),
                    authentication: "N".into(),
                    fee: true,
                    network_info_url: "http://example.com/net2".into(),
                    stream_info_url: "http://example.com/net2/streams".into(),
                    registration: "register@example.com".into(),
                    misc: "misc2".into(),
                },
            ],
            streams: vec![
                StreamEntry {
                    name: "MOUNT1".into(),
                    identifier: "MOUNT1".into(),
                    format: "RTCM 3.2".into(),
                    format_details: "1004(1),1005(5)".into(),
                    carrier: "2".into(),
                    nav_system: "GPS+GLO".into(),
                    network: "NET1".into(),
                    country_code: "DEU".into(),
                    latitude: 50.09,
                    longitude: 8.66,
                    nmea: false,
                    solution: false,
                    generator: "TRIMBLE NetR9".into(),
                    compression: "none".into(),
                    authentication: "B".into(),
                    fee: false,
                    bitrate: 9600,
                    misc: "misc1".into(),
                },
                StreamEntry {
                    name: "MOUNT2".into(),
                    identifier: "MOUNT2".into(),
                    format: "RTCM 3.3".into(),
                    format_details: "1004(1),1005(5)".into(),
                    carrier: "2".into(),
                    nav_system: "GPS+GLO+GAL".into(),
                    network: "NET1".into(),
                    country_code: "USA".into(),
                    latitude: 37.7,
                    longitude: -122.4,
                    nmea: true,
                    solution: true,
                    generator: "TRIMBLE NetR9".into(),
                    compression: "none".into(),
                    authentication: "N".into(),
                    fee: true,
                    bitrate: 4800,
                    misc: "misc2".into(),
                },
            ],
        }
    }

    fn counts(st: &Sourcetable) -> (usize, usize, usize) {
        (st.casters.len(), st.networks.len(), st.streams.len())
    }

    #[test]
    fn test_empty_query_returns_input() {
        let st = table();
        assert_eq!(st.filter("").unwrap(), st);
        assert_eq!(st.filter("?").unwrap(), st);
    }

    #[test]
    fn test_positional_country() {
        let st = table();
        let filtered = st.filter("?STR;;;;;;;;DEU").unwrap();
        assert_eq!(counts(&filtered), (0, 0, 1));
        assert_eq!(filtered.streams[0].name, "MOUNT1");
    }

    #[test]
    fn test_positional_multiple_fields() {
        let st = table();
        let filtered = st.filter("?STR;MOUNT1;;;;;;;DEU").unwrap();
        assert_eq!(counts(&filtered), (0, 0, 1));
    }

    #[test]
    fn test_explicit_country_applies_per_record_kind() {
        // Only casters have a field named Country
        let st = table();
        let filtered = st.filter("?Country=DEU").unwrap();
        assert_eq!(counts(&filtered), (1, 0, 0));
    }

    #[test]
    fn test_numeric_comparison() {
        let st = table();
        let filtered = st.filter("?Bitrate>5000").unwrap();
        assert_eq!(counts(&filtered), (0, 0, 1));
        assert_eq!(filtered.streams[0].name, "MOUNT1");
    }

    #[test]
    fn test_substring_operator() {
        let st = table();
        let filtered = st.filter("?NavSystem~GAL").unwrap();
        assert_eq!(counts(&filtered), (0, 0, 1));
        assert_eq!(filtered.streams[0].name, "MOUNT2");
    }

    #[test]
    fn test_bool_logical_rendering() {
        let st = table();
        let filtered = st.filter("?Country=USA&NMEA=true").unwrap();
        assert_eq!(counts(&filtered), (1, 0, 0));
    }

    #[test]
    fn test_authentication_matches_networks_and_streams() {
        let st = table();
        let filtered = st.filter("?Authentication=N").unwrap();
        assert_eq!(counts(&filtered), (0, 1, 1));
    }

    #[test]
    fn test_no_matches() {
        let st = table();
        let filtered = st.filter("?CountryCode=FRA").unwrap();
        assert_eq!(counts(&filtered), (0, 0, 0));
    }

    #[test]
    fn test_invalid_condition_is_error() {
        let st = table();
        assert!(st.filter("?invalid-query").is_err());
        assert!(st.filter("?&CountryCode@DEU").is_err());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let st = table();
        let once = st.filter("?STR;;;;;;;;DEU").unwrap();
        let twice = once.filter("?STR;;;;;;;;DEU").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_lexicographic_fallback() {
        let st = table();
        // Format is not numeric on either side
        let filtered = st.filter("?Format>RTCM 3.2").unwrap();
        assert_eq!(counts(&filtered), (0, 0, 1));
        assert_eq!(filtered.streams[0].name, "MOUNT2");
    }
}
