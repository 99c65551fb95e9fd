//! Request credentials
//!
//! Parsed from the `Authorization` header. Basic credentials are decoded
//! to username/password; anything else is carried as an opaque token.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Credentials attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No `Authorization` header was present
    Anonymous,
    /// Decoded `Basic` credentials
    Basic { username: String, password: String },
    /// Opaque token from a non-Basic scheme, passed through verbatim
    Bearer(String),
}

impl Credentials {
    /// Parse an `Authorization` header value
    ///
    /// A malformed Basic value (bad base64, or no `:` separator) is
    /// treated as anonymous rather than rejected here; the authorizer
    /// decides what anonymous means.
    pub fn from_header(header: Option<&str>) -> Credentials {
        let Some(header) = header else {
            return Credentials::Anonymous;
        };

        if let Some(encoded) = header.strip_prefix("Basic ") {
            let Ok(decoded) = BASE64.decode(encoded.trim()) else {
                return Credentials::Anonymous;
            };
            let Ok(decoded) = String::from_utf8(decoded) else {
                return Credentials::Anonymous;
            };
            let Some((username, password)) = decoded.split_once(':') else {
                return Credentials::Anonymous;
            };
            return Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            };
        }

        if let Some(token) = header.strip_prefix("Bearer ") {
            return Credentials::Bearer(token.trim().to_string());
        }

        Credentials::Bearer(header.to_string())
    }

    /// Username for logging; empty for anonymous and token credentials
    pub fn username(&self) -> &str {
        match self {
            Credentials::Basic { username, .. } => username,
            _ => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_header() {
        assert_eq!(Credentials::from_header(None), Credentials::Anonymous);
    }

    #[test]
    fn test_basic() {
        // username:password
        let creds = Credentials::from_header(Some("Basic dXNlcm5hbWU6cGFzc3dvcmQ="));
        assert_eq!(
            creds,
            Credentials::Basic {
                username: "username".into(),
                password: "password".into(),
            }
        );
    }

    #[test]
    fn test_basic_password_with_colon() {
        // user:pa:ss
        let creds = Credentials::from_header(Some("Basic dXNlcjpwYTpzcw=="));
        assert_eq!(
            creds,
            Credentials::Basic {
                username: "user".into(),
                password: "pa:ss".into(),
            }
        );
    }

    #[test]
    fn test_basic_bad_base64_is_anonymous() {
        let creds = Credentials::from_header(Some("Basic ???"));
        assert_eq!(creds, Credentials::Anonymous);
    }

    #[test]
    fn test_bearer() {
        let creds = Credentials::from_header(Some("Bearer some-token"));
        assert_eq!(creds, Credentials::Bearer("some-token".into()));
    }

    #[test]
    fn test_unknown_scheme_is_opaque() {
        let creds = Credentials::from_header(Some("Digest nonce=abc"));
        assert_eq!(creds, Credentials::Bearer("Digest nonce=abc".into()));
    }
}
