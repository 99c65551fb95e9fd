//! Crate-level error types
//!
//! The broker signals admission failures with specific kinds so the
//! transport adapters can translate them into the right wire response.

use crate::registry::RegistryError;

/// Error type shared across the caster
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials missing/invalid or principal lacks mount access
    #[error("request not authorized")]
    NotAuthorized,

    /// Mount not present in the configured sourcetable
    #[error("mount not found")]
    NotFound,

    /// Publish attempted while the mount is already online
    #[error("mount in use")]
    Conflict,

    /// Malformed request line, header, or SOURCE preamble
    #[error("bad request")]
    BadRequest,

    /// I/O error on a single peer
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant breach or backend failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::MountNotFound(_) | RegistryError::MountOffline(_) => Error::NotFound,
            RegistryError::MountInUse(_) => Error::Conflict,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
