//! Authorizer boundary
//!
//! The broker calls a single capability at request admission. The broker
//! never interprets credential bytes itself; it parses the HTTP
//! `Authorization` field into [`Credentials`] and passes them verbatim.
//! Implementations range from the no-op [`AllowAll`] to the static table
//! in [`StaticAuth`]; database-backed variants live outside this crate.

mod credentials;
mod static_auth;

pub use credentials::Credentials;
pub use static_auth::StaticAuth;

use async_trait::async_trait;

/// What a request wants to do with a mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stream data into the mount
    Publish,
    /// Stream data out of the mount
    Subscribe,
}

/// Why a request was not admitted
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Credentials missing/invalid, or the principal lacks mount access
    #[error("request not authorized")]
    NotAuthorized,

    /// The authorizer knows the mount does not exist
    #[error("mount not found")]
    NotFound,

    /// Authorizer backend failure; surfaces as a 500-equivalent
    #[error("authorizer error: {0}")]
    Internal(String),
}

/// Admission decisions for publish and subscribe requests
///
/// Called once per request before any mount state transition; a rejected
/// request never touches the registry.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(
        &self,
        action: Action,
        mount: &str,
        credentials: &Credentials,
    ) -> Result<(), AuthError>;
}

/// Authorizer that admits every request
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(
        &self,
        _action: Action,
        _mount: &str,
        _credentials: &Credentials,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}
