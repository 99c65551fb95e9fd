//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Mount name is not in the configured sourcetable
    #[error("mount not found: {0}")]
    MountNotFound(String),

    /// Mount already has an attached publisher
    #[error("mount in use: {0}")]
    MountInUse(String),

    /// Mount is configured but has no attached publisher
    #[error("mount offline: {0}")]
    MountOffline(String),
}
