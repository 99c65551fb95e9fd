//! Static-table authorizer
//!
//! User/password table with an optional per-user allow-list restricting
//! which mounts a user may subscribe to, and an optional set of public
//! mounts that anyone may subscribe to without credentials. Passwords are
//! compared as-is; hashing belongs to external authorizer implementations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::{Action, AuthError, Authorizer, Credentials};

/// In-memory authorizer backed by a static user table
#[derive(Debug, Default)]
pub struct StaticAuth {
    users: HashMap<String, String>,
    /// When a user has an entry here, subscribe is limited to these mounts
    subscribe_allowlist: HashMap<String, HashSet<String>>,
    /// Mounts anyone may subscribe to, credentials or not
    public_mounts: HashSet<String>,
}

impl StaticAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a username/password pair
    pub fn user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    /// Restrict a user's subscriptions to the given mounts
    pub fn allow_mounts<I, S>(mut self, username: impl Into<String>, mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribe_allowlist
            .entry(username.into())
            .or_default()
            .extend(mounts.into_iter().map(Into::into));
        self
    }

    /// Mark a mount as subscribable without credentials
    pub fn public_mount(mut self, mount: impl Into<String>) -> Self {
        self.public_mounts.insert(mount.into());
        self
    }

    fn check_password(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored == password)
    }
}

#[async_trait]
impl Authorizer for StaticAuth {
    async fn authorize(
        &self,
        action: Action,
        mount: &str,
        credentials: &Credentials,
    ) -> Result<(), AuthError> {
        // Public mounts short-circuit subscribe, even without credentials
        if action == Action::Subscribe && self.public_mounts.contains(mount) {
            return Ok(());
        }

        let Credentials::Basic { username, password } = credentials else {
            return Err(AuthError::NotAuthorized);
        };

        if !self.check_password(username, password) {
            return Err(AuthError::NotAuthorized);
        }

        if action == Action::Subscribe {
            if let Some(allowed) = self.subscribe_allowlist.get(username) {
                if !allowed.contains(mount) {
                    return Err(AuthError::NotAuthorized);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(username: &str, password: &str) -> Credentials {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_password_check() {
        let auth = StaticAuth::new().user("username", "password");

        assert!(auth
            .authorize(Action::Publish, "ANY", &basic("username", "password"))
            .await
            .is_ok());
        assert!(auth
            .authorize(Action::Publish, "ANY", &basic("username", "wrong"))
            .await
            .is_err());
        assert!(auth
            .authorize(Action::Publish, "ANY", &basic("nobody", "password"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_anonymous_rejected() {
        let auth = StaticAuth::new().user("username", "password");

        let result = auth
            .authorize(Action::Subscribe, "ANY", &Credentials::Anonymous)
            .await;
        assert!(matches!(result, Err(AuthError::NotAuthorized)));
    }

    #[tokio::test]
    async fn test_subscribe_allowlist() {
        let auth = StaticAuth::new()
            .user("rover", "secret")
            .allow_mounts("rover", ["NEAR00AUS0"]);

        assert!(auth
            .authorize(Action::Subscribe, "NEAR00AUS0", &basic("rover", "secret"))
            .await
            .is_ok());
        assert!(auth
            .authorize(Action::Subscribe, "FARX00AUS0", &basic("rover", "secret"))
            .await
            .is_err());

        // The allow-list restricts subscriptions only
        assert!(auth
            .authorize(Action::Publish, "FARX00AUS0", &basic("rover", "secret"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_public_mount_short_circuit() {
        let auth = StaticAuth::new().public_mount("OPEN00AUS0");

        assert!(auth
            .authorize(Action::Subscribe, "OPEN00AUS0", &Credentials::Anonymous)
            .await
            .is_ok());
        // Publishing to a public mount still needs credentials
        assert!(auth
            .authorize(Action::Publish, "OPEN00AUS0", &Credentials::Anonymous)
            .await
            .is_err());
    }
}
