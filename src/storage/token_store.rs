use crate::domain::session::Session;
use crate::domain::user::UserProfile;
use crate::storage::{KeyValueStore, keys};
use std::sync::Arc;

/// Tokens and profile of the current session. Pure persistence, no policy.
///
/// Read failures are logged and reported as absent.
#[derive(Debug, Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session key");
                None
            }
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read(keys::ACCESS_TOKEN)
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read(keys::REFRESH_TOKEN)
    }

    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.read(keys::USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Stored profile is corrupt, ignoring it");
                None
            }
        }
    }

    /// Replaces tokens and profile in one write.
    pub fn save_session(&self, session: &Session) {
        let user = match serde_json::to_string(&session.user) {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize profile");
                return;
            }
        };
        let ops = [
            (keys::ACCESS_TOKEN, Some(session.access_token.as_str())),
            (keys::REFRESH_TOKEN, session.refresh_token.as_deref()),
            (keys::USER, Some(user.as_str())),
        ];
        if let Err(e) = self.store.write_batch(&ops) {
            tracing::error!(error = %e, "Failed to persist session");
        }
    }

    pub fn save_user(&self, user: &UserProfile) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if let Err(e) = self.store.set(keys::USER, &raw) {
                    tracing::error!(error = %e, "Failed to persist profile");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize profile"),
        }
    }

    pub fn clear(&self) {
        let ops = [(keys::ACCESS_TOKEN, None), (keys::REFRESH_TOKEN, None), (keys::USER, None)];
        if let Err(e) = self.store.write_batch(&ops) {
            tracing::error!(error = %e, "Failed to clear session");
        }
    }
}
