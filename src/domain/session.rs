use crate::domain::user::UserProfile;
use base64::Engine;
use serde::Deserialize;
use time::OffsetDateTime;

/// The single active session of this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

/// What subscribers observe on the session change signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn {
        user: UserProfile,
    },
}

impl SessionState {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::LoggedIn { user } => Some(user),
            Self::LoggedOut => None,
        }
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Reads the unverified `exp` claim of a JWT-shaped token.
///
/// Display only. Returns `None` for opaque tokens or malformed payloads.
#[must_use]
pub fn token_expiry(token: &str) -> Option<OffsetDateTime> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    OffsetDateTime::from_unix_timestamp(claim.exp?).ok()
}
