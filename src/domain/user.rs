use serde::{Deserialize, Serialize};

/// Profile of the logged-in user as kept in the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub notifies: Vec<String>,
}

impl UserProfile {
    /// Two-letter avatar label: initials, else the username prefix, else "PJ".
    #[must_use]
    pub fn initials(&self) -> String {
        let first = self.first_name.trim().chars().next();
        let last = self.last_name.trim().chars().next();
        let from_names: String = first.into_iter().chain(last).collect::<String>().to_uppercase();
        if !from_names.is_empty() {
            return from_names;
        }
        let username = self.username.trim();
        if !username.is_empty() {
            return username.chars().take(2).collect::<String>().to_uppercase();
        }
        "PJ".to_string()
    }
}

/// Fields accepted by registration and profile edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}
