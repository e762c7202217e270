use crate::api::dto::notify::NotifyDto;
use crate::api::dto::{WireId, pick_id};
use crate::domain::notification::NotificationRecord;
use crate::domain::user::UserProfile;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

/// Body of both `/auth/login` and `/auth/refresh`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(alias = "user")]
    pub user_response: UserResponse,
}

/// A notification embedded in a profile: a bare id or a full record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NotifyRef {
    Id(WireId),
    Record(NotifyDto),
}

impl NotifyRef {
    fn into_record(self) -> Option<NotificationRecord> {
        match self {
            Self::Id(id) => Some(NotificationRecord::placeholder(String::from(id))),
            Self::Record(dto) => dto.into_record(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(rename = "firstName", alias = "first_name", default)]
    first_name: Option<String>,
    #[serde(rename = "lastName", alias = "last_name", default)]
    last_name: Option<String>,
    #[serde(default)]
    notifies: Vec<NotifyRef>,
}

impl UserResponse {
    /// Splits the response into the stored profile and the notifications to seed the cache with.
    #[must_use]
    pub fn into_parts(self) -> (UserProfile, Vec<NotificationRecord>) {
        let records: Vec<NotificationRecord> = self.notifies.into_iter().filter_map(NotifyRef::into_record).collect();
        let profile = UserProfile {
            id: pick_id([self.mongo_id, self.id]).unwrap_or_default(),
            email: self.email,
            username: self.username.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            notifies: records.iter().map(|n| n.id.clone()).collect(),
        };
        (profile, records)
    }
}
