use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    #[default]
    Information,
    Deadline,
    Other(String),
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "informazione" | "info" | "information" => Self::Information,
            "scadenza" | "deadline" => Self::Deadline,
            _ => Self::Other(value),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Information => "information".to_string(),
            NotificationKind::Deadline => "deadline".to_string(),
            NotificationKind::Other(raw) => raw,
        }
    }
}

/// Locally cached copy of a server-sent notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl NotificationRecord {
    /// Record known only by id, as embedded in a login profile.
    #[must_use]
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: String::new(),
            content: String::new(),
            kind: NotificationKind::default(),
            timestamp: None,
        }
    }
}
