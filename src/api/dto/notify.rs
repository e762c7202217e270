use crate::api::dto::{WireId, parse_timestamp, pick_id};
use crate::domain::notification::{NotificationKind, NotificationRecord};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NotifyDto {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    message: Option<String>,
    content: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    timestamp: Option<String>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<String>,
    created_at: Option<String>,
}

impl NotifyDto {
    /// `None` when the payload carries no id at all.
    #[must_use]
    pub fn into_record(self) -> Option<NotificationRecord> {
        let id = pick_id([self.mongo_id, self.id])?;
        let message = self.message.or_else(|| self.content.clone()).unwrap_or_default();
        Some(NotificationRecord {
            id,
            content: self.content.unwrap_or_else(|| message.clone()),
            message,
            kind: self.kind.map(NotificationKind::from).unwrap_or_default(),
            timestamp: parse_timestamp(self.timestamp.or(self.created_at_camel).or(self.created_at)),
        })
    }
}
