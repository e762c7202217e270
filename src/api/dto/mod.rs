//! Wire shapes of the Projello backend and their mapping into domain types.
//!
//! The backend names the same field differently across resources
//! (`_id`/`id`, `project_id`/`projectId`, `phase-id`, ...). Each resource gets
//! one DTO that accepts every spelling and one conversion into the domain
//! shape; nothing outside this module looks at raw field names.

use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

pub mod auth;
pub mod notify;
pub mod phase;
pub mod project;
pub mod task;

/// Identifier sent either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

/// Nested reference such as `{"id": ...}` or `{"_id": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefDto {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    email: Option<String>,
}

impl RefDto {
    #[must_use]
    pub fn id(self) -> Option<String> {
        self.mongo_id.or(self.id).map(String::from)
    }

    /// Id, falling back to the e-mail for references that carry no id.
    #[must_use]
    pub fn label(self) -> Option<String> {
        let email = self.email.clone();
        self.id().or(email)
    }
}

pub(crate) fn pick_id(candidates: impl IntoIterator<Item = Option<WireId>>) -> Option<String> {
    candidates.into_iter().flatten().next().map(String::from)
}

/// Non-negative integer that fits in `u32`; anything else reads as absent.
pub(crate) fn lenient_u32(raw: Option<serde_json::Value>) -> Option<u32> {
    let raw = raw?;
    let value = raw.as_u64().and_then(|n| u32::try_from(n).ok());
    if value.is_none() {
        tracing::debug!(%raw, "Out-of-range count, dropping it");
    }
    value
}

/// Parses RFC 3339, or an offset-less local date-time taken as UTC.
pub(crate) fn parse_timestamp(raw: Option<String>) -> Option<OffsetDateTime> {
    let raw = raw?;
    if let Ok(ts) = OffsetDateTime::parse(&raw, &Rfc3339) {
        return Some(ts);
    }
    let local = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
    match PrimitiveDateTime::parse(&raw, local) {
        Ok(ts) => Some(ts.assume_utc()),
        Err(e) => {
            tracing::debug!(value = %raw, error = %e, "Unparseable timestamp, dropping it");
            None
        }
    }
}
