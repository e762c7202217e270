use crate::api::dto::{WireId, lenient_u32, parse_timestamp, pick_id};
use crate::domain::project::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PhaseDto {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    project_id: Option<WireId>,
    #[serde(rename = "projectId")]
    project_id_camel: Option<WireId>,
    title: Option<String>,
    description: Option<String>,
    is_done: Option<bool>,
    #[serde(rename = "isDone")]
    is_done_camel: Option<bool>,
    wip_limit: Option<serde_json::Value>,
    #[serde(rename = "wipLimit")]
    wip_limit_camel: Option<serde_json::Value>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<String>,
    created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at_camel: Option<String>,
    updated_at: Option<String>,
}

impl PhaseDto {
    /// `project_id` fills in when the backend omits the owning project.
    #[must_use]
    pub fn into_phase(self, project_id: &str) -> Phase {
        Phase {
            id: pick_id([self.mongo_id, self.id]).unwrap_or_default(),
            project_id: pick_id([self.project_id, self.project_id_camel]).unwrap_or_else(|| project_id.to_string()),
            title: self.title.unwrap_or_default(),
            description: self.description,
            is_done: self.is_done.or(self.is_done_camel),
            wip_limit: lenient_u32(self.wip_limit).or_else(|| lenient_u32(self.wip_limit_camel)),
            created_at: parse_timestamp(self.created_at_camel.or(self.created_at)),
            updated_at: parse_timestamp(self.updated_at_camel.or(self.updated_at)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhaseRequest<'a> {
    pub title: &'a str,
    pub project_id: &'a str,
}
