use crate::api::dto::{WireId, parse_timestamp, pick_id};
use crate::domain::project::{Member, Project};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct MemberDto {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    #[serde(default)]
    email: String,
    #[serde(rename = "firstName", alias = "first_name", default)]
    first_name: Option<String>,
    #[serde(rename = "lastName", alias = "last_name", default)]
    last_name: Option<String>,
}

impl From<MemberDto> for Member {
    fn from(dto: MemberDto) -> Self {
        Self {
            id: pick_id([dto.mongo_id, dto.id]).unwrap_or_default(),
            email: dto.email,
            first_name: dto.first_name.unwrap_or_default(),
            last_name: dto.last_name.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectDto {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    #[serde(default)]
    title: Option<String>,
    description: Option<String>,
    creator: Option<MemberDto>,
    #[serde(default)]
    collaborators: Option<Vec<MemberDto>>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<String>,
    created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at_camel: Option<String>,
    updated_at: Option<String>,
}

impl From<ProjectDto> for Project {
    fn from(dto: ProjectDto) -> Self {
        Self {
            id: pick_id([dto.mongo_id, dto.id]).unwrap_or_default(),
            title: dto.title.unwrap_or_default(),
            description: dto.description,
            creator: dto.creator.map(Member::from),
            collaborators: dto.collaborators.unwrap_or_default().into_iter().map(Member::from).collect(),
            created_at: parse_timestamp(dto.created_at_camel.or(dto.created_at)),
            updated_at: parse_timestamp(dto.updated_at_camel.or(dto.updated_at)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}
