use crate::api::dto::{RefDto, WireId, lenient_u32, parse_timestamp, pick_id};
use crate::domain::project::{NewTask, Task, TaskAttachment, TaskPriority, TaskUpdate};
use serde::{Deserialize, Serialize};

/// Assignee as sent by the backend: a bare id or a user object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AssigneeRef {
    Id(WireId),
    User(RefDto),
}

impl AssigneeRef {
    fn into_label(self) -> Option<String> {
        match self {
            Self::Id(id) => Some(id.into()),
            Self::User(user) => user.label(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskDto {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    project_id: Option<WireId>,
    #[serde(rename = "projectId")]
    project_id_camel: Option<WireId>,
    phase_id: Option<WireId>,
    #[serde(rename = "phaseId")]
    phase_id_camel: Option<WireId>,
    #[serde(rename = "phase-id")]
    phase_id_kebab: Option<WireId>,
    phase: Option<RefDto>,
    title: Option<String>,
    description: Option<String>,
    expiration_date: Option<String>,
    #[serde(rename = "expirationDate")]
    expiration_date_camel: Option<String>,
    #[serde(rename = "expiration-date")]
    expiration_date_kebab: Option<String>,
    priority: Option<String>,
    attachments: Option<Vec<TaskAttachment>>,
    assignees: Option<Vec<AssigneeRef>>,
    position: Option<serde_json::Value>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<String>,
    created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    updated_at_camel: Option<String>,
    updated_at: Option<String>,
}

fn parse_priority(raw: Option<String>) -> Option<TaskPriority> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "low" => Some(TaskPriority::Low),
        "medium" => Some(TaskPriority::Medium),
        "high" => Some(TaskPriority::High),
        _ => None,
    }
}

impl TaskDto {
    /// `project_id` fills in when the backend omits the owning project.
    #[must_use]
    pub fn into_task(self, project_id: &str) -> Task {
        let phase_id = pick_id([self.phase_id, self.phase_id_camel, self.phase_id_kebab])
            .or_else(|| self.phase.and_then(RefDto::id))
            .unwrap_or_default();
        Task {
            id: pick_id([self.mongo_id, self.id]).unwrap_or_default(),
            project_id: pick_id([self.project_id, self.project_id_camel]).unwrap_or_else(|| project_id.to_string()),
            phase_id,
            title: self.title.unwrap_or_default(),
            description: self.description,
            expiration_date: self.expiration_date.or(self.expiration_date_camel).or(self.expiration_date_kebab),
            priority: parse_priority(self.priority),
            attachments: self.attachments.unwrap_or_default(),
            assignees: self.assignees.unwrap_or_default().into_iter().filter_map(AssigneeRef::into_label).collect(),
            position: lenient_u32(self.position),
            created_at: parse_timestamp(self.created_at_camel.or(self.created_at)),
            updated_at: parse_timestamp(self.updated_at_camel.or(self.updated_at)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTaskRequest<'a> {
    pub project_id: &'a str,
    pub phase_id: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
}

impl<'a> From<&'a NewTask> for CreateTaskRequest<'a> {
    fn from(task: &'a NewTask) -> Self {
        Self {
            project_id: &task.project_id,
            phase_id: &task.phase_id,
            title: task.title.trim(),
            description: task.description.as_deref().map(str::trim).filter(|d| !d.is_empty()),
            expiration_date: task.expiration_date.as_deref().filter(|d| !d.is_empty()),
            priority: task.priority,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateTaskRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
}

impl<'a> From<&'a TaskUpdate> for UpdateTaskRequest<'a> {
    fn from(update: &'a TaskUpdate) -> Self {
        Self {
            title: update.title.as_deref(),
            description: update.description.as_deref(),
            expiration_date: update.expiration_date.as_deref(),
            priority: update.priority,
            status: update.status.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoveTaskRequest<'a> {
    pub phase_id: &'a str,
    pub position: u32,
}
