use crate::api::ApiClient;
use crate::api::dto::task::{CreateTaskRequest, MoveTaskRequest, TaskDto, UpdateTaskRequest};
use crate::domain::project::{NewTask, Task, TaskQuery, TaskUpdate};
use crate::error::{AppError, Result};
use crate::services::auth_call::AuthenticatedCall;
use reqwest::Method;

#[derive(Clone, Debug)]
pub struct TaskService {
    api: ApiClient,
    auth: AuthenticatedCall,
}

fn query_pairs(query: &TaskQuery) -> Vec<(&'static str, &str)> {
    let mut pairs = vec![("project_id", query.project_id.as_str())];
    if let Some(phase_id) = query.phase_id.as_deref() {
        pairs.push(("phase_id", phase_id));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        pairs.push(("q", q));
    }
    pairs
}

impl TaskService {
    #[must_use]
    pub const fn new(api: ApiClient, auth: AuthenticatedCall) -> Self {
        Self { api, auth }
    }

    /// Tasks of a project, optionally narrowed to one phase or a search string.
    ///
    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self, query), fields(project_id = %query.project_id), err(level = "debug"))]
    pub async fn list(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let (api, auth) = (&self.api, &self.auth);
        let pairs = query_pairs(query);
        let pairs = &pairs;
        let tasks: Vec<TaskDto> = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::GET, "task")).query(pairs)).await })
            .await?;
        Ok(tasks.into_iter().map(|t| t.into_task(&query.project_id)).collect())
    }

    /// # Errors
    /// Returns `AppError::NotFound` for an unknown id.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn get(&self, id: &str) -> Result<Task> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("task/{id}");
        let path = path.as_str();
        let task: TaskDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::GET, path))).await })
            .await?;
        Ok(task.into_task(""))
    }

    /// # Errors
    /// Returns `AppError::Validation` for a blank title, otherwise the error of the authenticated call.
    #[tracing::instrument(skip(self, task), fields(project_id = %task.project_id, phase_id = %task.phase_id), err(level = "debug"))]
    pub async fn create(&self, task: &NewTask) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(AppError::Validation { status: 400, message: "task title is required".into() });
        }
        let (api, auth) = (&self.api, &self.auth);
        let body = CreateTaskRequest::from(task);
        let body = &body;
        let created: TaskDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::POST, "task")).json(body)).await })
            .await?;
        let created = created.into_task(&task.project_id);
        tracing::info!(task_id = %created.id, "Task created");
        Ok(created)
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self, update), err(level = "debug"))]
    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("task/{id}");
        let path = path.as_str();
        let body = UpdateTaskRequest::from(update);
        let body = &body;
        let updated: TaskDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::PUT, path)).json(body)).await })
            .await?;
        Ok(updated.into_task(""))
    }

    /// Places a task at `position` within `phase_id` on the backend.
    ///
    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn move_task(&self, task_id: &str, phase_id: &str, position: u32) -> Result<Task> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("task/{task_id}/move");
        let path = path.as_str();
        let body = MoveTaskRequest { phase_id, position };
        let body = &body;
        let moved: TaskDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::PATCH, path)).json(body)).await })
            .await?;
        Ok(moved.into_task(""))
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("task/{id}");
        let path = path.as_str();
        auth.execute(|| async move { api.send_empty(auth.bearer(api.request(Method::DELETE, path))).await })
            .await?;
        tracing::info!(task_id = %id, "Task deleted");
        Ok(())
    }
}
