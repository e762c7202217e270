use crate::api::ApiClient;
use crate::api::dto::project::{ProjectDto, ProjectPayload};
use crate::domain::project::{NewProject, Project, ProjectUpdate};
use crate::error::Result;
use crate::services::auth_call::AuthenticatedCall;
use reqwest::Method;

#[derive(Clone, Debug)]
pub struct ProjectService {
    api: ApiClient,
    auth: AuthenticatedCall,
}

impl ProjectService {
    #[must_use]
    pub const fn new(api: ApiClient, auth: AuthenticatedCall) -> Self {
        Self { api, auth }
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn list(&self) -> Result<Vec<Project>> {
        let (api, auth) = (&self.api, &self.auth);
        let projects: Vec<ProjectDto> = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::GET, "project"))).await })
            .await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    /// # Errors
    /// Returns `AppError::NotFound` for an unknown id.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn get(&self, id: &str) -> Result<Project> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("project/{id}");
        let path = path.as_str();
        let project: ProjectDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::GET, path))).await })
            .await?;
        Ok(project.into())
    }

    /// # Errors
    /// Returns `AppError::Validation` if the backend rejects the payload.
    #[tracing::instrument(skip(self, project), fields(title = %project.title), err(level = "debug"))]
    pub async fn create(&self, project: &NewProject) -> Result<Project> {
        let (api, auth) = (&self.api, &self.auth);
        let body = ProjectPayload {
            title: Some(project.title.trim()),
            description: project.description.as_deref().map(str::trim).filter(|d| !d.is_empty()),
        };
        let body = &body;
        let created: ProjectDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::POST, "project")).json(body)).await })
            .await?;
        let created = Project::from(created);
        tracing::info!(project_id = %created.id, "Project created");
        Ok(created)
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self, update), err(level = "debug"))]
    pub async fn update(&self, id: &str, update: &ProjectUpdate) -> Result<Project> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("project/{id}");
        let path = path.as_str();
        let body = ProjectPayload { title: update.title.as_deref(), description: update.description.as_deref() };
        let body = &body;
        let updated: ProjectDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::PUT, path)).json(body)).await })
            .await?;
        Ok(updated.into())
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("project/{id}");
        let path = path.as_str();
        auth.execute(|| async move { api.send_empty(auth.bearer(api.request(Method::DELETE, path))).await })
            .await?;
        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }
}
