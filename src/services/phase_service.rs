use crate::api::ApiClient;
use crate::api::dto::phase::{CreatePhaseRequest, PhaseDto};
use crate::domain::project::Phase;
use crate::error::{AppError, Result};
use crate::services::auth_call::AuthenticatedCall;
use reqwest::Method;

/// Board columns of a project.
#[derive(Clone, Debug)]
pub struct PhaseService {
    api: ApiClient,
    auth: AuthenticatedCall,
}

impl PhaseService {
    #[must_use]
    pub const fn new(api: ApiClient, auth: AuthenticatedCall) -> Self {
        Self { api, auth }
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn list(&self, project_id: &str) -> Result<Vec<Phase>> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("phase/{project_id}");
        let path = path.as_str();
        let phases: Vec<PhaseDto> = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::GET, path))).await })
            .await?;
        Ok(phases.into_iter().map(|p| p.into_phase(project_id)).collect())
    }

    /// # Errors
    /// Returns `AppError::Validation` for a blank title, otherwise the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn create(&self, project_id: &str, title: &str) -> Result<Phase> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation { status: 400, message: "phase title is required".into() });
        }
        let (api, auth) = (&self.api, &self.auth);
        let body = CreatePhaseRequest { title, project_id };
        let body = &body;
        let created: PhaseDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::POST, "phase")).json(body)).await })
            .await?;
        Ok(created.into_phase(project_id))
    }

    /// The backend takes the new title as a bare JSON string.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for a blank title, otherwise the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn rename(&self, project_id: &str, phase_id: &str, title: &str) -> Result<Phase> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation { status: 400, message: "phase title is required".into() });
        }
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("phase/{phase_id}");
        let path = path.as_str();
        let renamed: PhaseDto = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::PUT, path)).json(title)).await })
            .await?;
        Ok(renamed.into_phase(project_id))
    }

    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, phase_id: &str) -> Result<()> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("phase/{phase_id}");
        let path = path.as_str();
        auth.execute(|| async move { api.send_empty(auth.bearer(api.request(Method::DELETE, path))).await })
            .await
    }
}
