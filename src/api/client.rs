use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin reqwest wrapper bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    /// Returns `AppError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("projello-client/", env!("CARGO_PKG_VERSION")));
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        Ok(Self { http: builder.build()?, base_url: config.api_url.trim_end_matches('/').to_string() })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends a request; only transport failures are errors here.
    ///
    /// # Errors
    /// Returns `AppError::Network` if no response was received.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request did not complete");
            AppError::Network(e)
        })
    }

    /// Sends a request and maps any non-2xx status through [`AppError::from_status`].
    ///
    /// # Errors
    /// Returns the mapped status error or `AppError::Network`.
    pub async fn send_checked(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.send(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = error_parts(response).await;
        tracing::debug!(status = status.as_u16(), message = %message, "Request rejected");
        Err(AppError::from_status(status, message))
    }

    /// # Errors
    /// Returns a status error, `AppError::Network`, or `AppError::Decode` for an unexpected body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send_checked(request).await?;
        decode_json(response).await
    }

    /// # Errors
    /// Returns a status error or `AppError::Network`.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String> {
        let response = self.send_checked(request).await?;
        Ok(response.text().await?)
    }

    /// # Errors
    /// Returns a status error or `AppError::Network`.
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.send_checked(request).await.map(drop)
    }
}

/// Decodes a JSON body, reporting an empty or malformed body as `AppError::Decode`.
///
/// # Errors
/// Returns `AppError::Network` if the body cannot be read.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::Decode(e.to_string()))
}

/// Status and best-effort message of a rejected response.
///
/// The message is the `error` or `message` field of a JSON body, else the raw text.
pub async fn error_parts(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|field| v.get(field).and_then(serde_json::Value::as_str).map(String::from))
        })
        .unwrap_or(body);
    let message = if message.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        message
    };
    (status, message)
}
