use crate::error::Result;
use async_trait::async_trait;
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::RequestBuilder;
use std::future::Future;
use std::sync::Arc;

/// The slice of the session the retry policy needs.
#[async_trait]
pub trait TokenRefresher: Send + Sync + std::fmt::Debug {
    /// Current access token, without checking its validity.
    fn access_token(&self) -> Option<String>;

    /// Exchanges the refresh token for a new pair unless the session already
    /// moved past the `rejected` access token. Never errors; `false` means the
    /// session is gone.
    async fn refresh_rejected(&self, rejected: Option<String>) -> bool;

    /// Ends the session unconditionally.
    fn force_logout(&self);
}

pub(crate) fn reauth_counter() -> Counter<u64> {
    global::meter("projello-client")
        .u64_counter("request_reauth_total")
        .with_description("Requests that hit 401 and went through the refresh path")
        .build()
}

/// Runs `factory` once; on a 401 refreshes once and re-runs it once.
///
/// A 401 on the retry, or a failed refresh, ends the session. Any other
/// failure is returned untouched.
pub(crate) async fn with_reauth<R, T, F, Fut>(session: &R, reauth_total: &Counter<u64>, mut factory: F) -> Result<T>
where
    R: TokenRefresher + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let rejected = session.access_token();
    let error = match factory().await {
        Err(e) if e.is_unauthorized() => e,
        outcome => return outcome,
    };

    tracing::debug!("Request unauthorized, refreshing session");
    if !session.refresh_rejected(rejected).await {
        tracing::warn!("Session refresh failed, logging out");
        reauth_total.add(1, &[KeyValue::new("outcome", "refresh_failed")]);
        session.force_logout();
        return Err(error);
    }

    let outcome = factory().await;
    match &outcome {
        Ok(_) => reauth_total.add(1, &[KeyValue::new("outcome", "recovered")]),
        Err(e) if e.is_unauthorized() => {
            tracing::warn!("Request still unauthorized after refresh, logging out");
            reauth_total.add(1, &[KeyValue::new("outcome", "exhausted")]);
            session.force_logout();
        }
        Err(_) => reauth_total.add(1, &[KeyValue::new("outcome", "retry_failed")]),
    }
    outcome
}

/// Decorates outbound feature requests with the bearer header and the retry-once policy.
#[derive(Clone, Debug)]
pub struct AuthenticatedCall {
    session: Arc<dyn TokenRefresher>,
    reauth_total: Counter<u64>,
}

impl AuthenticatedCall {
    #[must_use]
    pub fn new(session: Arc<dyn TokenRefresher>) -> Self {
        Self { session, reauth_total: reauth_counter() }
    }

    /// Attaches `Authorization: Bearer <access token>` when a token is stored.
    #[must_use]
    pub fn bearer(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Executes a request factory under the retry-once policy.
    ///
    /// The factory is called again for the retry so it must rebuild the
    /// request, picking up the refreshed token through [`Self::bearer`].
    ///
    /// # Errors
    /// Returns the error of the last attempt.
    pub async fn execute<T, F, Fut>(&self, factory: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_reauth(self.session.as_ref(), &self.reauth_total, factory).await
    }
}
