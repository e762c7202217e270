use crate::api::ApiClient;
use crate::api::client::{decode_json, error_parts};
use crate::api::dto::auth::{AuthResponse, ChangePasswordRequest, LoginRequest};
use crate::domain::session::{Session, SessionState, token_expiry};
use crate::domain::user::{UserPayload, UserProfile};
use crate::error::{AppError, Result};
use crate::services::auth_call::{TokenRefresher, reauth_counter, with_reauth};
use crate::storage::{KeyValueStore, NotificationCache, TokenStore};
use async_trait::async_trait;
use opentelemetry::{KeyValue, global, metrics::Counter};
use reqwest::{Method, RequestBuilder, StatusCode};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::{Mutex, watch};
use tokio_stream::wrappers::WatchStream;

#[derive(Clone, Debug)]
struct Metrics {
    login_total: Counter<u64>,
    refresh_total: Counter<u64>,
    logout_total: Counter<u64>,
    reauth_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("projello-client");
        Self {
            login_total: meter
                .u64_counter("session_login_total")
                .with_description("Total number of successful logins")
                .build(),
            refresh_total: meter
                .u64_counter("session_refresh_total")
                .with_description("Total number of refresh token exchanges by outcome")
                .build(),
            logout_total: meter
                .u64_counter("session_logout_total")
                .with_description("Total number of sessions ended locally")
                .build(),
            reauth_total: reauth_counter(),
        }
    }
}

/// Owns the single session of this client and publishes every change to it.
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    tokens: TokenStore,
    notifications: NotificationCache,
    state: watch::Sender<SessionState>,
    refresh_lock: Mutex<()>,
    metrics: Metrics,
}

impl SessionManager {
    /// Restores whatever session the store already holds.
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        let tokens = TokenStore::new(Arc::clone(&store));
        let initial = match tokens.access_token() {
            Some(_) => SessionState::LoggedIn { user: tokens.user().unwrap_or_default() },
            None => SessionState::LoggedOut,
        };
        let (state, _) = watch::channel(initial);
        Self {
            api,
            tokens,
            notifications: NotificationCache::new(store),
            state,
            refresh_lock: Mutex::new(()),
            metrics: Metrics::new(),
        }
    }

    #[must_use]
    pub const fn notifications(&self) -> &NotificationCache {
        &self.notifications
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Stores the exchanged tokens and profile as one session, then publishes it.
    fn establish(&self, access_token: String, refresh_token: Option<String>, user: UserProfile) -> UserProfile {
        let session = Session { access_token, refresh_token, user };
        self.tokens.save_session(&session);
        self.publish(SessionState::LoggedIn { user: session.user.clone() });
        session.user
    }

    /// # Errors
    /// Returns `AppError::InvalidCredentials` on 401/403/404; other statuses map through [`AppError::from_status`].
    #[tracing::instrument(skip(self, password), err(level = "warn"))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let request = self.api.request(Method::POST, "auth/login").json(&LoginRequest { email, password });
        let response = self.api.send(request).await?;
        if !response.status().is_success() {
            let (status, message) = error_parts(response).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                    AppError::InvalidCredentials { status: status.as_u16(), message }
                }
                _ => AppError::from_status(status, message),
            });
        }
        let auth: AuthResponse = decode_json(response).await?;

        let (user, records) = auth.user_response.into_parts();
        self.notifications.clear_all();
        self.notifications.save_notifications(&records);
        let user = self.establish(auth.access_token, auth.refresh_token, user);
        self.metrics.login_total.add(1, &[]);
        tracing::info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Creates an account. Does not log in.
    ///
    /// # Errors
    /// Returns `AppError::Registration` if the backend rejects the payload.
    #[tracing::instrument(skip(self, payload), fields(email = %payload.email), err(level = "warn"))]
    pub async fn register(&self, payload: &UserPayload) -> Result<()> {
        let request = self.api.request(Method::POST, "user/register").json(payload);
        let response = self.api.send(request).await?;
        if response.status().is_success() {
            tracing::info!("Account registered");
            return Ok(());
        }
        let (status, message) = error_parts(response).await;
        Err(if status.is_client_error() {
            AppError::Registration { status: status.as_u16(), message }
        } else {
            AppError::from_status(status, message)
        })
    }

    /// Updates the profile on the backend, then the stored copy.
    ///
    /// # Errors
    /// Returns the error of the authenticated call.
    #[tracing::instrument(skip(self, payload), err(level = "warn"))]
    pub async fn edit_user(&self, payload: &UserPayload) -> Result<String> {
        let api = &self.api;
        let reply = with_reauth(self, &self.metrics.reauth_total, || async move {
            api.send_text(self.bearer(api.request(Method::PUT, "user")).json(payload)).await
        })
        .await?;

        if let Some(mut user) = self.tokens.user() {
            user.username.clone_from(&payload.username);
            user.email.clone_from(&payload.email);
            user.first_name.clone_from(&payload.first_name);
            user.last_name.clone_from(&payload.last_name);
            self.tokens.save_user(&user);
            self.publish(SessionState::LoggedIn { user });
        }
        Ok(reply)
    }

    /// # Errors
    /// Returns `AppError::Unauthorized` carrying the 400/403/404 status when the old password is wrong.
    #[tracing::instrument(skip(self, old_password, new_password), err(level = "warn"))]
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<String> {
        let api = &self.api;
        let body = ChangePasswordRequest { old_password, new_password };
        let body = &body;
        with_reauth(self, &self.metrics.reauth_total, || async move {
            let request = self.bearer(api.request(Method::PUT, "user/change-password")).json(body);
            let response = api.send(request).await?;
            if response.status().is_success() {
                return Ok(response.text().await?);
            }
            let (status, message) = error_parts(response).await;
            Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                    AppError::Unauthorized { status: status.as_u16(), message }
                }
                _ => AppError::from_status(status, message),
            })
        })
        .await
    }

    /// Drops tokens, profile and the notification cache. Never fails and may be repeated.
    pub fn logout(&self) {
        let had_session = self.tokens.access_token().is_some();
        self.tokens.clear();
        self.notifications.clear_all();
        self.publish(SessionState::LoggedOut);
        if had_session {
            self.metrics.logout_total.add(1, &[]);
            tracing::info!("Logged out");
        }
    }

    /// True iff an access token is stored, whether or not it is still valid.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.tokens.access_token().is_some()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.tokens.access_token()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.refresh_token()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.tokens.user()
    }

    /// Unverified expiry of the stored access token, for display.
    #[must_use]
    pub fn token_expiry(&self) -> Option<OffsetDateTime> {
        token_expiry(&self.tokens.access_token()?)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Stream of session states, starting with the current one.
    #[must_use]
    pub fn changes(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.state.subscribe())
    }

    #[must_use]
    pub fn bearer(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn exchange(&self, refresh_token: &str) -> Result<AuthResponse> {
        let request = self.api.request(Method::POST, "auth/refresh").bearer_auth(refresh_token);
        self.api.send_json(request).await
    }

    /// Exchanges the refresh token for a new pair; any failure ends the session.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_tokens(&self) -> bool {
        self.refresh_if_stale(self.tokens.access_token()).await
    }

    /// Refreshes on behalf of a request that was rejected while `rejected` was the access token.
    ///
    /// Callers that arrive while another refresh is in flight wait for it and
    /// reuse its outcome.
    async fn refresh_if_stale(&self, rejected: Option<String>) -> bool {
        let _guard = self.refresh_lock.lock().await;

        let current = self.tokens.access_token();
        if current.is_some() && current != rejected {
            tracing::debug!("Session already refreshed by a concurrent caller");
            return true;
        }

        let Some(refresh_token) = self.tokens.refresh_token() else {
            tracing::warn!("No refresh token stored, ending session");
            self.metrics.refresh_total.add(1, &[KeyValue::new("status", "missing")]);
            self.logout();
            return false;
        };

        let outcome = self.exchange(&refresh_token).await;
        if self.tokens.refresh_token().as_deref() != Some(refresh_token.as_str()) {
            tracing::debug!("Session replaced while refreshing, discarding the exchange");
            self.metrics.refresh_total.add(1, &[KeyValue::new("status", "discarded")]);
            return self.tokens.access_token().is_some();
        }

        match outcome {
            Ok(auth) => {
                // A response without a refresh token keeps the one just used.
                let (user, _) = auth.user_response.into_parts();
                self.establish(auth.access_token, auth.refresh_token.or(Some(refresh_token)), user);
                self.metrics.refresh_total.add(1, &[KeyValue::new("status", "success")]);
                tracing::debug!("Session refreshed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh rejected, ending session");
                self.metrics.refresh_total.add(1, &[KeyValue::new("status", "failure")]);
                self.logout();
                false
            }
        }
    }
}

#[async_trait]
impl TokenRefresher for SessionManager {
    fn access_token(&self) -> Option<String> {
        self.tokens.access_token()
    }

    async fn refresh_rejected(&self, rejected: Option<String>) -> bool {
        self.refresh_if_stale(rejected).await
    }

    fn force_logout(&self) {
        self.logout();
    }
}
