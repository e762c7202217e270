use crate::api::ApiClient;
use crate::api::dto::notify::NotifyDto;
use crate::domain::notification::NotificationRecord;
use crate::error::Result;
use crate::services::auth_call::AuthenticatedCall;
use crate::storage::NotificationCache;
use reqwest::Method;

/// Backend notifications mirrored into the local cache.
#[derive(Clone, Debug)]
pub struct NotificationService {
    api: ApiClient,
    auth: AuthenticatedCall,
    cache: NotificationCache,
}

impl NotificationService {
    #[must_use]
    pub const fn new(api: ApiClient, auth: AuthenticatedCall, cache: NotificationCache) -> Self {
        Self { api, auth, cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &NotificationCache {
        &self.cache
    }

    /// Replaces the cached list with the backend's; the read-set is kept.
    ///
    /// # Errors
    /// Returns the error of the authenticated call. The cache is untouched on failure.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn sync(&self) -> Result<Vec<NotificationRecord>> {
        let (api, auth) = (&self.api, &self.auth);
        let notifies: Vec<NotifyDto> = auth
            .execute(|| async move { api.send_json(auth.bearer(api.request(Method::GET, "notify"))).await })
            .await?;
        let records: Vec<NotificationRecord> = notifies.into_iter().filter_map(NotifyDto::into_record).collect();
        self.cache.save_notifications(&records);
        tracing::debug!(count = records.len(), unread = self.cache.unread_count(), "Notifications synced");
        Ok(self.cache.local_notifications())
    }

    /// Deletes on the backend first, then locally.
    ///
    /// # Errors
    /// Returns the error of the authenticated call. The cache is untouched on failure.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let (api, auth) = (&self.api, &self.auth);
        let path = format!("notify/{id}");
        let path = path.as_str();
        auth.execute(|| async move { api.send_empty(auth.bearer(api.request(Method::DELETE, path))).await })
            .await?;
        if !self.cache.delete_notification(id) {
            tracing::debug!(notification_id = %id, "Deleted notification was not cached");
        }
        Ok(())
    }
}
