use crate::domain::notification::NotificationRecord;
use crate::storage::{KeyValueStore, keys};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Locally cached notifications of the logged-in user and their read state.
///
/// The unread counter is stored alongside the list and recomputed on every
/// save as `cached - already read`. Storage failures are logged and read as
/// empty.
#[derive(Debug, Clone)]
pub struct NotificationCache {
    store: Arc<dyn KeyValueStore>,
}

impl NotificationCache {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read notification key");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .inspect_err(|e| tracing::warn!(key, error = %e, "Corrupt notification key, ignoring it"))
            .ok()
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|e| crate::error::AppError::Storage(e.to_string()))
            .and_then(|raw| self.store.set(key, &raw));
        if let Err(e) = result {
            tracing::error!(key, error = %e, "Failed to persist notification key");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::error!(key, error = %e, "Failed to remove notification key");
        }
    }

    /// Persists the list, keeping the first occurrence of each id.
    pub fn save_notifications(&self, notifies: &[NotificationRecord]) {
        let mut seen = HashSet::new();
        let unique: Vec<&NotificationRecord> = notifies.iter().filter(|n| seen.insert(n.id.as_str())).collect();
        tracing::debug!(received = notifies.len(), kept = unique.len(), "Saving notifications");

        self.write_json(keys::NOTIFICATIONS, &unique);

        let read = self.read_ids();
        let unread = unique.iter().filter(|n| !read.contains(&n.id)).count();
        self.write_json(keys::UNREAD_COUNT, &unread);
    }

    #[must_use]
    pub fn local_notifications(&self) -> Vec<NotificationRecord> {
        self.read_json(keys::NOTIFICATIONS).unwrap_or_default()
    }

    /// Removes the cached list only; the read-set and counter stay until the next save.
    pub fn clear_local_notifications(&self) {
        self.remove(keys::NOTIFICATIONS);
    }

    /// Drops the list, read-set and counter.
    pub fn clear_all(&self) {
        let ops = [(keys::NOTIFICATIONS, None), (keys::READ_NOTIFICATION_IDS, None), (keys::UNREAD_COUNT, None)];
        if let Err(e) = self.store.write_batch(&ops) {
            tracing::error!(error = %e, "Failed to clear notification cache");
        }
    }

    #[must_use]
    pub fn read_ids(&self) -> BTreeSet<String> {
        self.read_json(keys::READ_NOTIFICATION_IDS).unwrap_or_default()
    }

    /// Stored unread counter, or a fresh count if none is stored.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.read_json(keys::UNREAD_COUNT).unwrap_or_else(|| {
            let read = self.read_ids();
            self.local_notifications().iter().filter(|n| !read.contains(&n.id)).count()
        })
    }

    pub fn mark_read(&self, id: &str) {
        let mut read = self.read_ids();
        if read.insert(id.to_string()) {
            self.write_json(keys::READ_NOTIFICATION_IDS, &read);
            self.save_notifications(&self.local_notifications());
        }
    }

    pub fn mark_all_read(&self) {
        let mut read = self.read_ids();
        read.extend(self.local_notifications().into_iter().map(|n| n.id));
        self.write_json(keys::READ_NOTIFICATION_IDS, &read);
        self.save_notifications(&self.local_notifications());
    }

    /// Returns false if no cached notification had that id.
    pub fn delete_notification(&self, id: &str) -> bool {
        let mut notifies = self.local_notifications();
        let before = notifies.len();
        notifies.retain(|n| n.id != id);
        let removed = notifies.len() != before;
        self.save_notifications(&notifies);
        removed
    }

    pub fn delete_all_notifications(&self) {
        self.clear_local_notifications();
    }
}
