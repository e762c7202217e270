use crate::storage::{KeyValueStore, keys};
use std::sync::Arc;

/// UI-only flags. Not part of the session and untouched by logout.
#[derive(Debug, Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn sidebar_collapsed(&self) -> bool {
        match self.store.get(keys::SIDEBAR_COLLAPSED) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read sidebar flag");
                false
            }
        }
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        if let Err(e) = self.store.set(keys::SIDEBAR_COLLAPSED, if collapsed { "true" } else { "false" }) {
            tracing::error!(error = %e, "Failed to persist sidebar flag");
        }
    }
}
