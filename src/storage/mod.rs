use crate::error::Result;

pub mod file;
pub mod keys;
pub mod memory;
pub mod notification_cache;
pub mod preferences;
pub mod token_store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use notification_cache::NotificationCache;
pub use preferences::Preferences;
pub use token_store::TokenStore;

/// Durable string key-value storage backing all persisted client state.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// # Errors
    /// Returns `AppError::Storage` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    /// Returns `AppError::Storage` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// # Errors
    /// Returns `AppError::Storage` if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<()>;

    /// Applies several writes together; `None` removes the key.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if any write fails.
    fn write_batch(&self, ops: &[(&str, Option<&str>)]) -> Result<()> {
        for (key, value) in ops {
            match value {
                Some(value) => self.set(key, value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}
