use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// JSON object on disk, rewritten through a temp file on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the state file, starting empty if it is missing.
    ///
    /// A file that cannot be parsed is logged and treated as empty; it is
    /// overwritten on the next write.
    ///
    /// # Errors
    /// Returns `AppError::Storage` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt state file, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AppError::Storage(format!("read {}: {e}", path.display()))),
        };
        Ok(Self { path, entries: RwLock::new(entries) })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| AppError::Storage(format!("create {}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| AppError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|e| AppError::Storage(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| AppError::Storage(format!("rename {}: {e}", self.path.display())))
    }

    /// Applies `apply` to a copy and keeps it only once it is on disk.
    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| AppError::Storage("state lock poisoned".into()))?;
        let mut next = entries.clone();
        apply(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| AppError::Storage("state lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn write_batch(&self, ops: &[(&str, Option<&str>)]) -> Result<()> {
        self.mutate(|entries| {
            for (key, value) in ops {
                match value {
                    Some(value) => entries.insert((*key).to_string(), (*value).to_string()),
                    None => entries.remove(*key),
                };
            }
        })
    }
}
