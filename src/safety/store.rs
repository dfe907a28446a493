//! Persisted key-value flags.
//!
//! The acknowledgment outlives any single session, so it lives behind a
//! store trait rather than in ambient global state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex as TokioMutex;

/// External key-value collaborator for boolean flags.
///
/// Scope is process/account-wide. Implementations report failures; callers
/// decide how to degrade.
#[async_trait]
pub trait AcknowledgmentStore: Send + Sync {
    /// Read a flag. Missing keys are `false`.
    async fn get(&self, key: &str) -> anyhow::Result<bool>;

    /// Write a flag.
    async fn set(&self, key: &str, value: bool) -> anyhow::Result<()>;

    /// Remove a flag entirely.
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Flags persisted as a JSON object in `<data_dir>/flags.json`.
///
/// The file is re-read on every `get` so a flag cleared elsewhere (for
/// example on account change) takes effect for the next session.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: TokioMutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("flags.json"),
            write_lock: TokioMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> anyhow::Result<HashMap<String, bool>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {:?}", self.path))?;

        serde_json::from_str(&contents).with_context(|| format!("Corrupt flag file {:?}", self.path))
    }

    async fn save(&self, flags: &HashMap<String, bool>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(flags)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::debug!("[safety] Saved flags to {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl AcknowledgmentStore for JsonFileStore {
    async fn get(&self, key: &str) -> anyhow::Result<bool> {
        let flags = self.load().await?;
        Ok(flags.get(key).copied().unwrap_or(false))
    }

    async fn set(&self, key: &str, value: bool) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut flags = self.load().await.unwrap_or_else(|e| {
            tracing::warn!("[safety] Rewriting unreadable flag file: {:#}", e);
            HashMap::new()
        });
        flags.insert(key.to_string(), value);
        self.save(&flags).await
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut flags = self.load().await?;
        if flags.remove(key).is_some() {
            self.save(&flags).await?;
        }
        Ok(())
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    flags: parking_lot::Mutex<HashMap<String, bool>>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every operation fails.
    #[cfg(test)]
    pub fn failing() -> Self {
        Self {
            flags: parking_lot::Mutex::new(HashMap::new()),
            failing: true,
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing {
            anyhow::bail!("flag storage unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl AcknowledgmentStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<bool> {
        self.check()?;
        Ok(self.flags.lock().get(key).copied().unwrap_or(false))
    }

    async fn set(&self, key: &str, value: bool) -> anyhow::Result<()> {
        self.check()?;
        self.flags.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.check()?;
        self.flags.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_missing_file_reads_false() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path());
        assert!(!store.get("anything").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_set_get_remove() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(&temp.path().join("data"));

        store.set("flag", true).await.unwrap();
        assert!(store.get("flag").await.unwrap());

        // A second store over the same directory sees the persisted value
        let other = JsonFileStore::new(&temp.path().join("data"));
        assert!(other.get("flag").await.unwrap());

        other.remove("flag").await.unwrap();
        assert!(!store.get("flag").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path());
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(store.get("flag").await.is_err());

        // Writing recovers the file
        store.set("flag", true).await.unwrap();
        assert!(store.get("flag").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(!store.get("k").await.unwrap());
        store.set("k", true).await.unwrap();
        assert!(store.get("k").await.unwrap());
        store.remove("k").await.unwrap();
        assert!(!store.get("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_memory_store() {
        let store = MemoryStore::failing();
        assert!(store.get("k").await.is_err());
        assert!(store.set("k", true).await.is_err());
    }
}
