use async_trait::async_trait;
use nk_core::{Error, KeyValueStore, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::{StorageBackend, StorageConfig};

/// One `<key>.json` file per record inside a data directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub async fn new_with_path(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Storage(format!("Failed to create data directory {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn get_dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains(['/', '\\', '\0'])
            || key.starts_with('.')
        {
            return Err(Error::Storage(format!("Invalid record name: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    fn get_error_message() -> &'static str {
        "Data directory should be writable"
    }

    async fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(&config.data_dir).await
    }
}

#[async_trait]
impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.record_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.record_path(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let temp_dir = tempdir().unwrap();

        let storage = FileStorage::new_with_path(temp_dir.path()).await.unwrap();
        storage.set("records", "[1,2]").await.unwrap();
        drop(storage);

        let reopened = FileStorage::new_with_path(temp_dir.path()).await.unwrap();
        assert_eq!(reopened.get("records").await.unwrap().as_deref(), Some("[1,2]"));
        assert!(temp_dir.path().join("records.json").exists());
        assert!(!temp_dir.path().join("records.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_and_remove() {
        let temp_dir = tempdir().unwrap();
        let storage = FileStorage::new_with_path(temp_dir.path().join("nested")).await.unwrap();

        assert_eq!(storage.get("absent").await.unwrap(), None);
        storage.remove("absent").await.unwrap();

        storage.set("present", "x").await.unwrap();
        storage.remove("present").await.unwrap();
        assert_eq!(storage.get("present").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp_dir = tempdir().unwrap();
        let storage = FileStorage::new_with_path(temp_dir.path()).await.unwrap();
        assert!(storage.set("../escape", "x").await.is_err());
        assert!(storage.get("").await.is_err());
    }
}
