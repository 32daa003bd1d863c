use async_trait::async_trait;
use nk_core::{Error, KeyValueStore, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub mod admin;
pub mod backends;
pub mod catalog;
mod collection;
pub mod saved;

pub use admin::{AdminArticles, NewArticle, ADMIN_ARTICLES_KEY};
pub use backends::*;
pub use catalog::ArticleCatalog;
pub use collection::StoreEvent;
pub use saved::{SavedArticles, SAVED_ARTICLES_KEY};

/// A key-value backend that can be built from [`StorageConfig`].
#[async_trait]
pub trait StorageBackend: KeyValueStore + Sized {
    fn get_error_message() -> &'static str;
    async fn from_config(config: &StorageConfig) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    /// `~/.newskit`, or `./.newskit` when no home directory is known.
    pub fn default_dir() -> PathBuf {
        dirs_next::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".newskit")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

async fn build<T: StorageBackend + 'static>(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let backend = T::from_config(config)
        .await
        .map_err(|e| Error::Storage(format!("{} ({})", T::get_error_message(), e)))?;
    Ok(Arc::new(backend))
}

pub async fn create_storage(kind: StorageKind, config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let storage = match kind {
        StorageKind::Memory => build::<InMemoryStorage>(config).await?,
        StorageKind::File => build::<FileStorage>(config).await?,
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => build::<SQLiteStorage>(config).await?,
    };
    info!("🏦 Storage backend initialized (using {})", storage.name());
    Ok(storage)
}

pub mod prelude {
    pub use super::{AdminArticles, ArticleCatalog, NewArticle, SavedArticles, StoreEvent};
    pub use super::{create_storage, StorageConfig, StorageKind};
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_storage_kind_parsing() {
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!("FILE".parse::<StorageKind>().unwrap(), StorageKind::File);
        assert!("postgres".parse::<StorageKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_file_storage() {
        let temp_dir = tempdir().unwrap();
        let config = StorageConfig::new(temp_dir.path().join("data"));
        let storage = create_storage(StorageKind::File, &config).await.unwrap();
        assert_eq!(storage.name(), "file");
        assert!(temp_dir.path().join("data").is_dir());
    }
}
