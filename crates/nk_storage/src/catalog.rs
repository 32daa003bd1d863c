//! Bundled news articles shipped next to the app as `articles.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use nk_core::cache::Cache;
use nk_core::{Article, Result};
use tracing::{debug, error};

const CACHE_KEY: &str = "catalog:articles";
const BREAKING_NEWS_COUNT: usize = 3;

pub struct ArticleCatalog {
    path: PathBuf,
    cache: Arc<dyn Cache<Vec<Article>>>,
    ttl: Duration,
}

impl ArticleCatalog {
    pub fn new(path: impl AsRef<Path>, cache: Arc<dyn Cache<Vec<Article>>>, ttl: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache,
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<Vec<Article>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Every bundled article; a missing or malformed file yields none.
    pub async fn articles(&self) -> Vec<Article> {
        if let Some(articles) = self.cache.load(CACHE_KEY) {
            return articles;
        }
        match self.read_file().await {
            Ok(articles) => {
                debug!("📚 Loaded {} articles from {}", articles.len(), self.path.display());
                self.cache.save(CACHE_KEY, articles.clone(), self.ttl);
                articles
            }
            Err(e) => {
                error!("Error loading local articles from {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    pub async fn fetch_news(&self) -> Vec<Article> {
        self.articles().await.into_iter().take(BREAKING_NEWS_COUNT).collect()
    }

    pub async fn fetch_trending_news(&self) -> Vec<Article> {
        self.articles().await
    }

    pub async fn fetch_library(&self) -> Vec<Article> {
        self.articles().await
    }

    /// The bundled articles presented as how-to guides.
    pub async fn fetch_how_to_guides(&self) -> Vec<Article> {
        self.articles()
            .await
            .into_iter()
            .map(|a| Article {
                id: format!("howto-{}", a.id),
                category: "How-To".to_string(),
                ..a
            })
            .collect()
    }

    pub fn invalidate(&self) {
        self.cache.invalidate(CACHE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_article;
    use nk_core::cache::{MemoryCache, NoopCache};
    use tempfile::tempdir;

    async fn write_catalog(dir: &Path, count: usize) -> PathBuf {
        let articles: Vec<_> = (0..count).map(|i| sample_article(&i.to_string())).collect();
        let path = dir.join("articles.json");
        tokio::fs::write(&path, serde_json::to_string(&articles).unwrap()).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_breaking_news_is_first_three() {
        let temp_dir = tempdir().unwrap();
        let path = write_catalog(temp_dir.path(), 5).await;
        let catalog = ArticleCatalog::new(path, Arc::new(NoopCache), Duration::from_secs(60));

        let ids: Vec<_> = catalog.fetch_news().await.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(catalog.fetch_trending_news().await.len(), 5);
    }

    #[tokio::test]
    async fn test_how_to_guides() {
        let temp_dir = tempdir().unwrap();
        let path = write_catalog(temp_dir.path(), 2).await;
        let catalog = ArticleCatalog::new(path, Arc::new(NoopCache), Duration::from_secs(60));

        let guides = catalog.fetch_how_to_guides().await;
        assert_eq!(guides[0].id, "howto-0");
        assert!(guides.iter().all(|g| g.category == "How-To"));
    }

    #[tokio::test]
    async fn test_cache_serves_after_file_is_gone() {
        let temp_dir = tempdir().unwrap();
        let path = write_catalog(temp_dir.path(), 2).await;
        let catalog = ArticleCatalog::new(&path, Arc::new(MemoryCache::new()), Duration::from_secs(60));

        assert_eq!(catalog.articles().await.len(), 2);
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(catalog.articles().await.len(), 2);

        catalog.invalidate();
        assert!(catalog.articles().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("articles.json");
        tokio::fs::write(&path, "<html>").await.unwrap();
        let catalog = ArticleCatalog::new(path, Arc::new(NoopCache), Duration::from_secs(60));
        assert!(catalog.fetch_library().await.is_empty());
    }
}
