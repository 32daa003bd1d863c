//! Articles the reader saved for offline reading.

use std::sync::Arc;
use nk_core::{Article, KeyValueStore, Result, Subscription};
use tracing::info;
use crate::collection::{ArticleCollection, StoreEvent};

pub const SAVED_ARTICLES_KEY: &str = "news-kamocodes-saved-articles";

pub struct SavedArticles {
    collection: ArticleCollection,
}

impl SavedArticles {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(backend, SAVED_ARTICLES_KEY)
    }

    pub fn with_key(backend: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            collection: ArticleCollection::new(backend, key),
        }
    }

    /// Saved articles in the order they were saved.
    pub async fn list(&self) -> Vec<Article> {
        self.collection.read_all().await
    }

    pub async fn has(&self, id: &str) -> bool {
        self.collection.read_all().await.iter().any(|a| a.id == id)
    }

    /// Save `article` unless an article with the same id is already saved.
    pub async fn save(&self, article: &Article) -> Result<()> {
        let key = self.collection.key();
        self.collection
            .update(|articles| {
                if articles.iter().any(|a| a.id == article.id) {
                    return ((), None);
                }
                articles.push(article.clone());
                info!("🔖 Saved article {}: {}", article.id, article.title);
                ((), Some(StoreEvent::Added { collection: key, id: article.id.clone() }))
            })
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let key = self.collection.key();
        self.collection
            .update(|articles| {
                let before = articles.len();
                articles.retain(|a| a.id != id);
                if articles.len() == before {
                    return ((), None);
                }
                info!("🗑️ Removed saved article {}", id);
                ((), Some(StoreEvent::Removed { collection: key, id: id.to_string() }))
            })
            .await
    }

    /// Flip the saved state of `article`, returning whether it is now saved.
    pub async fn toggle(&self, article: &Article) -> Result<bool> {
        let key = self.collection.key();
        self.collection
            .update(|articles| {
                if let Some(pos) = articles.iter().position(|a| a.id == article.id) {
                    articles.remove(pos);
                    (false, Some(StoreEvent::Removed { collection: key, id: article.id.clone() }))
                } else {
                    articles.push(article.clone());
                    (true, Some(StoreEvent::Added { collection: key, id: article.id.clone() }))
                }
            })
            .await
    }

    /// Get notified whenever the saved list changes.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.collection.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::InMemoryStorage;
    use crate::test_support::sample_article;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> (Arc<InMemoryStorage>, SavedArticles) {
        let backend = Arc::new(InMemoryStorage::new());
        let store = SavedArticles::new(backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let (_, store) = store();
        let article = sample_article("a1");

        store.save(&article).await.unwrap();
        store.save(&article).await.unwrap();

        let saved = store.list().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "a1");
        assert!(store.has("a1").await);
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let (_, store) = store();
        store.save(&sample_article("a1")).await.unwrap();
        let before = store.list().await;

        store.remove("nope").await.unwrap();
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn test_save_then_remove_restores_state() {
        let (_, store) = store();
        store.save(&sample_article("a1")).await.unwrap();
        let before = store.list().await;

        let article = sample_article("a2");
        store.save(&article).await.unwrap();
        store.remove(&article.id).await.unwrap();

        assert_eq!(store.list().await, before);
        assert!(!store.has("a2").await);
    }

    #[tokio::test]
    async fn test_insertion_order() {
        let (_, store) = store();
        for id in ["c", "a", "b"] {
            store.save(&sample_article(id)).await.unwrap();
        }
        let ids: Vec<_> = store.list().await.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_toggle() {
        let (_, store) = store();
        let article = sample_article("t1");
        assert!(store.toggle(&article).await.unwrap());
        assert!(store.has("t1").await);
        assert!(!store.toggle(&article).await.unwrap());
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_reads_as_empty() {
        let (backend, store) = store();
        backend.set(SAVED_ARTICLES_KEY, "{not json").await.unwrap();

        assert!(store.list().await.is_empty());
        assert!(!store.has("a1").await);

        // No-op removes leave the record alone.
        for _ in 0..3 {
            store.remove("absent").await.unwrap();
        }
        let backups = |keys: Vec<String>| keys.into_iter().filter(|k| k.contains(".corrupt-")).count();
        assert_eq!(backups(backend.keys().await), 0);
        assert_eq!(backend.get(SAVED_ARTICLES_KEY).await.unwrap().as_deref(), Some("{not json"));

        // The first real write keeps exactly one copy of the unreadable record.
        store.save(&sample_article("a1")).await.unwrap();
        store.save(&sample_article("a2")).await.unwrap();
        assert_eq!(store.list().await.len(), 2);
        let keys = backend.keys().await;
        assert!(keys.iter().any(|k| k.starts_with("news-kamocodes-saved-articles.corrupt-")));
        assert_eq!(backups(keys), 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_one_entry() {
        let (_, store) = store();
        let store = Arc::new(store);
        let article = sample_article("dup");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let article = article.clone();
                tokio::spawn(async move { store.save(&article).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_distinct_saves_are_not_lost() {
        let (_, store) = store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.save(&sample_article(&format!("id-{}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list().await.len(), 16);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (_, store) = store();
        let changes = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        let sub = store.subscribe(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });

        let article = sample_article("s1");
        store.save(&article).await.unwrap();
        store.save(&article).await.unwrap();
        store.remove("s1").await.unwrap();
        assert_eq!(changes.load(Ordering::SeqCst), 2);

        drop(sub);
        store.save(&article).await.unwrap();
        assert_eq!(changes.load(Ordering::SeqCst), 2);
    }
}
