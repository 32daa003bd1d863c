//! Editorial backlog written through the admin console.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use chrono::Utc;
use nk_core::content::parse_full_content;
use nk_core::{Article, Error, KeyValueStore, Result, Subscription};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::collection::{ArticleCollection, StoreEvent};

pub const ADMIN_ARTICLES_KEY: &str = "news-kamocodes-admin-articles";

/// Form input for a new admin article. `full_content_text` uses the
/// line syntax understood by [`parse_full_content`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub full_content_text: String,
    pub category: String,
    pub image_url: String,
    pub source_url: String,
    pub source_name: String,
}

impl NewArticle {
    /// Every field is required.
    pub fn validate(&self) -> Result<()> {
        let fields: [(&'static str, &str); 7] = [
            ("title", &self.title),
            ("summary", &self.summary),
            ("fullContent", &self.full_content_text),
            ("category", &self.category),
            ("imageUrl", &self.image_url),
            ("sourceUrl", &self.source_url),
            ("sourceName", &self.source_name),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(Error::Validation { field: *field }),
            None => Ok(()),
        }
    }
}

/// Milliseconds since the epoch.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub struct AdminArticles {
    collection: ArticleCollection,
    clock: Clock,
    last_issued: AtomicI64,
}

impl fmt::Debug for AdminArticles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminArticles")
            .field("key", &self.collection.key())
            .field("last_issued", &self.last_issued.load(Ordering::SeqCst))
            .finish()
    }
}

impl AdminArticles {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(backend, Arc::new(|| Utc::now().timestamp_millis()))
    }

    pub fn with_clock(backend: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self {
            collection: ArticleCollection::new(backend, ADMIN_ARTICLES_KEY),
            clock,
            last_issued: AtomicI64::new(0),
        }
    }

    pub async fn list(&self) -> Vec<Article> {
        self.collection.read_all().await
    }

    /// Validate, assign a fresh id, parse the body and append.
    pub async fn create(&self, input: NewArticle) -> Result<Article> {
        input.validate()?;

        let key = self.collection.key();
        self.collection
            .update(|articles| {
                let id = self.next_id(articles);
                let article = Article {
                    id: id.to_string(),
                    title: input.title.trim().to_string(),
                    summary: input.summary.trim().to_string(),
                    full_content: parse_full_content(&input.full_content_text),
                    category: input.category.trim().to_string(),
                    image_url: input.image_url.trim().to_string(),
                    source_url: input.source_url.trim().to_string(),
                    source_name: input.source_name.trim().to_string(),
                    grounding_urls: None,
                };
                articles.push(article.clone());
                info!("📝 Created admin article {}: {}", article.id, article.title);
                let event = StoreEvent::Added { collection: key, id: article.id.clone() };
                (article, Some(event))
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let key = self.collection.key();
        self.collection
            .update(|articles| {
                let before = articles.len();
                articles.retain(|a| a.id != id);
                if articles.len() == before {
                    return ((), None);
                }
                info!("🗑️ Deleted admin article {}", id);
                ((), Some(StoreEvent::Removed { collection: key, id: id.to_string() }))
            })
            .await
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.collection.subscribe(callback)
    }

    // Called with the collection lock held. Ids stay creation timestamps but
    // are bumped past anything already issued or persisted.
    fn next_id(&self, existing: &[Article]) -> i64 {
        let newest_persisted = existing
            .iter()
            .filter_map(|a| a.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        let id = (self.clock)()
            .max(newest_persisted + 1)
            .max(self.last_issued.load(Ordering::SeqCst) + 1);
        self.last_issued.store(id, Ordering::SeqCst);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::InMemoryStorage;
    use nk_core::ContentBlock;

    fn input(title: &str, body: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            summary: format!("{} summary", title),
            full_content_text: body.to_string(),
            category: "Technology".to_string(),
            image_url: "https://example.com/image.jpg".to_string(),
            source_url: "https://example.com".to_string(),
            source_name: "Reuters".to_string(),
        }
    }

    fn frozen_store(now: i64) -> AdminArticles {
        AdminArticles::with_clock(Arc::new(InMemoryStorage::new()), Arc::new(move || now))
    }

    #[tokio::test]
    async fn test_create_parses_body() {
        let store = AdminArticles::new(Arc::new(InMemoryStorage::new()));
        let article = store
            .create(input("Launch", "## Title\nBody line\n> A quote\n"))
            .await
            .unwrap();

        assert_eq!(
            article.full_content,
            vec![
                ContentBlock::Subheading("Title".to_string()),
                ContentBlock::Paragraph("Body line".to_string()),
                ContentBlock::Quote("A quote".to_string()),
            ]
        );
        assert_eq!(store.list().await, vec![article]);
    }

    #[tokio::test]
    async fn test_same_millisecond_ids_differ() {
        let store = frozen_store(1_700_000_000_000);
        let a = store.create(input("A", "a")).await.unwrap();
        let b = store.create(input("B", "b")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.id, "1700000000000");
        assert_eq!(b.id, "1700000000001");
    }

    #[tokio::test]
    async fn test_ids_stay_unique_across_instances() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(InMemoryStorage::new());
        let first = AdminArticles::with_clock(backend.clone(), Arc::new(|| 42));
        let a = first.create(input("A", "a")).await.unwrap();

        // A new instance over the same record with a clock running behind.
        let second = AdminArticles::with_clock(backend, Arc::new(|| 10));
        let b = second.create(input("B", "b")).await.unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(b.id, "43");
    }

    #[tokio::test]
    async fn test_create_create_delete() {
        let store = AdminArticles::new(Arc::new(InMemoryStorage::new()));
        let a = store.create(input("A", "first")).await.unwrap();
        let b = store.create(input("B", "second")).await.unwrap();

        store.delete(&a.id).await.unwrap();
        assert_eq!(store.list().await, vec![b]);

        store.delete(&a.id).await.unwrap();
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_validation_blocks_write() {
        let store = AdminArticles::new(Arc::new(InMemoryStorage::new()));
        let mut missing = input("A", "body");
        missing.source_name = "   ".to_string();

        let err = store.create(missing).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "sourceName" }));
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_created_id_carries_date() {
        let store = frozen_store(1_705_276_800_000);
        let article = store.create(input("Dated", "body")).await.unwrap();
        assert_eq!(
            article.published_on(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }
}
