use std::sync::Arc;
use chrono::Utc;
use nk_core::{Article, KeyValueStore, Listeners, Result, Subscription};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added { collection: &'static str, id: String },
    Removed { collection: &'static str, id: String },
}

/// One JSON array of articles kept under a single record.
///
/// Mutations hold `lock` across the whole read-modify-write so concurrent
/// callers in one process never lose each other's updates.
pub(crate) struct ArticleCollection {
    backend: Arc<dyn KeyValueStore>,
    key: &'static str,
    lock: Mutex<()>,
    listeners: Listeners<StoreEvent>,
}

enum Loaded {
    Missing,
    Articles(Vec<Article>),
    Corrupt(String, serde_json::Error),
}

impl ArticleCollection {
    pub(crate) fn new(backend: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            backend,
            key,
            lock: Mutex::new(()),
            listeners: Listeners::new(),
        }
    }

    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    async fn load(&self) -> Result<Loaded> {
        let raw = match self.backend.get(self.key).await? {
            Some(raw) => raw,
            None => return Ok(Loaded::Missing),
        };
        match serde_json::from_str::<Vec<Article>>(&raw) {
            Ok(articles) => Ok(Loaded::Articles(articles)),
            Err(e) => Ok(Loaded::Corrupt(raw, e)),
        }
    }

    /// All articles in insertion order. Unreadable records read as empty.
    pub(crate) async fn read_all(&self) -> Vec<Article> {
        match self.load().await {
            Ok(Loaded::Articles(articles)) => articles,
            Ok(Loaded::Missing) => Vec::new(),
            Ok(Loaded::Corrupt(_, e)) => {
                warn!("Could not parse {} from {}: {}", self.key, self.backend.name(), e);
                Vec::new()
            }
            Err(e) => {
                warn!("Could not read {} from {}: {}", self.key, self.backend.name(), e);
                Vec::new()
            }
        }
    }

    /// Run `change` against the current list and persist the result when it
    /// reports a modification.
    pub(crate) async fn update<R, F>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Article>) -> (R, Option<StoreEvent>),
    {
        let _guard = self.lock.lock().await;

        let (mut articles, corrupt) = match self.load().await? {
            Loaded::Articles(articles) => (articles, None),
            Loaded::Missing => (Vec::new(), None),
            Loaded::Corrupt(raw, e) => {
                warn!("Record {} is corrupt ({}); treating it as empty", self.key, e);
                (Vec::new(), Some(raw))
            }
        };

        let (result, event) = change(&mut articles);
        if let Some(event) = event {
            // Keep the unreadable record around instead of silently overwriting it.
            if let Some(raw) = corrupt {
                let backup_key = format!("{}.corrupt-{}", self.key, Utc::now().timestamp_millis());
                warn!("Moving corrupt record {} to {} before writing", self.key, backup_key);
                self.backend.set(&backup_key, &raw).await?;
            }
            let json = serde_json::to_string(&articles)?;
            self.backend.set(self.key, &json).await?;
            debug!("💾 {} now holds {} articles", self.key, articles.len());
            self.listeners.emit(&event);
        }
        Ok(result)
    }
}
