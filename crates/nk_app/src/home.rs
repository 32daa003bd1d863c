//! Home feed loading.

use std::sync::Arc;

use nk_core::{Article, Weather};
use nk_inference::Gateway;
use nk_storage::{ArticleCatalog, SavedArticles};
use tracing::info;

pub const DEFAULT_CITY: &str = "Johannesburg";
pub const SAVED_SIDEBAR_LIMIT: usize = 5;

/// Everything the home view shows. Each slot is filled on its own, so one
/// failing source never blanks the others.
#[derive(Debug)]
pub struct HomeFeed {
    pub breaking: Vec<Article>,
    pub trending: Vec<Article>,
    pub weather: std::result::Result<Weather, String>,
    pub saved: Vec<Article>,
}

#[derive(Clone)]
pub struct HomeFeedLoader {
    catalog: Arc<ArticleCatalog>,
    gateway: Gateway,
    saved: Arc<SavedArticles>,
    city: String,
}

impl HomeFeedLoader {
    pub fn new(catalog: Arc<ArticleCatalog>, gateway: Gateway, saved: Arc<SavedArticles>) -> Self {
        Self {
            catalog,
            gateway,
            saved,
            city: DEFAULT_CITY.to_string(),
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub async fn load(&self) -> HomeFeed {
        let (breaking, trending, weather, saved) = tokio::join!(
            self.catalog.fetch_news(),
            self.catalog.fetch_trending_news(),
            self.gateway.fetch_weather(&self.city),
            self.saved.list(),
        );
        info!(
            "📰 Home feed: {} breaking, {} trending, {} saved",
            breaking.len(),
            trending.len(),
            saved.len()
        );

        HomeFeed {
            breaking,
            trending,
            weather: weather.map_err(|e| e.to_string()),
            saved: saved.into_iter().take(SAVED_SIDEBAR_LIMIT).collect(),
        }
    }
}
