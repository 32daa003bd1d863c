use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use crate::types::{Article, ChatMessage, Quote, StockData, Weather};
use crate::Result;

/// Lazy, finite, non-restartable sequence of generated text fragments.
pub type TextStream = BoxStream<'static, Result<String>>;

/// The external generative service behind every AI panel.
#[async_trait]
pub trait NewsGateway: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Write a news article about `topic`.
    async fn generate_article(&self, topic: &str) -> Result<Article>;

    /// Current conditions and a five day forecast for `city`.
    async fn fetch_weather(&self, city: &str) -> Result<Weather>;

    async fn fetch_daily_quote(&self) -> Result<Quote>;

    async fn generate_creative_idea(&self) -> Result<String>;

    /// Today's top market-moving stories.
    async fn fetch_financial_news(&self) -> Result<Vec<Article>>;

    async fn fetch_market_data(&self) -> Result<Vec<StockData>>;

    /// Stream timestamped live updates about `topic`.
    async fn stream_news_updates(&self, topic: &str) -> Result<TextStream>;

    /// Stream the assistant's reply to the last message of `history`.
    async fn stream_chat(&self, system_instruction: &str, history: &[ChatMessage]) -> Result<TextStream>;
}
