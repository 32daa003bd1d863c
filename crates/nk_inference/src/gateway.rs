//! Reader-facing wrapper around a [`NewsGateway`].
//!
//! Models report raw failures; the gateway bounds every call with a
//! timeout, validates payloads and turns failures into the messages, or
//! fallbacks, that the reader sees.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream};
use futures_util::StreamExt;
use tracing::{error, warn};

use nk_core::{
    Article, ChatMessage, Error, GalleryImage, NewsGateway, Quote, Result, StockData, TextStream,
    Weather,
};

use crate::{images, models, Config};

pub const JOURNALIST_UNAVAILABLE: &str =
    "The AI journalist is currently unavailable. Please try again later.";
pub const WEATHER_UNAVAILABLE: &str =
    "The weather service is currently unavailable. Please try again later.";
pub const FINANCIAL_NEWS_UNAVAILABLE: &str = "Could not load financial news at the moment.";
pub const MARKET_DATA_UNAVAILABLE: &str = "Could not load market data at the moment.";
pub const IDEA_FALLBACK: &str = "Could not generate an idea. Please try again.";
pub const LIVE_FEED_ERROR: &str = "\n--- ERROR: Could not connect to the live feed service. ---";

pub fn fallback_quote() -> Quote {
    Quote {
        text: "The journey of a thousand miles begins with a single step.".to_string(),
        author: "Lao Tzu".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Gateway {
    model: Arc<dyn NewsGateway>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(model: Arc<dyn NewsGateway>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn from_config(kind: &str, config: &Config) -> Result<Self> {
        Ok(Self::new(models::create_model(kind, config)?, config.timeout))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }

    pub async fn generate_article(&self, topic: &str) -> Result<Article> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Validation { field: "topic" });
        }
        self.call(self.model.generate_article(topic)).await.map_err(|e| {
            error!("Error generating article for topic {:?}: {}", topic, e);
            Error::GatewayUnavailable(JOURNALIST_UNAVAILABLE.to_string())
        })
    }

    /// Weather for `city`. A forecast shorter than five days counts as a
    /// failure.
    pub async fn fetch_weather(&self, city: &str) -> Result<Weather> {
        let result = self.call(self.model.fetch_weather(city)).await.and_then(|weather| {
            if weather.is_complete() {
                Ok(weather)
            } else {
                Err(Error::Inference(
                    "Received malformed weather data from the AI service.".to_string(),
                ))
            }
        });
        result.map_err(|e| {
            error!("Error fetching weather for {}: {}", city, e);
            Error::GatewayUnavailable(WEATHER_UNAVAILABLE.to_string())
        })
    }

    pub async fn fetch_daily_quote(&self) -> Quote {
        match self.call(self.model.fetch_daily_quote()).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Error fetching daily quote: {}", e);
                fallback_quote()
            }
        }
    }

    pub async fn generate_creative_idea(&self) -> String {
        match self.call(self.model.generate_creative_idea()).await {
            Ok(idea) => idea,
            Err(e) => {
                warn!("Error generating creative idea: {}", e);
                IDEA_FALLBACK.to_string()
            }
        }
    }

    pub async fn fetch_financial_news(&self) -> Result<Vec<Article>> {
        self.call(self.model.fetch_financial_news()).await.map_err(|e| {
            error!("Error fetching financial news: {}", e);
            Error::GatewayUnavailable(FINANCIAL_NEWS_UNAVAILABLE.to_string())
        })
    }

    pub async fn fetch_market_data(&self) -> Result<Vec<StockData>> {
        self.call(self.model.fetch_market_data()).await.map_err(|e| {
            error!("Error fetching market data: {}", e);
            Error::GatewayUnavailable(MARKET_DATA_UNAVAILABLE.to_string())
        })
    }

    /// Live updates about `topic`. Only a blank topic is an error; once the
    /// feed is open, any failure arrives as a final [`LIVE_FEED_ERROR`]
    /// fragment.
    pub async fn stream_news_updates(&self, topic: &str) -> Result<BoxStream<'static, String>> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Validation { field: "topic" });
        }
        let opened = self.call(self.model.stream_news_updates(topic)).await;
        let stream = match opened {
            Ok(stream) => bounded(stream, self.timeout),
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        };
        Ok(with_error_fragment(stream, LIVE_FEED_ERROR))
    }

    /// The assistant's reply as a stream of fragments. Failures, including
    /// failing to open the stream, arrive as a final `Err` item.
    pub async fn stream_chat(&self, system_instruction: &str, history: &[ChatMessage]) -> TextStream {
        match self.call(self.model.stream_chat(system_instruction, history)).await {
            Ok(stream) => bounded(stream, self.timeout),
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        }
    }

    pub fn generate_image(&self, prompt: &str) -> String {
        images::generate_image(prompt)
    }

    pub fn generate_image_gallery(&self) -> Vec<GalleryImage> {
        images::generate_image_gallery()
    }
}

/// Fail the stream when no chunk arrives within `limit`. The stream ends
/// after its first error.
fn bounded(stream: TextStream, limit: Duration) -> TextStream {
    let bounded = async_stream::stream! {
        let mut stream = stream;
        loop {
            match tokio::time::timeout(limit, stream.next()).await {
                Ok(Some(Ok(text))) => yield Ok(text),
                Ok(Some(Err(e))) => {
                    yield Err(e);
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    yield Err(Error::Timeout(limit));
                    break;
                }
            }
        }
    };
    bounded.boxed()
}

/// Replace the first error of `stream` with `fragment` and stop there.
pub fn with_error_fragment(stream: TextStream, fragment: &'static str) -> BoxStream<'static, String> {
    let texts = async_stream::stream! {
        let mut stream = stream;
        while let Some(item) = stream.next().await {
            match item {
                Ok(text) => yield text,
                Err(e) => {
                    error!("Stream failed: {}", e);
                    yield fragment.to_string();
                    break;
                }
            }
        }
    };
    texts.boxed()
}
