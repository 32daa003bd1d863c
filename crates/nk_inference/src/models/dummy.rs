use std::fmt;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::stream;
use futures_util::StreamExt;

use nk_core::{
    Article, ChatMessage, ChatRole, ContentBlock, CurrentConditions, ForecastDay, NewsGateway,
    Quote, Result, StockData, TextStream, Weather,
};

use crate::images::generate_image;

const IDEAS: [&str; 4] = [
    "A story about a lost robot in a forest",
    "An app that identifies plants from photos",
    "A podcast where retired athletes review modern training gear",
    "A neighbourhood map of the best street food, updated by vendors",
];

/// Offline model returning canned but topic-aware content, for demos and
/// tests without network access.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

fn checksum(text: &str) -> usize {
    text.bytes().map(usize::from).sum()
}

fn fragments(parts: Vec<String>) -> TextStream {
    stream::iter(parts.into_iter().map(Ok)).boxed()
}

#[async_trait]
impl NewsGateway for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_article(&self, topic: &str) -> Result<Article> {
        let topic = topic.trim();
        Ok(Article {
            id: format!("gen-{}", Utc::now().timestamp_millis()),
            title: format!("What we know so far: {}", topic),
            summary: format!("An offline briefing on {}.", topic),
            full_content: vec![
                ContentBlock::Paragraph(format!(
                    "Reports about {} continue to develop as more details emerge.",
                    topic
                )),
                ContentBlock::Subheading("Background".to_string()),
                ContentBlock::Paragraph(format!(
                    "Observers say {} has drawn attention from several quarters.",
                    topic
                )),
                ContentBlock::Quote("It is too early to draw conclusions.".to_string()),
            ],
            category: "World News".to_string(),
            image_url: generate_image(topic),
            source_url: "#".to_string(),
            source_name: "Generated offline".to_string(),
            grounding_urls: Some(Vec::new()),
        })
    }

    async fn fetch_weather(&self, city: &str) -> Result<Weather> {
        let base = 18.0 + (checksum(city) % 10) as f64;
        let conditions = ["Sunny", "Partly Cloudy", "Light showers", "Overcast", "Clear"];
        let today = Utc::now().date_naive();
        let forecast = (0..Weather::FORECAST_DAYS)
            .map(|i| ForecastDay {
                day_of_week: if i == 0 {
                    "Today".to_string()
                } else {
                    (today + ChronoDuration::days(i as i64)).format("%A").to_string()
                },
                high_temp: base + i as f64,
                low_temp: base - 8.0 + i as f64,
                condition: conditions[i % conditions.len()].to_string(),
            })
            .collect();

        Ok(Weather {
            current: CurrentConditions {
                city: city.trim().to_string(),
                temperature: base,
                condition: conditions[0].to_string(),
                humidity: 45.0,
                wind_speed: "12 km/h".to_string(),
            },
            forecast,
        })
    }

    async fn fetch_daily_quote(&self) -> Result<Quote> {
        Ok(Quote {
            text: "Well done is better than well said.".to_string(),
            author: "Benjamin Franklin".to_string(),
        })
    }

    async fn generate_creative_idea(&self) -> Result<String> {
        let index = Utc::now().timestamp_millis().unsigned_abs() as usize % IDEAS.len();
        Ok(IDEAS[index].to_string())
    }

    async fn fetch_financial_news(&self) -> Result<Vec<Article>> {
        let now = Utc::now().timestamp_millis();
        let stories = [
            ("Central bank holds rates steady", "Markets"),
            ("Tech shares lead global rally", "Stocks"),
            ("Oil slips as supply concerns ease", "Commodities"),
            ("Rand firms against the dollar", "Currencies"),
            ("Retail sales beat expectations", "Economy"),
        ];
        Ok(stories
            .iter()
            .enumerate()
            .map(|(index, (title, category))| {
                let summary = format!("{}. Offline digest, figures are illustrative.", title);
                Article {
                    id: format!("finance-{}-{}", now, index),
                    title: title.to_string(),
                    full_content: vec![ContentBlock::Paragraph(summary.clone())],
                    summary,
                    category: category.to_string(),
                    image_url: generate_image(category),
                    source_url: "#".to_string(),
                    source_name: "Offline Wire".to_string(),
                    grounding_urls: None,
                }
            })
            .collect())
    }

    async fn fetch_market_data(&self) -> Result<Vec<StockData>> {
        let rows = [
            ("DJIA", "Dow Jones Industrial Average", "38,996.39", "+62.42", "+0.16%"),
            ("IXIC", "NASDAQ Composite", "16,091.92", "-42.30", "-0.26%"),
            ("GSPC", "S&P 500", "5,137.08", "+40.81", "+0.80%"),
            ("AAPL", "Apple Inc.", "179.66", "-1.76", "-0.97%"),
        ];
        Ok(rows
            .iter()
            .map(|(symbol, name, price, change, change_percent)| StockData {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price: price.to_string(),
                change: change.to_string(),
                change_percent: change_percent.to_string(),
            })
            .collect())
    }

    async fn stream_news_updates(&self, topic: &str) -> Result<TextStream> {
        let now = Utc::now();
        let updates = (0..3)
            .map(|i| {
                let at = now + ChronoDuration::seconds(i * 45);
                format!(
                    "[{}] - Update {} on {}: correspondents are following the story.\n",
                    at.format("%H:%M:%S"),
                    i + 1,
                    topic.trim()
                )
            })
            .collect();
        Ok(fragments(updates))
    }

    async fn stream_chat(&self, _system_instruction: &str, history: &[ChatMessage]) -> Result<TextStream> {
        let question = history
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.text.trim())
            .unwrap_or_default();
        let reply = format!("I'm offline right now, but you asked: \"{}\".", question);
        let words = reply.split_inclusive(' ').map(str::to_string).collect();
        Ok(fragments(words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();

        let article = model.generate_article("  solar power ").await.unwrap();
        assert!(article.id.starts_with("gen-"));
        assert!(article.title.ends_with("solar power"));
        assert_eq!(article.source_url, "#");

        let weather = model.fetch_weather("Durban").await.unwrap();
        assert!(weather.is_complete());
        assert_eq!(weather.forecast[0].day_of_week, "Today");

        assert_eq!(model.fetch_financial_news().await.unwrap().len(), 5);
        let symbols: Vec<String> = model
            .fetch_market_data()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.symbol)
            .collect();
        assert_eq!(symbols, vec!["DJIA", "IXIC", "GSPC", "AAPL"]);
    }

    #[tokio::test]
    async fn test_dummy_streams() {
        let model = DummyModel::new();
        let updates: Vec<String> = model
            .stream_news_updates("elections")
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(updates.len(), 3);
        assert!(updates[0].starts_with('['));

        let history = vec![ChatMessage::model("Hi!"), ChatMessage::user("Any news?")];
        let reply: String = model
            .stream_chat("be brief", &history)
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();
        assert!(reply.contains("Any news?"));
    }
}
