use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use nk_core::{
    Article, ChatMessage, ChatRole, ContentBlock, Error, NewsGateway, Quote, Result, StockData,
    TextStream, Weather,
};

use crate::sse;
use crate::Config;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const GENERATED_SOURCE_NAME: &str = "Generated by AI with Google Search";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }

    /// Web sources the answer was grounded on. `None` when the service
    /// reported no grounding at all.
    fn grounding_urls(&self) -> Option<Vec<String>> {
        let metadata = self.candidates.first()?.grounding_metadata.as_ref()?;
        Some(
            metadata
                .grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref()?.uri.clone())
                .filter(|uri| !uri.is_empty())
                .collect(),
        )
    }
}

#[derive(Deserialize)]
struct RawBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: String,
}

impl From<RawBlock> for ContentBlock {
    fn from(raw: RawBlock) -> Self {
        match raw.kind.trim().to_ascii_lowercase().as_str() {
            "subheading" => ContentBlock::Subheading(raw.content),
            "quote" => ContentBlock::Quote(raw.content),
            _ => ContentBlock::Paragraph(raw.content),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedArticle {
    title: String,
    summary: String,
    #[serde(default)]
    full_content: Vec<RawBlock>,
    category: String,
    #[serde(default)]
    image_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialStory {
    title: String,
    summary: String,
    category: String,
    source_name: String,
    #[serde(default)]
    image_url: String,
}

/// Grounded answers are free text, so the JSON may sit inside a markdown
/// fence or after a sentence of preamble.
fn extract_json(text: &str) -> &str {
    let text = text.trim();
    if let Some(start) = text.find("```") {
        let inner = &text[start + 3..];
        let inner = inner.strip_prefix("json").unwrap_or(inner);
        let end = inner.find("```").unwrap_or(inner.len());
        return inner[..end].trim();
    }
    match (text.find(['{', '[']), text.rfind(['}', ']'])) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(extract_json(text))?)
}

fn parse_article(response: &GenerateResponse, now_ms: i64) -> Result<Article> {
    let generated: GeneratedArticle = parse_json(&response.text())?;
    Ok(Article {
        id: format!("gen-{}", now_ms),
        title: generated.title,
        summary: generated.summary,
        full_content: generated.full_content.into_iter().map(ContentBlock::from).collect(),
        category: generated.category,
        image_url: generated.image_url,
        source_url: "#".to_string(),
        source_name: GENERATED_SOURCE_NAME.to_string(),
        grounding_urls: response.grounding_urls(),
    })
}

fn parse_financial_news(text: &str, now_ms: i64) -> Result<Vec<Article>> {
    let stories: Vec<FinancialStory> = parse_json(text)?;
    Ok(stories
        .into_iter()
        .take(5)
        .enumerate()
        .map(|(index, story)| Article {
            id: format!("finance-{}-{}", now_ms, index),
            full_content: vec![ContentBlock::Paragraph(story.summary.clone())],
            title: story.title,
            summary: story.summary,
            category: story.category,
            image_url: story.image_url,
            source_url: "#".to_string(),
            source_name: story.source_name,
            grounding_urls: None,
        })
        .collect())
}

fn article_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "fullContent": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING", "description": "Can be \"paragraph\", \"subheading\", or \"quote\"." },
                        "content": { "type": "STRING" }
                    }
                }
            },
            "category": { "type": "STRING" },
            "imageUrl": { "type": "STRING", "description": "A URL for a relevant image from source.unsplash.com, e.g., https://source.unsplash.com/800x600/?topic" }
        },
        "required": ["title", "summary", "fullContent", "category", "imageUrl"]
    })
}

fn weather_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "current": {
                "type": "OBJECT",
                "properties": {
                    "city": { "type": "STRING" },
                    "temperature": { "type": "NUMBER" },
                    "condition": { "type": "STRING" },
                    "humidity": { "type": "NUMBER", "description": "Humidity in percentage" },
                    "windSpeed": { "type": "STRING", "description": "Wind speed with units, e.g., '15 km/h'" }
                },
                "required": ["city", "temperature", "condition", "humidity", "windSpeed"]
            },
            "forecast": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "dayOfWeek": { "type": "STRING" },
                        "highTemp": { "type": "NUMBER" },
                        "lowTemp": { "type": "NUMBER" },
                        "condition": { "type": "STRING" }
                    },
                    "required": ["dayOfWeek", "highTemp", "lowTemp", "condition"]
                }
            }
        },
        "required": ["current", "forecast"]
    })
}

fn quote_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "text": { "type": "STRING", "description": "The content of the quote." },
            "author": { "type": "STRING", "description": "The author of the quote." }
        },
        "required": ["text", "author"]
    })
}

fn financial_news_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "summary": { "type": "STRING" },
                "category": { "type": "STRING" },
                "sourceName": { "type": "STRING" },
                "imageUrl": { "type": "STRING", "description": "A URL for a relevant image from source.unsplash.com" }
            },
            "required": ["title", "summary", "category", "sourceName", "imageUrl"]
        }
    })
}

fn market_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "symbol": { "type": "STRING" },
                "name": { "type": "STRING" },
                "price": { "type": "STRING" },
                "change": { "type": "STRING" },
                "changePercent": { "type": "STRING" }
            },
            "required": ["symbol", "name", "price", "change", "changePercent"]
        }
    })
}

fn user_prompt(prompt: String) -> Vec<Content> {
    vec![Content { role: Some("user"), parts: vec![Part { text: prompt }] }]
}

fn chat_contents(history: &[ChatMessage]) -> Vec<Content> {
    // A conversation has to open with a user turn; the greeting is local only.
    history
        .iter()
        .skip_while(|m| m.role == ChatRole::Model)
        .map(|m| Content {
            role: Some(match m.role {
                ChatRole::User => "user",
                ChatRole::Model => "model",
            }),
            parts: vec![Part { text: m.text.clone() }],
        })
        .collect()
}

fn plain_request(prompt: String) -> GenerateRequest {
    GenerateRequest {
        contents: user_prompt(prompt),
        system_instruction: None,
        tools: Vec::new(),
        generation_config: None,
    }
}

/// JSON mode constrained by `schema`.
fn json_request(prompt: String, schema: Value) -> GenerateRequest {
    GenerateRequest {
        generation_config: Some(GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
        ..plain_request(prompt)
    }
}

/// Search-grounded request. The API refuses JSON mode together with tools,
/// so the schema travels in the prompt instead.
fn grounded_json_request(prompt: String, schema: Value) -> GenerateRequest {
    GenerateRequest {
        tools: vec![json!({ "googleSearch": {} })],
        ..plain_request(format!(
            "{}\n\nRespond only with JSON matching this schema:\n{}",
            prompt, schema
        ))
    }
}

pub struct GeminiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: Url,
    model: String,
    timeout: Duration,
}

impl GeminiModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Gemini API key is required".to_string()))?;
        let base = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(base)
            .map_err(|e| Error::Config(format!("Invalid Gemini base URL {}: {}", base, e)))?;
        // Streams outlive any whole-request bound; the gateway limits the
        // gap between chunks instead.
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url,
            model: config.model_name.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: config.timeout,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.model,
            method
        )
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!("Gemini API error ({}): {}", status, body)));
        }
        Ok(response.json::<GenerateResponse>().await?)
    }

    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TextStream> {
        let response = self
            .client
            .post(self.endpoint("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!("Gemini API error ({}): {}", status, body)));
        }

        let texts = sse::data_events(response.bytes_stream()).filter_map(|event| async move {
            match event {
                Ok(payload) => match serde_json::from_str::<GenerateResponse>(&payload) {
                    Ok(chunk) => {
                        let text = chunk.text();
                        (!text.is_empty()).then_some(Ok(text))
                    }
                    Err(e) => {
                        debug!("Skipping unparsable stream chunk: {}", e);
                        None
                    }
                },
                Err(e) => Some(Err(e)),
            }
        });
        Ok(texts.boxed())
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl NewsGateway for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate_article(&self, topic: &str) -> Result<Article> {
        info!("📝 Generating article about {:?}", topic);
        let request = grounded_json_request(
            format!(
                "Write a news article about the following topic: \"{}\". The article should be balanced and informative. The tone should be like a reputable news source (e.g., Reuters, AP). Include at least one subheading and one quote.",
                topic
            ),
            article_schema(),
        );
        let response = self.generate(&request).await?;
        parse_article(&response, Utc::now().timestamp_millis())
    }

    async fn fetch_weather(&self, city: &str) -> Result<Weather> {
        let request = json_request(
            format!(
                "Provide the current weather and a 5-day forecast for {}. Use Celsius. The first forecast day should be 'Today'.",
                city
            ),
            weather_schema(),
        );
        parse_json(&self.generate(&request).await?.text())
    }

    async fn fetch_daily_quote(&self) -> Result<Quote> {
        let request = json_request(
            "Provide an inspiring and thought-provoking quote.".to_string(),
            quote_schema(),
        );
        parse_json(&self.generate(&request).await?.text())
    }

    async fn generate_creative_idea(&self) -> Result<String> {
        let request = plain_request(
            "Generate a short, creative idea or prompt. For example, \"a story about a lost robot in a forest\" or \"an app that identifies plants from photos\"."
                .to_string(),
        );
        let text = self.generate(&request).await?.text();
        if text.trim().is_empty() {
            return Err(Error::Inference("Empty response".to_string()));
        }
        Ok(text)
    }

    async fn fetch_financial_news(&self) -> Result<Vec<Article>> {
        let request = grounded_json_request(
            "Provide the top 5 global financial news stories for today. Focus on market-moving news."
                .to_string(),
            financial_news_schema(),
        );
        let text = self.generate(&request).await?.text();
        parse_financial_news(&text, Utc::now().timestamp_millis())
    }

    async fn fetch_market_data(&self) -> Result<Vec<StockData>> {
        let request = grounded_json_request(
            "Get the latest market data for the following indices: Dow Jones Industrial Average (DJIA), NASDAQ Composite (IXIC), S&P 500 (GSPC). Also include one major tech stock like Apple (AAPL). Provide price, change, and percentage change. Prepend '+' to positive changes."
                .to_string(),
            market_schema(),
        );
        parse_json(&self.generate(&request).await?.text())
    }

    async fn stream_news_updates(&self, topic: &str) -> Result<TextStream> {
        let request = plain_request(format!(
            "Generate a live news feed about the following topic: \"{}\". Provide short, timestamped updates in a continuous stream. Format each update like: \"[HH:MM:SS] - Update text...\"",
            topic
        ));
        self.generate_stream(&request).await
    }

    async fn stream_chat(&self, system_instruction: &str, history: &[ChatMessage]) -> Result<TextStream> {
        let request = GenerateRequest {
            contents: chat_contents(history),
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part { text: system_instruction.to_string() }],
            }),
            tools: Vec::new(),
            generation_config: None,
        };
        self.generate_stream(&request).await
    }
}
