use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    Home,
    ArticleDetail,
    Admin,
    Learn,
    Chat,
    Finance,
    Weather,
    Landing,
}

impl View {
    pub const ALL: [View; 8] = [
        View::Home,
        View::ArticleDetail,
        View::Admin,
        View::Learn,
        View::Chat,
        View::Finance,
        View::Weather,
        View::Landing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::ArticleDetail => "articleDetail",
            View::Admin => "admin",
            View::Learn => "learn",
            View::Chat => "chat",
            View::Finance => "finance",
            View::Weather => "weather",
            View::Landing => "landing",
        }
    }

    /// Landing and admin render full-screen, without header, sidebar or bottom nav.
    pub fn has_chrome(&self) -> bool {
        !matches!(self, View::Landing | View::Admin)
    }

    /// Views that list articles a reader can open.
    pub fn produces_articles(&self) -> bool {
        matches!(self, View::Home | View::Finance | View::Learn)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        View::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown view: {}", s))
    }
}

/// A unit of article body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ContentBlock {
    Paragraph(String),
    Subheading(String),
    Quote(String),
}

impl ContentBlock {
    pub fn content(&self) -> &str {
        match self {
            ContentBlock::Paragraph(s) | ContentBlock::Subheading(s) | ContentBlock::Quote(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Paragraph(_) => "paragraph",
            ContentBlock::Subheading(_) => "subheading",
            ContentBlock::Quote(_) => "quote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub full_content: Vec<ContentBlock>,
    pub category: String,
    pub image_url: String,
    pub source_url: String,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_urls: Option<Vec<String>>,
}

impl Article {
    /// Publication date recovered from the id.
    ///
    /// Admin articles use their creation time in milliseconds as id; bundled
    /// articles may carry an ISO date instead. Any other id has no date.
    pub fn published_on(&self) -> Option<NaiveDate> {
        if let Ok(millis) = self.id.parse::<i64>() {
            return DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive());
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.id) {
            return Some(dt.date_naive());
        }
        NaiveDate::parse_from_str(&self.id, "%Y-%m-%d").ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub city: String,
    pub temperature: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub day_of_week: String,
    pub high_temp: f64,
    pub low_temp: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}

impl Weather {
    pub const FORECAST_DAYS: usize = 5;

    pub fn is_complete(&self) -> bool {
        self.forecast.len() >= Self::FORECAST_DAYS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Thunderstorm,
    Snow,
    Foggy,
    Thermostat,
}

impl WeatherIcon {
    pub fn from_condition(condition: &str) -> Self {
        let c = condition.to_lowercase();
        if c.contains("sunny") || c.contains("clear") {
            WeatherIcon::Sunny
        } else if c.contains("partly cloudy") {
            WeatherIcon::PartlyCloudy
        } else if c.contains("cloudy") || c.contains("overcast") {
            WeatherIcon::Cloudy
        } else if c.contains("rain") || c.contains("shower") {
            WeatherIcon::Rainy
        } else if c.contains("thunderstorm") {
            WeatherIcon::Thunderstorm
        } else if c.contains("snow") {
            WeatherIcon::Snow
        } else if c.contains("mist") || c.contains("fog") {
            WeatherIcon::Foggy
        } else {
            WeatherIcon::Thermostat
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            WeatherIcon::Sunny => "☀️",
            WeatherIcon::PartlyCloudy => "⛅",
            WeatherIcon::Cloudy => "☁️",
            WeatherIcon::Rainy => "🌧️",
            WeatherIcon::Thunderstorm => "⛈️",
            WeatherIcon::Snow => "🌨️",
            WeatherIcon::Foggy => "🌫️",
            WeatherIcon::Thermostat => "🌡️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockData {
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub image_url: String,
    pub prompt: String,
}

/// Profile handed over by the identity provider after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub picture: String,
}

impl User {
    pub fn first_name(&self) -> Option<&str> {
        self.name.split_whitespace().next()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Model, text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_with_id(id: &str) -> Article {
        Article {
            id: id.to_string(),
            title: "Test Article".to_string(),
            summary: "Summary".to_string(),
            full_content: vec![],
            category: "Technology".to_string(),
            image_url: String::new(),
            source_url: "#".to_string(),
            source_name: "test".to_string(),
            grounding_urls: None,
        }
    }

    #[test]
    fn test_article_wire_format() {
        let mut article = article_with_id("1");
        article.full_content = vec![
            ContentBlock::Subheading("Intro".to_string()),
            ContentBlock::Paragraph("Body".to_string()),
        ];
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["fullContent"][0]["type"], "subheading");
        assert_eq!(json["fullContent"][0]["content"], "Intro");
        assert_eq!(json["imageUrl"], "");
        assert!(json.get("groundingUrls").is_none());

        let parsed: Article = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, article);
    }

    #[test]
    fn test_published_on() {
        // 2024-01-15T00:00:00Z
        assert_eq!(
            article_with_id("1705276800000").published_on(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(
            article_with_id("2023-06-01").published_on(),
            NaiveDate::from_ymd_opt(2023, 6, 1)
        );
        assert_eq!(article_with_id("gen-1705276800000").published_on(), None);
    }

    #[test]
    fn test_view_parsing() {
        assert_eq!("home".parse::<View>().unwrap(), View::Home);
        assert_eq!("article-detail".parse::<View>().unwrap(), View::ArticleDetail);
        assert_eq!("Finance".parse::<View>().unwrap(), View::Finance);
        assert!("settings".parse::<View>().is_err());
        assert_eq!(serde_json::to_string(&View::ArticleDetail).unwrap(), "\"articleDetail\"");
    }

    #[test]
    fn test_view_chrome() {
        assert!(!View::Landing.has_chrome());
        assert!(!View::Admin.has_chrome());
        assert!(View::Home.has_chrome());
        assert!(View::ArticleDetail.has_chrome());
    }

    #[test]
    fn test_weather_icon() {
        assert_eq!(WeatherIcon::from_condition("Clear skies"), WeatherIcon::Sunny);
        assert_eq!(WeatherIcon::from_condition("Partly Cloudy"), WeatherIcon::PartlyCloudy);
        assert_eq!(WeatherIcon::from_condition("Overcast"), WeatherIcon::Cloudy);
        assert_eq!(WeatherIcon::from_condition("Light showers"), WeatherIcon::Rainy);
        assert_eq!(WeatherIcon::from_condition("Thunderstorm"), WeatherIcon::Thunderstorm);
        assert_eq!(WeatherIcon::from_condition("Snow"), WeatherIcon::Snow);
        assert_eq!(WeatherIcon::from_condition("Morning fog"), WeatherIcon::Foggy);
        assert_eq!(WeatherIcon::from_condition("Windy"), WeatherIcon::Thermostat);
    }

    #[test]
    fn test_user_first_name() {
        let user = User {
            name: "Kamo Ndlovu".to_string(),
            email: "kamo@example.com".to_string(),
            picture: String::new(),
        };
        assert_eq!(user.first_name(), Some("Kamo"));
    }
}
