//! Plain-text rendering for the terminal.

use nk_app::HomeFeed;
use nk_core::content::render_full_content;
use nk_core::{Article, GalleryImage, Quote, StockData, Weather, WeatherIcon};

pub fn article_line(index: usize, article: &Article) -> String {
    format!("{:>3}. [{}] {} ({})", index + 1, article.category, article.title, article.id)
}

pub fn article_list(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "  (none)".to_string();
    }
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| article_line(i, a))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn article(article: &Article) -> String {
    let mut out = format!("{}\n{}\n", article.title, "=".repeat(article.title.chars().count()));
    out.push_str(&format!("{} | {}", article.category, article.source_name));
    if let Some(date) = article.published_on() {
        out.push_str(&format!(" | {}", date.format("%B %-d, %Y")));
    }
    out.push_str(&format!("\n\n{}\n\n{}\n", article.summary, render_full_content(&article.full_content)));
    if article.source_url != "#" {
        out.push_str(&format!("\nSource: {}\n", article.source_url));
    }
    if let Some(urls) = article.grounding_urls.as_ref().filter(|u| !u.is_empty()) {
        out.push_str("\nSources:\n");
        for url in urls {
            out.push_str(&format!("  - {}\n", url));
        }
    }
    out
}

pub fn weather(weather: &Weather) -> String {
    let current = &weather.current;
    let mut out = format!(
        "{} {}: {:.0}°C, {} (humidity {:.0}%, wind {})\n",
        WeatherIcon::from_condition(&current.condition).symbol(),
        current.city,
        current.temperature,
        current.condition,
        current.humidity,
        current.wind_speed
    );
    for day in &weather.forecast {
        out.push_str(&format!(
            "  {:<10} {} {:>3.0}° / {:>3.0}°  {}\n",
            day.day_of_week,
            WeatherIcon::from_condition(&day.condition).symbol(),
            day.high_temp,
            day.low_temp,
            day.condition
        ));
    }
    out
}

pub fn quote(quote: &Quote) -> String {
    format!("\"{}\"\n  -- {}", quote.text, quote.author)
}

pub fn markets(stocks: &[StockData]) -> String {
    stocks
        .iter()
        .map(|s| format!("{:<6} {:<30} {:>12} {:>9} {:>8}", s.symbol, s.name, s.price, s.change, s.change_percent))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn gallery(images: &[GalleryImage]) -> String {
    images
        .iter()
        .map(|img| format!("{}\n  {}", img.prompt, img.image_url))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn home(feed: &HomeFeed) -> String {
    let weather = match &feed.weather {
        Ok(w) => weather(w),
        Err(message) => format!("{}\n", message),
    };
    format!(
        "Breaking news\n{}\n\nTrending\n{}\n\nWeather\n{}\nSaved\n{}",
        article_list(&feed.breaking),
        article_list(&feed.trending),
        weather,
        article_list(&feed.saved)
    )
}
