pub mod cache;
pub mod content;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use events::{Listeners, Subscription};
pub use models::{NewsGateway, TextStream};
pub use storage::KeyValueStore;
pub use types::{
    Article, ChatMessage, ChatRole, ContentBlock, ForecastDay, GalleryImage, Quote, StockData,
    User, View, Weather, WeatherIcon, CurrentConditions,
};

pub mod prelude {
    pub use super::types::*;
    pub use super::{Error, NewsGateway, Result};
}
