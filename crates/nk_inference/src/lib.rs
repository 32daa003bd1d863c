use std::fmt;
use std::time::Duration;

pub mod gateway;
pub mod images;
pub mod models;
pub mod sse;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
    /// Upper bound for a whole call, and for the gap between two stream chunks.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub mod prelude {
    pub use super::gateway::Gateway;
    pub use super::models::create_model;
    pub use super::Config;
    pub use nk_core::{Article, Error, NewsGateway, Result};
}

pub use gateway::Gateway;
pub use models::create_model;
