use std::sync::Arc;

use nk_core::{Error, NewsGateway, Result};
use tracing::info;

use crate::Config;

pub mod dummy;
pub mod gemini;

/// Build the model named `kind` (`gemini`, or `dummy`/`offline`).
pub fn create_model(kind: &str, config: &Config) -> Result<Arc<dyn NewsGateway>> {
    let model: Arc<dyn NewsGateway> = match kind.trim().to_ascii_lowercase().as_str() {
        "gemini" => Arc::new(gemini::GeminiModel::new(config)?),
        "dummy" | "offline" => Arc::new(dummy::DummyModel::new()),
        other => return Err(Error::Config(format!("Unknown model: {}", other))),
    };
    info!("🤖 Using {} model", model.name());
    Ok(model)
}
