use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A gateway call failed; the message is meant to be shown to the reader.
    #[error("{0}")]
    GatewayUnavailable(String),

    #[error("Gateway call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Please fill out all fields: `{field}` is missing")]
    Validation { field: &'static str },

    #[error("Not authorized")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for failures of the external AI service (including timeouts).
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            Error::GatewayUnavailable(_) | Error::Timeout(_) | Error::Inference(_) | Error::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
