use thiserror::Error;

/// failures raised by the rest facets.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("resource not found: {url}")]
    NotFound { url: String },
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("received invalid object: {0}")]
    InvalidObject(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl RestError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::NotFound { .. })
    }
}
