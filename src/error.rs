use thiserror::Error;

/// Startup configuration problems. These abort the client before it connects.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set; point it at an OpenAI-compatible endpoint (e.g. http://localhost:11434/v1)")]
    MissingApiBase(&'static str),

    #[error("{0} must be a JSON object of header names and values: {1}")]
    InvalidHeaders(&'static str, String),
}

/// A non-success HTTP status from an upstream API
#[derive(Error, Debug)]
#[error("request to {url} failed with status {status}")]
pub struct UpstreamError {
    pub url: String,
    pub status: u16,
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}
