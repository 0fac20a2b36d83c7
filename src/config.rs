use std::collections::BTreeMap;

use serde_json::Value;

use crate::constants::{DEFAULT_MODEL, ENV_API_BASE, ENV_API_KEY, ENV_MCP_HTTP_HEADERS, ENV_MODEL};
use crate::error::ConfigError;

/// Client settings, read once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `http://localhost:11434/v1`
    pub api_base: String,
    /// Bearer token; local servers usually need none
    pub api_key: Option<String>,
    pub model: String,
    /// Extra headers for the streamable HTTP transport
    pub http_headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, treating blank values as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = get(ENV_API_BASE).ok_or(ConfigError::MissingApiBase(ENV_API_BASE))?;
        let api_key = get(ENV_API_KEY);
        let model = get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let http_headers = match get(ENV_MCP_HTTP_HEADERS) {
            Some(raw) => parse_headers(&raw)?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key,
            model,
            http_headers,
        })
    }
}

/// Parses a JSON object of header names to values. Non-string values are
/// rendered as JSON text.
pub fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidHeaders(ENV_MCP_HTTP_HEADERS, msg);

    let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(invalid("expected a JSON object".to_string()));
    };

    Ok(map
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (name, value)
        })
        .collect())
}
