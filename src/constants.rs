/// User agent string for NWS requests. The NWS API rejects anonymous clients.
pub const USER_AGENT: &str = concat!("mcp-weather/", env!("CARGO_PKG_VERSION"));

/// National Weather Service API base URL
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// Media type the NWS API serves alerts and forecasts as
pub const GEO_JSON: &str = "application/geo+json";

/// Seconds before an NWS request is abandoned
pub const NWS_TIMEOUT_SECS: u64 = 30;

/// Number of forecast periods rendered by `get_forecast`
pub const FORECAST_PERIODS: usize = 5;

pub const NO_ALERTS_MESSAGE: &str = "No active alerts for this state.";
pub const NO_PERIODS_MESSAGE: &str = "No forecast periods available for this location.";

/// Separator between rendered alerts or forecast periods
pub const SECTION_SEPARATOR: &str = "\n---\n";

// Client environment
pub const ENV_API_BASE: &str = "API_BASE";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_MCP_HTTP_HEADERS: &str = "MCP_HTTP_HEADERS";

pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Upper bound on model/tool round trips for a single query
pub const MAX_TOOL_ROUNDS: usize = 8;

/// Placeholder sent to the model when a tool produced no text
pub const EMPTY_TOOL_OUTPUT: &str = "(no output)";

/// Default directory for rotated log files
pub const LOG_DIR: &str = "logs";
