use std::sync::Arc;

use anyhow::Result;
use rmcp::{
    handler::server::{
        router::{prompt::PromptRouter, tool::ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolResult, Content, GetPromptRequestParams, GetPromptResult, Implementation,
        ListPromptsResult, PaginatedRequestParams, PromptMessage, PromptMessageRole,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router,
    ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::de::DeserializeOwned;

use crate::constants::{FORECAST_PERIODS, NWS_API_BASE};
use crate::error::UpstreamError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::formatters::{format_alerts, format_forecast};
use crate::models::{
    AlertResponse, ForecastResponse, GetAlertsRequest, GetForecastRequest, PointsResponse,
    WeatherUsArgs,
};

/// Main weather service that handles MCP requests
#[derive(Clone)]
pub struct Weather {
    fetcher: Arc<dyn Fetcher>,
    nws_base: String,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl Weather {
    /// Creates a service talking to the public NWS API
    pub fn new() -> Result<Self> {
        Self::with_base(NWS_API_BASE)
    }

    /// Creates a service talking to an NWS-compatible API at `nws_base`
    pub fn with_base(nws_base: impl Into<String>) -> Result<Self> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new()?), nws_base))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, nws_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            nws_base: nws_base.into().trim_end_matches('/').to_string(),
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Makes an HTTP GET request and deserializes the JSON response
    async fn make_request<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self.fetcher.get_json(url).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Resolves the forecast endpoint of the grid cell containing the coordinate
    async fn forecast_url(&self, latitude: f64, longitude: f64) -> Result<String, McpError> {
        let points_url = format!("{}/points/{},{}", self.nws_base, latitude, longitude);

        let points = self
            .make_request::<PointsResponse>(&points_url)
            .await
            .map_err(|e| {
                let not_found = e
                    .downcast_ref::<UpstreamError>()
                    .is_some_and(UpstreamError::is_not_found);
                if not_found {
                    McpError::invalid_params(
                        "Location not found in NWS coverage area. Forecasts are only available for US locations.",
                        None,
                    )
                } else {
                    McpError::internal_error(format!("Failed to fetch grid points: {e:#}"), None)
                }
            })?;

        if let (Some(id), Some(x), Some(y)) = (
            &points.properties.grid_id,
            points.properties.grid_x,
            points.properties.grid_y,
        ) {
            tracing::debug!("Resolved grid {id} {x},{y}");
        }

        Ok(points.properties.forecast)
    }
}

/// Upper-cases `raw` and checks it is a two-letter code
fn normalize_state(raw: &str) -> Option<String> {
    let state = raw.trim().to_ascii_uppercase();
    (state.len() == 2 && state.chars().all(|c| c.is_ascii_alphabetic())).then_some(state)
}

fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for Weather {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "weather".to_string(),
                title: Some("NWS Weather".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Weather alerts and forecasts for US locations, powered by the National Weather Service API."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[tool_router]
impl Weather {
    /// Gets active weather alerts for a US state
    #[tool(description = "Get weather alerts for a US State")]
    async fn get_alerts(
        &self,
        Parameters(request): Parameters<GetAlertsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let Some(state) = normalize_state(&request.state_abbreviated) else {
            tracing::error!("[get_alerts] Invalid state input: {:?}", request.state_abbreviated);
            return Err(McpError::invalid_params(
                "State must be provided as a US two-letter code (e.g. NY).",
                None,
            ));
        };

        let url = format!("{}/alerts/active/area/{}", self.nws_base, state);
        tracing::info!("[get_alerts] State: {state} URL: {url}");

        let alerts = self
            .make_request::<AlertResponse>(&url)
            .await
            .map_err(|e| McpError::internal_error(format!("Failed to fetch alerts: {e:#}"), None))?;

        tracing::info!("[get_alerts] {} alert(s) for {state}", alerts.features.len());
        Ok(CallToolResult::success(vec![Content::text(format_alerts(&alerts))]))
    }

    /// Gets the weather forecast for a coordinate
    #[tool(description = "Get weather forecast for a location. Input in latitude and longitude")]
    async fn get_forecast(
        &self,
        Parameters(request): Parameters<GetForecastRequest>,
    ) -> Result<CallToolResult, McpError> {
        let GetForecastRequest { latitude, longitude } = request;
        tracing::info!("[get_forecast] Latitude {latitude}, Longitude {longitude}");

        if !valid_coordinates(latitude, longitude) {
            return Err(McpError::invalid_params(
                format!("Invalid coordinates: {latitude}, {longitude}"),
                None,
            ));
        }

        let forecast_url = self.forecast_url(latitude, longitude).await?;

        let forecast = self
            .make_request::<ForecastResponse>(&forecast_url)
            .await
            .map_err(|e| McpError::internal_error(format!("Failed to fetch forecast: {e:#}"), None))?;

        for period in forecast.properties.periods.iter().take(FORECAST_PERIODS) {
            tracing::debug!("Fetched forecast for period {}", period.name);
        }

        Ok(CallToolResult::success(vec![Content::text(format_forecast(&forecast))]))
    }
}

#[prompt_router]
impl Weather {
    /// Asks for the active alerts of a state using the alerts tool
    #[prompt(
        name = "prompt_get_alerts",
        description = "Get weather alerts for a US State"
    )]
    async fn prompt_get_alerts(
        &self,
        Parameters(request): Parameters<GetAlertsRequest>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let Some(state) = normalize_state(&request.state_abbreviated) else {
            return Err(McpError::invalid_params(
                "State must be provided as a US two-letter code (e.g. NY).",
                None,
            ));
        };

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!("Get weather alerts for the US state with the two-letter code '{state}'."),
        )])
    }

    /// Asks for today's temperature at a coordinate using the forecast tool
    #[prompt(
        name = "weather_us",
        description = "Get today's temperature for a US location"
    )]
    async fn weather_us(
        &self,
        Parameters(args): Parameters<WeatherUsArgs>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let WeatherUsArgs { latitude, longitude } = args;
        if !valid_coordinates(latitude, longitude) {
            return Err(McpError::invalid_params(
                format!("Invalid coordinates: {latitude}, {longitude}"),
                None,
            ));
        }

        Ok(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Use `get_forecast` for this location.\n- latitude: {latitude}\n- longitude: {longitude}\nConcisely print today's temperature."
            ),
        )])
    }
}
