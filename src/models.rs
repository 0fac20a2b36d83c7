use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize};

// ============================================================================
// National Weather Service API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AlertResponse {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    pub properties: AlertProperties,
}

/// Every field is optional upstream; missing values render as defaults.
#[derive(Debug, Default, Deserialize)]
pub struct AlertProperties {
    pub event: Option<String>,
    #[serde(rename = "areaDesc")]
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointsResponse {
    pub properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
pub struct PointsProperties {
    /// Absolute URL of the gridpoint forecast for the requested coordinate
    pub forecast: String,
    #[serde(rename = "gridId")]
    pub grid_id: Option<String>,
    #[serde(rename = "gridX")]
    pub grid_x: Option<i32>,
    #[serde(rename = "gridY")]
    pub grid_y: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
pub struct ForecastProperties {
    #[serde(default)]
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastPeriod {
    pub name: String,
    pub temperature: i32,
    #[serde(rename = "temperatureUnit")]
    pub temperature_unit: String,
    #[serde(rename = "windSpeed")]
    pub wind_speed: String,
    #[serde(rename = "windDirection")]
    pub wind_direction: String,
    #[serde(rename = "detailedForecast")]
    pub detailed_forecast: String,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetAlertsRequest {
    /// Two-letter US state code (e.g. CA, NY)
    pub state_abbreviated: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetForecastRequest {
    /// Latitude of the location (e.g. 39.0997)
    #[serde(deserialize_with = "number_or_numeric_string")]
    #[schemars(with = "f64")]
    pub latitude: f64,
    /// Longitude of the location (e.g. -94.5783)
    #[serde(deserialize_with = "number_or_numeric_string")]
    #[schemars(with = "f64")]
    pub longitude: f64,
}

// ============================================================================
// MCP Prompt Argument Models
// ============================================================================

/// Prompt arguments travel as strings, so numeric strings are accepted here too
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct WeatherUsArgs {
    /// Latitude of the location
    #[serde(deserialize_with = "number_or_numeric_string")]
    #[schemars(with = "f64")]
    pub latitude: f64,
    /// Longitude of the location
    #[serde(deserialize_with = "number_or_numeric_string")]
    #[schemars(with = "f64")]
    pub longitude: f64,
}

/// Accepts a JSON number or a string holding one, as models often quote coordinates
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let from_numbers: GetForecastRequest =
            serde_json::from_value(json!({ "latitude": 39.74, "longitude": -104 })).unwrap();
        assert_eq!((from_numbers.latitude, from_numbers.longitude), (39.74, -104.0));

        let from_strings: GetForecastRequest =
            serde_json::from_value(json!({ "latitude": "39.74", "longitude": " -104.99 " })).unwrap();
        assert_eq!((from_strings.latitude, from_strings.longitude), (39.74, -104.99));
    }

    #[test]
    fn coordinates_reject_non_numeric_strings() {
        let err = serde_json::from_value::<GetForecastRequest>(
            json!({ "latitude": "Denver", "longitude": "-104.99" }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Denver"));

        assert!(serde_json::from_value::<GetForecastRequest>(json!({ "latitude": true, "longitude": 1 })).is_err());
    }

    #[test]
    fn coordinate_schema_stays_numeric() {
        let schema = serde_json::to_value(schemars::schema_for!(GetForecastRequest)).unwrap();
        assert_eq!(schema["properties"]["latitude"]["type"], "number");
        assert_eq!(schema["properties"]["longitude"]["type"], "number");
    }
}
