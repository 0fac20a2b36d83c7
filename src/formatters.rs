use crate::constants::{FORECAST_PERIODS, NO_ALERTS_MESSAGE, NO_PERIODS_MESSAGE, SECTION_SEPARATOR};
use crate::models::{AlertFeature, AlertResponse, ForecastPeriod, ForecastResponse};

/// Formats a single alert feature
pub fn format_alert(feature: &AlertFeature) -> String {
    let props = &feature.properties;
    format!(
        "Event: {}\nArea: {}\nSeverity: {}\nDescription: {}\nInstructions: {}",
        props.event.as_deref().unwrap_or("Unknown"),
        props.area_desc.as_deref().unwrap_or("Unknown"),
        props.severity.as_deref().unwrap_or("Unknown"),
        props
            .description
            .as_deref()
            .unwrap_or("No description available"),
        props
            .instruction
            .as_deref()
            .unwrap_or("No specific instructions provided"),
    )
}

/// Formats weather alerts into a human-readable string
pub fn format_alerts(alerts: &AlertResponse) -> String {
    if alerts.features.is_empty() {
        return NO_ALERTS_MESSAGE.to_string();
    }

    alerts
        .features
        .iter()
        .map(format_alert)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

fn format_period(period: &ForecastPeriod) -> String {
    format!(
        "{}:\nTemperature: {}\u{00b0}{}\nWind: {} {}\nForecast: {}",
        period.name,
        period.temperature,
        period.temperature_unit,
        period.wind_speed,
        period.wind_direction,
        period.detailed_forecast
    )
}

/// Formats the leading periods of an NWS forecast
pub fn format_forecast(forecast: &ForecastResponse) -> String {
    let periods = &forecast.properties.periods;
    if periods.is_empty() {
        return NO_PERIODS_MESSAGE.to_string();
    }

    periods
        .iter()
        .take(FORECAST_PERIODS)
        .map(format_period)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn period(name: &str, temperature: i32) -> serde_json::Value {
        json!({
            "name": name,
            "temperature": temperature,
            "temperatureUnit": "F",
            "windSpeed": "5 to 10 mph",
            "windDirection": "NW",
            "detailedForecast": "Sunny, with a high near 75."
        })
    }

    #[test]
    fn alert_defaults_fill_missing_fields() {
        let alerts: AlertResponse = serde_json::from_value(json!({
            "features": [{ "properties": { "event": "Flood Watch" } }]
        }))
        .unwrap();

        let text = format_alerts(&alerts);
        assert_eq!(
            text,
            "Event: Flood Watch\nArea: Unknown\nSeverity: Unknown\n\
             Description: No description available\n\
             Instructions: No specific instructions provided"
        );
    }

    #[test]
    fn alerts_are_separated() {
        let alerts: AlertResponse = serde_json::from_value(json!({
            "features": [
                { "properties": { "event": "Heat Advisory", "areaDesc": "Maricopa" } },
                { "properties": { "event": "Red Flag Warning", "severity": "Severe" } }
            ]
        }))
        .unwrap();

        let text = format_alerts(&alerts);
        let sections: Vec<_> = text.split(SECTION_SEPARATOR).collect();
        assert_eq!(sections.len(), 2);
        assert!(sections[0].contains("Area: Maricopa"));
        assert!(sections[1].contains("Severity: Severe"));
    }

    #[test]
    fn empty_alerts_use_fixed_message() {
        let alerts: AlertResponse = serde_json::from_value(json!({ "features": [] })).unwrap();
        assert_eq!(format_alerts(&alerts), NO_ALERTS_MESSAGE);
    }

    #[test]
    fn forecast_keeps_first_five_periods() {
        let periods: Vec<_> = (0..8).map(|i| period(&format!("Day {i}"), 60 + i)).collect();
        let forecast: ForecastResponse =
            serde_json::from_value(json!({ "properties": { "periods": periods } })).unwrap();

        let text = format_forecast(&forecast);
        assert_eq!(text.split(SECTION_SEPARATOR).count(), FORECAST_PERIODS);
        assert!(text.starts_with("Day 0:\nTemperature: 60\u{00b0}F\nWind: 5 to 10 mph NW"));
        assert!(text.contains("Day 4:"));
        assert!(!text.contains("Day 5:"));
    }

    #[test]
    fn forecast_without_periods() {
        let forecast: ForecastResponse =
            serde_json::from_value(json!({ "properties": { "periods": [] } })).unwrap();
        assert_eq!(format_forecast(&forecast), NO_PERIODS_MESSAGE);
    }
}
