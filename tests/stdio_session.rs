use std::collections::BTreeMap;

use mcp_weather::{
    relay::ToolHost,
    session::{McpSession, ServerTarget},
};
use serde_json::json;

/// Launches the server binary over stdio against an NWS base nothing listens on
async fn spawn_server() -> McpSession {
    let target = ServerTarget::parse(env!("CARGO_BIN_EXE_weather-server"))
        .with_args([
            "--no-log-file".to_string(),
            "--nws-base".to_string(),
            "http://127.0.0.1:9".to_string(),
        ])
        .unwrap();

    McpSession::connect(&target, &BTreeMap::new())
        .await
        .expect("connect over stdio")
}

#[tokio::test]
async fn stdio_session_lists_tools() {
    let session = spawn_server().await;

    let mut names: Vec<_> = session.tools().iter().map(|t| t.name.to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["get_alerts", "get_forecast"]);

    session.close().await.expect("close");
}

#[tokio::test]
async fn stdio_forecast_with_unreachable_nws_is_tool_error() {
    let session = spawn_server().await;

    let mut args = serde_json::Map::new();
    args.insert("latitude".to_string(), json!(39.74));
    args.insert("longitude".to_string(), json!(-104.99));
    let err = session.call_tool("get_forecast", args).await.unwrap_err();

    assert!(format!("{err:#}").contains("grid points"), "{err:#}");

    session.close().await.expect("close");
}
