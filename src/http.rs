//! Streamable HTTP hosting for the weather server.
//!
//! Each MCP session gets a clone of one [`Weather`] service, so all sessions
//! share its HTTP client. Sessions are tracked in memory by rmcp's local
//! session manager.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use tower_http::cors::CorsLayer;

use crate::service::Weather;

/// Builds the router serving the MCP endpoint at `path`.
///
/// The CORS layer answers browser preflight `OPTIONS` requests so web-based
/// inspectors can talk to the server directly.
pub fn router(path: &str, weather: Weather) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(weather.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .nest_service(path, service)
        .layer(CorsLayer::permissive())
}

/// Serves the MCP endpoint on `bind` until Ctrl-C
pub async fn serve(bind: SocketAddr, path: &str, weather: Weather) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let local = listener.local_addr()?;
    tracing::info!("Serving MCP over HTTP at http://{local}{path}");

    axum::serve(listener, router(path, weather))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
