use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use mcp_weather::{constants, http, logging, service::Weather};
use rmcp::ServiceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Speak MCP over stdin/stdout
    Stdio,
    /// Serve the streamable HTTP transport
    Http,
}

/// MCP server exposing National Weather Service alerts and forecasts
#[derive(Parser, Debug)]
#[command(name = "weather-server", version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Address to listen on with the HTTP transport
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Endpoint path with the HTTP transport
    #[arg(long, default_value = "/mcp")]
    path: String,

    /// Base URL of the NWS API
    #[arg(long, default_value = constants::NWS_API_BASE)]
    nws_base: String,

    /// Directory for daily-rotated log files
    #[arg(long, default_value = constants::LOG_DIR)]
    log_dir: PathBuf,

    /// Only log to stderr
    #[arg(long)]
    no_log_file: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    let _guard = logging::init(env!("CARGO_CRATE_NAME"), "weather_server", log_dir)?;

    tracing::info!("Starting Weather MCP Server...");

    let weather = Weather::with_base(cli.nws_base)?;

    match cli.transport {
        Transport::Stdio => {
            let server = weather.serve(rmcp::transport::stdio()).await?;
            server.waiting().await?;
        }
        Transport::Http => {
            if !cli.path.starts_with('/') {
                bail!("--path must start with '/', got {:?}", cli.path);
            }
            http::serve(cli.bind, &cli.path, weather).await?;
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}
