//! MCP client connection, over a spawned child process or streamable HTTP.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        JsonObject, Tool,
    },
    service::RunningService,
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig, ConfigureCommandExt,
        StreamableHttpClientTransport, TokioChildProcess,
    },
    RoleClient, ServiceExt,
};
use tokio::process::Command;

use crate::relay::ToolHost;

/// Where the MCP server lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerTarget {
    /// A local server launched as a child process speaking stdio, with extra
    /// arguments passed after the script or executable
    Local { path: PathBuf, args: Vec<String> },
    /// A remote server reached through the streamable HTTP transport
    Http(String),
}

impl ServerTarget {
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            ServerTarget::Http(arg.to_string())
        } else {
            ServerTarget::Local {
                path: PathBuf::from(arg),
                args: Vec::new(),
            }
        }
    }

    /// Appends arguments for a local server; a URL takes none
    pub fn with_args(self, extra: impl IntoIterator<Item = String>) -> Result<Self> {
        match self {
            ServerTarget::Local { path, mut args } => {
                args.extend(extra);
                Ok(ServerTarget::Local { path, args })
            }
            ServerTarget::Http(url) => {
                let extra: Vec<String> = extra.into_iter().collect();
                if !extra.is_empty() {
                    bail!("server arguments {extra:?} cannot be passed to the HTTP server {url}");
                }
                Ok(ServerTarget::Http(url))
            }
        }
    }
}

/// Program and arguments used to launch a local server.
///
/// Python and JavaScript servers run under their interpreters; anything else
/// is executed directly. `extra` follows the script or executable.
pub fn launch_command(path: &Path, extra: &[String]) -> (String, Vec<String>) {
    let script = path.to_string_lossy().into_owned();
    let (program, mut args) = match path.extension().and_then(|e| e.to_str()) {
        Some("py") => ("python".to_string(), vec![script]),
        Some("js") => ("node".to_string(), vec![script]),
        _ => (script, Vec::new()),
    };
    args.extend_from_slice(extra);
    (program, args)
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid header name {name:?}"))?;
        let value =
            HeaderValue::from_str(value).with_context(|| format!("invalid value for header {name}"))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "weather-client".to_string(),
            title: Some("Weather MCP Client".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// An initialized MCP client session with its cached tool catalog
pub struct McpSession {
    client: RunningService<RoleClient, ClientInfo>,
    tools: Vec<Tool>,
}

impl McpSession {
    /// Connects to `target`, performs the MCP handshake and lists its tools
    pub async fn connect(target: &ServerTarget, http_headers: &BTreeMap<String, String>) -> Result<Self> {
        let client = match target {
            ServerTarget::Local { path, args } => {
                let (program, args) = launch_command(path, args);
                tracing::info!("Launching stdio server: {program} {}", args.join(" "));
                let transport = TokioChildProcess::new(Command::new(&program).configure(|cmd| {
                    cmd.args(&args);
                }))
                .with_context(|| format!("failed to launch {}", path.display()))?;
                client_info()
                    .serve(transport)
                    .await
                    .context("MCP initialization failed")?
            }
            ServerTarget::Http(url) => {
                tracing::info!("Connecting to HTTP server: {url}");
                let http = reqwest::Client::builder()
                    .default_headers(header_map(http_headers)?)
                    .build()?;
                let transport = StreamableHttpClientTransport::with_client(
                    http,
                    StreamableHttpClientTransportConfig::with_uri(url.as_str()),
                );
                client_info()
                    .serve(transport)
                    .await
                    .context("MCP initialization failed")?
            }
        };

        let tools = client
            .list_tools(Default::default())
            .await
            .context("failed to list tools")?
            .tools;

        let server = client
            .peer_info()
            .map(|info| info.server_info.name.clone())
            .unwrap_or_default();
        let names: Vec<&str> = tools.iter().map(|t| &*t.name).collect();
        tracing::info!("Connected to server {server:?} with tools: {names:?}");
        for tool in &tools {
            tracing::debug!(
                "Tool {}: {} {}",
                tool.name,
                tool.description.as_deref().unwrap_or_default(),
                serde_json::Value::Object((*tool.input_schema).clone())
            );
        }

        Ok(Self { client, tools })
    }

    /// Closes the connection, stopping a spawned server
    pub async fn close(self) -> Result<()> {
        tracing::info!("Cleaning up MCP client resources");
        self.client.cancel().await.context("failed to close MCP session")?;
        Ok(())
    }
}

#[async_trait]
impl ToolHost for McpSession {
    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<CallToolResult> {
        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        self.client
            .call_tool(params)
            .await
            .with_context(|| format!("tool {name} failed"))
    }
}
