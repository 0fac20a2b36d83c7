//! Tool-call relay between a chat model and an MCP server.
//!
//! A query runs as a function-calling loop: the model sees the user's text
//! and the server's tool catalog, any tool calls it makes are executed
//! against the server, and the results are fed back until the model answers
//! in plain text.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rmcp::model::{CallToolResult, Content, JsonObject, RawContent, Tool};
use serde_json::Value;

use crate::chat::{ChatBackend, ChatMessage, ChatRequest, FunctionTool, ToolCall};
use crate::constants::{EMPTY_TOOL_OUTPUT, MAX_TOOL_ROUNDS};

/// The MCP side of the relay
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Tool catalog captured when the connection was made
    fn tools(&self) -> &[Tool];

    async fn call_tool(&self, name: &str, arguments: JsonObject) -> Result<CallToolResult>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: JsonObject,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    /// The model's final text reply
    pub answer: String,
    /// Tools run while producing the answer, in call order
    pub invocations: Vec<ToolInvocation>,
}

/// Renders tool result content as plain text.
///
/// Text items are kept verbatim; anything else (images, resources) is shown
/// as its JSON form.
pub fn flatten_tool_content(content: &[Content]) -> String {
    content
        .iter()
        .map(|item| match &item.raw {
            RawContent::Text(text) => text.text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn parse_arguments(call: &ToolCall) -> Result<JsonObject> {
    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return Ok(JsonObject::new());
    }

    let value: Value = serde_json::from_str(raw)
        .with_context(|| format!("Failed to parse arguments for tool {}", call.function.name))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "Arguments for tool {} must be a JSON object, got {other}",
            call.function.name
        ),
    }
}

pub struct Relay<C, T> {
    chat: C,
    host: T,
    model: String,
    catalog: Vec<FunctionTool>,
}

impl<C: ChatBackend, T: ToolHost> Relay<C, T> {
    /// Wraps `host`'s tool catalog once; every request reuses it as is.
    pub fn new(chat: C, host: T, model: impl Into<String>) -> Self {
        let catalog = host.tools().iter().map(FunctionTool::from).collect();
        Self {
            chat,
            host,
            model: model.into(),
            catalog,
        }
    }

    pub fn into_host(self) -> T {
        self.host
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        let tool_choice = (!self.catalog.is_empty()).then_some("auto");
        ChatRequest {
            model: self.model.clone(),
            messages,
            tools: self.catalog.clone(),
            tool_choice,
        }
    }

    /// Runs one user query to completion
    pub async fn process_query(&self, query: &str) -> Result<RelayOutcome> {
        tracing::info!("Processing query: {query}");

        let mut messages = vec![ChatMessage::user(query)];
        let mut invocations = Vec::new();

        for round in 1..=MAX_TOOL_ROUNDS {
            tracing::info!(
                "Starting completion turn {round} with {} message(s) and {} tool(s)",
                messages.len(),
                self.catalog.len()
            );

            let request = self.request(messages);
            let reply = self.chat.complete(&request).await?;
            messages = request.messages;

            let calls = reply.tool_calls();
            tracing::info!(
                "Model reply on turn {round}: chars={} tool_calls={}",
                reply.text().len(),
                calls.len()
            );

            if calls.is_empty() {
                return Ok(RelayOutcome {
                    answer: reply.text().to_string(),
                    invocations,
                });
            }

            // Tool results are matched to calls by id, so every call needs one.
            let calls: Vec<ToolCall> = calls
                .iter()
                .enumerate()
                .map(|(i, call)| {
                    let mut call = call.clone();
                    if call.id.is_empty() {
                        call.id = format!("call_{round}_{i}");
                    }
                    call
                })
                .collect();

            messages.push(ChatMessage::Assistant {
                content: reply.text().to_string(),
                tool_calls: calls.clone(),
            });

            for call in &calls {
                let name = &call.function.name;
                let arguments = parse_arguments(call)?;
                tracing::info!(
                    "Invoking MCP tool {name} with args {}",
                    serde_json::Value::Object(arguments.clone())
                );

                let result = self.host.call_tool(name, arguments.clone()).await?;
                let output = flatten_tool_content(&result.content);
                if result.is_error == Some(true) {
                    tracing::warn!("Tool {name} reported an error: {output}");
                } else {
                    tracing::info!("Tool {name} returned {} character(s)", output.len());
                }

                let content = if output.is_empty() {
                    EMPTY_TOOL_OUTPUT.to_string()
                } else {
                    output.clone()
                };
                messages.push(ChatMessage::Tool {
                    tool_call_id: call.id.clone(),
                    name: name.clone(),
                    content,
                });
                invocations.push(ToolInvocation {
                    name: name.clone(),
                    arguments,
                    output,
                });
            }
        }

        bail!("model kept requesting tools after {MAX_TOOL_ROUNDS} rounds")
    }
}
