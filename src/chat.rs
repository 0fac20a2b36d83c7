//! OpenAI-compatible chat-completions client.
//!
//! Only the subset needed for function calling is modelled: text messages,
//! tool calls and tool results.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rmcp::model::{JsonObject, Tool};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object
    #[serde(default, deserialize_with = "arguments_as_string")]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Accepts arguments either as a JSON-encoded string or as an inline object,
/// which some local servers emit.
fn arguments_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// A tool descriptor in the chat API's function-calling format
#[derive(Debug, Clone, Serialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// The MCP server's input schema, shared rather than copied
    pub parameters: Arc<JsonObject>,
}

impl From<&Tool> for FunctionTool {
    fn from(tool: &Tool) -> Self {
        FunctionTool {
            kind: "function",
            function: FunctionSpec {
                name: tool.name.to_string(),
                description: tool.description.as_deref().unwrap_or_default().to_string(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
}

/// The assistant message of the first completion choice
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl AssistantReply {
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantReply,
}

/// Something that can answer a chat-completion request
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply>;
}

/// [`ChatBackend`] speaking the OpenAI `/chat/completions` protocol
pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OpenAiChat {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!("{}/chat/completions", config.api_base),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("chat request to {} failed", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            bail!("chat API error {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("malformed chat completion response")?;

        match parsed.choices.into_iter().next() {
            Some(choice) => Ok(choice.message),
            None => bail!("chat completion response contained no choices"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode, Uri},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// What the mock completions server saw for one request
    #[derive(Debug, Clone)]
    struct Seen {
        path: String,
        authorization: Option<String>,
        body: Value,
    }

    #[derive(Clone)]
    struct MockApi {
        status: StatusCode,
        reply: Value,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    async fn record(
        State(api): State<MockApi>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        api.seen.lock().unwrap().push(Seen {
            path: uri.path().to_string(),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        (api.status, Json(api.reply))
    }

    /// Starts a loopback completions server; returns its `/v1` base and the request log
    async fn mock_api(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Seen>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(record).with_state(MockApi {
            status,
            reply,
            seen: seen.clone(),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/v1"), seen)
    }

    fn chat_for(api_base: String, api_key: Option<&str>) -> OpenAiChat {
        OpenAiChat::new(&ClientConfig {
            api_base,
            api_key: api_key.map(str::to_string),
            model: "llama3.1:8b".to_string(),
            http_headers: BTreeMap::new(),
        })
        .unwrap()
    }

    fn hello() -> ChatRequest {
        ChatRequest {
            model: "llama3.1:8b".to_string(),
            messages: vec![ChatMessage::user("hello")],
            tools: vec![],
            tool_choice: None,
        }
    }

    fn sunny() -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": "It is sunny." } }] })
    }

    #[tokio::test]
    async fn completion_posts_to_chat_completions_with_bearer_key() {
        let (base, seen) = mock_api(StatusCode::OK, sunny()).await;

        let reply = chat_for(base, Some("sk-test")).complete(&hello()).await.unwrap();

        assert_eq!(reply.text(), "It is sunny.");
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/v1/chat/completions");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sk-test"));
        assert_eq!(seen[0].body["model"], "llama3.1:8b");
        assert_eq!(seen[0].body["messages"][0]["content"], "hello");
    }

    #[tokio::test]
    async fn completion_without_key_sends_no_authorization() {
        let (base, seen) = mock_api(StatusCode::OK, sunny()).await;

        chat_for(base, None).complete(&hello()).await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen[0].path, "/v1/chat/completions");
        assert_eq!(seen[0].authorization, None);
    }

    #[tokio::test]
    async fn completion_error_status_is_reported_with_body() {
        let (base, _) = mock_api(StatusCode::SERVICE_UNAVAILABLE, json!("model not loaded")).await;

        let err = chat_for(base, None).complete(&hello()).await.unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("chat API error 503"), "{message}");
        assert!(message.contains("model not loaded"), "{message}");
    }

    #[tokio::test]
    async fn completion_without_choices_is_an_error() {
        let (base, _) = mock_api(StatusCode::OK, json!({ "choices": [] })).await;

        let err = chat_for(base, None).complete(&hello()).await.unwrap_err();

        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn tool_message_shape() {
        let message = ChatMessage::Tool {
            tool_call_id: "call_1".to_string(),
            name: "get_alerts".to_string(),
            content: "No active alerts for this state.".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "tool",
                "tool_call_id": "call_1",
                "name": "get_alerts",
                "content": "No active alerts for this state."
            })
        );
    }

    #[test]
    fn assistant_without_calls_omits_tool_calls() {
        let message = ChatMessage::Assistant {
            content: "hi".to_string(),
            tool_calls: vec![],
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "role": "assistant", "content": "hi" })
        );
    }

    #[test]
    fn reply_parses_string_and_object_arguments() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_a",
                            "type": "function",
                            "function": { "name": "get_alerts", "arguments": "{\"state_abbreviated\":\"CO\"}" }
                        },
                        {
                            "function": { "name": "get_forecast", "arguments": { "latitude": 1.5, "longitude": 2.5 } }
                        }
                    ]
                }
            }]
        }))
        .unwrap();

        let reply = &response.choices[0].message;
        assert_eq!(reply.text(), "");
        let calls = reply.tool_calls();
        assert_eq!(calls[0].function.arguments, r#"{"state_abbreviated":"CO"}"#);
        assert_eq!(calls[1].kind, "function");
        assert_eq!(calls[1].id, "");
        let args: Value = serde_json::from_str(&calls[1].function.arguments).unwrap();
        assert_eq!(args, json!({ "latitude": 1.5, "longitude": 2.5 }));
    }

    #[test]
    fn reply_with_null_tool_calls() {
        let reply: AssistantReply = serde_json::from_value(json!({
            "role": "assistant",
            "content": "It is sunny.",
            "tool_calls": null
        }))
        .unwrap();

        assert_eq!(reply.text(), "It is sunny.");
        assert!(reply.tool_calls().is_empty());
    }

    #[test]
    fn request_omits_empty_tools() {
        let request = ChatRequest {
            model: "llama3.1:8b".to_string(),
            messages: vec![ChatMessage::user("hello")],
            tools: vec![],
            tool_choice: None,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "llama3.1:8b",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }
}
