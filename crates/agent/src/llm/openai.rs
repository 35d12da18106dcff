//! OpenAI-compatible chat completions client.
//!
//! Works against OpenAI itself and against Ollama's `/v1` endpoint.

use async_trait::async_trait;
use logex_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{LlmClient, LlmError, ModelRequest, ModelTurn};
use crate::conversation::{Message, Role, ToolCallRequest};
use crate::tools::ToolDefinition;

const MAX_ERROR_BODY_CHARS: usize = 512;

pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        // The response loop bounds each call; no request timeout here.
        let http = Client::builder().build().map_err(|error| LlmError::Client(error.to_string()))?;
        let base_url = config.base_url.as_deref().unwrap_or("https://api.openai.com/v1");

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelTurn, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: to_wire_messages(request.system_prompt, request.messages),
            tools: request.tools.iter().map(WireTool::from).collect(),
            temperature: self.temperature,
        };
        debug!(
            event_name = "llm.request.sent",
            model = %self.model,
            message_count = body.messages.len(),
            tool_count = body.tools.len(),
            "sending chat completion request"
        );

        let mut builder = self.http.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response =
            builder.send().await.map_err(|error| LlmError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let payload: ChatResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;
        from_wire_response(payload)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    temperature: f32,
}

#[derive(Debug, PartialEq, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self { role, content: Some(content), tool_calls: None, tool_call_id: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

impl From<&ToolCallRequest> for WireToolCall {
    fn from(call: &ToolCallRequest) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

impl From<&ToolDefinition> for WireTool {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: definition.name,
                description: definition.description,
                parameters: definition.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

/// Maps the conversation onto the chat completions message list.
///
/// Each tool round becomes one synthesized assistant message carrying the
/// round's `tool_calls`, followed by its `tool` messages. Consecutive results
/// from different rounds are split at the round boundary.
fn to_wire_messages(system_prompt: &str, messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len() + 2);
    wire.push(WireMessage::text("system", system_prompt.to_string()));

    let mut index = 0;
    while index < messages.len() {
        let message = &messages[index];
        match message.role {
            Role::User => wire.push(WireMessage::text("user", message.content_string())),
            Role::Assistant => wire.push(WireMessage::text("assistant", message.content_string())),
            Role::ToolResult => {
                let run_end = messages[index..]
                    .iter()
                    .position(|next| {
                        next.role != Role::ToolResult || next.tool_round != message.tool_round
                    })
                    .map_or(messages.len(), |offset| index + offset);
                push_tool_run(&mut wire, &messages[index..run_end]);
                index = run_end;
                continue;
            }
        }
        index += 1;
    }

    wire
}

fn push_tool_run(wire: &mut Vec<WireMessage>, run: &[Message]) {
    let answered = run
        .iter()
        .filter_map(|message| match &message.tool_call {
            Some(call) => Some((call, message)),
            None => {
                warn!(
                    event_name = "llm.request.orphan_tool_result",
                    "dropping tool result without an originating call"
                );
                None
            }
        })
        .collect::<Vec<_>>();
    if answered.is_empty() {
        return;
    }

    wire.push(WireMessage {
        role: "assistant",
        content: None,
        tool_calls: Some(answered.iter().map(|(call, _)| WireToolCall::from(*call)).collect()),
        tool_call_id: None,
    });
    for (call, message) in answered {
        wire.push(WireMessage {
            role: "tool",
            content: Some(message.content_string()),
            tool_calls: None,
            tool_call_id: Some(call.id.clone()),
        });
    }
}

fn from_wire_response(response: ChatResponse) -> Result<ModelTurn, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Decode("response contained no choices".to_string()))?;

    let calls = choice.message.tool_calls.unwrap_or_default();
    if !calls.is_empty() {
        return Ok(ModelTurn::ToolCalls(
            calls
                .into_iter()
                .map(|call| ToolCallRequest {
                    id: call.id,
                    name: call.function.name,
                    // Malformed JSON is passed through so argument validation can report it.
                    arguments: serde_json::from_str(&call.function.arguments)
                        .unwrap_or(Value::String(call.function.arguments)),
                })
                .collect(),
        ));
    }

    Ok(ModelTurn::Text(choice.message.content.unwrap_or_default()))
}
