//! Model invocation boundary.

mod openai;
mod scripted;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::{Message, ToolCallRequest};
use crate::tools::ToolDefinition;

pub use openai::OpenAiClient;
pub use scripted::{RecordedRequest, ScriptedLlmClient};

/// Everything the model sees for one invocation.
#[derive(Clone, Copy, Debug)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

/// One model response: a final answer or a batch of tool calls.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelTurn {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
}

impl ModelTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Neither usable text nor a tool call.
    pub fn is_contentless(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::ToolCalls(calls) => calls.is_empty(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("could not build http client: {0}")]
    Client(String),
    #[error("request to model endpoint failed: {0}")]
    Transport(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode model response: {0}")]
    Decode(String),
    #[error("scripted model has no turns left")]
    ScriptExhausted,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelTurn, LlmError>;
}
