use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(Value),
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
    /// Set on tool results: the request this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallRequest>,
    /// Tool round within the turn that produced this result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_round: Option<u32>,
    /// Set on assistant notices that stand in for an answer after a failed turn.
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    pub fn failed_notice(text: impl Into<String>) -> Self {
        Self { failed: true, ..Self::assistant(text) }
    }

    pub fn tool_result(call: ToolCallRequest, payload: Value) -> Self {
        Self {
            role: Role::ToolResult,
            content: MessageContent::Structured(payload),
            tool_call: Some(call),
            tool_round: None,
            failed: false,
        }
    }

    pub fn in_round(mut self, round: u32) -> Self {
        self.tool_round = Some(round);
        self
    }

    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
            tool_call: None,
            tool_round: None,
            failed: false,
        }
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call.as_ref().map(|call| call.id.as_str())
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Structured(_) => None,
        }
    }

    /// Content flattened to a string, structured payloads as compact JSON.
    pub fn content_string(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Structured(value) => value.to_string(),
        }
    }
}

/// The message history of one customer session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4(), contact_id: None, messages: Vec::new() }
    }

    pub fn with_contact_id(mut self, contact_id: impl Into<String>) -> Self {
        self.contact_id = Some(contact_id.into());
        self
    }

    /// Seeds a session from history kept by the caller, e.g. a previous
    /// transcript.
    pub fn from_history(messages: Vec<Message>) -> Self {
        Self { messages, ..Self::new() }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

/// A session shared between tasks. Holding the guard makes the holder the
/// only writer for the whole turn.
#[derive(Clone, Debug, Default)]
pub struct SharedConversation {
    inner: Arc<Mutex<ConversationState>>,
}

impl SharedConversation {
    pub fn new(state: ConversationState) -> Self {
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> ConversationState {
        self.inner.lock().await.clone()
    }
}
