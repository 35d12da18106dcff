use serde_json::{json, Value};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("`{field}` must be a finite number")]
    InvalidMeasurement { field: &'static str },
    #[error("package measurements are too large to price")]
    CostOverflow,
    #[error("zip code `{0}` must end with a digit")]
    InvalidZipCode(String),
}

/// Failures raised while dispatching a single tool call.
///
/// None of these abort a conversation: the response loop converts each one
/// into a structured payload via [`ToolError::payload`] and hands it back to
/// the model as an ordinary tool result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool `{name}` is not registered")]
    UnknownTool { name: String },
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },
    #[error("tool `{tool}` did not finish within {timeout_ms}ms")]
    TimedOut { tool: String, timeout_ms: u64 },
}

impl ToolError {
    pub fn from_domain(tool: impl Into<String>, error: DomainError) -> Self {
        Self::invalid(tool, error.to_string())
    }

    pub fn invalid(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments { tool: tool.into(), reason: reason.into() }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::UnknownTool { .. } => "unknown_tool",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::TimedOut { .. } => "tool_timeout",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::UnknownTool { name } => json!({
                "error": "tool not found",
                "tool": name,
            }),
            Self::InvalidArguments { tool, reason } => json!({
                "error": "invalid arguments",
                "tool": tool,
                "details": reason,
            }),
            Self::TimedOut { tool, timeout_ms } => json!({
                "error": "tool timed out",
                "tool": tool,
                "timeout_ms": timeout_ms,
            }),
        }
    }
}

/// Failures that end a conversation turn without an answer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("query is empty")]
    EmptyQuery,
    #[error("model call did not finish within {timeout_ms}ms")]
    ModelTimeout { timeout_ms: u64 },
    #[error("model call failed: {0}")]
    Upstream(String),
}

impl TurnError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty_query",
            Self::ModelTimeout { .. } => "model_timeout",
            Self::Upstream(_) => "upstream_failure",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "Please type a question so I can help you.",
            Self::ModelTimeout { .. } => {
                "Sorry, that took longer than expected. Please try again in a moment."
            }
            Self::Upstream(_) => {
                "Sorry, I could not reach the assistant service right now. Please try again shortly."
            }
        }
    }
}
