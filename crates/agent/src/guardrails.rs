use std::time::Duration;

use logex_core::config::AppConfig;

/// Appended as a user message when the model answers with nothing.
pub const CORRECTIVE_PROMPT: &str = "Respond with a real output.";

pub const FALLBACK_ANSWER: &str = "I'm sorry, I wasn't able to put together an answer just now. \
Could you rephrase your question, or ask me to connect you with a human representative?";

/// Outcome of the check run when the model answers with nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmptyOutputDecision {
    Retry { corrective_prompt: &'static str },
    Degrade(Degradation),
}

/// Outcome of the check run before a round of tool calls executes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolRoundDecision {
    Allow,
    Degrade(Degradation),
}

/// A loop bound was hit; the turn ends with `user_message`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Degradation {
    pub reason_code: &'static str,
    pub user_message: String,
    pub fallback_path: &'static str,
}

impl Degradation {
    fn fallback_answer(reason_code: &'static str) -> Self {
        Self {
            reason_code,
            user_message: FALLBACK_ANSWER.to_string(),
            fallback_path: "fallback_answer",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub max_empty_retries: u32,
    pub max_tool_rounds: u32,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            max_empty_retries: 3,
            max_tool_rounds: 8,
            model_timeout: Duration::from_secs(30),
            tool_timeout: Duration::from_secs(10),
        }
    }
}

impl GuardrailPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_empty_retries: config.agent.max_empty_retries,
            max_tool_rounds: config.agent.max_tool_rounds,
            model_timeout: Duration::from_secs(config.llm.timeout_secs),
            tool_timeout: Duration::from_secs(config.agent.tool_timeout_secs),
        }
    }

    /// `retries` corrective re-asks have already been spent this turn.
    pub fn on_empty_output(&self, retries: u32) -> EmptyOutputDecision {
        if retries < self.max_empty_retries {
            EmptyOutputDecision::Retry { corrective_prompt: CORRECTIVE_PROMPT }
        } else {
            EmptyOutputDecision::Degrade(Degradation::fallback_answer(
                "empty_output_retries_exhausted",
            ))
        }
    }

    /// `rounds` tool rounds already ran this turn.
    pub fn on_tool_round(&self, rounds: u32) -> ToolRoundDecision {
        if rounds < self.max_tool_rounds {
            ToolRoundDecision::Allow
        } else {
            ToolRoundDecision::Degrade(Degradation::fallback_answer("tool_rounds_exhausted"))
        }
    }
}
