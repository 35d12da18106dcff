use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use logex_core::config::AppConfig;
use logex_core::errors::{ToolError, TurnError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::conversation::{ConversationState, Message, SharedConversation, ToolCallRequest};
use crate::guardrails::{Degradation, EmptyOutputDecision, GuardrailPolicy, ToolRoundDecision};
use crate::llm::{LlmClient, LlmError, ModelRequest, ModelTurn, OpenAiClient};
use crate::prompt::build_system_prompt;
use crate::tools::{CatalogOptions, ToolDefinition, ToolRegistry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Answered,
    /// A loop bound was hit and the canned apology was returned.
    Fallback { reason_code: &'static str },
    /// The turn failed; the text is a user-safe error message.
    Failed { error_class: &'static str },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnReply {
    pub text: String,
    pub outcome: TurnOutcome,
}

impl TurnReply {
    pub fn is_answered(&self) -> bool {
        self.outcome == TurnOutcome::Answered
    }
}

enum TurnState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(TurnReply),
}

/// Drives the tool-augmented response loop for one conversation turn at a time.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    definitions: Vec<ToolDefinition>,
    guardrails: GuardrailPolicy,
    company_name: String,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, guardrails: GuardrailPolicy) -> Self {
        let definitions = tools.definitions();
        Self { llm, tools, definitions, guardrails, company_name: "Logex".to_string() }
    }

    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = company_name.into();
        self
    }

    /// Wires the HTTP model client and the logistics catalog from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let llm = OpenAiClient::from_config(&config.llm)?;
        let tools = ToolRegistry::logistics(CatalogOptions {
            company_name: config.agent.company_name.clone(),
            ..CatalogOptions::default()
        });

        Ok(Self::new(Arc::new(llm), tools, GuardrailPolicy::from_config(config))
            .with_company_name(config.agent.company_name.clone()))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn guardrails(&self) -> &GuardrailPolicy {
        &self.guardrails
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    /// Runs one turn. On error the conversation is left exactly as it was.
    pub async fn respond(
        &self,
        state: &mut ConversationState,
        query: &str,
    ) -> Result<TurnReply, TurnError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TurnError::EmptyQuery);
        }

        let checkpoint = state.len();
        let started = Instant::now();
        let result = self.run_turn(state, query).await;
        match &result {
            Ok(reply) => info!(
                event_name = "agent.turn.completed",
                conversation_id = %state.id,
                outcome = ?reply.outcome,
                message_count = state.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversation turn completed"
            ),
            Err(error) => {
                state.truncate(checkpoint);
                warn!(
                    event_name = "agent.turn.failed",
                    conversation_id = %state.id,
                    error_class = error.error_class(),
                    error = %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "conversation turn failed; history rolled back"
                );
            }
        }
        result
    }

    /// Presentation entry point: always yields text for the user.
    ///
    /// Failed turns still record the query and a notice flagged as failed,
    /// so the session stays readable and usable.
    pub async fn process_query(&self, state: &mut ConversationState, query: &str) -> TurnReply {
        match self.respond(state, query).await {
            Ok(reply) => reply,
            Err(error) => {
                let text = error.user_message().to_string();
                if error != TurnError::EmptyQuery {
                    state.push(Message::user(query.trim()));
                    state.push(Message::failed_notice(text.clone()));
                }
                let outcome = TurnOutcome::Failed { error_class: error.error_class() };
                TurnReply { text, outcome }
            }
        }
    }

    /// Same as [`Self::process_query`], holding the session lock for the whole turn.
    pub async fn process_shared(
        &self,
        conversation: &SharedConversation,
        query: &str,
    ) -> TurnReply {
        let mut state = conversation.lock().await;
        self.process_query(&mut state, query).await
    }

    async fn run_turn(
        &self,
        state: &mut ConversationState,
        query: &str,
    ) -> Result<TurnReply, TurnError> {
        state.push(Message::user(query));
        let system_prompt = build_system_prompt(
            &self.company_name,
            Utc::now(),
            state.contact_id.as_deref(),
            &self.definitions,
        );

        let mut empty_retries = 0;
        let mut tool_rounds = 0;
        let mut current = TurnState::AwaitingModel;
        loop {
            current = match current {
                TurnState::AwaitingModel => {
                    let turn = self.invoke_model(&system_prompt, state).await?;
                    if turn.is_contentless() {
                        match self.guardrails.on_empty_output(empty_retries) {
                            EmptyOutputDecision::Retry { corrective_prompt } => {
                                empty_retries += 1;
                                debug!(
                                    event_name = "agent.model.empty_output",
                                    conversation_id = %state.id,
                                    retries = empty_retries,
                                    "model returned no content; asking again"
                                );
                                state.push(Message::user(corrective_prompt));
                                TurnState::AwaitingModel
                            }
                            EmptyOutputDecision::Degrade(degradation) => {
                                TurnState::Done(self.fallback(state, degradation))
                            }
                        }
                    } else {
                        match turn {
                            ModelTurn::Text(text) => TurnState::Done(TurnReply {
                                text,
                                outcome: TurnOutcome::Answered,
                            }),
                            ModelTurn::ToolCalls(calls) => {
                                match self.guardrails.on_tool_round(tool_rounds) {
                                    ToolRoundDecision::Allow => TurnState::ExecutingTools(calls),
                                    ToolRoundDecision::Degrade(degradation) => {
                                        TurnState::Done(self.fallback(state, degradation))
                                    }
                                }
                            }
                        }
                    }
                }
                TurnState::ExecutingTools(calls) => {
                    tool_rounds += 1;
                    for call in calls {
                        let payload = self.execute_tool(state, &call).await;
                        state.push(Message::tool_result(call, payload).in_round(tool_rounds));
                    }
                    TurnState::AwaitingModel
                }
                TurnState::Done(reply) => {
                    state.push(Message::assistant(reply.text.clone()));
                    return Ok(reply);
                }
            };
        }
    }

    async fn invoke_model(
        &self,
        system_prompt: &str,
        state: &ConversationState,
    ) -> Result<ModelTurn, TurnError> {
        let request = ModelRequest {
            system_prompt,
            messages: state.messages(),
            tools: &self.definitions,
        };
        let timeout = self.guardrails.model_timeout;

        match tokio::time::timeout(timeout, self.llm.complete(request)).await {
            Ok(Ok(turn)) => Ok(turn),
            Ok(Err(error)) => Err(TurnError::Upstream(error.to_string())),
            Err(_) => Err(TurnError::ModelTimeout { timeout_ms: duration_ms(timeout) }),
        }
    }

    async fn execute_tool(&self, state: &ConversationState, call: &ToolCallRequest) -> Value {
        let started = Instant::now();
        let timeout = self.guardrails.tool_timeout;
        let result =
            tokio::time::timeout(timeout, self.tools.execute(&call.name, call.arguments.clone()))
                .await
                .unwrap_or_else(|_| {
                    Err(ToolError::TimedOut {
                        tool: call.name.clone(),
                        timeout_ms: duration_ms(timeout),
                    })
                });

        match result {
            Ok(payload) => {
                info!(
                    event_name = "agent.tool.executed",
                    conversation_id = %state.id,
                    tool = %call.name,
                    call_id = %call.id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "tool call executed"
                );
                payload
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.rejected",
                    conversation_id = %state.id,
                    tool = %call.name,
                    call_id = %call.id,
                    error_class = error.error_class(),
                    error = %error,
                    "tool call returned an error payload"
                );
                error.payload()
            }
        }
    }

    fn fallback(&self, state: &ConversationState, degradation: Degradation) -> TurnReply {
        let Degradation { reason_code, user_message, fallback_path } = degradation;
        warn!(
            event_name = "agent.turn.fallback",
            conversation_id = %state.id,
            reason_code,
            fallback_path,
            "loop bound reached; answering with fallback"
        );
        TurnReply { text: user_message, outcome: TurnOutcome::Fallback { reason_code } }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
