use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{LlmClient, LlmError, ModelRequest, ModelTurn};
use crate::conversation::Message;

/// What a scripted client saw on one call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// Replays a fixed list of model turns, in order. Used for offline runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    turns: Mutex<VecDeque<Result<ModelTurn, LlmError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl ScriptedLlmClient {
    pub fn new(turns: impl IntoIterator<Item = ModelTurn>) -> Self {
        Self::with_results(turns.into_iter().map(Ok))
    }

    pub fn with_results(results: impl IntoIterator<Item = Result<ModelTurn, LlmError>>) -> Self {
        Self {
            turns: Mutex::new(results.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, turn: Result<ModelTurn, LlmError>) {
        self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push_back(turn);
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelTurn, LlmError> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(
            RecordedRequest {
                system_prompt: request.system_prompt.to_string(),
                messages: request.messages.to_vec(),
                tool_names: request.tools.iter().map(|tool| tool.name.to_string()).collect(),
            },
        );

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or(Err(LlmError::ScriptExhausted))
    }
}
