//! Agent runtime for the Logex customer-service assistant.
//!
//! This crate owns the one piece of real control flow in the assistant: the
//! tool-augmented response loop.
//!
//! # Architecture
//!
//! Each user query runs as one turn:
//! 1. **Conversation** (`conversation`) - append the query to the session history
//! 2. **Model call** (`llm`) - send preamble, history and tool catalog to the model
//! 3. **Tool execution** (`tools`) - run requested tools, append their results, ask again
//! 4. **Guardrails** (`guardrails`) - bound empty-output retries and tool rounds
//!
//! # Key Types
//!
//! - `AgentRuntime` - the response loop (see `runtime` module)
//! - `LlmClient` - pluggable model boundary (OpenAI-compatible HTTP or scripted)
//! - `ToolRegistry` - name → tool catalog with typed argument validation
//!
//! # Failure Principle
//!
//! Tool failures never abort a turn: they become structured payloads the model
//! can read. Model failures roll the turn back and surface as a user-safe message.

pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod tools;

pub use conversation::{ConversationState, Message, Role, SharedConversation, ToolCallRequest};
pub use runtime::{AgentRuntime, TurnOutcome, TurnReply};
