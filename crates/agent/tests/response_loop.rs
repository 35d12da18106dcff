use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use logex_agent::conversation::{ConversationState, Message, Role, SharedConversation};
use logex_agent::guardrails::{GuardrailPolicy, CORRECTIVE_PROMPT, FALLBACK_ANSWER};
use logex_agent::llm::{LlmError, ModelTurn, ScriptedLlmClient};
use logex_agent::tools::{CatalogOptions, Tool, ToolRegistry};
use logex_agent::{AgentRuntime, ToolCallRequest, TurnOutcome};
use logex_core::errors::{ToolError, TurnError};
use serde_json::{json, Value};

fn ensure(condition: bool, message: impl Into<String>) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message.into())
    }
}

fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest { id: id.to_string(), name: name.to_string(), arguments }
}

fn catalog() -> ToolRegistry {
    ToolRegistry::logistics(CatalogOptions { seed: Some(7), ..CatalogOptions::default() })
}

fn runtime_with(llm: Arc<ScriptedLlmClient>, policy: GuardrailPolicy) -> AgentRuntime {
    AgentRuntime::new(llm, catalog(), policy)
}

fn roles(state: &ConversationState) -> Vec<Role> {
    state.messages().iter().map(|message| message.role).collect()
}

fn payload_at(state: &ConversationState, index: usize) -> Result<Value, String> {
    let message = state.messages().get(index).ok_or(format!("no message at {index}"))?;
    serde_json::from_str(&message.content_string()).map_err(|e| e.to_string())
}

#[tokio::test]
async fn tool_call_then_final_text() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::ToolCalls(vec![call(
            "call_1",
            "track_order",
            json!({ "order_id": "ORD123456" }),
        )]),
        ModelTurn::text("Your order ORD123456 is being prepared for shipment."),
    ]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default());
    let mut state = ConversationState::new();

    let reply = runtime
        .respond(&mut state, "Where is my order ORD123456?")
        .await
        .map_err(|e| e.to_string())?;

    ensure(reply.outcome == TurnOutcome::Answered, "turn should be answered")?;
    ensure(reply.text.contains("ORD123456"), "answer should come from the model")?;
    ensure(
        roles(&state) == vec![Role::User, Role::ToolResult, Role::Assistant],
        format!("unexpected message order: {:?}", roles(&state)),
    )?;

    let tool_message = &state.messages()[1];
    ensure(tool_message.tool_call_id() == Some("call_1"), "tool result must carry the call id")?;
    ensure(tool_message.tool_round == Some(1), "tool result is tagged with its round")?;
    let payload = payload_at(&state, 1)?;
    ensure(payload["status"] == "Processing", format!("unexpected payload {payload}"))?;
    ensure(payload.get("estimated_delivery").is_some(), "open order needs an estimate")?;

    let requests = llm.requests();
    ensure(requests.len() == 2, "model should be asked twice")?;
    ensure(requests[1].messages.len() == 2, "second call sees query and tool result")?;
    ensure(requests[0].tool_names.len() == 5, "the whole catalog is offered")
}

#[tokio::test]
async fn sibling_tool_results_precede_next_model_call() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::ToolCalls(vec![
            call("call_a", "track_order", json!({ "order_id": "ORD789012" })),
            call(
                "call_b",
                "calculate_shipping_cost",
                json!({ "length": 10, "width": 10, "height": 10, "weight": 2 }),
            ),
        ]),
        ModelTurn::text("Your order is in transit and a new 10x10x10 box costs $16.00."),
    ]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default());
    let mut state = ConversationState::new();

    runtime.respond(&mut state, "Two questions").await.map_err(|e| e.to_string())?;

    let requests = llm.requests();
    let second = requests.get(1).ok_or("missing second model call")?;
    let ids = second.messages.iter().filter_map(Message::tool_call_id).collect::<Vec<_>>();
    ensure(ids == vec!["call_a", "call_b"], format!("tool results out of order: {ids:?}"))?;

    let rounds =
        state.messages().iter().filter_map(|message| message.tool_round).collect::<Vec<_>>();
    ensure(rounds == vec![1, 1], format!("sibling calls share a round: {rounds:?}"))?;

    let cost = payload_at(&state, 2)?;
    ensure(cost["shipping_cost"] == json!(16.0), format!("unexpected cost payload {cost}"))
}

#[tokio::test]
async fn consecutive_tool_rounds_stay_distinguishable() -> Result<(), String> {
    // Both rounds reuse the same per-response call id.
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::ToolCalls(vec![call(
            "call_0",
            "track_order",
            json!({ "order_id": "ORD789012" }),
        )]),
        ModelTurn::ToolCalls(vec![call(
            "call_0",
            "estimate_delivery_time",
            json!({ "order_id": "ORD789012", "destination_zip": "80202" }),
        )]),
        ModelTurn::text("Your order is in transit and should arrive within a few days."),
    ]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default());
    let mut state = ConversationState::new();

    let reply = runtime
        .respond(&mut state, "Where is ORD789012 and when will it reach Denver?")
        .await
        .map_err(|e| e.to_string())?;

    ensure(reply.is_answered(), "turn should be answered")?;
    ensure(
        roles(&state) == vec![Role::User, Role::ToolResult, Role::ToolResult, Role::Assistant],
        format!("unexpected message order: {:?}", roles(&state)),
    )?;
    let rounds = state.messages().iter().map(|message| message.tool_round).collect::<Vec<_>>();
    ensure(
        rounds == vec![None, Some(1), Some(2), None],
        format!("each round keeps its own tag: {rounds:?}"),
    )?;

    let requests = llm.requests();
    ensure(requests.len() == 3, "model is asked after every round")?;
    ensure(requests[1].messages.len() == 2, "second call sees only the first round")?;
    ensure(requests[2].messages[2].tool_round == Some(2), "third call sees the second round")
}

#[tokio::test]
async fn empty_outputs_are_retried_with_corrective_prompt() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::text(""),
        ModelTurn::text("   "),
        ModelTurn::text("Hello! How can I help you today?"),
    ]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default());
    let mut state = ConversationState::new();

    let reply = runtime.respond(&mut state, "hi").await.map_err(|e| e.to_string())?;

    ensure(reply.text == "Hello! How can I help you today?", "final text is returned")?;
    ensure(llm.call_count() == 3, "model is asked exactly three times")?;
    let correctives = state
        .messages()
        .iter()
        .filter(|message| message.as_text() == Some(CORRECTIVE_PROMPT))
        .count();
    ensure(correctives == 2, format!("expected two corrective prompts, got {correctives}"))?;
    ensure(state.last().and_then(Message::as_text) == Some(reply.text.as_str()), "answer is last")
}

#[tokio::test]
async fn exhausted_retries_return_fallback() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::text(""),
        ModelTurn::ToolCalls(Vec::new()),
        ModelTurn::text("\n"),
        ModelTurn::text(""),
        ModelTurn::text("never reached"),
    ]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default());
    let mut state = ConversationState::new();

    let reply = runtime.respond(&mut state, "hi").await.map_err(|e| e.to_string())?;

    ensure(reply.text == FALLBACK_ANSWER, "fallback apology expected")?;
    ensure(
        reply.outcome == TurnOutcome::Fallback { reason_code: "empty_output_retries_exhausted" },
        format!("unexpected outcome {:?}", reply.outcome),
    )?;
    ensure(llm.call_count() == 4, "one initial call plus three retries")?;
    ensure(llm.remaining() == 1, "script must not be drained past the cap")?;
    ensure(
        state.last().map(|message| message.role) == Some(Role::Assistant),
        "fallback is recorded",
    )
}

#[tokio::test]
async fn unknown_tool_and_bad_arguments_become_payloads() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::ToolCalls(vec![
            call("call_1", "teleport_package", json!({})),
            call(
                "call_2",
                "calculate_shipping_cost",
                json!({ "length": 10, "width": 10, "height": 10 }),
            ),
            call("call_3", "track_order", Value::String("{order_id:".to_string())),
        ]),
        ModelTurn::text("I could not look that up, sorry."),
    ]));
    let runtime = runtime_with(llm, GuardrailPolicy::default());
    let mut state = ConversationState::new();

    let reply = runtime.respond(&mut state, "help").await.map_err(|e| e.to_string())?;
    ensure(reply.is_answered(), "loop continues after tool errors")?;

    let payloads = state
        .messages()
        .iter()
        .filter(|message| message.role == Role::ToolResult)
        .map(|message| serde_json::from_str::<Value>(&message.content_string()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    ensure(payloads.len() == 3, "every call gets a result")?;
    ensure(payloads[0]["error"] == "tool not found", format!("{}", payloads[0]))?;
    ensure(payloads[0]["tool"] == "teleport_package", "unknown name is echoed")?;
    ensure(payloads[1]["error"] == "invalid arguments", format!("{}", payloads[1]))?;
    ensure(
        payloads[1]["details"].as_str().is_some_and(|details| details.contains("weight")),
        "missing field is named",
    )?;
    ensure(payloads[2]["error"] == "invalid arguments", format!("{}", payloads[2]))
}

#[tokio::test]
async fn unknown_order_is_a_normal_result() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::ToolCalls(vec![call(
            "call_1",
            "track_order",
            json!({ "order_id": "ORD000000" }),
        )]),
        ModelTurn::text("I could not find that order."),
    ]));
    let runtime = runtime_with(llm, GuardrailPolicy::default());
    let mut state = ConversationState::new();

    runtime.respond(&mut state, "Where is ORD000000?").await.map_err(|e| e.to_string())?;

    let payload = payload_at(&state, 1)?;
    ensure(
        payload == json!({ "error": "Order not found", "order_id": "ORD000000" }),
        format!("{payload}"),
    )
}

#[tokio::test]
async fn upstream_failure_rolls_back_and_process_query_records_notice() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::with_results([
        Ok(ModelTurn::ToolCalls(vec![call(
            "call_1",
            "track_order",
            json!({ "order_id": "ORD123456" }),
        )])),
        Err(LlmError::Status { status: 429, body: "rate limited".to_string() }),
    ]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default());
    let mut state = ConversationState::from_history(vec![
        Message::user("hello"),
        Message::assistant("Hi! How can I help?"),
    ]);
    let before = state.clone();

    let result = runtime.respond(&mut state, "Where is ORD123456?").await;
    ensure(matches!(result, Err(TurnError::Upstream(_))), format!("unexpected result {result:?}"))?;
    ensure(state == before, "history must be rolled back exactly")?;

    llm.push(Err(LlmError::Transport("connection reset".to_string())));
    let reply = runtime.process_query(&mut state, "Where is ORD123456?").await;
    ensure(
        reply.outcome == TurnOutcome::Failed { error_class: "upstream_failure" },
        format!("unexpected outcome {:?}", reply.outcome),
    )?;
    ensure(reply.text.contains("try again"), "user-safe text expected")?;
    ensure(!reply.text.contains("connection reset"), "internal detail must not leak")?;
    ensure(state.len() == before.len() + 2, "query and notice appended")?;
    ensure(state.last().is_some_and(|message| message.failed), "notice is flagged")
}

#[tokio::test]
async fn slow_model_times_out() -> Result<(), String> {
    let llm = Arc::new(
        ScriptedLlmClient::new([ModelTurn::text("too late")])
            .with_delay(Duration::from_millis(500)),
    );
    let policy =
        GuardrailPolicy { model_timeout: Duration::from_millis(20), ..GuardrailPolicy::default() };
    let runtime = runtime_with(llm, policy);
    let mut state = ConversationState::new();

    let result = runtime.respond(&mut state, "hi").await;

    ensure(
        result == Err(TurnError::ModelTimeout { timeout_ms: 20 }),
        format!("unexpected {result:?}"),
    )?;
    ensure(state.is_empty(), "timed-out turn leaves no trace")
}

struct StallingTool;

#[async_trait]
impl Tool for StallingTool {
    fn name(&self) -> &'static str {
        "stall"
    }

    fn description(&self) -> &'static str {
        "Never finishes in time."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _input: Value) -> Result<Value, ToolError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(json!({}))
    }
}

#[tokio::test]
async fn slow_tool_yields_timeout_payload() -> Result<(), String> {
    let llm = Arc::new(ScriptedLlmClient::new([
        ModelTurn::ToolCalls(vec![call("call_1", "stall", json!({}))]),
        ModelTurn::text("That lookup is taking too long."),
    ]));
    let mut tools = ToolRegistry::new();
    tools.register(StallingTool);
    let policy =
        GuardrailPolicy { tool_timeout: Duration::from_millis(20), ..GuardrailPolicy::default() };
    let runtime = AgentRuntime::new(llm, tools, policy);
    let mut state = ConversationState::new();

    let reply = runtime.respond(&mut state, "stall please").await.map_err(|e| e.to_string())?;
    ensure(reply.is_answered(), "turn still completes")?;

    let payload = payload_at(&state, 1)?;
    ensure(payload["error"] == "tool timed out", format!("{payload}"))?;
    ensure(payload["timeout_ms"] == 20, format!("sub-second budget must survive: {payload}"))
}

#[tokio::test]
async fn tool_rounds_are_capped() -> Result<(), String> {
    let round = || {
        let arguments = json!({ "order_id": "ORD345678" });
        ModelTurn::ToolCalls(vec![call("call_x", "track_order", arguments)])
    };
    let llm = Arc::new(ScriptedLlmClient::new([round(), round(), round(), round()]));
    let policy = GuardrailPolicy { max_tool_rounds: 2, ..GuardrailPolicy::default() };
    let runtime = runtime_with(llm.clone(), policy);
    let mut state = ConversationState::new();

    let reply = runtime.respond(&mut state, "loop forever").await.map_err(|e| e.to_string())?;

    ensure(
        reply.outcome == TurnOutcome::Fallback { reason_code: "tool_rounds_exhausted" },
        format!("unexpected outcome {:?}", reply.outcome),
    )?;
    ensure(llm.call_count() == 3, "two rounds run, the third request is refused")?;
    let results =
        state.messages().iter().filter(|message| message.role == Role::ToolResult).count();
    ensure(results == 2, format!("expected two tool results, got {results}"))
}

#[tokio::test]
async fn preamble_carries_contact_and_time() -> Result<(), String> {
    let llm =
        Arc::new(ScriptedLlmClient::new([ModelTurn::text("Hi!"), ModelTurn::text("Hi again!")]));
    let runtime = runtime_with(llm.clone(), GuardrailPolicy::default()).with_company_name("Logex");

    let mut anonymous = ConversationState::new();
    runtime.respond(&mut anonymous, "hello").await.map_err(|e| e.to_string())?;
    let mut known = ConversationState::new().with_contact_id("1");
    runtime.respond(&mut known, "hello").await.map_err(|e| e.to_string())?;

    let requests = llm.requests();
    ensure(requests[0].system_prompt.contains("Contact ID: Unknown"), "missing placeholder")?;
    ensure(requests[1].system_prompt.contains("Contact ID: 1"), "missing contact id")?;
    ensure(requests[0].system_prompt.contains("Current time: 20"), "missing timestamp")?;
    ensure(requests[0].system_prompt.contains("Logex"), "missing company name")
}

#[tokio::test]
async fn shared_sessions_serialize_turns() -> Result<(), String> {
    let llm =
        Arc::new(ScriptedLlmClient::new([ModelTurn::text("first"), ModelTurn::text("second")]));
    let runtime = Arc::new(runtime_with(llm, GuardrailPolicy::default()));
    let session = SharedConversation::default();

    let handles = ["one", "two"].map(|query| {
        let runtime = Arc::clone(&runtime);
        let session = session.clone();
        tokio::spawn(async move { runtime.process_shared(&session, query).await })
    });
    for handle in handles {
        let reply = handle.await.map_err(|e| e.to_string())?;
        ensure(reply.is_answered(), "both turns answer")?;
    }

    let snapshot = session.snapshot().await;
    ensure(
        roles(&snapshot) == vec![Role::User, Role::Assistant, Role::User, Role::Assistant],
        format!("turns interleaved: {:?}", roles(&snapshot)),
    )
}
