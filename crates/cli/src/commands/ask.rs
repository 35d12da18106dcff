use logex_agent::{AgentRuntime, ConversationState, TurnOutcome, TurnReply};
use logex_core::config::LoadOptions;

use crate::commands::{
    async_runtime, load_config, CommandResult, EXIT_CONFIG, EXIT_INVALID_INPUT, EXIT_TURN_FAILED,
};

pub fn run(options: &LoadOptions, query: &str) -> CommandResult {
    let config = match load_config("ask", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let agent = match AgentRuntime::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("ask", "llm_client", error.to_string(), EXIT_CONFIG);
        }
    };
    let runtime = match async_runtime("ask") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let mut state = ConversationState::new();
    state.contact_id = config.agent.contact_id.clone();
    let reply = runtime.block_on(agent.process_query(&mut state, query));
    render_reply(reply)
}

/// Maps a turn reply onto the command envelope and exit code.
pub fn render_reply(reply: TurnReply) -> CommandResult {
    match reply.outcome {
        TurnOutcome::Answered | TurnOutcome::Fallback { .. } => {
            CommandResult::success("ask", reply.text)
        }
        TurnOutcome::Failed { error_class } => {
            let exit_code =
                if error_class == "empty_query" { EXIT_INVALID_INPUT } else { EXIT_TURN_FAILED };
            CommandResult::failure("ask", error_class, reply.text, exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use logex_agent::{TurnOutcome, TurnReply};
    use serde_json::Value;

    use super::render_reply;

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).expect("valid json")
    }

    #[test]
    fn fallback_is_still_a_successful_answer() {
        let result = render_reply(TurnReply {
            text: "Sorry.".to_string(),
            outcome: TurnOutcome::Fallback { reason_code: "tool_rounds_exhausted" },
        });

        assert_eq!(result.exit_code, 0);
        assert_eq!(parse(&result.output)["message"], "Sorry.");
    }

    #[test]
    fn failures_map_to_exit_codes() {
        let empty = render_reply(TurnReply {
            text: "Please type a question.".to_string(),
            outcome: TurnOutcome::Failed { error_class: "empty_query" },
        });
        let upstream = render_reply(TurnReply {
            text: "Please try again.".to_string(),
            outcome: TurnOutcome::Failed { error_class: "upstream_failure" },
        });

        assert_eq!(empty.exit_code, 3);
        assert_eq!(upstream.exit_code, 4);
        assert_eq!(parse(&upstream.output)["error_class"], "upstream_failure");
    }
}
