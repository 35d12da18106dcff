use anyhow::{Context, Result};
use logex_agent::{AgentRuntime, ConversationState};
use logex_core::config::LoadOptions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::commands::{async_runtime, load_config, CommandResult, EXIT_CONFIG, EXIT_TURN_FAILED};

const HISTORY_COMMAND: &str = "/history";
const EXIT_COMMAND: &str = "/exit";
const PROMPT: &str = "you> ";

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("chat", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let agent = match AgentRuntime::from_config(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("chat", "llm_client", error.to_string(), EXIT_CONFIG);
        }
    };
    let runtime = match async_runtime("chat") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let mut state = ConversationState::new();
    state.contact_id = config.agent.contact_id.clone();
    info!(
        event_name = "cli.chat.started",
        conversation_id = %state.id,
        model = %config.llm.model,
        "interactive session started"
    );
    let result = runtime.block_on(async {
        let input = BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        run_session(&agent, &mut state, input, &mut output).await
    });

    match result {
        Ok(turns) => CommandResult::success("chat", format!("session ended after {turns} turn(s)")),
        Err(error) => CommandResult::failure("chat", "io", format!("{error:#}"), EXIT_TURN_FAILED),
    }
}

/// Reads queries line by line until `/exit` or end of input. Returns the
/// number of turns run.
pub async fn run_session<R, W>(
    agent: &AgentRuntime,
    state: &mut ConversationState,
    input: R,
    output: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut turns = 0;

    loop {
        output.write_all(PROMPT.as_bytes()).await.context("failed to write prompt")?;
        output.flush().await.context("failed to flush prompt")?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            EXIT_COMMAND => break,
            HISTORY_COMMAND => {
                let history = serde_json::to_string_pretty(state.messages())
                    .context("failed to serialize history")?;
                output.write_all(history.as_bytes()).await.context("failed to write history")?;
            }
            query => {
                let reply = agent.process_query(state, query).await;
                turns += 1;
                output
                    .write_all(format!("{}> {}", agent.company_name(), reply.text).as_bytes())
                    .await
                    .context("failed to write answer")?;
            }
        }
        output.write_all(b"\n").await.context("failed to write newline")?;
    }

    output.write_all(b"\n").await.context("failed to write newline")?;
    output.flush().await.context("failed to flush output")?;
    Ok(turns)
}
