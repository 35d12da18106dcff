use logex_agent::tools::{CatalogOptions, ToolRegistry};
use serde_json::Value;

use crate::commands::{async_runtime, CommandResult, EXIT_INVALID_INPUT, EXIT_OK};

/// Invokes one catalog tool directly, without a model in the loop.
pub fn run(tool: &str, raw_args: &str, seed: Option<u64>) -> CommandResult {
    let arguments = match serde_json::from_str::<Value>(raw_args) {
        Ok(arguments) => arguments,
        Err(error) => {
            return CommandResult::failure(
                "call",
                "invalid_input",
                format!("--args is not valid JSON: {error}"),
                EXIT_INVALID_INPUT,
            );
        }
    };
    let runtime = match async_runtime("call") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let registry = ToolRegistry::logistics(CatalogOptions { seed, ..CatalogOptions::default() });
    match runtime.block_on(registry.execute(tool, arguments)) {
        Ok(payload) => CommandResult::json("call", EXIT_OK, &payload),
        Err(error) => CommandResult::json("call", EXIT_INVALID_INPUT, &error.payload()),
    }
}
