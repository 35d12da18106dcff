pub mod ask;
pub mod call;
pub mod chat;
pub mod config;
pub mod doctor;
pub mod tools;

use logex_core::config::{AppConfig, LoadOptions};
use serde::Serialize;
use tokio::runtime::Runtime;

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;
pub const EXIT_TURN_FAILED: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::outcome(EXIT_OK, command, "ok", None, message)
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::outcome(exit_code, command, "error", Some(error_class), message)
    }

    /// Pretty-printed JSON body, for commands whose output is data.
    pub fn json<T>(command: &str, exit_code: u8, payload: &T) -> Self
    where
        T: Serialize,
    {
        match serde_json::to_string_pretty(payload) {
            Ok(output) => Self { exit_code, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), exit_code),
        }
    }

    fn outcome(
        exit_code: u8,
        command: &str,
        status: &str,
        error_class: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        let payload = CommandOutcome { command, status, error_class, message: message.into() };
        let output = serde_json::to_string(&payload).unwrap_or_else(|error| {
            format!(
                "{{\"command\":\"{}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
                escape_json(command),
                escape_json(&error.to_string())
            )
        });
        Self { exit_code, output }
    }
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn async_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_TURN_FAILED,
        )
    })
}

pub(crate) fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{CommandResult, EXIT_INVALID_INPUT};

    #[test]
    fn success_omits_error_class() {
        let result = CommandResult::success("ask", "Hello!");
        let payload: Value = serde_json::from_str(&result.output).expect("valid json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("error_class").is_none());
    }

    #[test]
    fn failure_carries_class_and_code() {
        let result =
            CommandResult::failure("call", "invalid_input", "bad \"json\"", EXIT_INVALID_INPUT);
        let payload: Value = serde_json::from_str(&result.output).expect("valid json");

        assert_eq!(result.exit_code, 3);
        assert_eq!(payload["error_class"], "invalid_input");
        assert_eq!(payload["message"], "bad \"json\"");
    }
}
