use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use logex_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use crate::commands::{load_config, CommandResult, EXIT_OK};

struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

impl ConfigField {
    fn new(
        key_path: &'static str,
        env_keys: &'static [&'static str],
        value: impl Into<String>,
    ) -> Self {
        Self { key_path, env_keys, value: value.into() }
    }
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key_path, field.value));
    }

    CommandResult { exit_code: EXIT_OK, output: lines.join("\n") }
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    let unset = || "<unset>".to_string();
    vec![
        ConfigField::new("llm.provider", &["LOGEX_LLM_PROVIDER"], config.llm.provider.as_str()),
        ConfigField::new("llm.model", &["LOGEX_LLM_MODEL"], config.llm.model.as_str()),
        ConfigField::new(
            "llm.base_url",
            &["LOGEX_LLM_BASE_URL"],
            config.llm.base_url.clone().unwrap_or_else(unset),
        ),
        ConfigField::new(
            "llm.api_key",
            &["LOGEX_LLM_API_KEY"],
            if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" },
        ),
        ConfigField::new(
            "llm.temperature",
            &["LOGEX_LLM_TEMPERATURE"],
            config.llm.temperature.to_string(),
        ),
        ConfigField::new(
            "llm.timeout_secs",
            &["LOGEX_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        ConfigField::new(
            "agent.company_name",
            &["LOGEX_AGENT_COMPANY_NAME"],
            config.agent.company_name.as_str(),
        ),
        ConfigField::new(
            "agent.max_empty_retries",
            &["LOGEX_AGENT_MAX_EMPTY_RETRIES"],
            config.agent.max_empty_retries.to_string(),
        ),
        ConfigField::new(
            "agent.max_tool_rounds",
            &["LOGEX_AGENT_MAX_TOOL_ROUNDS"],
            config.agent.max_tool_rounds.to_string(),
        ),
        ConfigField::new(
            "agent.tool_timeout_secs",
            &["LOGEX_AGENT_TOOL_TIMEOUT_SECS"],
            config.agent.tool_timeout_secs.to_string(),
        ),
        ConfigField::new(
            "agent.contact_id",
            &["LOGEX_AGENT_CONTACT_ID"],
            config.agent.contact_id.clone().unwrap_or_else(unset),
        ),
        ConfigField::new(
            "logging.level",
            &["LOGEX_LOGGING_LEVEL", "LOGEX_LOG_LEVEL"],
            config.logging.level.as_str(),
        ),
        ConfigField::new(
            "logging.format",
            &["LOGEX_LOGGING_FORMAT", "LOGEX_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_lowercase(),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    toml::from_str::<Value>(&raw).ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
