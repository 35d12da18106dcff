use logex_agent::llm::OpenAiClient;
use logex_agent::tools::{CatalogOptions, ToolRegistry};
use logex_core::config::{AppConfig, LoadOptions};
use serde::Serialize;
use serde_json::json;

use crate::commands::{async_runtime, CommandResult, EXIT_CONFIG, EXIT_OK};

const EXPECTED_TOOLS: [&str; 5] = [
    "calculate_shipping_cost",
    "estimate_delivery_time",
    "retrieve_company_information",
    "track_order",
    "validate_address",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let config_failed = report
        .checks
        .iter()
        .any(|check| check.name == "config_validation" && check.status == CheckStatus::Fail);
    let exit_code = if config_failed { EXIT_CONFIG } else { EXIT_OK };

    if json_output {
        return CommandResult::json("doctor", exit_code, &report);
    }
    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.push(check_llm_client(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.push(DoctorCheck {
                name: "llm_client",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let registry =
        ToolRegistry::logistics(CatalogOptions { seed: Some(0), ..CatalogOptions::default() });
    checks.push(check_tool_catalog(&registry));
    checks.push(check_tool_execution(&registry));

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_client(config: &AppConfig) -> DoctorCheck {
    match OpenAiClient::from_config(&config.llm) {
        Ok(client) => DoctorCheck::pass(
            "llm_client",
            format!(
                "{} client ready for model `{}` at {}",
                config.llm.provider.as_str(),
                config.llm.model,
                client.endpoint()
            ),
        ),
        Err(error) => DoctorCheck::fail("llm_client", error.to_string()),
    }
}

fn check_tool_catalog(registry: &ToolRegistry) -> DoctorCheck {
    let names = registry.names();
    if names != EXPECTED_TOOLS {
        return DoctorCheck::fail(
            "tool_catalog",
            format!("expected tools {EXPECTED_TOOLS:?}, found {names:?}"),
        );
    }

    let malformed = registry
        .definitions()
        .into_iter()
        .filter(|definition| definition.parameters["type"] != "object")
        .map(|definition| definition.name)
        .collect::<Vec<_>>();
    if !malformed.is_empty() {
        return DoctorCheck::fail(
            "tool_catalog",
            format!("parameter schemas must be objects: {malformed:?}"),
        );
    }

    DoctorCheck::pass("tool_catalog", format!("{} tools registered", names.len()))
}

fn check_tool_execution(registry: &ToolRegistry) -> DoctorCheck {
    let runtime = match async_runtime("doctor") {
        Ok(runtime) => runtime,
        Err(result) => return DoctorCheck::fail("tool_execution", result.output),
    };

    let arguments = json!({ "length": 10, "width": 10, "height": 10, "weight": 2 });
    match runtime.block_on(registry.execute("calculate_shipping_cost", arguments)) {
        Ok(payload) if payload["shipping_cost"] == json!(16.0) => {
            DoctorCheck::pass("tool_execution", "reference shipping quote computed as 16.00")
        }
        Ok(payload) => DoctorCheck::fail(
            "tool_execution",
            format!("unexpected reference shipping quote: {payload}"),
        ),
        Err(error) => DoctorCheck::fail("tool_execution", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
