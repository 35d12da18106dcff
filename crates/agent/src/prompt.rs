//! System preamble sent with every model call.

use chrono::{DateTime, Utc};

use crate::tools::ToolDefinition;

pub const UNKNOWN_CONTACT: &str = "Unknown";

/// Builds the preamble: persona, tool overview, current time and contact id.
pub fn build_system_prompt(
    company_name: &str,
    now: DateTime<Utc>,
    contact_id: Option<&str>,
    tools: &[ToolDefinition],
) -> String {
    let tool_descriptions = tools
        .iter()
        .map(|tool| format!("- {}: {}", tool.name, tool.description))
        .collect::<Vec<_>>()
        .join("\n");
    let contact_id =
        contact_id.map(str::trim).filter(|id| !id.is_empty()).unwrap_or(UNKNOWN_CONTACT);

    format!(
        r#"You are a customer service representative for {company_name}, a logistics company. You help customers with shipping and delivery questions. Keep answers short and accurate, and use the available tools whenever live data is needed.

## Tools

{tool_descriptions}

## Guidelines

- Look up order status, delivery dates, shipping prices and addresses with the tools. Never guess them.
- Do not promise delivery dates or prices that no tool returned.
- When a tool cannot find what the customer asked for, say so politely and offer to escalate to a human representative.
- Walk customers through multi-step processes such as scheduling a pickup or filing a claim one step at a time.
- Only discuss order details with the customer who asked about them.
- Be friendly and professional.

Current time: {now}.
Contact ID: {contact_id}"#,
        now = logex_core::logistics::iso8601(now),
    )
}
