//! Tool catalog exposed to the model.

mod logistics;

use std::collections::BTreeMap;

use async_trait::async_trait;
use logex_core::errors::ToolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use logistics::{
    CatalogOptions, CompanyInfoTool, EstimateDeliveryTool, SharedRng, ShippingCostTool,
    TrackOrderTool, ValidateAddressTool,
};

/// What the model is told about a tool.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the argument object.
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, input: Value) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters_schema(),
        }
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full customer-service catalog.
    pub fn logistics(options: CatalogOptions) -> Self {
        let rng = options.shared_rng();
        let mut registry = Self::new();
        registry.register(TrackOrderTool::new(options.order_book()));
        registry.register(EstimateDeliveryTool::new(rng.clone()));
        registry.register(ShippingCostTool);
        registry.register(ValidateAddressTool::new(rng));
        registry.register(CompanyInfoTool::new(options.company_directory()));
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Definitions ordered by tool name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let tool =
            self.get(name).ok_or_else(|| ToolError::UnknownTool { name: name.to_string() })?;
        tool.execute(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Decodes a tool's argument object into its typed form.
pub fn parse_arguments<T>(tool: &str, input: Value) -> Result<T, ToolError>
where
    T: DeserializeOwned,
{
    if !input.is_object() {
        return Err(ToolError::invalid(tool, "arguments must be a JSON object"));
    }
    serde_json::from_value(input).map_err(|error| ToolError::invalid(tool, error.to_string()))
}

/// Accepts `12.5` as well as `"12.5"`; models sometimes quote numbers.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("`{text}` is not a number"))),
    }
}

/// Accepts order ids and zip codes sent as bare numbers.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}
