use logex_agent::tools::{CatalogOptions, ToolRegistry};

use crate::commands::{CommandResult, EXIT_OK};

/// Prints the tool catalog exactly as the model receives it.
pub fn run() -> CommandResult {
    let registry = ToolRegistry::logistics(CatalogOptions::default());
    CommandResult::json("tools", EXIT_OK, &registry.definitions())
}
