//! `tools`: list or invoke the local tools without the assistant

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::tools::{build_registry, ToolRegistry};

/// Tool definitions in the function-calling format, pretty-printed
///
/// # Errors
///
/// Returns error if serialization fails
pub fn render_definitions(registry: &ToolRegistry) -> Result<String> {
    let definitions: Vec<serde_json::Value> = registry
        .all_definitions()
        .iter()
        .map(|tool| tool.to_function_json())
        .collect();
    Ok(serde_json::to_string_pretty(&definitions)?)
}

/// Print every tool definition
///
/// # Errors
///
/// Returns error if the roster cannot be loaded
pub fn list_tools(config: &Config) -> Result<()> {
    let registry = build_registry(&config.tools, config.app.lang)?;
    println!("{}", render_definitions(&registry)?);
    Ok(())
}

/// Invoke `name` with JSON `args` and render its output
///
/// String outputs are returned as-is, other values pretty-printed.
///
/// # Errors
///
/// Returns `RelayError::UnknownTool` for unregistered names and
/// `RelayError::ToolArguments` when `args` is not valid JSON or does not
/// match the tool's parameters
pub async fn invoke(registry: &ToolRegistry, name: &str, args: &str) -> Result<String> {
    let tool = registry.resolve(name)?;
    let args: serde_json::Value =
        serde_json::from_str(args).map_err(|e| RelayError::ToolArguments {
            tool: name.to_string(),
            message: e.to_string(),
        })?;

    match tool.execute(args).await? {
        serde_json::Value::String(text) => Ok(text),
        value => Ok(serde_json::to_string_pretty(&value)?),
    }
}

/// Invoke a tool and print its output
///
/// # Errors
///
/// Returns error if the roster cannot be loaded or the invocation fails
pub async fn call_tool(config: &Config, name: &str, args: &str) -> Result<()> {
    let registry = build_registry(&config.tools, config.app.lang)?;
    println!("{}", invoke(&registry, name, args).await?);
    Ok(())
}
