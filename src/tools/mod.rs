//! Tools module for the assistant relay
//!
//! This module contains the tool definitions, the tool registry, and the
//! local lookup functions the assistant can call while a run is in progress.

pub mod calendar;
pub mod registry_builder;
pub mod roster;
pub mod schedule;

use crate::error::{RelayError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use calendar::{Clock, CurrentDateTool, CurrentWorkWeekTool, FixedClock, SystemClock};
pub use registry_builder::{build_registry, ToolRegistryBuilder};
pub use roster::{Roster, RosterMember, ScheduleEntry, ScheduleKind};
pub use schedule::ScheduleTool;

/// Tool definition structure
///
/// Describes a tool to the assistant in the function calling format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON schema for the tool's parameters
    pub parameters: serde_json::Value,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Definition in the shape assistants expect under `tools`
    ///
    /// # Examples
    ///
    /// ```
    /// use assistant_relay::tools::Tool;
    /// use serde_json::json;
    ///
    /// let tool = Tool::new("ping", "Ping", json!({"type": "object"}));
    /// assert_eq!(tool.to_function_json()["type"], "function");
    /// assert_eq!(tool.to_function_json()["function"]["name"], "ping");
    /// ```
    pub fn to_function_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// Tools are deterministic lookups: they read their injected data and the
/// clock, never perform I/O, and fail only on malformed arguments.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition
    fn tool_definition(&self) -> Tool;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ToolArguments`] when `args` do not match the
    /// tool's parameters
    async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Decode tool arguments into a typed parameter struct
///
/// `null` is treated as an empty object so tools with only optional
/// parameters accept calls without arguments.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: serde_json::Value) -> Result<T> {
    let args = if args.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| {
        RelayError::ToolArguments {
            tool: tool.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Tool registry for managing available tools
///
/// Built once at startup and shared read-only with the run driver.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool executor under its definition name
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if a tool with the same name is
    /// already registered
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) -> Result<()> {
        let name = executor.tool_definition().name;
        if name.trim().is_empty() {
            return Err(RelayError::Config("Tool name cannot be empty".to_string()).into());
        }
        if self.tools.contains_key(&name) {
            return Err(RelayError::Config(format!("Duplicate tool name: {}", name)).into());
        }
        self.tools.insert(name, executor);
        Ok(())
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// Resolve a tool the assistant asked for
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownTool`] when nothing is registered under
    /// `name`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ToolExecutor>> {
        self.get(name)
            .ok_or_else(|| RelayError::UnknownTool(name.to_string()).into())
    }

    /// Check every entry is registered under its own definition name
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] naming the first mismatch
    pub fn validate(&self) -> Result<()> {
        for (name, executor) in &self.tools {
            let defined = executor.tool_definition().name;
            if &defined != name {
                return Err(RelayError::Config(format!(
                    "Tool registered as '{}' defines itself as '{}'",
                    name, defined
                ))
                .into());
            }
        }
        Ok(())
    }

    /// All tool definitions, sorted by name
    pub fn all_definitions(&self) -> Vec<Tool> {
        self.tools
            .values()
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True if no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockToolExecutor {
        name: String,
    }

    #[async_trait]
    impl ToolExecutor for MockToolExecutor {
        fn tool_definition(&self) -> Tool {
            Tool::new(self.name.clone(), "Mock tool", json!({"type": "object"}))
        }

        async fn execute(&self, args: serde_json::Value) -> Result<serde_json::Value> {
            Ok(json!({ "echo": args }))
        }
    }

    fn mock(name: &str) -> Arc<dyn ToolExecutor> {
        Arc::new(MockToolExecutor {
            name: name.to_string(),
        })
    }

    #[test]
    fn test_tool_registry_new() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_tool_registry_register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("test")).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("test").is_ok());
    }

    #[test]
    fn test_tool_registry_rejects_duplicates() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("test")).unwrap();
        assert!(registry.register(mock("test")).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_tool_registry_rejects_empty_name() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(mock(" ")).is_err());
    }

    #[test]
    fn test_resolve_unknown_tool_is_an_error() {
        let registry = ToolRegistry::new();
        let err = registry.resolve("nonexistent").err().unwrap();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::UnknownTool(name)) if name == "nonexistent"
        ));
    }

    #[test]
    fn test_definitions_and_names_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(mock("zeta")).unwrap();
        registry.register(mock("alpha")).unwrap();
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        let names: Vec<String> = registry
            .all_definitions()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
        assert!(registry.validate().is_ok());
    }

    #[tokio::test]
    async fn test_tool_executor_execution() {
        let registry = {
            let mut r = ToolRegistry::new();
            r.register(mock("echo")).unwrap();
            r
        };
        let tool = registry.resolve("echo").unwrap();
        let result = tool.execute(json!({"a": 1})).await.unwrap();
        assert_eq!(result, json!({"echo": {"a": 1}}));
    }

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(default)]
        names: Vec<String>,
    }

    #[test]
    fn test_parse_args_treats_null_as_empty_object() {
        let params: Params = parse_args("t", serde_json::Value::Null).unwrap();
        assert!(params.names.is_empty());
    }

    #[test]
    fn test_parse_args_reports_tool_name() {
        let err = parse_args::<Params>("t", json!({"names": 5})).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::ToolArguments { tool, .. }) if tool == "t"
        ));
    }
}
