//! Tool layer
//!
//! Tools are external capabilities a participant may invoke while producing
//! its message. Each declares a JSON input schema; invocation returns
//! structured JSON or a typed failure. The engine never invokes a tool
//! directly — a participant owns its tools through a [`ToolSet`].

pub mod coinmarketcap;
mod http;

pub use http::HttpTool;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::llm::ToolDefinition;

/// Typed tool invocation failure. Surfaced to the owning participant,
/// which decides whether to degrade or re-raise.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Input failed schema validation; no transport call was made.
    #[error("invalid input: {0}")]
    Schema(String),
    /// Network or transport failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Missing or rejected credential.
    #[error("authorization failure: {0}")]
    Auth(String),
    /// Non-2xx response that is not an authorization failure.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// Invocation was cancelled before completing.
    #[error("invocation cancelled")]
    Cancelled,
}

/// Trait for tools a participant can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Invoke the tool with validated-by-implementation input
    async fn invoke(&self, input: Value, cancel: &CancellationToken) -> Result<Value, ToolError>;
}

/// Ordered collection of tools owned by one participant
#[derive(Default, Clone)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    #[allow(dead_code)] // Utility method for API completeness
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool definitions for a completion request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Invoke a tool by name. An unknown name is a schema-class failure:
    /// the model asked for a capability this participant does not own.
    pub async fn invoke(
        &self,
        name: &str,
        input: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ToolError> {
        for tool in &self.tools {
            if tool.name() == name {
                return tool.invoke(input, cancel).await;
            }
        }
        Err(ToolError::Schema(format!("unknown tool '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> String {
            "Echoes its input.".to_string()
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn invoke(
            &self,
            input: Value,
            _cancel: &CancellationToken,
        ) -> Result<Value, ToolError> {
            Ok(input)
        }
    }

    #[tokio::test]
    async fn invoke_routes_by_name() {
        let set = ToolSet::new().with_tool(Arc::new(EchoTool));
        let cancel = CancellationToken::new();

        let out = set
            .invoke("echo", json!({"hello": "world"}), &cancel)
            .await
            .unwrap();
        assert_eq!(out["hello"], "world");
    }

    #[tokio::test]
    async fn unknown_tool_is_schema_error() {
        let set = ToolSet::new().with_tool(Arc::new(EchoTool));
        let cancel = CancellationToken::new();

        let err = set.invoke("missing", json!({}), &cancel).await.unwrap_err();
        assert!(matches!(err, ToolError::Schema(_)));
    }

    #[test]
    fn definitions_expose_schema() {
        let set = ToolSet::new().with_tool(Arc::new(EchoTool));
        let defs = set.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].input_schema["type"], "object");
    }
}
