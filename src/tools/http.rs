//! Generic HTTP GET tool
//!
//! Wraps a fixed endpoint as a tool: the declared JSON schema names the
//! query parameters the model may supply. Input is validated against the
//! schema before any transport call is made.

use super::{Tool, ToolError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// HTTP GET tool with a declared query-parameter schema
pub struct HttpTool {
    name: String,
    description: String,
    base_url: String,
    headers: Vec<(String, String)>,
    schema: Value,
    client: Client,
}

impl HttpTool {
    /// `schema` is a JSON-schema object whose `properties` are the allowed
    /// query parameters (primitive types only) and whose `required` list
    /// names the mandatory ones.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        base_url: impl Into<String>,
        schema: Value,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            description: description.into(),
            base_url: base_url.into(),
            headers: Vec::new(),
            schema,
            client,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Validate input against the declared schema. Checks that the input is
    /// an object, that every required field is present, and that supplied
    /// fields match their declared primitive type.
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let object = input
            .as_object()
            .ok_or_else(|| ToolError::Schema("input must be a JSON object".to_string()))?;

        if let Some(required) = self.schema.get("required").and_then(Value::as_array) {
            for field in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(field) {
                    return Err(ToolError::Schema(format!(
                        "missing required field '{field}'"
                    )));
                }
            }
        }

        let properties = self.schema.get("properties").and_then(Value::as_object);
        for (key, value) in object {
            let declared = properties
                .and_then(|p| p.get(key))
                .and_then(|d| d.get("type"))
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::Schema(format!("unknown field '{key}'")))?;

            let ok = match declared {
                "string" => value.is_string(),
                "number" => value.is_number(),
                "integer" => value.is_i64() || value.is_u64(),
                "boolean" => value.is_boolean(),
                other => {
                    return Err(ToolError::Schema(format!(
                        "field '{key}' has unsupported schema type '{other}'"
                    )))
                }
            };
            if !ok {
                return Err(ToolError::Schema(format!(
                    "field '{key}' must be of type {declared}"
                )));
            }
        }

        Ok(())
    }

    /// Render validated input fields as query parameters.
    fn query_params(input: &Value) -> Vec<(String, String)> {
        input
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(k, v)| {
                        let rendered = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.clone(), rendered)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn send(&self, input: &Value) -> Result<Value, ToolError> {
        let mut builder = self.client.get(&self.base_url);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        builder = builder.query(&Self::query_params(input));

        let response = builder.send().await.map_err(|e| {
            ToolError::Transport(format!("request to {} failed: {e}", self.base_url))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Transport(format!("failed to read response: {e}")))?;

        match status.as_u16() {
            200..=299 => serde_json::from_str(&body)
                .map_err(|e| ToolError::Transport(format!("response was not JSON: {e}"))),
            401 | 403 => Err(ToolError::Auth(body)),
            code => Err(ToolError::Status { status: code, body }),
        }
    }
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn invoke(&self, input: Value, cancel: &CancellationToken) -> Result<Value, ToolError> {
        self.validate(&input)?;

        tracing::debug!(tool = %self.name, url = %self.base_url, "invoking HTTP tool");

        tokio::select! {
            result = self.send(&input) => result,
            () = cancel.cancelled() => Err(ToolError::Cancelled),
        }
    }
}
