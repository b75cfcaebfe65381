//! OpenAI-compatible chat-completions client
//!
//! One wire implementation behind [`CompletionService`], constructed either
//! against the hosted endpoint (API key required) or against a local
//! OpenAI-compatible endpoint with no credential.

use super::types::{ContentBlock, LlmMessage, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{CompletionService, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HOSTED_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Chat-completions service implementation
pub struct ChatCompletionsService {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl ChatCompletionsService {
    /// Remote hosted endpoint; requires a credential.
    pub fn hosted(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(HOSTED_URL.to_string(), Some(api_key.into()), model)
    }

    /// Local open endpoint (e.g. an Ollama or llama.cpp server exposing
    /// `/v1`); no credential is sent.
    pub fn local(base_url: &str, model: impl Into<String>) -> Self {
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self::with_endpoint(endpoint, None, model)
    }

    fn with_endpoint(endpoint: String, api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            model: model.into(),
            endpoint,
        }
    }

    fn translate_request(&self, request: &LlmRequest) -> WireRequest {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: Some(request.system.clone()),
            tool_calls: None,
            tool_call_id: None,
        }];

        for msg in &request.messages {
            messages.extend(translate_message(msg));
        }

        let tools: Vec<WireToolDef> = request
            .tools
            .iter()
            .map(|t| WireToolDef {
                r#type: "function".to_string(),
                function: WireFunctionDef {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect();

        WireRequest {
            model: self.model.clone(),
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            max_tokens: request.max_tokens,
        }
    }

    fn classify_error(&self, status: reqwest::StatusCode, body: &str) -> LlmError {
        let message = body.to_string();
        match status.as_u16() {
            401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
            429 => {
                let mut err = LlmError::rate_limit(format!("Rate limited: {message}"));
                if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
                    if let Some(retry_after) = parsed
                        .get("error")
                        .and_then(|e| e.get("retry_after"))
                        .and_then(serde_json::Value::as_f64)
                    {
                        err = err.with_retry_after(Duration::from_secs_f64(retry_after));
                    }
                }
                err
            }
            400 => LlmError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

/// Translate one neutral message into wire messages. Tool results become
/// separate role "tool" messages keyed by the originating call id.
fn translate_message(msg: &LlmMessage) -> Vec<WireMessage> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in &msg.content {
        match block {
            ContentBlock::Text { text: t } => text.push_str(t),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(WireToolCall {
                    id: id.clone(),
                    r#type: "function".to_string(),
                    function: WireFunctionCall {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                });
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                let content = if *is_error {
                    format!("Error: {content}")
                } else {
                    content.clone()
                };
                out.push(WireMessage {
                    role: "tool".to_string(),
                    content: Some(content),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id.clone()),
                });
            }
        }
    }

    if !text.is_empty() || !tool_calls.is_empty() {
        let role = match msg.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        out.push(WireMessage {
            role: role.to_string(),
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        });
    }

    out
}

fn normalize_response(resp: WireResponse) -> Result<LlmResponse, LlmError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::unknown("Response contained no choices"))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content {
        if !text.is_empty() {
            content.push(ContentBlock::Text { text });
        }
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        let input: serde_json::Value = serde_json::from_str(&call.function.arguments)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    let end_turn = choice.finish_reason.as_deref() != Some("tool_calls");

    let usage = resp.usage.map(|u| Usage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    Ok(LlmResponse {
        content,
        end_turn,
        usage: usage.unwrap_or_default(),
    })
}

#[async_trait]
impl CompletionService for ChatCompletionsService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let wire_request = self.translate_request(request);

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&wire_request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                LlmError::network(format!("Connection failed: {e}"))
            } else {
                LlmError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(self.classify_error(status, &body));
        }

        let wire_response: WireResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        normalize_response(wire_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Chat-completions wire types

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireToolDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    r#type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireToolDef {
    r#type: String,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
