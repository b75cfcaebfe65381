//! Participants
//!
//! A participant produces one message per turn, given the full transcript.
//! [`AssistantParticipant`] delegates to a completion service; with a
//! non-empty toolset it runs a bounded reflect-on-tool-use loop before
//! answering.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::llm::{CompletionService, ContentBlock, LlmError, LlmMessage, LlmRequest, MessageRole};
use crate::team::TurnEvents;
use crate::tools::ToolSet;
use crate::transcript::{Message, Transcript};

/// Default cap on tool-call rounds within a single turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// Failure produced while a participant was taking its turn
#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("completion request failed: {0}")]
    Completion(#[from] LlmError),
    #[error("tool-call rounds exceeded the cap of {0}")]
    ToolRoundsExceeded(usize),
    #[error("turn cancelled")]
    Cancelled,
}

/// An entity that produces the next message, given the running transcript
#[async_trait]
pub trait Participant: Send + Sync {
    fn name(&self) -> &str;

    /// Produce this turn's final message. Partial output may be streamed
    /// through `events`; the engine only acts on the returned message.
    async fn respond(
        &self,
        transcript: &Transcript,
        events: &TurnEvents,
        cancel: &CancellationToken,
    ) -> Result<Message, ParticipantError>;
}

/// LLM-backed participant with an immutable persona and optional tools
pub struct AssistantParticipant {
    name: String,
    system_instruction: String,
    service: Arc<dyn CompletionService>,
    tools: ToolSet,
    max_tool_rounds: usize,
    max_tokens: Option<u32>,
}

impl AssistantParticipant {
    pub fn new(
        name: impl Into<String>,
        system_instruction: impl Into<String>,
        service: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            name: name.into(),
            system_instruction: system_instruction.into(),
            service,
            tools: ToolSet::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_tokens: None,
        }
    }

    pub fn with_tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Render the shared transcript as completion-request context. Every
    /// prior message arrives as a sender-labelled user message, so each
    /// participant sees the identical history.
    fn render_context(&self, transcript: &Transcript) -> Vec<LlmMessage> {
        transcript
            .iter()
            .map(|m| LlmMessage::user(format!("{}: {}", m.sender, m.text)))
            .collect()
    }

    fn build_request(&self, context: &[LlmMessage]) -> LlmRequest {
        LlmRequest {
            system: self.system_instruction.clone(),
            messages: context.to_vec(),
            tools: self.tools.definitions(),
            max_tokens: self.max_tokens,
        }
    }

    /// Execute every tool call in the response, feeding results (or typed
    /// failures, degraded to error results) back into the turn context.
    /// Returns the last successful structured output.
    async fn run_tool_calls(
        &self,
        calls: Vec<(String, String, Value)>,
        context: &mut Vec<LlmMessage>,
        events: &TurnEvents,
        cancel: &CancellationToken,
    ) -> Option<Value> {
        let mut last_payload = None;
        let mut results = Vec::new();

        for (id, name, input) in calls {
            events.tool_call(&name, &input).await;

            match self.tools.invoke(&name, input, cancel).await {
                Ok(payload) => {
                    events.tool_result(&name, &payload).await;
                    results.push(ContentBlock::tool_result(&id, payload.to_string(), false));
                    last_payload = Some(payload);
                }
                Err(e) => {
                    tracing::warn!(
                        participant = %self.name,
                        tool = %name,
                        error = %e,
                        "tool invocation failed"
                    );
                    events.tool_failed(&name, &e.to_string()).await;
                    results.push(ContentBlock::tool_result(&id, e.to_string(), true));
                }
            }
        }

        context.push(LlmMessage {
            role: MessageRole::User,
            content: results,
        });
        last_payload
    }
}

#[async_trait]
impl Participant for AssistantParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        transcript: &Transcript,
        events: &TurnEvents,
        cancel: &CancellationToken,
    ) -> Result<Message, ParticipantError> {
        let mut context = self.render_context(transcript);
        let mut last_payload: Option<Value> = None;

        // Round 0 is the plain completion; each further round reflects on
        // tool results from the previous one.
        for _round in 0..=self.max_tool_rounds {
            let request = self.build_request(&context);

            // Biased so a cancellation issued between rounds always wins
            // over an immediately-ready completion.
            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ParticipantError::Cancelled),
                result = self.service.complete(&request) => result?,
            };

            let text = response.text();
            if !text.is_empty() {
                events.text_chunk(&text).await;
            }

            let calls: Vec<(String, String, Value)> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            if calls.is_empty() {
                let mut message = Message::new(&self.name, text);
                if let Some(payload) = last_payload {
                    message = message.with_tool_payload(payload);
                }
                return Ok(message);
            }

            context.push(LlmMessage::assistant(response.content.clone()));
            if let Some(payload) = self.run_tool_calls(calls, &mut context, events, cancel).await
            {
                last_payload = Some(payload);
            }
        }

        Err(ParticipantError::ToolRoundsExceeded(self.max_tool_rounds))
    }
}
