//! Completion-service abstraction
//!
//! Provider-neutral interface to the LLM endpoint a participant talks to.
//! The engine never touches this layer directly.

mod chat;
mod error;
pub mod testing;
mod types;

pub use chat::ChatCompletionsService;
pub use error::{LlmError, LlmErrorKind};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion services
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "completion request finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "completion request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
