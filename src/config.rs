//! Application configuration
//!
//! Credentials and endpoints live in an explicit struct threaded through
//! construction; nothing is read from the environment after startup.

use std::sync::Arc;
use thiserror::Error;

use crate::llm::{ChatCompletionsService, CompletionService, LoggingService};
use crate::participant::DEFAULT_MAX_TOOL_ROUNDS;

/// Default cap on conversation turns before the engine's safety stop.
pub const DEFAULT_MAX_TURNS: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Which completion endpoint to talk to
#[derive(Debug, Clone)]
pub enum CompletionProvider {
    /// Hosted endpoint; requires a credential.
    Hosted { api_key: String },
    /// Local OpenAI-compatible endpoint; no credential.
    Local { base_url: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: CompletionProvider,
    pub model: String,
    pub coinmarketcap_api_key: Option<String>,
    pub max_turns: usize,
    pub max_tool_rounds: usize,
}

impl AppConfig {
    /// Read configuration from the process environment. Selecting the
    /// local provider (by setting `ROUNDTABLE_LOCAL_URL`) removes the
    /// credential requirement.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match std::env::var("ROUNDTABLE_LOCAL_URL").ok().filter(|s| !s.is_empty()) {
            Some(base_url) => CompletionProvider::Local { base_url },
            None => CompletionProvider::Hosted {
                api_key: std::env::var("OPENAI_API_KEY")
                    .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY"))?,
            },
        };

        Ok(Self {
            provider,
            model: std::env::var("ROUNDTABLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            coinmarketcap_api_key: std::env::var("COINMARKETCAP_API_KEY").ok(),
            max_turns: std::env::var("ROUNDTABLE_MAX_TURNS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TURNS),
            max_tool_rounds: std::env::var("ROUNDTABLE_MAX_TOOL_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
        })
    }

    /// Build the completion service this configuration selects, wrapped
    /// with request logging.
    pub fn completion_service(&self) -> Arc<dyn CompletionService> {
        let service: Arc<dyn CompletionService> = match &self.provider {
            CompletionProvider::Hosted { api_key } => {
                Arc::new(ChatCompletionsService::hosted(api_key, &self.model))
            }
            CompletionProvider::Local { base_url } => {
                Arc::new(ChatCompletionsService::local(base_url, &self.model))
            }
        };
        Arc::new(LoggingService::new(service))
    }
}
