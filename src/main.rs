//! roundtable - round-robin multi-agent group chat
//!
//! Demo wiring: a data-fetching agent with a cryptocurrency-metadata tool,
//! a bullish analyst, a bearish analyst, and a judge debate an investment
//! recommendation until the judge's DECISION marker appears.

mod config;
mod console;
mod llm;
mod participant;
mod team;
mod termination;
mod tools;
mod transcript;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use participant::AssistantParticipant;
use team::Team;
use termination::TextMentionTermination;
use tools::{coinmarketcap, ToolSet};

const TASK: &str = "Get a investment recommendation for bitcoin (BTC)";
const TERMINATION_MARKER: &str = "DECISION";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roundtable=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let service = config.completion_service();
    tracing::info!(model = %service.model_id(), max_turns = config.max_turns, "configured");

    let mut provider_tools = ToolSet::new();
    match &config.coinmarketcap_api_key {
        Some(key) => {
            provider_tools = provider_tools.with_tool(Arc::new(coinmarketcap::metadata_tool(key)));
        }
        None => {
            tracing::warn!(
                "COINMARKETCAP_API_KEY not set; MetaDataProvider runs without the metadata tool"
            );
        }
    }

    let data_provider = AssistantParticipant::new(
        "MetaDataProvider",
        "You are a helpful assistant. You can use the coinmarketcap tool to get \
         metadata about a cryptocurrency.",
        service.clone(),
    )
    .with_tools(provider_tools)
    .with_max_tool_rounds(config.max_tool_rounds);

    let bullish = AssistantParticipant::new(
        "BullishAnalyst",
        "You are a bullish crypto analyst. Your goal is to make a compelling argument \
         to buy the given token, using available data. Focus on strengths, growth \
         potential, and momentum.",
        service.clone(),
    );

    let bearish = AssistantParticipant::new(
        "BearishAnalyst",
        "You are a skeptical crypto analyst. Your role is to argue against buying the \
         given token. Consider risks, volatility, weak fundamentals, or market \
         conditions that may harm its future.",
        service.clone(),
    );

    let judge = AssistantParticipant::new(
        "InvestmentJudge",
        "You are an impartial crypto investment advisor. Listen to both analysts, \
         evaluate their arguments critically, and provide a final recommendation: \
         BUY, HOLD, or AVOID. Justify your decision with reasoning and summarize key \
         points. Conclude with DECISION: <your decision>.",
        service,
    );

    let (event_tx, event_rx) = mpsc::channel(256);
    let printer = tokio::spawn(console::print_events(event_rx));

    let team = Team::new(config.max_turns)
        .with_participant(Arc::new(data_provider))
        .with_participant(Arc::new(bullish))
        .with_participant(Arc::new(bearish))
        .with_participant(Arc::new(judge))
        .with_events(event_tx);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling conversation");
                cancel.cancel();
            }
        }
    });

    let result = team
        .run(TASK, &TextMentionTermination::new(TERMINATION_MARKER), &cancel)
        .await;

    // Close the event channel so the printer drains and exits.
    drop(team);
    let _ = printer.await;

    match result {
        Ok(transcript) => {
            tracing::info!(messages = transcript.len(), "conversation finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                partial_messages = e.transcript().len(),
                "conversation failed"
            );
            Err(e.into())
        }
    }
}
