//! Console sink for streamed conversation events
//!
//! Pure presentation: drains the engine's event channel and prints. Has no
//! feedback path into the engine.

use tokio::sync::mpsc;

use crate::team::TeamEvent;

/// Print events until the engine drops its sender.
pub async fn print_events(mut rx: mpsc::Receiver<TeamEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TeamEvent::TurnStarted { participant, .. } => {
                println!("\n---------- {participant} ----------");
            }
            TeamEvent::TextChunk { text, .. } => {
                println!("{text}");
            }
            TeamEvent::ToolCall { tool, input, .. } => {
                println!("[{tool}] call {}", summarize(&input.to_string()));
            }
            TeamEvent::ToolResult { tool, payload, .. } => {
                println!("[{tool}] result {}", summarize(&payload.to_string()));
            }
            TeamEvent::ToolFailed { tool, error, .. } => {
                println!("[{tool}] failed: {error}");
            }
            // Text was already streamed chunk by chunk.
            TeamEvent::MessageAppended(_) => {}
            TeamEvent::Terminated { turns } => {
                println!("\nConversation terminated after {turns} turn(s).");
            }
        }
    }
}

/// Truncate payloads for display.
fn summarize(s: &str) -> String {
    const LIMIT: usize = 120;
    let truncated: String = s.chars().take(LIMIT).collect();
    if truncated.len() < s.len() {
        format!("{truncated}...")
    } else {
        truncated
    }
}
