//! Conversation engine
//!
//! Drives an ordered set of participants in strict round-robin rotation
//! over a shared transcript. The engine is the transcript's only writer;
//! termination is evaluated after each complete message is appended, and a
//! configured max-turn cap guarantees the loop ends even if the condition
//! never matches.

#[cfg(test)]
mod proptests;

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::participant::{Participant, ParticipantError};
use crate::termination::TerminationCondition;
use crate::transcript::{Message, Transcript};

/// Event emitted to the presentation sink while a conversation runs.
/// Purely informational; dropping the receiver never affects the engine.
#[derive(Debug, Clone)]
pub enum TeamEvent {
    TurnStarted {
        participant: String,
        turn: usize,
    },
    /// Partial text produced during a turn, ahead of the final message.
    TextChunk {
        participant: String,
        text: String,
    },
    ToolCall {
        participant: String,
        tool: String,
        input: Value,
    },
    ToolResult {
        participant: String,
        tool: String,
        payload: Value,
    },
    ToolFailed {
        participant: String,
        tool: String,
        error: String,
    },
    MessageAppended(Message),
    Terminated {
        turns: usize,
    },
}

/// Per-turn handle a participant uses to stream presentation events.
#[derive(Clone)]
pub struct TurnEvents {
    participant: String,
    tx: Option<mpsc::Sender<TeamEvent>>,
}

impl TurnEvents {
    fn new(participant: &str, tx: Option<mpsc::Sender<TeamEvent>>) -> Self {
        Self {
            participant: participant.to_string(),
            tx,
        }
    }

    /// Sink-less handle for tests and headless runs.
    #[allow(dead_code)]
    pub fn disabled(participant: &str) -> Self {
        Self::new(participant, None)
    }

    async fn send(&self, event: TeamEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }

    pub async fn text_chunk(&self, text: &str) {
        self.send(TeamEvent::TextChunk {
            participant: self.participant.clone(),
            text: text.to_string(),
        })
        .await;
    }

    pub async fn tool_call(&self, tool: &str, input: &Value) {
        self.send(TeamEvent::ToolCall {
            participant: self.participant.clone(),
            tool: tool.to_string(),
            input: input.clone(),
        })
        .await;
    }

    pub async fn tool_result(&self, tool: &str, payload: &Value) {
        self.send(TeamEvent::ToolResult {
            participant: self.participant.clone(),
            tool: tool.to_string(),
            payload: payload.clone(),
        })
        .await;
    }

    pub async fn tool_failed(&self, tool: &str, error: &str) {
        self.send(TeamEvent::ToolFailed {
            participant: self.participant.clone(),
            tool: tool.to_string(),
            error: error.to_string(),
        })
        .await;
    }
}

/// Engine failure. Every variant carries the transcript as it stood when
/// the run stopped, so callers can inspect or resume.
#[derive(Error)]
pub enum TeamError {
    #[error("participant '{participant}' failed: {source}")]
    Participant {
        participant: String,
        source: ParticipantError,
        transcript: Transcript,
    },
    #[error("reached {max_turns} turns without matching the termination condition")]
    SafetyStop {
        max_turns: usize,
        transcript: Transcript,
    },
    #[error("conversation cancelled")]
    Cancelled { transcript: Transcript },
}

impl TeamError {
    /// The partial transcript at the point of failure.
    pub fn transcript(&self) -> &Transcript {
        match self {
            TeamError::Participant { transcript, .. }
            | TeamError::SafetyStop { transcript, .. }
            | TeamError::Cancelled { transcript } => transcript,
        }
    }
}

impl std::fmt::Debug for TeamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Transcripts are large; show the failure and the message count.
        match self {
            TeamError::Participant {
                participant,
                source,
                transcript,
            } => f
                .debug_struct("Participant")
                .field("participant", participant)
                .field("source", source)
                .field("transcript_len", &transcript.len())
                .finish(),
            TeamError::SafetyStop {
                max_turns,
                transcript,
            } => f
                .debug_struct("SafetyStop")
                .field("max_turns", max_turns)
                .field("transcript_len", &transcript.len())
                .finish(),
            TeamError::Cancelled { transcript } => f
                .debug_struct("Cancelled")
                .field("transcript_len", &transcript.len())
                .finish(),
        }
    }
}

/// Round-robin conversation engine
pub struct Team {
    participants: Vec<Arc<dyn Participant>>,
    max_turns: usize,
    events: Option<mpsc::Sender<TeamEvent>>,
}

impl Team {
    /// `max_turns` is the required safety cap: the run fails with
    /// [`TeamError::SafetyStop`] if the condition never matches.
    pub fn new(max_turns: usize) -> Self {
        Self {
            participants: Vec::new(),
            max_turns,
            events: None,
        }
    }

    pub fn with_participant(mut self, participant: Arc<dyn Participant>) -> Self {
        self.participants.push(participant);
        self
    }

    pub fn with_events(mut self, tx: mpsc::Sender<TeamEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Run the conversation: seed the transcript with the task, rotate
    /// through participants appending one message per turn, and stop when
    /// the termination condition matches.
    pub async fn run(
        &self,
        task: impl Into<String>,
        termination: &dyn TerminationCondition,
        cancel: &CancellationToken,
    ) -> Result<Transcript, TeamError> {
        let mut transcript = Transcript::with_task(task);

        if termination.matches(&transcript) {
            self.emit(TeamEvent::Terminated { turns: 0 }).await;
            return Ok(transcript);
        }

        for turn in 0..self.max_turns {
            if self.participants.is_empty() {
                break;
            }
            if cancel.is_cancelled() {
                return Err(TeamError::Cancelled { transcript });
            }

            let participant = &self.participants[turn % self.participants.len()];
            tracing::debug!(turn, participant = %participant.name(), "starting turn");
            self.emit(TeamEvent::TurnStarted {
                participant: participant.name().to_string(),
                turn,
            })
            .await;

            let events = TurnEvents::new(participant.name(), self.events.clone());
            let mut message = match participant.respond(&transcript, &events, cancel).await {
                Ok(message) => message,
                Err(ParticipantError::Cancelled) => {
                    return Err(TeamError::Cancelled { transcript });
                }
                Err(source) => {
                    // The failing turn appended nothing; the transcript is
                    // exactly as it was when the turn began.
                    return Err(TeamError::Participant {
                        participant: participant.name().to_string(),
                        source,
                        transcript,
                    });
                }
            };

            // Sender attribution is the engine's invariant, not the
            // participant's.
            message.sender = participant.name().to_string();
            transcript.append(message);
            self.emit(TeamEvent::MessageAppended(
                transcript.latest().cloned().expect("just appended"),
            ))
            .await;

            if termination.matches(&transcript) {
                let turns = turn + 1;
                tracing::info!(turns, "conversation terminated");
                self.emit(TeamEvent::Terminated { turns }).await;
                return Ok(transcript);
            }
        }

        tracing::warn!(max_turns = self.max_turns, "safety stop tripped");
        Err(TeamError::SafetyStop {
            max_turns: self.max_turns,
            transcript,
        })
    }

    async fn emit(&self, event: TeamEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}
