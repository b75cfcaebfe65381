//! Transcript data model
//!
//! The transcript is the single source of truth for turn history: an
//! append-only sequence of messages with one writer (the engine) and
//! many readers (the participants).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sender name used for the synthetic message that seeds a conversation.
pub const TASK_SENDER: &str = "user";

/// One message in the conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Position in the transcript, assigned at append time.
    pub seq: u64,
    /// Name of the participant that produced this message.
    pub sender: String,
    pub text: String,
    /// Structured output of the last tool invocation made while producing
    /// this message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_payload: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a message that has not yet been appended; `seq` is assigned
    /// by [`Transcript::append`].
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            seq: 0,
            sender: sender.into(),
            text: text.into(),
            tool_payload: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tool_payload(mut self, payload: Value) -> Self {
        self.tool_payload = Some(payload);
        self
    }
}

/// Ordered, append-only record of all messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a transcript with the synthetic initial task message.
    pub fn with_task(task: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.append(Message::new(TASK_SENDER, task));
        transcript
    }

    /// Append a message, assigning it the next sequence index.
    /// Returns the assigned index.
    pub fn append(&mut self, mut message: Message) -> u64 {
        let seq = self.messages.len() as u64;
        message.seq = seq;
        self.messages.push(message);
        seq
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)] // Utility method for API completeness
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[allow(dead_code)] // Utility method for API completeness
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_assigns_sequential_indices() {
        let mut transcript = Transcript::new();
        let a = transcript.append(Message::new("alice", "first"));
        let b = transcript.append(Message::new("bob", "second"));
        assert_eq!(a, 0);
        assert_eq!(b, 1);

        let seqs: Vec<u64> = transcript.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn with_task_seeds_synthetic_user_message() {
        let transcript = Transcript::with_task("Get a recommendation for BTC");
        assert_eq!(transcript.len(), 1);
        let first = transcript.latest().unwrap();
        assert_eq!(first.sender, TASK_SENDER);
        assert_eq!(first.text, "Get a recommendation for BTC");
        assert_eq!(first.seq, 0);
    }

    #[test]
    fn tool_payload_survives_append() {
        let mut transcript = Transcript::new();
        let msg = Message::new("provider", "here is the data")
            .with_tool_payload(json!({"symbol": "BTC", "name": "Bitcoin"}));
        transcript.append(msg);

        let payload = transcript.latest().unwrap().tool_payload.as_ref().unwrap();
        assert_eq!(payload["symbol"], "BTC");
    }

    #[test]
    fn latest_on_empty_is_none() {
        let transcript = Transcript::new();
        assert!(transcript.latest().is_none());
        assert!(transcript.is_empty());
    }
}
