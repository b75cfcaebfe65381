//! Termination conditions for the conversation engine
//!
//! A condition is a pure function over the transcript, evaluated by the
//! engine only after a complete message has been appended.

use crate::transcript::Transcript;

/// Stop condition evaluated after each turn. Must be total and
/// side-effect free.
pub trait TerminationCondition: Send + Sync {
    fn matches(&self, transcript: &Transcript) -> bool;
}

/// Terminates when the newest message's text contains a fixed marker.
pub struct TextMentionTermination {
    marker: String,
}

impl TextMentionTermination {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl TerminationCondition for TextMentionTermination {
    fn matches(&self, transcript: &Transcript) -> bool {
        transcript
            .latest()
            .is_some_and(|m| m.text.contains(&self.marker))
    }
}

/// Never matches. Exercises the engine's max-turn safety stop in tests.
#[allow(dead_code)]
pub struct NeverTerminate;

impl TerminationCondition for NeverTerminate {
    fn matches(&self, _transcript: &Transcript) -> bool {
        false
    }
}
