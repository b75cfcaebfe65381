//! Property-based tests for the conversation engine
//!
//! Verify the round-robin and safety-stop invariants across generated
//! team shapes and turn budgets.

use super::*;
use crate::participant::{Participant, ParticipantError};
use crate::termination::{NeverTerminate, TextMentionTermination};
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Participant that counts its invocations and can emit a marker on a
/// chosen global turn.
struct CountingParticipant {
    name: String,
    invocations: AtomicUsize,
    global_turns: Arc<AtomicUsize>,
    marker_on_turn: Option<usize>,
}

impl CountingParticipant {
    fn new(
        name: String,
        global_turns: Arc<AtomicUsize>,
        marker_on_turn: Option<usize>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            invocations: AtomicUsize::new(0),
            global_turns,
            marker_on_turn,
        })
    }
}

#[async_trait]
impl Participant for CountingParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        _transcript: &Transcript,
        _events: &TurnEvents,
        _cancel: &CancellationToken,
    ) -> Result<Message, ParticipantError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let turn = self.global_turns.fetch_add(1, Ordering::SeqCst);
        let text = if self.marker_on_turn == Some(turn) {
            "DECISION".to_string()
        } else {
            format!("turn {turn}")
        };
        Ok(Message::new(&self.name, text))
    }
}

fn build_team(
    n_participants: usize,
    max_turns: usize,
    marker_on_turn: Option<usize>,
) -> (Team, Vec<Arc<CountingParticipant>>) {
    let global_turns = Arc::new(AtomicUsize::new(0));
    let mut team = Team::new(max_turns);
    let mut participants = Vec::new();
    for i in 0..n_participants {
        let p = CountingParticipant::new(format!("p{i}"), global_turns.clone(), marker_on_turn);
        participants.push(p.clone());
        team = team.with_participant(p);
    }
    (team, participants)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    /// A never-matching condition always trips the safety stop, and the
    /// transcript holds exactly the seed plus one message per turn.
    #[test]
    fn never_matching_condition_always_stops(
        n_participants in 1usize..5,
        max_turns in 0usize..40,
    ) {
        let (team, _) = build_team(n_participants, max_turns, None);
        let err = block_on(team.run("task", &NeverTerminate, &CancellationToken::new()))
            .unwrap_err();

        prop_assert!(
            matches!(err, TeamError::SafetyStop { .. }),
            "expected TeamError::SafetyStop, got {:?}",
            err
        );
        prop_assert_eq!(err.transcript().len(), 1 + max_turns);
    }

    /// Over M completed turns with N participants, each participant is
    /// invoked exactly floor(M/N) or ceil(M/N) times.
    #[test]
    fn round_robin_fairness(
        n_participants in 1usize..6,
        max_turns in 0usize..40,
    ) {
        let (team, participants) = build_team(n_participants, max_turns, None);
        let _ = block_on(team.run("task", &NeverTerminate, &CancellationToken::new()));

        let floor = max_turns / n_participants;
        let ceil = max_turns.div_ceil(n_participants);
        for p in &participants {
            let count = p.invocations.load(Ordering::SeqCst);
            prop_assert!(count == floor || count == ceil,
                "participant invoked {} times, expected {} or {}", count, floor, ceil);
        }
    }

    /// Messages appear in fixed rotation order by sender.
    #[test]
    fn rotation_order_is_fixed(
        n_participants in 1usize..6,
        max_turns in 1usize..30,
    ) {
        let (team, _) = build_team(n_participants, max_turns, None);
        let err = block_on(team.run("task", &NeverTerminate, &CancellationToken::new()))
            .unwrap_err();

        // Skip the seed message; turn i belongs to participant i mod N.
        for (i, message) in err.transcript().iter().skip(1).enumerate() {
            prop_assert_eq!(&message.sender, &format!("p{}", i % n_participants));
        }
    }

    /// The engine halts exactly at the first marker-bearing message.
    #[test]
    fn halts_exactly_at_marker(
        n_participants in 1usize..5,
        marker_turn in 0usize..20,
    ) {
        let max_turns = 40;
        let (team, _) = build_team(n_participants, max_turns, Some(marker_turn));
        let condition = TextMentionTermination::new("DECISION");
        let transcript = block_on(team.run("task", &condition, &CancellationToken::new()))
            .unwrap();

        prop_assert_eq!(transcript.len(), 1 + marker_turn + 1);
        prop_assert!(transcript.latest().unwrap().text.contains("DECISION"));
    }
}
