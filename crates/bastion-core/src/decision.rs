//! Decision requests, the inbox, and the sources that answer them.
//!
//! When a plan step needs a participant's choice it suspends with a
//! [`DecisionRequest`]. Whoever drives the engine obtains a [`Decision`]
//! from a [`DecisionSource`] and drops it into the phase's
//! [`DecisionInbox`]; the suspended step picks it up when the plan is run
//! again.
//!
//! Three sources are provided: [`StubDecisionSource`] (always declines),
//! [`ScriptedDecisionSource`] (replays a fixed list) and
//! [`ChannelDecisionSource`] (asks a remote participant over channels).

use std::collections::VecDeque;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use bastion_types::{TerritoryId, UnitId};

/// Errors that can occur while obtaining a decision.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// A scripted source ran out of answers.
    #[error("no scripted decision left for request: {request}")]
    Exhausted {
        /// Description of the unanswered request.
        request: String,
    },

    /// The remote participant went away.
    #[error("decision channel closed")]
    Disconnected,
}

/// A question a suspended step is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionRequest {
    /// Should the arriving bombers raid rather than attack?
    ShouldBomb {
        /// The territory under attack.
        territory: TerritoryId,
        /// The arriving bombers.
        bombers: Vec<UnitId>,
    },
}

impl core::fmt::Display for DecisionRequest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ShouldBomb { territory, bombers } => {
                write!(f, "bomb territory {territory} with {} bombers?", bombers.len())
            }
        }
    }
}

/// A participant's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Answer to [`DecisionRequest::ShouldBomb`].
    Bomb(bool),
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

/// Holds the answer to the outstanding request until a step consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionInbox {
    answer: Option<Decision>,
}

impl DecisionInbox {
    /// Create an empty inbox.
    pub const fn new() -> Self {
        Self { answer: None }
    }

    /// Deliver an answer, replacing any unconsumed one.
    pub fn deliver(&mut self, decision: Decision) {
        if let Some(stale) = self.answer.replace(decision) {
            tracing::warn!(?stale, "discarding unconsumed decision");
        }
    }

    /// Consume the answer, if any.
    pub const fn take(&mut self) -> Option<Decision> {
        self.answer.take()
    }

    /// Whether an answer is waiting.
    pub const fn has_answer(&self) -> bool {
        self.answer.is_some()
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// A source of participant decisions.
pub trait DecisionSource {
    /// Answer `request`.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if no answer can be produced.
    fn decide(
        &mut self,
        request: &DecisionRequest,
    ) -> impl Future<Output = Result<Decision, DecisionError>> + Send;
}

/// A decision source that always declines.
#[derive(Debug, Clone, Default)]
pub struct StubDecisionSource;

impl StubDecisionSource {
    /// Create a new stub decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for StubDecisionSource {
    async fn decide(&mut self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        match request {
            DecisionRequest::ShouldBomb { .. } => Ok(Decision::Bomb(false)),
        }
    }
}

/// A decision source that replays a fixed list of answers in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisionSource {
    answers: VecDeque<Decision>,
}

impl ScriptedDecisionSource {
    /// Create a source that answers with `answers`, first to last.
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }

    /// The number of answers left.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl DecisionSource for ScriptedDecisionSource {
    async fn decide(&mut self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        self.answers.pop_front().ok_or_else(|| DecisionError::Exhausted {
            request: request.to_string(),
        })
    }
}

/// A decision source backed by a remote participant.
///
/// Requests are sent on one channel and answers awaited on another.
#[derive(Debug)]
pub struct ChannelDecisionSource {
    requests: mpsc::Sender<DecisionRequest>,
    answers: mpsc::Receiver<Decision>,
}

impl ChannelDecisionSource {
    /// Create a source from a request sender and an answer receiver.
    pub const fn new(
        requests: mpsc::Sender<DecisionRequest>,
        answers: mpsc::Receiver<Decision>,
    ) -> Self {
        Self { requests, answers }
    }
}

impl DecisionSource for ChannelDecisionSource {
    async fn decide(&mut self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        self.requests
            .send(request.clone())
            .await
            .map_err(|_closed| DecisionError::Disconnected)?;
        self.answers.recv().await.ok_or(DecisionError::Disconnected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bomb_request() -> DecisionRequest {
        DecisionRequest::ShouldBomb {
            territory: TerritoryId::new(),
            bombers: vec![UnitId::new()],
        }
    }

    #[test]
    fn inbox_hands_out_an_answer_once() {
        let mut inbox = DecisionInbox::new();
        assert!(!inbox.has_answer());
        inbox.deliver(Decision::Bomb(true));
        assert_eq!(inbox.take(), Some(Decision::Bomb(true)));
        assert_eq!(inbox.take(), None);
    }

    #[tokio::test]
    async fn stub_declines_bombing() {
        let mut source = StubDecisionSource::new();
        let decision = source.decide(&bomb_request()).await.unwrap();
        assert_eq!(decision, Decision::Bomb(false));
    }

    #[tokio::test]
    async fn scripted_source_replays_then_exhausts() {
        let mut source = ScriptedDecisionSource::new([Decision::Bomb(true)]);
        assert_eq!(source.decide(&bomb_request()).await.unwrap(), Decision::Bomb(true));
        assert_eq!(source.remaining(), 0);
        let err = source.decide(&bomb_request()).await.unwrap_err();
        assert!(matches!(err, DecisionError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn channel_source_round_trips_through_participant() {
        let (request_tx, mut request_rx) = mpsc::channel(1);
        let (answer_tx, answer_rx) = mpsc::channel(1);
        let participant = tokio::spawn(async move {
            let request = request_rx.recv().await.unwrap();
            assert!(matches!(request, DecisionRequest::ShouldBomb { .. }));
            answer_tx.send(Decision::Bomb(true)).await.unwrap();
        });

        let mut source = ChannelDecisionSource::new(request_tx, answer_rx);
        let decision = source.decide(&bomb_request()).await.unwrap();
        assert_eq!(decision, Decision::Bomb(true));
        participant.await.unwrap();
    }

    #[tokio::test]
    async fn channel_source_reports_disconnect() {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (answer_tx, answer_rx) = mpsc::channel::<Decision>(1);
        drop(answer_tx);
        let mut source = ChannelDecisionSource::new(request_tx, answer_rx);

        let err = source.decide(&bomb_request()).await.unwrap_err();
        assert!(matches!(err, DecisionError::Disconnected));
        drop(request_rx);
    }
}
