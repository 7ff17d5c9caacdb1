//! The externally visible, timestamped action log.
//!
//! Each top-level [`HistoryEvent`] corresponds to one player-visible step
//! ("3 armour moved from Alpha to Bravo", "Red undoes: ..."). Details of the
//! step are attached as children of the most recent event, along with every
//! change the bridge applied while the event was open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bastion_types::PlayerId;

use crate::change::{Change, CompositeChange};

/// One entry in the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// When the event was recorded.
    pub at: DateTime<Utc>,
    /// The acting player, if any.
    pub player: Option<PlayerId>,
    /// Human-readable description.
    pub text: String,
    /// Detail lines attached after the event was started.
    pub children: Vec<String>,
    /// Changes applied while this event was the latest one.
    #[serde(default)]
    pub changes: CompositeChange,
}

/// Append-only history of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    events: Vec<HistoryEvent>,
}

impl History {
    /// Create an empty history.
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Start a new top-level event.
    pub fn start_event(&mut self, player: Option<PlayerId>, text: impl Into<String>) {
        self.events.push(HistoryEvent {
            at: Utc::now(),
            player,
            text: text.into(),
            children: Vec::new(),
            changes: CompositeChange::new(),
        });
    }

    /// Attach a detail line to the most recent event.
    ///
    /// Starts an anonymous event if none exists yet.
    pub fn add_child(&mut self, text: impl Into<String>) {
        match self.events.last_mut() {
            Some(event) => event.children.push(text.into()),
            None => self.start_event(None, text),
        }
    }

    /// Append an applied change to the most recent event.
    ///
    /// Starts an anonymous event if none exists yet.
    pub fn record_change(&mut self, change: Change) {
        if self.events.is_empty() {
            self.start_event(None, "changes");
        }
        if let Some(event) = self.events.last_mut() {
            event.changes.add(change);
        }
    }

    /// All events, oldest first.
    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    /// The most recent event.
    pub fn last(&self) -> Option<&HistoryEvent> {
        self.events.last()
    }

    /// The number of top-level events.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events were recorded.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_attach_to_latest_event() {
        let mut history = History::new();
        let red = PlayerId::new();
        history.start_event(Some(red), "first");
        history.start_event(Some(red), "second");
        history.add_child("detail");

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().map(|e| e.children.clone()), Some(vec![String::from("detail")]));
        assert!(history.events().first().is_some_and(|e| e.children.is_empty()));
    }

    #[test]
    fn changes_attach_to_latest_event() {
        let mut history = History::new();
        let red = PlayerId::new();
        history.start_event(Some(red), "income");
        history.record_change(crate::factory::change_resource(
            red,
            bastion_types::ResourceKind::Industry,
            rust_decimal::Decimal::new(4, 0),
        ));

        assert_eq!(history.len(), 1);
        assert_eq!(history.last().map(|e| e.changes.len()), Some(1));
    }

    #[test]
    fn child_without_event_starts_one() {
        let mut history = History::new();
        history.add_child("orphan");
        assert_eq!(history.last().map(|e| e.text.as_str()), Some("orphan"));
        assert_eq!(history.last().and_then(|e| e.player), None);
    }
}
