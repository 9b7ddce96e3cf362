//! EventBus - broadcast-based event system for progression events.
//!
//! Publishes events as the engine mutates progression state so that UI
//! widgets, haptics bridges and other subscribers can react in real time.

use crate::persona::PersonaId;
use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted by the progression engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompanionEvent {
    /// The active persona changed
    Switched {
        /// Newly active persona
        persona: PersonaId,
    },
    /// A persona gained a level
    LevelUp {
        /// Persona that leveled up
        persona: PersonaId,
        /// Level after the promotion
        new_level: u32,
    },
    /// The passive drain removed XP from the global player pool
    XpDrained {
        /// Amount actually removed (0 when the pool was already empty)
        amount: f64,
    },
    /// XP was awarded to a persona
    XpAwarded {
        /// Persona that received the award
        persona: PersonaId,
        /// Final amount after the modifier was applied
        amount: f64,
        /// Modifier that was applied to the base amount
        modifier: f64,
    },
}

/// Broadcast-based event bus for progression events.
///
/// Uses `tokio::broadcast` so multiple subscribers can receive the same
/// events. Slow subscribers miss events (lagged) rather than blocking the
/// publisher; subscribers receive events in publish order.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CompanionEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events. Returns a receiver that will get all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CompanionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all active subscribers.
    ///
    /// Returns the number of subscribers that received the event. With no
    /// subscribers the event is silently dropped.
    pub fn publish(&self, event: CompanionEvent) -> usize {
        // send() returns Err if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Get the current number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
