//! Message passing between the swarm core and its collaborators.
//!
//! Outbound notifications are queued in the [`Outbox`] resource while a tick
//! runs and flushed, in order, to a caller-supplied [`NotificationSink`]
//! afterwards. Inbound intents arrive as identifier-keyed [`InboundMessage`]s.

use crate::components::AgentId;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// Something the core tells the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A new trackable entity for the health collaborator.
    Registered { id: AgentId, health: f32, max_health: f32 },
    /// The identifier is no longer valid.
    Removed { id: AgentId },
    /// A charging agent reached the player.
    PlayerContact { id: AgentId, damage: f32 },
}

/// Receiver for outbound notifications.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl NotificationSink for Sender<Notification> {
    fn notify(&mut self, notification: Notification) {
        // A dropped receiver means nobody is listening anymore.
        let _ = self.send(notification);
    }
}

/// Adapts a closure into a sink.
pub struct CallbackSink<F>(pub F);

impl<F: FnMut(Notification)> NotificationSink for CallbackSink<F> {
    fn notify(&mut self, notification: Notification) {
        (self.0)(notification)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _notification: Notification) {}
}

/// Notifications produced during the current tick, not yet delivered.
#[derive(Resource, Debug, Default)]
pub struct Outbox(pub Vec<Notification>);

impl Outbox {
    pub fn push(&mut self, notification: Notification) {
        self.0.push(notification);
    }

    pub fn flush_into(&mut self, sink: &mut dyn NotificationSink) {
        for notification in self.0.drain(..) {
            sink.notify(notification);
        }
    }
}

/// Identifier-keyed intent from an authoritative source (e.g. a network host).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    Damage { id: AgentId, amount: f32 },
    Kill { id: AgentId },
}

impl InboundMessage {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What an inbound damage/death notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Health reduced, agent still alive.
    Damaged,
    /// This notification started the agent's death.
    Killed,
    /// Nothing changed (unknown id, already dying, or a bogus amount).
    Ignored,
}
