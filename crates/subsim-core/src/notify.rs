//! Outward notifications.
//!
//! The core never renders or plays audio. It raises fire-and-forget
//! notifications that toast, audio and render layers subscribe to.

use serde::Serialize;
use subsim_logic::difficulty::Difficulty;

use crate::components::{CrewId, TaskId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// A system was repaired
    TaskCompleted { id: TaskId, title: String, reward: u32 },
    /// A crew member's health reached zero
    CrewDied { id: CrewId, name: String },
    /// Event-log line (spawns, expiries, heals)
    Message { text: String },
    /// A command was rejected; shown to the player, nothing changed
    Notice { text: String },
    /// Every system repaired
    Victory { supplies: u32, difficulty: Difficulty },
    /// Nobody left to make repairs
    Defeat,
    /// State changed; re-render when convenient
    StateChanged { revision: u64 },
}

impl Notification {
    pub fn message(text: impl Into<String>) -> Self {
        Notification::Message { text: text.into() }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Notification::Notice { text: text.into() }
    }
}

/// Receives notifications from the engine.
pub trait Listener {
    fn notify(&mut self, notification: &Notification);
}

impl<F: FnMut(&Notification)> Listener for F {
    fn notify(&mut self, notification: &Notification) {
        self(notification)
    }
}
