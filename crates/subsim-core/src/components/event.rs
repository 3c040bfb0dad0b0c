//! Active event records.

use serde::{Deserialize, Serialize};
use std::fmt;
use subsim_logic::events::{EventKind, INSTANT_EVENT_LINGER};

use super::task::TaskId;

/// Unique, monotonically allocated event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt_{}", self.0)
    }
}

/// Per-kind runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventMeta {
    /// Contribution to the global damage modifier while active
    pub global_damage_boost: f64,
    /// Remaining fire intensity
    pub fire_health: f64,
    pub fire_max: f64,
    /// Supplies granted on spawn
    pub reward: u32,
}

/// An event currently affecting the boat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub target: Option<TaskId>,
    /// Simulation-clock seconds
    pub started_at: f64,
    /// Seconds; 0 = instantaneous
    pub duration: f64,
    pub meta: EventMeta,
}

impl ActiveEvent {
    pub fn new(id: EventId, kind: EventKind, target: Option<TaskId>, now: f64) -> Self {
        Self {
            id,
            kind,
            target,
            started_at: now,
            duration: kind.profile().duration,
            meta: EventMeta::default(),
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        (now - self.started_at).max(0.0)
    }

    /// Whether the event has run its course at `now`.
    pub fn is_expired(&self, now: f64) -> bool {
        let lifetime = if self.duration > 0.0 {
            self.duration
        } else {
            INSTANT_EVENT_LINGER
        };
        now - self.started_at >= lifetime
    }

    /// Seconds left before expiry, for countdown displays.
    pub fn remaining(&self, now: f64) -> f64 {
        (self.duration - self.age(now)).max(0.0)
    }

    pub fn is_fire(&self) -> bool {
        self.kind == EventKind::Fire
    }
}
