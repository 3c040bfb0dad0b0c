//! Event kinds and their static profiles.
//!
//! Events are transient modifiers: hazards that make repairs slower or more
//! dangerous, and bonuses that ease the pressure. The engine owns active
//! events; this module only describes what each kind does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of random events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Debris burst to all crew plus extra pressure damage while active
    HullBreach,
    /// Burning compartment; blocks repair until fought or burnt out
    Fire,
    /// Surge on one system; repairs more dangerous and slightly slower
    Electrical,
    /// Hidden cache; immediate supplies
    SupplyCache,
    /// Temporary lull; less damage for everyone
    CalmWaters,
}

impl EventKind {
    /// Declaration order; the spawn pool is built in this order.
    pub const ALL: [EventKind; 5] = [
        EventKind::HullBreach,
        EventKind::Fire,
        EventKind::Electrical,
        EventKind::SupplyCache,
        EventKind::CalmWaters,
    ];

    pub fn key(self) -> &'static str {
        match self {
            EventKind::HullBreach => "hullBreach",
            EventKind::Fire => "fire",
            EventKind::Electrical => "electrical",
            EventKind::SupplyCache => "supplyCache",
            EventKind::CalmWaters => "calmWaters",
        }
    }

    pub fn profile(self) -> &'static EventProfile {
        match self {
            EventKind::HullBreach => &HULL_BREACH,
            EventKind::Fire => &FIRE,
            EventKind::Electrical => &ELECTRICAL,
            EventKind::SupplyCache => &SUPPLY_CACHE,
            EventKind::CalmWaters => &CALM_WATERS,
        }
    }

    /// Whether this kind needs a task to act on.
    pub fn needs_target(self) -> bool {
        self.profile().needs_target
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Static description of an event kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventProfile {
    pub name: &'static str,
    pub description: &'static str,
    /// Seconds the event stays active; 0 means instantaneous.
    pub duration: f64,
    pub needs_target: bool,
    /// Multiplier applied to the target task's damage while active.
    pub task_damage_factor: f64,
    /// Multiplier applied to the target task's repair speed while active.
    pub task_speed_factor: f64,
    /// Additive modifier to every repair's damage while active.
    pub global_damage_boost: f64,
}

const HULL_BREACH: EventProfile = EventProfile {
    name: "Hull Breach",
    description: "A hull breach sprays debris: all crew take a burst of damage and extra pressure damage for a short time.",
    duration: 12.0,
    needs_target: false,
    task_damage_factor: 1.0,
    task_speed_factor: 1.0,
    global_damage_boost: 0.6,
};

const FIRE: EventProfile = EventProfile {
    name: "Fire",
    description: "A fire has started in a system. Repairs there stop until a crew member puts it out.",
    duration: 30.0,
    needs_target: true,
    task_damage_factor: 1.6,
    task_speed_factor: 0.6,
    global_damage_boost: 0.0,
};

const ELECTRICAL: EventProfile = EventProfile {
    name: "Electrical Surge",
    description: "An electrical surge damages systems: repairs become more dangerous and slightly slower.",
    duration: 10.0,
    needs_target: true,
    task_damage_factor: 1.5,
    task_speed_factor: 0.85,
    global_damage_boost: 0.0,
};

const SUPPLY_CACHE: EventProfile = EventProfile {
    name: "Supply Cache",
    description: "A hidden cache is found: immediate supply bonus.",
    duration: 0.0,
    needs_target: false,
    task_damage_factor: 1.0,
    task_speed_factor: 1.0,
    global_damage_boost: 0.0,
};

const CALM_WATERS: EventProfile = EventProfile {
    name: "Calm Waters",
    description: "A temporary lull: damage taken is reduced for a short time.",
    duration: 12.0,
    needs_target: false,
    task_damage_factor: 1.0,
    task_speed_factor: 1.0,
    global_damage_boost: -0.3,
};

/// Instantaneous events stay listed this long before they self-remove.
pub const INSTANT_EVENT_LINGER: f64 = 0.5;

/// Hull breach burst damage: `BURST_MIN + rand * BURST_SPREAD`.
pub const HULL_BREACH_BURST_MIN: f64 = 6.0;
pub const HULL_BREACH_BURST_SPREAD: f64 = 8.0;

/// Supply cache reward: `CACHE_MIN + round(rand * CACHE_SPREAD)`.
pub const SUPPLY_CACHE_MIN: u32 = 18;
pub const SUPPLY_CACHE_SPREAD: f64 = 24.0;

/// Kinds drawn when every weight rounds to zero.
pub const FALLBACK_POOL: [EventKind; 3] =
    [EventKind::SupplyCache, EventKind::Fire, EventKind::Electrical];

/// Relative spawn weights per kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWeights {
    pub hull_breach: f64,
    pub fire: f64,
    pub electrical: f64,
    pub supply_cache: f64,
    pub calm_waters: f64,
}

impl EventWeights {
    pub fn weight(&self, kind: EventKind) -> f64 {
        match kind {
            EventKind::HullBreach => self.hull_breach,
            EventKind::Fire => self.fire,
            EventKind::Electrical => self.electrical,
            EventKind::SupplyCache => self.supply_cache,
            EventKind::CalmWaters => self.calm_waters,
        }
    }
}

impl Default for EventWeights {
    fn default() -> Self {
        Self {
            hull_breach: 1.0,
            fire: 1.0,
            electrical: 1.0,
            supply_cache: 1.0,
            calm_waters: 1.0,
        }
    }
}

/// Expand weights into a draw pool: each kind appears `round(weight * 10)`
/// times. A degenerate table yields [`FALLBACK_POOL`].
pub fn weighted_pool(weights: &EventWeights) -> Vec<EventKind> {
    let mut pool = Vec::new();
    for kind in EventKind::ALL {
        let w = weights.weight(kind);
        let count = if w.is_finite() { (w * 10.0).round().max(0.0) as usize } else { 0 };
        pool.extend(std::iter::repeat(kind).take(count));
    }
    if pool.is_empty() {
        pool.extend(FALLBACK_POOL);
    }
    pool
}

/// Damage factor from global modifiers, never negative.
pub fn global_damage_factor(boosts: impl IntoIterator<Item = f64>) -> f64 {
    (1.0 + boosts.into_iter().sum::<f64>()).max(0.0)
}

/// Recompute task multipliers from the kinds of events still targeting it.
///
/// Returns `(damage_mult, speed_mult)`. Effects of the same kind stack
/// multiplicatively.
pub fn task_multipliers(kinds: impl IntoIterator<Item = EventKind>) -> (f64, f64) {
    kinds.into_iter().fold((1.0, 1.0), |(dmg, spd), kind| {
        let p = kind.profile();
        (dmg * p.task_damage_factor, spd * p.task_speed_factor)
    })
}
