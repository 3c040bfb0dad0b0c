//! Pure medical logic: healing steps and auto-heal target selection.

/// Health within this distance of max counts as fully healed.
pub const FULL_HEALTH_EPSILON: f64 = 1e-4;

/// Auto-heal level needed to enable automatic healing.
pub const AUTO_HEAL_MIN_LEVEL: u32 = 1;

/// Auto-heal level at which the Medic may treat themself.
pub const SELF_HEAL_MIN_LEVEL: u32 = 2;

/// Health after healing for `dt` seconds, clamped to `max_health`.
pub fn heal_step(health: f64, max_health: f64, heal_rate: f64, dt: f64) -> f64 {
    (health + heal_rate * dt).min(max_health)
}

pub fn is_fully_healed(health: f64, max_health: f64) -> bool {
    health >= max_health - FULL_HEALTH_EPSILON
}

/// One crew member as seen by the auto-heal picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealCandidate {
    pub health: f64,
    pub max_health: f64,
    pub idle: bool,
    pub is_medic: bool,
}

impl HealCandidate {
    fn fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }
}

/// Index of the idle wounded candidate with the lowest health fraction.
///
/// Ties go to the earliest candidate. The Medic is considered only when
/// `allow_self` is set.
pub fn pick_heal_target(candidates: &[HealCandidate], allow_self: bool) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.idle && c.health > 0.0 && c.health < c.max_health)
        .filter(|(_, c)| allow_self || !c.is_medic)
        .min_by(|(_, a), (_, b)| {
            a.fraction()
                .partial_cmp(&b.fraction())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}
