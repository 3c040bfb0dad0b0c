//! Crew members and what they are doing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subsim_logic::roles::Role;
use subsim_logic::upgrades::{derive_stats, UpgradeLevels};

use super::task::TaskId;

/// Roster slot. The roster is fixed; ids never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrewId {
    Capt,
    Xo,
    Eo,
    Med,
}

impl CrewId {
    pub const ALL: [CrewId; 4] = [CrewId::Capt, CrewId::Xo, CrewId::Eo, CrewId::Med];

    pub fn key(self) -> &'static str {
        match self {
            CrewId::Capt => "capt",
            CrewId::Xo => "xo",
            CrewId::Eo => "eo",
            CrewId::Med => "med",
        }
    }
}

impl fmt::Display for CrewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CrewId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrewId::ALL
            .into_iter()
            .find(|id| id.key() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// The single activity a crew member is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "target", rename_all = "camelCase")]
pub enum Engagement {
    #[default]
    Idle,
    Repairing(TaskId),
    Healing(CrewId),
    Extinguishing(TaskId),
}

impl Engagement {
    pub fn is_idle(self) -> bool {
        self == Engagement::Idle
    }
}

/// Crew member component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crew {
    pub id: CrewId,
    pub name: String,
    pub role: Role,
    pub health: f64,
    pub max_health: f64,
    pub engagement: Engagement,
    pub upgrades: UpgradeLevels,

    // Derived from role + upgrades; see `recompute_stats`
    pub repair_speed_mult: f64,
    pub damage_reduction: f64,
    pub heal_rate: f64,
    pub auto_heal_level: u32,
    pub fire_suppression: f64,
}

impl Crew {
    pub fn new(id: CrewId, name: impl Into<String>, role: Role, health: f64) -> Self {
        let mut crew = Self {
            id,
            name: name.into(),
            role,
            health,
            max_health: 100.0,
            engagement: Engagement::Idle,
            upgrades: UpgradeLevels::new(),
            repair_speed_mult: 1.0,
            damage_reduction: 0.0,
            heal_rate: 0.0,
            auto_heal_level: 0,
            fire_suppression: 0.0,
        };
        crew.recompute_stats();
        crew
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_idle(&self) -> bool {
        self.engagement.is_idle()
    }

    pub fn is_wounded(&self) -> bool {
        self.is_alive() && self.health < self.max_health
    }

    /// Who the Medic is treating, if anyone.
    pub fn heal_target(&self) -> Option<CrewId> {
        match self.engagement {
            Engagement::Healing(target) => Some(target),
            _ => None,
        }
    }

    pub fn health_fraction(&self) -> f64 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Reset derived stats and re-sum every owned upgrade.
    pub fn recompute_stats(&mut self) {
        let stats = derive_stats(self.role, &self.upgrades);
        self.repair_speed_mult = stats.repair_speed_mult;
        self.damage_reduction = stats.damage_reduction;
        self.heal_rate = stats.heal_rate;
        self.auto_heal_level = stats.auto_heal_level;
        self.fire_suppression = stats.fire_suppression;
    }

    /// Subtract health, floored at zero. Returns true if this blow was fatal.
    ///
    /// The caller is responsible for clearing anything that referenced the
    /// crew member's engagement.
    pub fn take_damage(&mut self, amount: f64) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.engagement = Engagement::Idle;
            return true;
        }
        false
    }
}

/// The boat's crew at the start of a patrol.
pub fn default_roster() -> Vec<Crew> {
    vec![
        Crew::new(CrewId::Capt, "Anthony (Capt)", Role::Captain, 100.0),
        Crew::new(CrewId::Xo, "John (XO)", Role::Xo, 100.0),
        Crew::new(CrewId::Eo, "Gabe (EO)", Role::Engineer, 90.0),
        Crew::new(CrewId::Med, "Rin (Medic)", Role::Medic, 100.0),
    ]
}
