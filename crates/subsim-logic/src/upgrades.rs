//! Upgrade catalog, cost curve and derived crew stats.
//!
//! Upgrade levels are the only canonical per-crew progression. Every derived
//! stat (repair speed, damage reduction, heal rate) is recomputed from the
//! levels from scratch, so loading a save or recomputing twice can never drift.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::roles::Role;

/// Cost growth per level already owned.
pub const COST_GROWTH: f64 = 1.5;

/// Damage reduction never exceeds this.
pub const MAX_DAMAGE_REDUCTION: f64 = 0.9;

/// Fire suppression never removes more than this share of spread chance.
pub const MAX_FIRE_SUPPRESSION: f64 = 0.9;

/// Medic healing before upgrades, HP per second.
pub const MEDIC_BASE_HEAL: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeKind {
    Speed,
    Armor,
    Med,
    AutoHeal,
    Engineer,
    FireSuppression,
    Drills,
}

/// Static definition of an upgrade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeDef {
    pub name: &'static str,
    pub description: &'static str,
    pub cost_base: f64,
    pub effect_per_level: f64,
    /// Only this role may buy it.
    pub role: Option<Role>,
    /// Buying it raises every crew member's level at once.
    pub applies_to_all: bool,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 7] = [
        UpgradeKind::Speed,
        UpgradeKind::Armor,
        UpgradeKind::Med,
        UpgradeKind::AutoHeal,
        UpgradeKind::Engineer,
        UpgradeKind::FireSuppression,
        UpgradeKind::Drills,
    ];

    pub fn key(self) -> &'static str {
        match self {
            UpgradeKind::Speed => "speed",
            UpgradeKind::Armor => "armor",
            UpgradeKind::Med => "med",
            UpgradeKind::AutoHeal => "autoHeal",
            UpgradeKind::Engineer => "engineer",
            UpgradeKind::FireSuppression => "fireSuppression",
            UpgradeKind::Drills => "drills",
        }
    }

    pub fn def(self) -> &'static UpgradeDef {
        match self {
            UpgradeKind::Speed => &SPEED,
            UpgradeKind::Armor => &ARMOR,
            UpgradeKind::Med => &MED,
            UpgradeKind::AutoHeal => &AUTO_HEAL,
            UpgradeKind::Engineer => &ENGINEER,
            UpgradeKind::FireSuppression => &FIRE_SUPPRESSION,
            UpgradeKind::Drills => &DRILLS,
        }
    }

    /// Whether a crew member with `role` may own this upgrade.
    pub fn allowed_for(self, role: Role) -> bool {
        self.def().role.map_or(true, |r| r == role)
    }

    /// Upgrades a crew member with `role` can be offered.
    pub fn offered_to(role: Role) -> impl Iterator<Item = UpgradeKind> {
        Self::ALL.into_iter().filter(move |k| k.allowed_for(role))
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.def().name)
    }
}

impl FromStr for UpgradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpgradeKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| s.to_string())
    }
}

const SPEED: UpgradeDef = UpgradeDef {
    name: "Tool Kit",
    description: "Increase repair speed by 10% per level.",
    cost_base: 20.0,
    effect_per_level: 0.10,
    role: None,
    applies_to_all: false,
};

const ARMOR: UpgradeDef = UpgradeDef {
    name: "Reinforced Suit",
    description: "Reduce damage taken while repairing by 8% per level.",
    cost_base: 25.0,
    effect_per_level: 0.08,
    role: None,
    applies_to_all: false,
};

const MED: UpgradeDef = UpgradeDef {
    name: "Med Training",
    description: "Increase Medic healing rate by +50% of base per level.",
    cost_base: 30.0,
    effect_per_level: 0.5,
    role: Some(Role::Medic),
    applies_to_all: false,
};

// Binary below level 2: level 1 enables auto-heal, level 2 allows self-heal.
const AUTO_HEAL: UpgradeDef = UpgradeDef {
    name: "Auto-Heal Module",
    description: "The Medic automatically heals idle wounded crew while idle. Level 2 lets the Medic treat themself.",
    cost_base: 40.0,
    effect_per_level: 0.0,
    role: Some(Role::Medic),
    applies_to_all: false,
};

const ENGINEER: UpgradeDef = UpgradeDef {
    name: "Field Expertise",
    description: "Engineers gain +25% repair speed per level (stacks with Tool Kit).",
    cost_base: 35.0,
    effect_per_level: 0.25,
    role: Some(Role::Engineer),
    applies_to_all: false,
};

const FIRE_SUPPRESSION: UpgradeDef = UpgradeDef {
    name: "Fire Suppression Drills",
    description: "The XO drills the crew: fires are 15% less likely to spread per level.",
    cost_base: 30.0,
    effect_per_level: 0.15,
    role: Some(Role::Xo),
    applies_to_all: false,
};

const DRILLS: UpgradeDef = UpgradeDef {
    name: "Damage Control Drills",
    description: "Whole-crew training: every crew member takes 4% less damage per level.",
    cost_base: 60.0,
    effect_per_level: 0.04,
    role: None,
    applies_to_all: true,
};

/// Supplies needed to buy the next level when `current_level` are owned.
///
/// Saturates at `u32::MAX`, so the curve is strictly increasing only while
/// `current_level < COST_CURVE_LEVELS`.
pub fn upgrade_cost(kind: UpgradeKind, current_level: u32) -> u32 {
    let exp = i32::try_from(current_level).unwrap_or(i32::MAX);
    let cost = (kind.def().cost_base * COST_GROWTH.powi(exp)).round();
    if cost >= u32::MAX as f64 {
        u32::MAX
    } else {
        cost as u32
    }
}

/// Levels below which every catalog entry's cost still fits in a `u32`.
pub const COST_CURVE_LEVELS: u32 = 44;

/// Per-crew upgrade levels, keyed by upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeLevels(BTreeMap<UpgradeKind, u32>);

impl UpgradeLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn set(&mut self, kind: UpgradeKind, level: u32) {
        if level == 0 {
            self.0.remove(&kind);
        } else {
            self.0.insert(kind, level);
        }
    }

    /// Raise one level and return the new level.
    pub fn increment(&mut self, kind: UpgradeKind) -> u32 {
        let next = self.level(kind).saturating_add(1);
        self.set(kind, next);
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (UpgradeKind, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Levels keyed by wire name, with every known upgrade present.
    pub fn to_keyed(&self) -> BTreeMap<String, u32> {
        UpgradeKind::ALL
            .into_iter()
            .map(|k| (k.key().to_string(), self.level(k)))
            .collect()
    }
}

/// Stats derived from role and upgrade levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedStats {
    pub repair_speed_mult: f64,
    pub damage_reduction: f64,
    pub heal_rate: f64,
    pub auto_heal_level: u32,
    pub fire_suppression: f64,
}

impl DerivedStats {
    /// Stats of a crew member with no upgrades.
    pub fn baseline(role: Role) -> Self {
        derive_stats(role, &UpgradeLevels::new())
    }
}

/// Recompute derived stats from scratch.
pub fn derive_stats(role: Role, levels: &UpgradeLevels) -> DerivedStats {
    let lvl = |k: UpgradeKind| levels.level(k) as f64;
    let per = |k: UpgradeKind| k.def().effect_per_level;

    let engineer_bonus = if role == Role::Engineer {
        lvl(UpgradeKind::Engineer) * per(UpgradeKind::Engineer)
    } else {
        0.0
    };
    let repair_speed_mult = 1.0 + lvl(UpgradeKind::Speed) * per(UpgradeKind::Speed) + engineer_bonus;

    let damage_reduction = (lvl(UpgradeKind::Armor) * per(UpgradeKind::Armor)
        + lvl(UpgradeKind::Drills) * per(UpgradeKind::Drills))
    .min(MAX_DAMAGE_REDUCTION);

    let heal_rate = if role == Role::Medic {
        MEDIC_BASE_HEAL * (1.0 + lvl(UpgradeKind::Med) * per(UpgradeKind::Med))
    } else {
        0.0
    };

    let fire_suppression = if role == Role::Xo {
        (lvl(UpgradeKind::FireSuppression) * per(UpgradeKind::FireSuppression))
            .min(MAX_FIRE_SUPPRESSION)
    } else {
        0.0
    };

    DerivedStats {
        repair_speed_mult,
        damage_reduction,
        heal_rate,
        auto_heal_level: levels.level(UpgradeKind::AutoHeal),
        fire_suppression,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_curve() {
        assert_eq!(upgrade_cost(UpgradeKind::Speed, 0), 20);
        assert_eq!(upgrade_cost(UpgradeKind::Speed, 1), 30);
        assert_eq!(upgrade_cost(UpgradeKind::Speed, 2), 45);
        assert_eq!(upgrade_cost(UpgradeKind::Armor, 1), 38);
    }

    #[test]
    fn test_cost_saturates_past_curve() {
        let top = upgrade_cost(UpgradeKind::Drills, COST_CURVE_LEVELS);
        assert!(top < u32::MAX);
        assert_eq!(upgrade_cost(UpgradeKind::Drills, COST_CURVE_LEVELS + 2), u32::MAX);
        assert_eq!(upgrade_cost(UpgradeKind::Drills, u32::MAX), u32::MAX);
    }

    #[test]
    fn test_cost_strictly_increasing() {
        for kind in UpgradeKind::ALL {
            for n in 0..COST_CURVE_LEVELS {
                assert!(
                    upgrade_cost(kind, n + 1) > upgrade_cost(kind, n),
                    "{:?} level {}",
                    kind,
                    n
                );
            }
        }
    }

    #[test]
    fn test_role_restrictions() {
        assert!(UpgradeKind::Speed.allowed_for(Role::Captain));
        assert!(UpgradeKind::Med.allowed_for(Role::Medic));
        assert!(!UpgradeKind::Med.allowed_for(Role::Engineer));
        assert!(!UpgradeKind::Engineer.allowed_for(Role::Xo));
        assert!(UpgradeKind::FireSuppression.allowed_for(Role::Xo));
        assert!(!UpgradeKind::AutoHeal.allowed_for(Role::Captain));
        let medic: Vec<_> = UpgradeKind::offered_to(Role::Medic).collect();
        assert!(medic.contains(&UpgradeKind::AutoHeal));
        assert!(!medic.contains(&UpgradeKind::Engineer));
    }

    #[test]
    fn test_speed_level_one() {
        let mut levels = UpgradeLevels::new();
        levels.increment(UpgradeKind::Speed);
        let stats = derive_stats(Role::Engineer, &levels);
        assert!((stats.repair_speed_mult - 1.10).abs() < 1e-9);
    }

    #[test]
    fn test_engineer_bonus_only_for_engineers() {
        let mut levels = UpgradeLevels::new();
        levels.set(UpgradeKind::Engineer, 2);
        assert!((derive_stats(Role::Engineer, &levels).repair_speed_mult - 1.5).abs() < 1e-9);
        assert_eq!(derive_stats(Role::Captain, &levels).repair_speed_mult, 1.0);
    }

    #[test]
    fn test_damage_reduction_capped() {
        let mut levels = UpgradeLevels::new();
        levels.set(UpgradeKind::Armor, 20);
        assert_eq!(derive_stats(Role::Xo, &levels).damage_reduction, MAX_DAMAGE_REDUCTION);
    }

    #[test]
    fn test_heal_rate() {
        let mut levels = UpgradeLevels::new();
        assert_eq!(derive_stats(Role::Medic, &levels).heal_rate, 2.0);
        assert_eq!(derive_stats(Role::Captain, &levels).heal_rate, 0.0);
        levels.set(UpgradeKind::Med, 2);
        assert_eq!(derive_stats(Role::Medic, &levels).heal_rate, 4.0);
    }

    #[test]
    fn test_derive_is_idempotent() {
        let mut levels = UpgradeLevels::new();
        levels.set(UpgradeKind::Speed, 3);
        levels.set(UpgradeKind::Armor, 2);
        levels.set(UpgradeKind::Drills, 1);
        let a = derive_stats(Role::Engineer, &levels);
        let b = derive_stats(Role::Engineer, &levels);
        assert_eq!(a, b);
    }

    #[test]
    fn test_levels_serialize_by_key() {
        let mut levels = UpgradeLevels::new();
        levels.set(UpgradeKind::AutoHeal, 1);
        let keyed = levels.to_keyed();
        assert_eq!(keyed.get("autoHeal"), Some(&1));
        assert_eq!(keyed.get("speed"), Some(&0));
        assert_eq!(keyed.len(), UpgradeKind::ALL.len());
    }
}
