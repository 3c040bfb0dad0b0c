//! Difficulty presets.
//!
//! A preset bundles every tunable that scales with difficulty: damage, the
//! starting economy, event cadence, repair time and which events are likely.
//! Fire spread only happens on Hard and Nightmare.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::events::EventWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

/// Tunables for one difficulty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyPreset {
    pub damage_multiplier: f64,
    pub start_supplies: u32,
    pub event_delay_min_ms: u64,
    pub event_delay_max_ms: u64,
    pub task_time_mult: f64,
    pub event_weights: EventWeights,
    /// Per-second base chance that a burning task spreads fire; 0 disables spread.
    pub fire_spread_rate: f64,
}

const EASY: DifficultyPreset = DifficultyPreset {
    damage_multiplier: 0.8,
    start_supplies: 90,
    event_delay_min_ms: 25_000,
    event_delay_max_ms: 45_000,
    task_time_mult: 0.9,
    event_weights: EventWeights {
        hull_breach: 0.5,
        fire: 0.9,
        electrical: 0.9,
        supply_cache: 1.5,
        calm_waters: 1.2,
    },
    fire_spread_rate: 0.0,
};

const NORMAL: DifficultyPreset = DifficultyPreset {
    damage_multiplier: 1.0,
    start_supplies: 50,
    event_delay_min_ms: 15_000,
    event_delay_max_ms: 35_000,
    task_time_mult: 1.0,
    event_weights: EventWeights {
        hull_breach: 0.8,
        fire: 1.0,
        electrical: 1.0,
        supply_cache: 1.0,
        calm_waters: 1.0,
    },
    fire_spread_rate: 0.0,
};

const HARD: DifficultyPreset = DifficultyPreset {
    damage_multiplier: 1.6,
    start_supplies: 30,
    event_delay_min_ms: 8_000,
    event_delay_max_ms: 20_000,
    task_time_mult: 1.1,
    event_weights: EventWeights {
        hull_breach: 1.4,
        fire: 1.6,
        electrical: 1.4,
        supply_cache: 0.6,
        calm_waters: 0.6,
    },
    fire_spread_rate: 0.05,
};

const NIGHTMARE: DifficultyPreset = DifficultyPreset {
    damage_multiplier: 2.6,
    start_supplies: 20,
    event_delay_min_ms: 5_000,
    event_delay_max_ms: 12_000,
    task_time_mult: 1.2,
    event_weights: EventWeights {
        hull_breach: 2.0,
        fire: 2.2,
        electrical: 1.8,
        supply_cache: 0.4,
        calm_waters: 0.3,
    },
    fire_spread_rate: 0.09,
};

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Nightmare,
    ];

    pub fn preset(self) -> &'static DifficultyPreset {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Normal => &NORMAL,
            Difficulty::Hard => &HARD,
            Difficulty::Nightmare => &NIGHTMARE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
            Difficulty::Nightmare => "Nightmare",
        }
    }

    /// Parse a preset name, falling back to Normal for anything unknown.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }

    /// One-line summary for a difficulty picker.
    pub fn describe(self) -> String {
        let p = self.preset();
        format!(
            "Damage x{}, Start supplies: {}, Event cadence: {}–{}s",
            p.damage_multiplier,
            p.start_supplies,
            (p.event_delay_min_ms as f64 / 1000.0).round(),
            (p.event_delay_max_ms as f64 / 1000.0).round()
        )
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| s.to_string())
    }
}

impl DifficultyPreset {
    /// Effort needed to finish a task of `base_time` seconds.
    pub fn required_time(&self, base_time: f64) -> f64 {
        base_time * self.task_time_mult
    }

    /// Draw the next spawn delay in milliseconds from `[min, max)`.
    ///
    /// `unit` is a uniform sample in `[0, 1)`.
    pub fn event_delay_ms(&self, unit: f64) -> u64 {
        let span = self.event_delay_max_ms.saturating_sub(self.event_delay_min_ms);
        self.event_delay_min_ms + (unit.clamp(0.0, 1.0) * span as f64).floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_preset() {
        let p = Difficulty::Normal.preset();
        assert_eq!(p.start_supplies, 50);
        assert_eq!(p.damage_multiplier, 1.0);
        assert_eq!(p.task_time_mult, 1.0);
        assert_eq!(p.fire_spread_rate, 0.0);
    }

    #[test]
    fn test_harder_presets_hurt_more() {
        let mut last = 0.0;
        for d in Difficulty::ALL {
            let p = d.preset();
            assert!(p.damage_multiplier > last);
            assert!(p.event_delay_min_ms < p.event_delay_max_ms);
            last = p.damage_multiplier;
        }
        assert!(Difficulty::Hard.preset().fire_spread_rate > 0.0);
        assert!(
            Difficulty::Nightmare.preset().fire_spread_rate
                > Difficulty::Hard.preset().fire_spread_rate
        );
    }

    #[test]
    fn test_name_fallback() {
        assert_eq!(Difficulty::from_name_or_default("hard"), Difficulty::Hard);
        assert_eq!(Difficulty::from_name_or_default("Impossible"), Difficulty::Normal);
    }

    #[test]
    fn test_event_delay_bounds() {
        let p = Difficulty::Normal.preset();
        assert_eq!(p.event_delay_ms(0.0), 15_000);
        assert!(p.event_delay_ms(0.999_999) < 35_000);
        assert_eq!(p.event_delay_ms(0.5), 25_000);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Difficulty::Hard.describe(),
            "Damage x1.6, Start supplies: 30, Event cadence: 8–20s"
        );
    }
}
