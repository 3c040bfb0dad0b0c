//! Pure simulation logic for the submarine incident simulation.
//!
//! This crate holds the static tables and formulas that the engine in
//! `subsim-core` is built on. Nothing here owns state or touches storage:
//! functions take plain data and return results, so every balance number can
//! be unit-tested in isolation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`difficulty`] | Difficulty presets: damage scaling, economy, event cadence and weights |
//! | [`events`] | Event kinds, per-kind profiles, weighted spawn pool |
//! | [`fire`] | Firefighting power, counter-damage and spread probability |
//! | [`medical`] | Medic heal rate and heal-target selection |
//! | [`repair`] | Repair progress, repair damage and completion rewards |
//! | [`roles`] | Crew roles |
//! | [`upgrades`] | Upgrade catalog, cost curve and derived crew stats |

pub mod difficulty;
pub mod events;
pub mod fire;
pub mod medical;
pub mod repair;
pub mod roles;
pub mod upgrades;
