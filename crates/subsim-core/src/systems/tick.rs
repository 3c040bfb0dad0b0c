//! One simulation step

use rand::RngCore;

use crate::notify::Notification;
use crate::state::{Outcome, SimulationState};

use super::events::event_expiry_system;
use super::firefighting::{fire_spread_system, firefighting_system};
use super::medical::{auto_heal_system, healing_system};
use super::repair::repair_system;

/// Advance the simulation by `dt` seconds.
///
/// `dt` is applied as given; clamping long stalls is the engine's job.
/// Returns true if anything changed.
pub fn step_simulation(state: &mut SimulationState, dt: f64, rng: &mut dyn RngCore) -> bool {
    if state.is_over() {
        return false;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    state.clock += dt;

    let mut changed = false;
    changed |= repair_system(state, dt);
    changed |= firefighting_system(state, dt);
    changed |= auto_heal_system(state);
    changed |= healing_system(state, dt);
    changed |= event_expiry_system(state);
    changed |= fire_spread_system(state, dt, rng);
    changed |= check_outcome(state);

    if changed {
        state.mark_changed();
    }
    changed
}

/// Victory when every system is repaired, defeat when nobody is left to
/// repair them.
pub fn check_outcome(state: &mut SimulationState) -> bool {
    if state.is_over() {
        return false;
    }
    if state.all_tasks_complete() {
        state.outcome = Outcome::Victory;
        log::info!(
            "all systems repaired on {} with {} supplies",
            state.difficulty,
            state.supplies
        );
        state.notify(Notification::Victory {
            supplies: state.supplies,
            difficulty: state.difficulty,
        });
        return true;
    }
    if state.all_crew_dead() {
        state.outcome = Outcome::Defeat;
        log::info!("all crew lost");
        state.notify(Notification::Defeat);
        return true;
    }
    false
}
