//! Event system - strategy registry, spawning and expiry
//!
//! Each [`EventKind`] maps to a unit strategy implementing [`EventBehavior`].
//! `apply` establishes the derived effects of an active event and is re-run
//! when events are restored from a save; `trigger` holds one-shot effects
//! and only runs on spawn.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use subsim_logic::events::{
    weighted_pool, EventKind, HULL_BREACH_BURST_MIN, HULL_BREACH_BURST_SPREAD, SUPPLY_CACHE_MIN,
    SUPPLY_CACHE_SPREAD,
};
use subsim_logic::fire::FIRE_MAX_INTENSITY;

use crate::components::{ActiveEvent, CrewId, EventId, TaskId};
use crate::error::EventError;
use crate::notify::Notification;
use crate::state::SimulationState;

pub trait EventBehavior {
    /// Establish derived effects for the active event `id`.
    fn apply(&self, state: &mut SimulationState, id: EventId) -> Result<(), EventError> {
        attach(state, id)
    }

    /// One-shot effects, run once on spawn.
    fn trigger(&self, _state: &mut SimulationState, _id: EventId, _rng: &mut dyn RngCore) {}

    /// Undo derived effects. `event` has already left the active list.
    fn revert(&self, state: &mut SimulationState, event: &ActiveEvent) -> Result<(), EventError> {
        if let Some(task) = event.target {
            state.refresh_task_modifiers(task);
        }
        Ok(())
    }
}

struct HullBreach;
struct Fire;
struct Electrical;
struct SupplyCache;
struct CalmWaters;

/// Strategy for an event kind.
pub fn behavior(kind: EventKind) -> &'static dyn EventBehavior {
    match kind {
        EventKind::HullBreach => &HullBreach,
        EventKind::Fire => &Fire,
        EventKind::Electrical => &Electrical,
        EventKind::SupplyCache => &SupplyCache,
        EventKind::CalmWaters => &CalmWaters,
    }
}

/// Shared part of `apply`: check the target, set the global modifier and
/// recompute the target's multipliers.
fn attach(state: &mut SimulationState, id: EventId) -> Result<(), EventError> {
    let event = state.event_mut(id).ok_or(EventError::NotActive(id))?;
    let profile = event.kind.profile();
    if profile.needs_target && event.target.is_none() {
        return Err(EventError::MissingTarget(event.kind));
    }
    event.meta.global_damage_boost = profile.global_damage_boost;
    if let Some(task) = event.target {
        state.refresh_task_modifiers(task);
    }
    Ok(())
}

fn target_title(state: &SimulationState, task: Option<TaskId>) -> String {
    task.and_then(|t| state.task(t))
        .map(|t| t.title.clone())
        .unwrap_or_default()
}

impl EventBehavior for HullBreach {
    fn trigger(&self, state: &mut SimulationState, _id: EventId, rng: &mut dyn RngCore) {
        let living: Vec<CrewId> = state
            .crew
            .iter()
            .filter(|c| c.is_alive())
            .map(|c| c.id)
            .collect();
        // Debris ignores armor
        for crew in living {
            let burst = HULL_BREACH_BURST_MIN + rng.gen::<f64>() * HULL_BREACH_BURST_SPREAD;
            state.damage_crew(crew, burst);
        }
    }
}

impl EventBehavior for Fire {
    fn apply(&self, state: &mut SimulationState, id: EventId) -> Result<(), EventError> {
        attach(state, id)?;
        let event = state.event_mut(id).ok_or(EventError::NotActive(id))?;
        // A restored fire keeps the intensity it was saved with
        if event.meta.fire_max <= 0.0 {
            event.meta.fire_max = FIRE_MAX_INTENSITY;
            event.meta.fire_health = FIRE_MAX_INTENSITY;
        } else {
            event.meta.fire_health = event.meta.fire_health.clamp(0.0, event.meta.fire_max);
        }
        Ok(())
    }

    fn revert(&self, state: &mut SimulationState, event: &ActiveEvent) -> Result<(), EventError> {
        let task = event.target.ok_or(EventError::MissingTarget(event.kind))?;
        state.refresh_task_modifiers(task);
        if !state.is_on_fire(task) {
            let extinguisher = state.task_mut(task).and_then(|t| t.extinguisher.take());
            if let Some(crew) = extinguisher {
                state.release_engagement(crew);
            }
        }
        Ok(())
    }
}

impl EventBehavior for Electrical {}

impl EventBehavior for SupplyCache {
    fn trigger(&self, state: &mut SimulationState, id: EventId, rng: &mut dyn RngCore) {
        let reward = SUPPLY_CACHE_MIN + (rng.gen::<f64>() * SUPPLY_CACHE_SPREAD).round() as u32;
        if let Some(event) = state.event_mut(id) {
            event.meta.reward = reward;
        }
        state.grant_supplies(reward);
        state.notify(Notification::message(format!(
            "Supply cache found: +{} supplies.",
            reward
        )));
    }
}

impl EventBehavior for CalmWaters {}

/// Spawn an event of `kind`. Kinds that need a target must be given one.
pub fn spawn_event(
    state: &mut SimulationState,
    kind: EventKind,
    target: Option<TaskId>,
    rng: &mut dyn RngCore,
) -> Result<EventId, EventError> {
    let target = if kind.needs_target() {
        Some(target.ok_or(EventError::MissingTarget(kind))?)
    } else {
        None
    };

    let id = state.alloc_event_id();
    state.events.push(ActiveEvent::new(id, kind, target, state.clock));

    let strategy = behavior(kind);
    if let Err(err) = strategy.apply(state, id) {
        state.events.retain(|e| e.id != id);
        return Err(err);
    }

    let title = target_title(state, target);
    if title.is_empty() {
        log::info!("event {} spawned: {}", id, kind);
        state.notify(Notification::message(format!("Event: {}", kind)));
    } else {
        log::info!("event {} spawned: {} on {}", id, kind, title);
        state.notify(Notification::message(format!("Event: {} on {}", kind, title)));
    }

    strategy.trigger(state, id, rng);
    Ok(id)
}

/// Draw a kind from the difficulty's weighted pool and spawn it.
///
/// A target-requiring kind with no incomplete task to hit becomes a supply
/// cache.
pub fn spawn_random_event(
    state: &mut SimulationState,
    rng: &mut dyn RngCore,
) -> Result<EventId, EventError> {
    let pool = weighted_pool(&state.preset().event_weights);
    let mut kind = pool.choose(rng).copied().unwrap_or(EventKind::SupplyCache);
    let mut target = None;

    if kind.needs_target() {
        let open: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|t| !t.complete)
            .map(|t| t.id)
            .collect();
        match open.choose(rng) {
            Some(task) => target = Some(*task),
            None => kind = EventKind::SupplyCache,
        }
    }

    spawn_event(state, kind, target, rng)
}

/// Remove an active event and revert its effects.
///
/// Revert failures are logged, never propagated.
pub fn remove_event(state: &mut SimulationState, id: EventId) -> Option<ActiveEvent> {
    let index = state.events.iter().position(|e| e.id == id)?;
    let event = state.events.remove(index);
    if let Err(err) = behavior(event.kind).revert(state, &event) {
        log::warn!("reverting {} failed: {}", event.id, err);
    }
    Some(event)
}

/// Remove every event whose lifetime has elapsed on the simulation clock.
pub fn event_expiry_system(state: &mut SimulationState) -> bool {
    let now = state.clock;
    let expired: Vec<EventId> = state
        .events
        .iter()
        .filter(|e| e.is_expired(now))
        .map(|e| e.id)
        .collect();

    for id in &expired {
        if let Some(event) = remove_event(state, *id) {
            if event.duration > 0.0 {
                log::info!("event {} ended: {}", event.id, event.kind);
                let title = target_title(state, event.target);
                let text = if title.is_empty() {
                    format!("{} has passed.", event.kind)
                } else {
                    format!("{} on {} has passed.", event.kind, title)
                };
                state.notify(Notification::message(text));
            }
        }
    }
    !expired.is_empty()
}

/// Re-attach an event read from a save. One-shot effects are not replayed.
pub fn restore_event(state: &mut SimulationState, event: ActiveEvent) -> Result<(), EventError> {
    let (id, kind) = (event.id, event.kind);
    if state.event(id).is_some() {
        return Err(EventError::DuplicateId(id));
    }
    state.events.push(event);
    if let Err(err) = behavior(kind).apply(state, id) {
        state.events.retain(|e| e.id != id);
        return Err(err);
    }
    Ok(())
}
