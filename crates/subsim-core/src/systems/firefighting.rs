//! Firefighting system - crew knock fires down, unattended fires spread

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use subsim_logic::events::EventKind;
use subsim_logic::fire::{counter_damage, knock_down, spread_probability};
use subsim_logic::roles::Role;

use crate::components::{CrewId, Engagement, EventId, TaskId};
use crate::notify::Notification;
use crate::state::SimulationState;
use crate::systems::events::{remove_event, spawn_event};

/// Each extinguishing crew member works the oldest fire on their task.
pub fn firefighting_system(state: &mut SimulationState, dt: f64) -> bool {
    let mut changed = release_stale_extinguishers(state);

    for crew_id in CrewId::ALL {
        let Some(crew) = state.crew(crew_id) else {
            continue;
        };
        let Engagement::Extinguishing(task_id) = crew.engagement else {
            continue;
        };
        let (speed, reduction) = (crew.repair_speed_mult, crew.damage_reduction);

        if state.task(task_id).and_then(|t| t.extinguisher) != Some(crew_id) {
            log::debug!("{}: not holding the extinguisher slot on {}", crew_id, task_id);
            state.release_engagement(crew_id);
            changed = true;
            continue;
        }

        let Some(fire_id) = state.fires_on(task_id).next().map(|e| e.id) else {
            state.release_engagement(crew_id);
            changed = true;
            continue;
        };

        let (before, after, max) = match state.event_mut(fire_id) {
            Some(fire) => {
                let before = fire.meta.fire_health;
                fire.meta.fire_health = knock_down(before, speed, dt);
                (before, fire.meta.fire_health, fire.meta.fire_max)
            }
            None => continue,
        };
        state.damage_crew(crew_id, counter_damage(before, max, reduction, dt));
        changed = true;

        if after <= 0.0 {
            put_out(state, fire_id, task_id);
        }
    }

    changed
}

fn put_out(state: &mut SimulationState, fire: EventId, task: TaskId) {
    remove_event(state, fire);
    let title = state.task(task).map(|t| t.title.clone()).unwrap_or_default();
    log::info!("fire on {} extinguished", title);
    state.notify(Notification::message(format!("Fire on {} extinguished.", title)));
}

/// Clear extinguisher slots whose holder is dead or doing something else,
/// and slots on tasks that are no longer burning.
fn release_stale_extinguishers(state: &mut SimulationState) -> bool {
    let mut changed = false;
    for task_id in TaskId::ALL {
        let Some(holder) = state.task(task_id).and_then(|t| t.extinguisher) else {
            continue;
        };
        let engaged = state.crew(holder).map_or(false, |c| {
            c.is_alive() && c.engagement == Engagement::Extinguishing(task_id)
        });
        if !engaged {
            log::debug!("{}: dropping stale extinguisher {}", task_id, holder);
            if let Some(task) = state.task_mut(task_id) {
                task.extinguisher = None;
            }
            changed = true;
        } else if !state.is_on_fire(task_id) {
            state.release_engagement(holder);
            changed = true;
        }
    }
    changed
}

/// On difficulties with a spread rate, fires older than a couple of seconds
/// may jump to another open system.
pub fn fire_spread_system(state: &mut SimulationState, dt: f64, rng: &mut dyn RngCore) -> bool {
    let rate = state.preset().fire_spread_rate;
    if rate <= 0.0 {
        return false;
    }
    let suppression = state
        .by_role(Role::Xo)
        .filter(|xo| xo.is_alive())
        .map_or(0.0, |xo| xo.fire_suppression);

    let now = state.clock;
    let burning: Vec<(TaskId, f64)> = state
        .events
        .iter()
        .filter(|e| e.is_fire())
        .filter_map(|e| e.target.map(|t| (t, e.age(now))))
        .collect();

    let mut changed = false;
    for (source, age) in burning {
        let chance = spread_probability(rate, age, dt, suppression);
        if chance <= 0.0 || rng.gen::<f64>() >= chance {
            continue;
        }
        let open: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|t| !t.complete && !state.is_on_fire(t.id))
            .map(|t| t.id)
            .collect();
        let Some(&target) = open.choose(rng) else {
            continue;
        };
        if spawn_event(state, EventKind::Fire, Some(target), rng).is_ok() {
            log::info!("fire spread from {} to {}", source, target);
            let from = state.task(source).map(|t| t.title.clone()).unwrap_or_default();
            let to = state.task(target).map(|t| t.title.clone()).unwrap_or_default();
            state.notify(Notification::message(format!("Fire spread from {} to {}!", from, to)));
            changed = true;
        }
    }
    changed
}
