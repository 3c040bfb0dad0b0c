//! Repair system - advances assigned tasks and damages the repairing crew

use subsim_logic::repair::{progress_delta, repair_damage, RepairInput};

use crate::components::{Engagement, TaskId};
use crate::state::SimulationState;

/// Advance every assigned, incomplete task by `dt` seconds.
///
/// Returns true if anything changed.
pub fn repair_system(state: &mut SimulationState, dt: f64) -> bool {
    let mut changed = false;
    let damage_mult = state.preset().damage_multiplier;
    let global = state.global_damage_factor();

    for task_id in TaskId::ALL {
        let Some(task) = state.task(task_id) else {
            continue;
        };
        if task.complete {
            continue;
        }
        let Some(crew_id) = task.assigned else {
            continue;
        };

        let engaged = state.crew(crew_id).map_or(false, |c| {
            c.is_alive() && c.engagement == Engagement::Repairing(task_id)
        });
        if !engaged {
            log::debug!("{}: dropping stale assignment of {}", task_id, crew_id);
            if let Some(task) = state.task_mut(task_id) {
                task.assigned = None;
            }
            changed = true;
            continue;
        }

        // Burning compartments are paused, not abandoned
        if state.is_on_fire(task_id) {
            continue;
        }

        let (input, required) = {
            let (Some(task), Some(crew)) = (state.task(task_id), state.crew(crew_id)) else {
                continue;
            };
            let input = RepairInput {
                dt,
                crew_speed_mult: crew.repair_speed_mult,
                crew_damage_reduction: crew.damage_reduction,
                task_access_speed_mult: task.access_speed_mult,
                task_event_speed_mult: task.event_speed_mult,
                task_base_damage: task.base_damage_per_sec,
                task_event_damage_mult: task.event_damage_mult,
                difficulty_damage_mult: damage_mult,
                global_damage_factor: global,
            };
            (input, state.required_time(task))
        };

        let finished = match state.task_mut(task_id) {
            Some(task) => {
                task.progress = (task.progress + progress_delta(&input)).min(required);
                task.progress >= required
            }
            None => continue,
        };
        state.damage_crew(crew_id, repair_damage(&input));
        changed = true;

        // A repair finished on the tick its crew member died still counts
        if finished {
            state.complete_task(task_id);
        }
    }

    changed
}

/// Complete every unfinished task whose progress already meets the
/// requirement, e.g. after an easier difficulty shrank it.
pub fn settle_finished_tasks(state: &mut SimulationState) -> bool {
    let due: Vec<TaskId> = state
        .tasks
        .iter()
        .filter(|t| !t.complete && t.progress >= state.required_time(t))
        .map(|t| t.id)
        .collect();
    for id in &due {
        state.complete_task(*id);
    }
    !due.is_empty()
}
