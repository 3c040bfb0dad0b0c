//! Medical system - medic auto-heal and active healing

use subsim_logic::medical::{
    heal_step, is_fully_healed, pick_heal_target, HealCandidate, AUTO_HEAL_MIN_LEVEL,
    SELF_HEAL_MIN_LEVEL,
};
use subsim_logic::roles::Role;

use crate::components::{CrewId, Engagement};
use crate::notify::Notification;
use crate::state::SimulationState;

/// An idle medic with the auto-heal module picks the most wounded idle crew
/// member.
pub fn auto_heal_system(state: &mut SimulationState) -> bool {
    let Some(medic) = state.living_medic() else {
        return false;
    };
    if !medic.is_idle() || medic.auto_heal_level < AUTO_HEAL_MIN_LEVEL {
        return false;
    }
    let medic_id = medic.id;
    let allow_self = medic.auto_heal_level >= SELF_HEAL_MIN_LEVEL;

    let candidates: Vec<HealCandidate> = state
        .crew
        .iter()
        .map(|c| HealCandidate {
            health: c.health,
            max_health: c.max_health,
            idle: c.is_idle(),
            is_medic: c.role == Role::Medic,
        })
        .collect();
    let Some(index) = pick_heal_target(&candidates, allow_self) else {
        return false;
    };
    let target = state.crew[index].id;
    let target_name = state.crew[index].name.clone();

    if let Some(medic) = state.crew_mut(medic_id) {
        medic.engagement = Engagement::Healing(target);
        let text = format!("{} auto-heals {}.", medic.name, target_name);
        log::debug!("{}", text);
        state.notify(Notification::message(text));
    }
    true
}

/// Advance every active heal by `dt` seconds.
pub fn healing_system(state: &mut SimulationState, dt: f64) -> bool {
    let mut changed = false;

    for medic_id in CrewId::ALL {
        let Some(medic) = state.crew(medic_id) else {
            continue;
        };
        let Some(target_id) = medic.heal_target() else {
            continue;
        };
        let rate = medic.heal_rate;

        let Some(target) = state.crew(target_id).filter(|t| t.is_alive()) else {
            log::debug!("{}: heal target {} is gone", medic_id, target_id);
            state.release_engagement(medic_id);
            changed = true;
            continue;
        };
        if is_fully_healed(target.health, target.max_health) {
            state.release_engagement(medic_id);
            changed = true;
            continue;
        }

        let healed = match state.crew_mut(target_id) {
            Some(target) => {
                target.health = heal_step(target.health, target.max_health, rate, dt);
                if is_fully_healed(target.health, target.max_health) {
                    target.health = target.max_health;
                    Some(target.name.clone())
                } else {
                    None
                }
            }
            None => continue,
        };
        changed = true;

        if let Some(name) = healed {
            state.release_engagement(medic_id);
            state.notify(Notification::message(format!("{} is fully healed.", name)));
        }
    }

    changed
}
