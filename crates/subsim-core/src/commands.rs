//! Player commands.
//!
//! Every command re-validates its preconditions against the current state.
//! A rejected command changes nothing and returns the reason.

use subsim_logic::difficulty::Difficulty;
use subsim_logic::upgrades::{upgrade_cost, UpgradeKind};

use crate::components::{CrewId, Engagement, TaskId};
use crate::error::CommandError;
use crate::notify::Notification;
use crate::state::SimulationState;
use crate::systems::settle_finished_tasks;

/// Parse a crew id from its wire name (`"eo"`).
pub fn parse_crew(raw: &str) -> Result<CrewId, CommandError> {
    raw.parse().map_err(CommandError::UnknownCrew)
}

/// Parse a task id from its wire name (`"reactor"`).
pub fn parse_task(raw: &str) -> Result<TaskId, CommandError> {
    raw.parse().map_err(CommandError::UnknownTask)
}

/// Parse an upgrade from its catalog key (`"autoHeal"`).
pub fn parse_upgrade(raw: &str) -> Result<UpgradeKind, CommandError> {
    raw.parse().map_err(CommandError::UnknownUpgrade)
}

/// Parse a difficulty name, case-insensitively.
pub fn parse_difficulty(raw: &str) -> Result<Difficulty, CommandError> {
    raw.parse().map_err(CommandError::UnknownDifficulty)
}

fn living_crew_name(state: &SimulationState, id: CrewId) -> Result<String, CommandError> {
    let crew = state
        .crew(id)
        .ok_or_else(|| CommandError::UnknownCrew(id.to_string()))?;
    if !crew.is_alive() {
        return Err(CommandError::CrewDead(crew.name.clone()));
    }
    Ok(crew.name.clone())
}

/// Put `crew` on `task`, or clear the task with `None`.
///
/// A crew member already busy elsewhere is moved; whoever held the task
/// before is sent back to idle.
pub fn assign_crew_to_task(
    state: &mut SimulationState,
    crew: Option<CrewId>,
    task: TaskId,
) -> Result<(), CommandError> {
    let current = state
        .task(task)
        .ok_or_else(|| CommandError::UnknownTask(task.to_string()))?;
    if current.complete {
        return Err(CommandError::TaskComplete(task));
    }
    let previous = current.assigned;
    let title = current.title.clone();

    let Some(crew) = crew else {
        return unassign_task(state, task);
    };
    if state.is_on_fire(task) {
        return Err(CommandError::TaskOnFire(task));
    }
    let name = living_crew_name(state, crew)?;
    if previous == Some(crew) {
        return Ok(());
    }

    state.release_engagement(crew);
    if let Some(previous) = previous {
        state.release_engagement(previous);
    }
    if let Some(member) = state.crew_mut(crew) {
        member.engagement = Engagement::Repairing(task);
    }
    if let Some(task) = state.task_mut(task) {
        task.assigned = Some(crew);
    }

    log::debug!("{} assigned to {}", crew, task);
    state.notify(Notification::message(format!("{} assigned to {}.", name, title)));
    state.mark_changed();
    Ok(())
}

/// Send whoever is repairing `task` back to idle.
pub fn unassign_task(state: &mut SimulationState, task: TaskId) -> Result<(), CommandError> {
    let assigned = state
        .task(task)
        .ok_or_else(|| CommandError::UnknownTask(task.to_string()))?
        .assigned;
    if let Some(crew) = assigned {
        state.release_engagement(crew);
        state.mark_changed();
    }
    Ok(())
}

/// Toggle the medic's heal on `target`.
///
/// Returns true when the medic is now healing `target`, false when the heal
/// was cancelled.
pub fn request_heal(state: &mut SimulationState, target: CrewId) -> Result<bool, CommandError> {
    let medic = state.living_medic().ok_or(CommandError::NoLivingMedic)?;
    let medic_id = medic.id;
    let medic_name = medic.name.clone();
    let already = medic.heal_target() == Some(target);
    let target_name = living_crew_name(state, target)?;

    state.release_engagement(medic_id);
    if already {
        state.notify(Notification::message(format!("{} stops healing.", medic_name)));
        state.mark_changed();
        return Ok(false);
    }

    if let Some(medic) = state.crew_mut(medic_id) {
        medic.engagement = Engagement::Healing(target);
    }
    state.notify(Notification::message(format!(
        "{} is healing {}.",
        medic_name, target_name
    )));
    state.mark_changed();
    Ok(true)
}

/// Buy the next level of `upgrade` for `crew` and return what it cost.
///
/// Upgrades that apply to everyone raise every crew member's level at once.
pub fn purchase_upgrade(
    state: &mut SimulationState,
    crew: CrewId,
    upgrade: UpgradeKind,
) -> Result<u32, CommandError> {
    let name = living_crew_name(state, crew)?;
    let buyer = state
        .crew(crew)
        .ok_or_else(|| CommandError::UnknownCrew(crew.to_string()))?;
    let def = upgrade.def();
    if !upgrade.allowed_for(buyer.role) {
        return Err(CommandError::RoleRestricted {
            upgrade,
            required: def.role.unwrap_or(buyer.role),
        });
    }
    let cost = upgrade_cost(upgrade, buyer.upgrades.level(upgrade));
    if state.supplies < cost {
        return Err(CommandError::InsufficientSupplies {
            needed: cost,
            available: state.supplies,
        });
    }

    state.supplies -= cost;
    for member in &mut state.crew {
        if def.applies_to_all || member.id == crew {
            member.upgrades.increment(upgrade);
            member.recompute_stats();
        }
    }

    let text = if def.applies_to_all {
        format!("Purchased {} for the whole crew.", upgrade)
    } else {
        format!("Purchased {} for {}.", upgrade, name)
    };
    log::info!("{} (-{} supplies)", text, cost);
    state.notify(Notification::message(text));
    state.mark_changed();
    Ok(cost)
}

/// Switch difficulty. Before the patrol starts the supply pool resets to the
/// new preset; afterwards only task requirements and damage change.
pub fn apply_difficulty(state: &mut SimulationState, difficulty: Difficulty, started: bool) {
    state.difficulty = difficulty;
    if !started {
        state.supplies = difficulty.preset().start_supplies;
    }

    let mult = difficulty.preset().task_time_mult;
    for task in &mut state.tasks {
        let required = task.required_time(mult);
        if task.complete {
            task.progress = required;
        } else {
            task.progress = task.progress.clamp(0.0, required);
        }
    }
    // Easier settings can leave partially repaired systems already finished
    settle_finished_tasks(state);

    log::info!("difficulty set to {}", difficulty);
    state.notify(Notification::message(difficulty.describe()));
    state.mark_changed();
}

/// Send an idle crew member to fight the fire on `task`.
pub fn extinguish(state: &mut SimulationState, crew: CrewId, task: TaskId) -> Result<(), CommandError> {
    let name = living_crew_name(state, crew)?;
    if !state.crew(crew).map_or(false, |c| c.is_idle()) {
        return Err(CommandError::CrewBusy(name));
    }
    let holder = state
        .task(task)
        .ok_or_else(|| CommandError::UnknownTask(task.to_string()))?
        .extinguisher;
    if !state.is_on_fire(task) {
        return Err(CommandError::NoFire(task));
    }
    if let Some(holder) = holder {
        return Err(CommandError::ExtinguisherAssigned { task, crew: holder });
    }

    if let Some(member) = state.crew_mut(crew) {
        member.engagement = Engagement::Extinguishing(task);
    }
    let title = match state.task_mut(task) {
        Some(t) => {
            t.extinguisher = Some(crew);
            t.title.clone()
        }
        None => String::new(),
    };
    state.notify(Notification::message(format!("{} is fighting the fire on {}.", name, title)));
    state.mark_changed();
    Ok(())
}

/// Pull the firefighter off `task`.
pub fn recall_extinguisher(state: &mut SimulationState, task: TaskId) -> Result<(), CommandError> {
    let holder = state
        .task(task)
        .ok_or_else(|| CommandError::UnknownTask(task.to_string()))?
        .extinguisher;
    if let Some(crew) = holder {
        state.release_engagement(crew);
        state.mark_changed();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use subsim_logic::events::EventKind;

    use crate::systems::spawn_event;

    fn fresh() -> SimulationState {
        SimulationState::new(Difficulty::Normal)
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!(parse_crew("med"), Ok(CrewId::Med));
        assert_eq!(parse_task("comms"), Ok(TaskId::Comms));
        assert_eq!(parse_upgrade("autoHeal"), Ok(UpgradeKind::AutoHeal));
        assert_eq!(parse_difficulty("nightmare"), Ok(Difficulty::Nightmare));
        assert_eq!(parse_crew("cook"), Err(CommandError::UnknownCrew("cook".into())));
        assert!(matches!(parse_upgrade("laser"), Err(CommandError::UnknownUpgrade(_))));
    }

    #[test]
    fn test_assign_moves_crew_between_tasks() {
        let mut state = fresh();
        assign_crew_to_task(&mut state, Some(CrewId::Eo), TaskId::Reactor).unwrap();
        assign_crew_to_task(&mut state, Some(CrewId::Eo), TaskId::Sonar).unwrap();

        assert_eq!(state.task(TaskId::Reactor).unwrap().assigned, None);
        assert_eq!(state.task(TaskId::Sonar).unwrap().assigned, Some(CrewId::Eo));
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn test_assign_replaces_previous_holder() {
        let mut state = fresh();
        assign_crew_to_task(&mut state, Some(CrewId::Capt), TaskId::Comms).unwrap();
        assign_crew_to_task(&mut state, Some(CrewId::Xo), TaskId::Comms).unwrap();

        assert!(state.crew(CrewId::Capt).unwrap().is_idle());
        assert_eq!(state.task(TaskId::Comms).unwrap().assigned, Some(CrewId::Xo));
    }

    #[test]
    fn test_assign_rejections() {
        let mut state = fresh();
        state.task_mut(TaskId::Comms).unwrap().complete = true;
        state.task_mut(TaskId::Comms).unwrap().progress = 10.0;
        assert_eq!(
            assign_crew_to_task(&mut state, Some(CrewId::Eo), TaskId::Comms),
            Err(CommandError::TaskComplete(TaskId::Comms))
        );

        state.crew_mut(CrewId::Capt).unwrap().health = 0.0;
        assert!(matches!(
            assign_crew_to_task(&mut state, Some(CrewId::Capt), TaskId::Sonar),
            Err(CommandError::CrewDead(_))
        ));

        let mut rng = StdRng::seed_from_u64(0);
        spawn_event(&mut state, EventKind::Fire, Some(TaskId::Reactor), &mut rng).unwrap();
        assert_eq!(
            assign_crew_to_task(&mut state, Some(CrewId::Eo), TaskId::Reactor),
            Err(CommandError::TaskOnFire(TaskId::Reactor))
        );
        assert_eq!(state.revision, 0);
    }

    #[test]
    fn test_heal_request_toggles() {
        let mut state = fresh();
        assert_eq!(request_heal(&mut state, CrewId::Eo), Ok(true));
        assert_eq!(state.crew(CrewId::Med).unwrap().heal_target(), Some(CrewId::Eo));
        assert_eq!(request_heal(&mut state, CrewId::Eo), Ok(false));
        assert!(state.crew(CrewId::Med).unwrap().is_idle());
    }

    #[test]
    fn test_heal_request_rejections() {
        let mut state = fresh();
        state.crew_mut(CrewId::Xo).unwrap().health = 0.0;
        assert!(matches!(request_heal(&mut state, CrewId::Xo), Err(CommandError::CrewDead(_))));

        state.crew_mut(CrewId::Med).unwrap().health = 0.0;
        assert_eq!(request_heal(&mut state, CrewId::Eo), Err(CommandError::NoLivingMedic));
    }

    #[test]
    fn test_purchase_speed() {
        let mut state = fresh();
        assert_eq!(purchase_upgrade(&mut state, CrewId::Capt, UpgradeKind::Speed), Ok(20));
        let capt = state.crew(CrewId::Capt).unwrap();
        assert_eq!(capt.upgrades.level(UpgradeKind::Speed), 1);
        assert!((capt.repair_speed_mult - 1.10).abs() < 1e-9);
        assert_eq!(state.supplies, 30);

        assert_eq!(purchase_upgrade(&mut state, CrewId::Capt, UpgradeKind::Speed), Ok(30));
        assert_eq!(
            purchase_upgrade(&mut state, CrewId::Capt, UpgradeKind::Speed),
            Err(CommandError::InsufficientSupplies { needed: 45, available: 0 })
        );
    }

    #[test]
    fn test_purchase_role_restricted() {
        let mut state = fresh();
        assert!(matches!(
            purchase_upgrade(&mut state, CrewId::Capt, UpgradeKind::Med),
            Err(CommandError::RoleRestricted { .. })
        ));
        assert_eq!(state.supplies, 50);
    }

    #[test]
    fn test_drills_apply_to_everyone() {
        let mut state = fresh();
        state.supplies = 100;
        assert_eq!(purchase_upgrade(&mut state, CrewId::Xo, UpgradeKind::Drills), Ok(60));
        for crew in &state.crew {
            assert_eq!(crew.upgrades.level(UpgradeKind::Drills), 1);
            assert!((crew.damage_reduction - 0.04).abs() < 1e-9);
        }
    }

    #[test]
    fn test_difficulty_before_start_resets_supplies() {
        let mut state = fresh();
        apply_difficulty(&mut state, Difficulty::Easy, false);
        assert_eq!(state.supplies, 90);
        apply_difficulty(&mut state, Difficulty::Hard, true);
        assert_eq!(state.supplies, 90);
        assert_eq!(state.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_difficulty_completes_shrunk_tasks() {
        let mut state = SimulationState::new(Difficulty::Nightmare);
        assign_crew_to_task(&mut state, Some(CrewId::Eo), TaskId::Comms).unwrap();
        state.task_mut(TaskId::Comms).unwrap().progress = 11.5;

        apply_difficulty(&mut state, Difficulty::Easy, true);

        let comms = state.task(TaskId::Comms).unwrap();
        assert!(comms.complete);
        assert_eq!(comms.progress, 9.0);
        assert!(state.crew(CrewId::Eo).unwrap().is_idle());
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn test_extinguish_rules() {
        let mut state = fresh();
        assert_eq!(
            extinguish(&mut state, CrewId::Xo, TaskId::Sonar),
            Err(CommandError::NoFire(TaskId::Sonar))
        );

        let mut rng = StdRng::seed_from_u64(0);
        spawn_event(&mut state, EventKind::Fire, Some(TaskId::Sonar), &mut rng).unwrap();
        extinguish(&mut state, CrewId::Xo, TaskId::Sonar).unwrap();
        assert_eq!(
            extinguish(&mut state, CrewId::Capt, TaskId::Sonar),
            Err(CommandError::ExtinguisherAssigned { task: TaskId::Sonar, crew: CrewId::Xo })
        );

        assign_crew_to_task(&mut state, Some(CrewId::Eo), TaskId::Reactor).unwrap();
        assert!(matches!(
            extinguish(&mut state, CrewId::Eo, TaskId::Sonar),
            Err(CommandError::CrewBusy(_))
        ));

        recall_extinguisher(&mut state, TaskId::Sonar).unwrap();
        assert!(state.crew(CrewId::Xo).unwrap().is_idle());
        assert_eq!(state.task(TaskId::Sonar).unwrap().extinguisher, None);
    }
}
