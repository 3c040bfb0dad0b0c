//! Simulation state - the single owner of everything the tick mutates
//!
//! Systems and commands receive `&mut SimulationState`; nothing lives in
//! globals. Helpers here keep the cross-references between crew engagements
//! and task slots consistent.

use serde::Serialize;
use subsim_logic::difficulty::{Difficulty, DifficultyPreset};
use subsim_logic::events::{global_damage_factor, task_multipliers};
use subsim_logic::repair::completion_reward;
use subsim_logic::roles::Role;

use crate::components::*;
use crate::notify::Notification;

/// How the session ended, if it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Outcome {
    #[default]
    InProgress,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    pub difficulty: Difficulty,
    pub supplies: u32,
    /// Roster order; tie-breaks follow it
    pub crew: Vec<Crew>,
    pub tasks: Vec<Task>,
    /// Oldest first
    pub events: Vec<ActiveEvent>,
    /// Simulation seconds elapsed (sum of clamped tick deltas)
    pub clock: f64,
    pub next_event_id: u64,
    pub outcome: Outcome,
    /// Bumped every time a step or command changes anything
    pub revision: u64,
    #[serde(skip)]
    outbox: Vec<Notification>,
}

impl SimulationState {
    /// Fresh patrol at the given difficulty.
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            supplies: difficulty.preset().start_supplies,
            crew: default_roster(),
            tasks: default_tasks(),
            events: Vec::new(),
            clock: 0.0,
            next_event_id: 1,
            outcome: Outcome::InProgress,
            revision: 0,
            outbox: Vec::new(),
        }
    }

    pub fn preset(&self) -> &'static DifficultyPreset {
        self.difficulty.preset()
    }

    /// Effort needed to finish `task` at the current difficulty.
    pub fn required_time(&self, task: &Task) -> f64 {
        task.required_time(self.preset().task_time_mult)
    }

    pub fn crew(&self, id: CrewId) -> Option<&Crew> {
        self.crew.iter().find(|c| c.id == id)
    }

    pub fn crew_mut(&mut self, id: CrewId) -> Option<&mut Crew> {
        self.crew.iter_mut().find(|c| c.id == id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn event(&self, id: EventId) -> Option<&ActiveEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut ActiveEvent> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    /// First crew member with the given role.
    pub fn by_role(&self, role: Role) -> Option<&Crew> {
        self.crew.iter().find(|c| c.role == role)
    }

    pub fn living_medic(&self) -> Option<&Crew> {
        self.by_role(Role::Medic).filter(|m| m.is_alive())
    }

    pub fn fires_on(&self, task: TaskId) -> impl Iterator<Item = &ActiveEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.is_fire() && e.target == Some(task))
    }

    pub fn is_on_fire(&self, task: TaskId) -> bool {
        self.fires_on(task).next().is_some()
    }

    /// `max(0, 1 + sum of global modifiers)` over active events.
    pub fn global_damage_factor(&self) -> f64 {
        global_damage_factor(self.events.iter().map(|e| e.meta.global_damage_boost))
    }

    pub fn alloc_event_id(&mut self) -> EventId {
        let id = EventId(self.next_event_id);
        self.next_event_id += 1;
        id
    }

    /// Rebuild a task's event list and multipliers from the events still
    /// targeting it.
    pub fn refresh_task_modifiers(&mut self, id: TaskId) {
        let targeting: Vec<&ActiveEvent> = self
            .events
            .iter()
            .filter(|e| e.target == Some(id))
            .collect();
        let ids: Vec<EventId> = targeting.iter().map(|e| e.id).collect();
        let (dmg, spd) = task_multipliers(targeting.iter().map(|e| e.kind));
        if let Some(task) = self.task_mut(id) {
            task.events = ids;
            task.event_damage_mult = dmg;
            task.event_speed_mult = spd;
        }
    }

    /// Put a crew member back to idle and clear any task slot holding them.
    pub fn release_engagement(&mut self, id: CrewId) {
        if let Some(crew) = self.crew_mut(id) {
            crew.engagement = Engagement::Idle;
        }
        self.clear_references_to(id);
    }

    /// Remove `id` from every task's repair and extinguisher slot.
    pub fn clear_references_to(&mut self, id: CrewId) {
        for task in &mut self.tasks {
            if task.assigned == Some(id) {
                task.assigned = None;
            }
            if task.extinguisher == Some(id) {
                task.extinguisher = None;
            }
        }
    }

    /// Apply damage to a crew member. On death, clear their engagement and
    /// every slot referring to them, and raise a crew-died notification.
    ///
    /// Returns true if the blow was fatal.
    pub fn damage_crew(&mut self, id: CrewId, amount: f64) -> bool {
        let Some(crew) = self.crew_mut(id) else {
            return false;
        };
        if !crew.take_damage(amount) {
            return false;
        }
        let name = crew.name.clone();
        self.clear_references_to(id);
        log::info!("{} died", name);
        self.notify(Notification::message(format!("{} has died.", name)));
        self.notify(Notification::CrewDied { id, name });
        true
    }

    pub fn grant_supplies(&mut self, amount: u32) {
        self.supplies = self.supplies.saturating_add(amount);
    }

    /// Mark a task complete, bank the reward and free its crew.
    ///
    /// Returns the reward, or `None` if the task was already complete.
    pub fn complete_task(&mut self, id: TaskId) -> Option<u32> {
        let required = {
            let task = self.task(id)?;
            if task.complete {
                return None;
            }
            self.required_time(task)
        };
        let reward = completion_reward(required);
        let (title, assigned) = {
            let task = self.task_mut(id)?;
            task.complete = true;
            task.progress = required;
            (task.title.clone(), task.assigned.take())
        };
        if let Some(crew) = assigned {
            self.release_engagement(crew);
        }
        self.grant_supplies(reward);
        log::info!("{} repaired, +{} supplies", title, reward);
        self.notify(Notification::message(format!("{} repaired!", title)));
        self.notify(Notification::TaskCompleted { id, title, reward });
        Some(reward)
    }

    pub fn all_tasks_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.complete)
    }

    pub fn all_crew_dead(&self) -> bool {
        self.crew.iter().all(|c| !c.is_alive())
    }

    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    /// Record a change and raise [`Notification::StateChanged`].
    pub fn mark_changed(&mut self) {
        self.revision += 1;
        let revision = self.revision;
        self.notify(Notification::StateChanged { revision });
    }

    pub fn notify(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    /// Describe every broken invariant; empty when the state is consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for task in &self.tasks {
            let required = self.required_time(task);
            if task.progress < 0.0 || task.progress > required {
                problems.push(format!(
                    "{}: progress {} outside [0, {}]",
                    task.id, task.progress, required
                ));
            }
            if task.complete && task.progress != required {
                problems.push(format!("{}: complete but progress {}", task.id, task.progress));
            }
            if !task.complete && task.progress >= required {
                problems.push(format!("{}: progress full but not complete", task.id));
            }
            if task.complete && task.assigned.is_some() {
                problems.push(format!("{}: complete but still assigned", task.id));
            }
            if let Some(crew) = task.assigned {
                let engaged = self
                    .crew(crew)
                    .map_or(false, |c| c.engagement == Engagement::Repairing(task.id));
                if !engaged {
                    problems.push(format!("{}: assigned to {} who is not repairing it", task.id, crew));
                }
            }
            if let Some(crew) = task.extinguisher {
                let engaged = self
                    .crew(crew)
                    .map_or(false, |c| c.engagement == Engagement::Extinguishing(task.id));
                if !engaged {
                    problems.push(format!("{}: extinguisher {} is not fighting it", task.id, crew));
                }
            }
            if task.event_damage_mult < 1.0 || task.event_speed_mult <= 0.0 || task.event_speed_mult > 1.0 {
                problems.push(format!("{}: event multipliers out of range", task.id));
            }
        }

        for crew in &self.crew {
            if crew.health < 0.0 || crew.health > crew.max_health {
                problems.push(format!("{}: health {} outside [0, {}]", crew.id, crew.health, crew.max_health));
            }
            if !crew.is_alive() && !crew.is_idle() {
                problems.push(format!("{}: dead but engaged", crew.id));
            }
            match crew.engagement {
                Engagement::Repairing(t) => {
                    if self.task(t).and_then(|task| task.assigned) != Some(crew.id) {
                        problems.push(format!("{}: repairing {} without holding the slot", crew.id, t));
                    }
                }
                Engagement::Extinguishing(t) => {
                    if self.task(t).and_then(|task| task.extinguisher) != Some(crew.id) {
                        problems.push(format!("{}: extinguishing {} without holding the slot", crew.id, t));
                    }
                }
                Engagement::Healing(_) if crew.role != Role::Medic => {
                    problems.push(format!("{}: healing without being a medic", crew.id));
                }
                _ => {}
            }
        }

        for (i, event) in self.events.iter().enumerate() {
            if self.events[..i].iter().any(|e| e.id == event.id) {
                problems.push(format!("duplicate event id {}", event.id));
            }
        }

        problems
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_normal_state() {
        let state = SimulationState::new(Difficulty::Normal);
        assert_eq!(state.supplies, 50);
        for task in &state.tasks {
            let expected = if task.id == TaskId::Hull { 20.0 } else { 0.0 };
            assert_eq!(task.progress, expected);
        }
        for crew in &state.crew {
            let expected = if crew.id == CrewId::Eo { 90.0 } else { crew.max_health };
            assert_eq!(crew.health, expected);
        }
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn test_damage_crew_death_clears_slots() {
        let mut state = SimulationState::default();
        state.crew_mut(CrewId::Capt).unwrap().engagement = Engagement::Repairing(TaskId::Sonar);
        state.task_mut(TaskId::Sonar).unwrap().assigned = Some(CrewId::Capt);

        assert!(!state.damage_crew(CrewId::Capt, 10.0));
        assert!(state.damage_crew(CrewId::Capt, 500.0));

        assert_eq!(state.task(TaskId::Sonar).unwrap().assigned, None);
        assert!(state.crew(CrewId::Capt).unwrap().is_idle());
        let notes = state.drain_notifications();
        assert!(notes
            .iter()
            .any(|n| matches!(n, Notification::CrewDied { id: CrewId::Capt, .. })));
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn test_complete_task_rewards_once() {
        let mut state = SimulationState::default();
        state.crew_mut(CrewId::Eo).unwrap().engagement = Engagement::Repairing(TaskId::Comms);
        state.task_mut(TaskId::Comms).unwrap().assigned = Some(CrewId::Eo);

        assert_eq!(state.complete_task(TaskId::Comms), Some(60));
        assert_eq!(state.complete_task(TaskId::Comms), None);
        assert_eq!(state.supplies, 110);

        let comms = state.task(TaskId::Comms).unwrap();
        assert!(comms.complete);
        assert_eq!(comms.progress, 10.0);
        assert_eq!(comms.assigned, None);
        assert!(state.crew(CrewId::Eo).unwrap().is_idle());
    }

    #[test]
    fn test_invariant_checker_flags_dangling_slot() {
        let mut state = SimulationState::default();
        state.task_mut(TaskId::Reactor).unwrap().assigned = Some(CrewId::Xo);
        assert!(!state.check_invariants().is_empty());
    }
}
