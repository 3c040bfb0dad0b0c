//! Pure repair logic: progress rate, repair damage and completion rewards.

/// Smallest reward for finishing any task.
pub const MIN_COMPLETION_REWARD: u32 = 12;

/// Supplies granted per second of required effort.
pub const REWARD_PER_SECOND: f64 = 6.0;

/// Inputs to one repair step for a single task/crew pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairInput {
    pub dt: f64,
    pub crew_speed_mult: f64,
    pub crew_damage_reduction: f64,
    pub task_access_speed_mult: f64,
    pub task_event_speed_mult: f64,
    pub task_base_damage: f64,
    pub task_event_damage_mult: f64,
    pub difficulty_damage_mult: f64,
    /// `max(0, 1 + sum of global modifiers)`
    pub global_damage_factor: f64,
}

/// Effective seconds of repair banked this step.
pub fn progress_delta(input: &RepairInput) -> f64 {
    input.dt * input.crew_speed_mult * input.task_access_speed_mult * input.task_event_speed_mult
}

/// Health lost by the repairing crew member this step.
pub fn repair_damage(input: &RepairInput) -> f64 {
    let raw = input.task_base_damage
        * input.task_event_damage_mult
        * input.difficulty_damage_mult
        * input.dt;
    raw * input.global_damage_factor * (1.0 - input.crew_damage_reduction)
}

/// Supplies granted for finishing a task that needed `required_time` seconds.
pub fn completion_reward(required_time: f64) -> u32 {
    let scaled = (required_time * REWARD_PER_SECOND).round();
    (scaled.max(0.0) as u32).max(MIN_COMPLETION_REWARD)
}
