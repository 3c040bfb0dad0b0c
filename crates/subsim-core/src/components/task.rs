//! Repairable ship systems.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::crew::CrewId;
use super::event::EventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskId {
    Hull,
    Flood,
    Reactor,
    Command,
    Sonar,
    Comms,
}

impl TaskId {
    pub const ALL: [TaskId; 6] = [
        TaskId::Hull,
        TaskId::Flood,
        TaskId::Reactor,
        TaskId::Command,
        TaskId::Sonar,
        TaskId::Comms,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TaskId::Hull => "hull",
            TaskId::Flood => "flood",
            TaskId::Reactor => "reactor",
            TaskId::Command => "command",
            TaskId::Sonar => "sonar",
            TaskId::Comms => "comms",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.key() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A failing system and its repair state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Seconds of effective effort to finish, before the difficulty multiplier
    pub base_time: f64,
    /// Effective seconds banked so far
    pub progress: f64,
    pub assigned: Option<CrewId>,
    /// Health lost per second by whoever repairs it
    pub base_damage_per_sec: f64,
    pub complete: bool,
    /// Static repair slowdown (flooded or breached compartments)
    pub access_speed_mult: f64,
    /// Product of damage factors of events targeting this task
    pub event_damage_mult: f64,
    /// Product of speed factors of events targeting this task
    pub event_speed_mult: f64,
    /// Active events targeting this task, oldest first
    pub events: Vec<EventId>,
    /// Crew member fighting a fire here
    pub extinguisher: Option<CrewId>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, base_time: f64, base_damage_per_sec: f64) -> Self {
        Self {
            id,
            title: title.into(),
            base_time,
            progress: 0.0,
            assigned: None,
            base_damage_per_sec,
            complete: false,
            access_speed_mult: 1.0,
            event_damage_mult: 1.0,
            event_speed_mult: 1.0,
            events: Vec::new(),
            extinguisher: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_access_speed(mut self, mult: f64) -> Self {
        self.access_speed_mult = mult;
        self
    }

    /// Effort required at the given difficulty time multiplier.
    pub fn required_time(&self, task_time_mult: f64) -> f64 {
        self.base_time * task_time_mult
    }

    /// Completion fraction in `[0, 1]`.
    pub fn fraction(&self, task_time_mult: f64) -> f64 {
        let required = self.required_time(task_time_mult);
        if required > 0.0 {
            (self.progress / required).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// The systems that need repair at the start of a patrol.
pub fn default_tasks() -> Vec<Task> {
    vec![
        Task::new(TaskId::Hull, "Hull Breach", 57.0, 1.5)
            .with_progress(20.0)
            .with_access_speed(0.3),
        Task::new(TaskId::Flood, "Flooding", 24.0, 1.0).with_access_speed(0.6),
        Task::new(TaskId::Reactor, "Reactor Room", 16.0, 6.5),
        Task::new(TaskId::Command, "Command Systems", 14.0, 5.0),
        Task::new(TaskId::Sonar, "Sonar Array", 12.0, 3.5),
        Task::new(TaskId::Comms, "Communications", 10.0, 2.5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tasks() {
        let tasks = default_tasks();
        assert_eq!(tasks.len(), TaskId::ALL.len());
        assert_eq!(tasks[0].progress, 20.0);
        assert!(tasks[1..].iter().all(|t| t.progress == 0.0));
        assert!(tasks
            .iter()
            .all(|t| t.event_damage_mult == 1.0 && t.event_speed_mult == 1.0));
        let reactor = tasks.iter().find(|t| t.id == TaskId::Reactor).unwrap();
        assert_eq!(reactor.base_time, 16.0);
        assert_eq!(reactor.base_damage_per_sec, 6.5);
    }

    #[test]
    fn test_required_time_and_fraction() {
        let task = Task::new(TaskId::Comms, "Communications", 10.0, 2.5).with_progress(7.5);
        assert_eq!(task.required_time(1.5), 15.0);
        assert!((task.fraction(1.5) - 0.5).abs() < 1e-9);
        assert!((task.fraction(1.1) - 7.5 / 11.0).abs() < 1e-9);
    }
}
