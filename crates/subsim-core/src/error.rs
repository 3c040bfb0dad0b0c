//! Error types for commands and event handlers.
//!
//! A [`CommandError`] is a validation rejection: the command was a no-op and
//! the message is meant for the player.

use subsim_logic::events::EventKind;
use subsim_logic::roles::Role;
use subsim_logic::upgrades::UpgradeKind;
use thiserror::Error;

use crate::components::{CrewId, EventId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown crew member `{0}`")]
    UnknownCrew(String),
    #[error("unknown task `{0}`")]
    UnknownTask(String),
    #[error("unknown upgrade `{0}`")]
    UnknownUpgrade(String),
    #[error("unknown difficulty `{0}`")]
    UnknownDifficulty(String),
    #[error("{0} is dead and cannot act")]
    CrewDead(String),
    #[error("{0} is busy with another activity")]
    CrewBusy(String),
    #[error("{0} is already repaired")]
    TaskComplete(TaskId),
    #[error("{0} is on fire; put the fire out first")]
    TaskOnFire(TaskId),
    #[error("there is no fire on {0}")]
    NoFire(TaskId),
    #[error("{crew} is already fighting the fire on {task}")]
    ExtinguisherAssigned { task: TaskId, crew: CrewId },
    #[error("no living medic aboard")]
    NoLivingMedic,
    #[error("{upgrade} is restricted to the {required}")]
    RoleRestricted { upgrade: UpgradeKind, required: Role },
    #[error("not enough supplies: need {needed}, have {available}")]
    InsufficientSupplies { needed: u32, available: u32 },
}

/// Failure while applying or reverting an event's effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("{0} needs a target system")]
    MissingTarget(EventKind),
    #[error("event {0} is not active")]
    NotActive(EventId),
    #[error("event {0} is already active")]
    DuplicateId(EventId),
}
