//! SubSim Core - submarine incident simulation engine
//!
//! A crew of four must repair six failing systems aboard a damaged
//! submarine while random events make the work slower and more dangerous.
//! This crate owns the whole simulation; rendering, audio and input live in
//! whatever front end subscribes to it.
//!
//! # Architecture
//!
//! - **Components**: plain data records (crew, tasks, active events)
//! - **State**: one [`SimulationState`](state::SimulationState) owning every component
//! - **Systems**: per-tick logic run by [`step_simulation`](systems::step_simulation)
//! - **Commands**: validated player intents
//! - **Engine**: timers, random stream, notifications and persistence
//!
//! # Example
//!
//! ```rust,no_run
//! use subsim_core::prelude::*;
//!
//! let mut engine = SimulationEngine::new(EngineConfig::default())
//!     .with_storage(MemoryStorage::new());
//! engine.load().ok();
//! engine.assign_crew_to_task(Some(CrewId::Eo), TaskId::Reactor).ok();
//!
//! // Drive from a wall clock in seconds
//! engine.start(0.0);
//! let mut now = 0.0;
//! while engine.is_running() {
//!     now += 0.12;
//!     engine.pump(now);
//! }
//! ```

pub mod commands;
pub mod components;
pub mod engine;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod schedule;
pub mod state;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{EngineConfig, SimulationEngine};
    pub use crate::error::{CommandError, EventError};
    pub use crate::notify::Notification;
    pub use crate::persistence::{FileStorage, MemoryStorage, Storage};
    pub use crate::state::{Outcome, SimulationState};
    pub use subsim_logic::difficulty::Difficulty;
    pub use subsim_logic::events::EventKind;
    pub use subsim_logic::roles::Role;
    pub use subsim_logic::upgrades::UpgradeKind;
}
