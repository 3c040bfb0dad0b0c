//! Simulation engine - main entry point for running a patrol

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use subsim_logic::difficulty::Difficulty;
use subsim_logic::events::EventKind;
use subsim_logic::upgrades::{upgrade_cost, UpgradeKind};

use crate::commands;
use crate::components::*;
use crate::error::{CommandError, EventError};
use crate::notify::{Listener, Notification};
use crate::persistence::{read_save, restore, save_state, SaveError, Storage, DEFAULT_SAVE_KEY};
use crate::schedule::Schedule;
use crate::state::{Outcome, SimulationState};
use crate::systems::{spawn_event, spawn_random_event, step_simulation};

/// Construction options
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub difficulty: Difficulty,
    /// Seed for the engine's random stream
    pub seed: u64,
    /// Storage key the session is saved under
    pub save_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            seed: 0,
            save_key: DEFAULT_SAVE_KEY.to_string(),
        }
    }
}

/// Main simulation engine
pub struct SimulationEngine {
    state: SimulationState,
    config: EngineConfig,
    rng: StdRng,
    schedule: Schedule,
    storage: Option<Box<dyn Storage>>,
    listeners: Vec<Box<dyn Listener>>,
    /// Set once the patrol has been started
    started: bool,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: SimulationState::new(config.difficulty),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            schedule: Schedule::new(),
            storage: None,
            listeners: Vec::new(),
            started: false,
        }
    }

    /// Persist to `storage` on autosave, difficulty change and game end.
    pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Register a notification listener.
    pub fn subscribe(&mut self, listener: impl Listener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // --- Lifecycle ---

    /// Arm the tick and event timers at wall-clock `wall_now` (seconds).
    ///
    /// Starting an engine that is already running replaces its timers.
    pub fn start(&mut self, wall_now: f64) {
        if self.state.is_over() {
            return;
        }
        let next = self.next_event_time();
        self.schedule.arm(wall_now, next);
        self.started = true;
        log::info!(
            "patrol started on {}; first event at t={:.1}s",
            self.state.difficulty,
            next
        );
    }

    /// Cancel every timer.
    pub fn stop(&mut self) {
        if self.schedule.is_armed() {
            log::info!("simulation stopped at t={:.1}s", self.state.clock);
        }
        self.schedule.cancel_all();
    }

    pub fn is_running(&self) -> bool {
        self.schedule.is_armed()
    }

    /// Drive the engine from a wall clock. Runs at most one tick.
    ///
    /// Returns true if a tick ran and changed anything.
    pub fn pump(&mut self, wall_now: f64) -> bool {
        match self.schedule.take_tick(wall_now) {
            Some(dt) => self.advance(dt),
            None => false,
        }
    }

    /// Run one step of `dt` seconds, then spawn a due event and autosave.
    pub fn advance(&mut self, dt: f64) -> bool {
        let mut changed = step_simulation(&mut self.state, dt, &mut self.rng);

        if !self.state.is_over() && self.schedule.event_due(self.state.clock) {
            if let Err(err) = spawn_random_event(&mut self.state, &mut self.rng) {
                log::warn!("event spawn failed: {}", err);
            }
            let next = self.next_event_time();
            self.schedule.reschedule_event(next);
            self.state.mark_changed();
            changed = true;
        }

        if self.state.is_over() {
            self.stop();
            self.save_logged();
        } else if changed && self.schedule.autosave_due(self.state.clock) {
            self.save_logged();
        }

        self.flush();
        changed
    }

    fn next_event_time(&mut self) -> f64 {
        let unit: f64 = self.rng.gen();
        self.state.clock + self.state.preset().event_delay_ms(unit) as f64 / 1000.0
    }

    /// Deliver pending notifications to listeners.
    fn flush(&mut self) {
        for notification in self.state.drain_notifications() {
            for listener in &mut self.listeners {
                listener.notify(&notification);
            }
        }
    }

    /// Run a command; a rejection becomes a player-facing notice.
    fn command<T>(
        &mut self,
        f: impl FnOnce(&mut SimulationState) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let result = f(&mut self.state);
        if let Err(err) = &result {
            log::debug!("command rejected: {}", err);
            self.state.notify(Notification::notice(err.to_string()));
        }
        self.flush();
        result
    }

    // --- Commands ---

    pub fn assign_crew_to_task(&mut self, crew: Option<CrewId>, task: TaskId) -> Result<(), CommandError> {
        self.command(|s| commands::assign_crew_to_task(s, crew, task))
    }

    pub fn unassign_task(&mut self, task: TaskId) -> Result<(), CommandError> {
        self.command(|s| commands::unassign_task(s, task))
    }

    /// Toggle healing; returns true when the medic is now healing `target`.
    pub fn request_heal(&mut self, target: CrewId) -> Result<bool, CommandError> {
        self.command(|s| commands::request_heal(s, target))
    }

    /// Returns the supplies spent.
    pub fn purchase_upgrade(&mut self, crew: CrewId, upgrade: UpgradeKind) -> Result<u32, CommandError> {
        let cost = self.command(|s| commands::purchase_upgrade(s, crew, upgrade))?;
        self.save_logged();
        Ok(cost)
    }

    pub fn extinguish(&mut self, crew: CrewId, task: TaskId) -> Result<(), CommandError> {
        self.command(|s| commands::extinguish(s, crew, task))
    }

    pub fn recall_extinguisher(&mut self, task: TaskId) -> Result<(), CommandError> {
        self.command(|s| commands::recall_extinguisher(s, task))
    }

    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        commands::apply_difficulty(&mut self.state, difficulty, self.started);
        self.config.difficulty = difficulty;
        let next = self.next_event_time();
        self.schedule.reschedule_event(next);
        self.save_logged();
        self.flush();
    }

    /// Unknown names fall back to Normal.
    pub fn apply_difficulty_named(&mut self, name: &str) -> Difficulty {
        let difficulty = name.parse().unwrap_or_else(|_| {
            log::warn!("unknown difficulty `{}`, using Normal", name);
            Difficulty::Normal
        });
        self.apply_difficulty(difficulty);
        difficulty
    }

    /// Clear the save and start over at the current difficulty.
    pub fn reset_progress(&mut self) {
        if let Some(storage) = self.storage.as_mut() {
            if let Err(err) = storage.remove(&self.config.save_key) {
                log::warn!("clearing save failed: {}", err);
            }
        }
        let revision = self.state.revision;
        self.state = SimulationState::new(self.state.difficulty);
        self.state.revision = revision;
        self.started = self.schedule.is_armed();
        let next = self.next_event_time();
        self.schedule.reschedule_event(next);
        log::info!("progress reset");
        self.state
            .notify(Notification::message("Progress reset. Upgrades and supplies cleared."));
        self.state.mark_changed();
        self.flush();
    }

    // --- Debug hooks ---

    /// Spawn from the weighted pool now and restart the event timer.
    pub fn spawn_random_event(&mut self) -> Result<EventId, EventError> {
        let id = spawn_random_event(&mut self.state, &mut self.rng)?;
        let next = self.next_event_time();
        self.schedule.reschedule_event(next);
        self.state.mark_changed();
        self.flush();
        Ok(id)
    }

    pub fn spawn_event(&mut self, kind: EventKind, target: Option<TaskId>) -> Result<EventId, EventError> {
        let id = spawn_event(&mut self.state, kind, target, &mut self.rng)?;
        self.state.mark_changed();
        self.flush();
        Ok(id)
    }

    // --- Persistence ---

    pub fn save(&mut self) -> Result<(), SaveError> {
        let Some(storage) = self.storage.as_mut() else {
            return Ok(());
        };
        save_state(storage.as_mut(), &self.config.save_key, &self.state)?;
        self.schedule.mark_saved(self.state.clock);
        Ok(())
    }

    fn save_logged(&mut self) {
        if let Err(err) = self.save() {
            log::warn!("save failed: {}", err);
        }
    }

    /// Restore the saved session onto a fresh state.
    ///
    /// Returns `Ok(false)` when nothing was saved. On error the current state
    /// is left untouched.
    pub fn load(&mut self) -> Result<bool, SaveError> {
        let Some(storage) = self.storage.as_ref() else {
            return Ok(false);
        };
        let data = match read_save(storage.as_ref(), &self.config.save_key) {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(false),
            Err(err) => {
                log::warn!("ignoring unreadable save: {}", err);
                return Err(err);
            }
        };
        let mut state = SimulationState::new(self.config.difficulty);
        restore(&mut state, &data);
        state.revision = self.state.revision;
        self.state = state;
        self.config.difficulty = self.state.difficulty;
        // The restored clock invalidates the pending spawn time
        let next = self.next_event_time();
        self.schedule.reschedule_event(next);
        log::info!(
            "loaded save: {} with {} supplies",
            self.state.difficulty,
            self.state.supplies
        );
        self.state.mark_changed();
        self.flush();
        Ok(true)
    }

    // --- Snapshots ---

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn crew(&self) -> &[Crew] {
        &self.state.crew
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn active_events(&self) -> &[ActiveEvent] {
        &self.state.events
    }

    pub fn supplies(&self) -> u32 {
        self.state.supplies
    }

    pub fn difficulty(&self) -> Difficulty {
        self.state.difficulty
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome
    }

    pub fn revision(&self) -> u64 {
        self.state.revision
    }

    pub fn clock(&self) -> f64 {
        self.state.clock
    }

    pub fn next_event_at(&self) -> Option<f64> {
        self.schedule.next_event_at()
    }

    /// Price of the next level of `upgrade` for `crew`.
    pub fn upgrade_cost(&self, crew: CrewId, upgrade: UpgradeKind) -> Option<u32> {
        self.state
            .crew(crew)
            .map(|c| upgrade_cost(upgrade, c.upgrades.level(upgrade)))
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
