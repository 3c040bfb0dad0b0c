//! Save/Load functionality for persisting simulation state
//!
//! The mutable parts of the session (difficulty, supplies, upgrade levels,
//! task progress, active events) are written as one JSON document under a
//! single key of a [`Storage`]. Loading parses the whole document before
//! touching the state, and event effects are rebuilt through the event
//! strategies rather than trusted from the save.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use subsim_logic::difficulty::Difficulty;
use subsim_logic::events::EventKind;
use subsim_logic::upgrades::UpgradeKind;
use thiserror::Error;

use crate::components::*;
use crate::state::SimulationState;
use crate::systems::restore_event;

/// Version number for the save format (increment when the format changes)
pub const SAVE_VERSION: u32 = 1;

/// Storage key used unless the engine is configured otherwise
pub const DEFAULT_SAVE_KEY: &str = "subsim_state_v1";

/// Durable local key-value storage.
pub trait Storage {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// In-memory storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serializable snapshot of the session.
///
/// Ids and names are kept as plain strings so a save with unknown entries
/// still parses; unknown entries are skipped on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    pub version: u32,
    pub difficulty: String,
    pub supplies: u32,
    #[serde(default)]
    pub clock: f64,
    #[serde(default)]
    pub next_event_id: u64,
    #[serde(default)]
    pub crew: Vec<SavedCrew>,
    #[serde(default)]
    pub tasks: Vec<SavedTask>,
    #[serde(default)]
    pub active_events: Vec<SavedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCrew {
    pub id: String,
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTask {
    pub id: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extinguisher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEvent {
    pub id: u64,
    pub kind: String,
    #[serde(default)]
    pub target: Option<String>,
    pub started_at: f64,
    pub duration: f64,
    #[serde(default)]
    pub meta: EventMeta,
}

impl SaveData {
    /// Capture the persisted parts of `state`.
    pub fn capture(state: &SimulationState) -> Self {
        Self {
            version: SAVE_VERSION,
            difficulty: state.difficulty.name().to_string(),
            supplies: state.supplies,
            clock: state.clock,
            next_event_id: state.next_event_id,
            crew: state
                .crew
                .iter()
                .map(|c| SavedCrew {
                    id: c.id.key().to_string(),
                    upgrades: c.upgrades.to_keyed(),
                })
                .collect(),
            tasks: state
                .tasks
                .iter()
                .map(|t| SavedTask {
                    id: t.id.key().to_string(),
                    progress: t.progress,
                    complete: t.complete,
                    extinguisher: t.extinguisher.map(|c| c.key().to_string()),
                })
                .collect(),
            active_events: state
                .events
                .iter()
                .map(|e| SavedEvent {
                    id: e.id.0,
                    kind: e.kind.key().to_string(),
                    target: e.target.map(|t| t.key().to_string()),
                    started_at: e.started_at,
                    duration: e.duration,
                    meta: e.meta,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and version-check a stored document.
    pub fn from_json(raw: &str) -> Result<Self, SaveError> {
        let data: SaveData = serde_json::from_str(raw)?;
        if data.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: data.version,
            });
        }
        Ok(data)
    }
}

/// Write `state` under `key`.
pub fn save_state(
    storage: &mut dyn Storage,
    key: &str,
    state: &SimulationState,
) -> Result<(), SaveError> {
    let raw = SaveData::capture(state).to_json()?;
    storage.write(key, &raw)?;
    Ok(())
}

/// Read the document under `key`. `Ok(None)` when nothing was saved.
pub fn read_save(storage: &dyn Storage, key: &str) -> Result<Option<SaveData>, SaveError> {
    match storage.read(key)? {
        Some(raw) => SaveData::from_json(&raw).map(Some),
        None => Ok(None),
    }
}

/// Apply a parsed save onto a fresh state.
pub fn restore(state: &mut SimulationState, data: &SaveData) {
    state.difficulty = Difficulty::from_name_or_default(&data.difficulty);
    state.supplies = data.supplies;

    for saved in &data.crew {
        let Some(crew) = saved.id.parse().ok().and_then(|id| state.crew_mut(id)) else {
            log::debug!("skipping unknown crew `{}` in save", saved.id);
            continue;
        };
        for (key, level) in &saved.upgrades {
            match key.parse::<UpgradeKind>() {
                Ok(kind) if kind.allowed_for(crew.role) => crew.upgrades.set(kind, *level),
                Ok(kind) => log::debug!("{}: {} not allowed, skipped", crew.id, kind),
                Err(_) => log::debug!("skipping unknown upgrade `{}` in save", key),
            }
        }
        crew.recompute_stats();
    }

    let mult = state.preset().task_time_mult;
    for saved in &data.tasks {
        let Some(task) = saved.id.parse().ok().and_then(|id| state.task_mut(id)) else {
            log::debug!("skipping unknown task `{}` in save", saved.id);
            continue;
        };
        let required = task.required_time(mult);
        let progress = if saved.progress.is_finite() {
            saved.progress.clamp(0.0, required)
        } else {
            task.progress
        };
        task.complete = saved.complete || progress >= required;
        task.progress = if task.complete { required } else { progress };
    }

    state.clock = if data.clock.is_finite() {
        data.clock.max(0.0)
    } else {
        0.0
    };

    for saved in &data.active_events {
        let Ok(kind) = saved.kind.parse::<EventKind>() else {
            log::debug!("skipping unknown event kind `{}` in save", saved.kind);
            continue;
        };
        let target = match saved.target.as_deref().map(str::parse::<TaskId>) {
            Some(Ok(task)) => Some(task),
            Some(Err(_)) => {
                log::debug!("skipping event {} with unknown target", saved.id);
                continue;
            }
            None => None,
        };
        let event = ActiveEvent {
            id: EventId(saved.id),
            kind,
            target,
            started_at: saved.started_at,
            duration: saved.duration.max(0.0),
            meta: saved.meta,
        };
        if let Err(err) = restore_event(state, event) {
            log::warn!("dropping saved event {}: {}", saved.id, err);
        }
    }

    let highest = state.events.iter().map(|e| e.id.0).max().unwrap_or(0);
    state.next_event_id = data.next_event_id.max(highest + 1).max(1);

    for saved in &data.tasks {
        let (Ok(task), Some(Ok(crew))) = (
            saved.id.parse::<TaskId>(),
            saved.extinguisher.as_deref().map(str::parse::<CrewId>),
        ) else {
            continue;
        };
        let available = state.crew(crew).map_or(false, |c| c.is_alive() && c.is_idle());
        if available && state.is_on_fire(task) {
            if let Some(member) = state.crew_mut(crew) {
                member.engagement = Engagement::Extinguishing(task);
            }
            if let Some(t) = state.task_mut(task) {
                t.extinguisher = Some(crew);
            }
        }
    }
}
