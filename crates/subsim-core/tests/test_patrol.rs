//! Integration tests for a full patrol driven through the engine.
//!
//! Exercises: commands → tick → events → economy → save/load
//!
//! No rendering, no wall clock: time is fed in explicitly.

use std::cell::RefCell;
use std::rc::Rc;

use subsim_core::persistence::DEFAULT_SAVE_KEY;
use subsim_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn engine(difficulty: Difficulty, seed: u64) -> SimulationEngine {
    SimulationEngine::new(EngineConfig {
        difficulty,
        seed,
        ..EngineConfig::default()
    })
}

fn crew<'a>(engine: &'a SimulationEngine, id: CrewId) -> &'a Crew {
    engine.state().crew(id).expect("roster member")
}

fn task<'a>(engine: &'a SimulationEngine, id: TaskId) -> &'a Task {
    engine.state().task(id).expect("known task")
}

fn record(engine: &mut SimulationEngine) -> Rc<RefCell<Vec<Notification>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    engine.subscribe(move |n: &Notification| sink.borrow_mut().push(n.clone()));
    seen
}

/// Give every idle crew member something useful to do.
fn autopilot(engine: &mut SimulationEngine) {
    let idle: Vec<(CrewId, Role)> = engine
        .crew()
        .iter()
        .filter(|c| c.is_alive() && c.is_idle())
        .map(|c| (c.id, c.role))
        .collect();

    for (id, role) in idle {
        if role == Role::Medic {
            let wounded = engine
                .crew()
                .iter()
                .filter(|c| c.is_alive() && c.health < 60.0)
                .min_by(|a, b| a.health.total_cmp(&b.health))
                .map(|c| c.id);
            if let Some(target) = wounded {
                let _ = engine.request_heal(target);
                continue;
            }
        }

        let burning = engine
            .tasks()
            .iter()
            .find(|t| t.extinguisher.is_none() && engine.state().is_on_fire(t.id))
            .map(|t| t.id);
        if let Some(t) = burning {
            let _ = engine.extinguish(id, t);
            continue;
        }

        let open = engine
            .tasks()
            .iter()
            .find(|t| !t.complete && t.assigned.is_none() && !engine.state().is_on_fire(t.id))
            .map(|t| t.id);
        if let Some(t) = open {
            let _ = engine.assign_crew_to_task(Some(id), t);
        }
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn fresh_normal_session() {
    let engine = engine(Difficulty::Normal, 1);

    assert_eq!(engine.supplies(), 50);
    for t in engine.tasks() {
        let expected = if t.id == TaskId::Hull { 20.0 } else { 0.0 };
        assert_eq!(t.progress, expected, "{}", t.id);
    }
    for c in engine.crew() {
        let expected = if c.id == CrewId::Eo { 90.0 } else { c.max_health };
        assert_eq!(c.health, expected, "{}", c.id);
    }
    assert_eq!(engine.outcome(), Outcome::InProgress);
    assert!(engine.active_events().is_empty());
}

#[test]
fn one_second_of_reactor_repair() {
    let mut engine = engine(Difficulty::Normal, 1);
    engine
        .assign_crew_to_task(Some(CrewId::Eo), TaskId::Reactor)
        .unwrap();

    assert!(engine.advance(1.0));

    assert!((task(&engine, TaskId::Reactor).progress - 1.0).abs() < 1e-9);
    assert!((crew(&engine, CrewId::Eo).health - (90.0 - 6.5)).abs() < 1e-9);
}

#[test]
fn buying_a_tool_kit() {
    let mut engine = engine(Difficulty::Normal, 1);
    assert_eq!(engine.upgrade_cost(CrewId::Capt, UpgradeKind::Speed), Some(20));

    assert_eq!(engine.purchase_upgrade(CrewId::Capt, UpgradeKind::Speed), Ok(20));

    let capt = crew(&engine, CrewId::Capt);
    assert_eq!(capt.upgrades.level(UpgradeKind::Speed), 1);
    assert!((capt.repair_speed_mult - 1.10).abs() < 1e-9);
    assert_eq!(engine.upgrade_cost(CrewId::Capt, UpgradeKind::Speed), Some(30));
}

#[test]
fn fire_expiry_restores_multipliers() {
    let mut engine = engine(Difficulty::Normal, 1);
    engine.spawn_event(EventKind::Fire, Some(TaskId::Reactor)).unwrap();

    let reactor = task(&engine, TaskId::Reactor);
    assert!(reactor.event_damage_mult > 1.0);
    assert!(reactor.event_speed_mult < 1.0);

    for _ in 0..100 {
        if engine.active_events().is_empty() {
            break;
        }
        engine.advance(0.5);
    }

    let reactor = task(&engine, TaskId::Reactor);
    assert!(engine.active_events().is_empty());
    assert_eq!(reactor.event_damage_mult, 1.0);
    assert_eq!(reactor.event_speed_mult, 1.0);
    assert!(reactor.events.is_empty());
}

#[test]
fn finishing_comms_pays_sixty() {
    let mut engine = engine(Difficulty::Normal, 1);
    let seen = record(&mut engine);
    engine
        .assign_crew_to_task(Some(CrewId::Xo), TaskId::Comms)
        .unwrap();

    for _ in 0..10 {
        engine.advance(1.0);
    }

    let comms = task(&engine, TaskId::Comms);
    assert!(comms.complete);
    assert_eq!(comms.assigned, None);
    assert_eq!(engine.supplies(), 110);
    assert!(seen.borrow().iter().any(|n| matches!(
        n,
        Notification::TaskCompleted { id: TaskId::Comms, reward: 60, .. }
    )));
}

#[test]
fn heal_request_toggles_off() {
    let mut engine = engine(Difficulty::Normal, 1);
    assert_eq!(engine.request_heal(CrewId::Eo), Ok(true));
    assert_eq!(crew(&engine, CrewId::Med).heal_target(), Some(CrewId::Eo));

    assert_eq!(engine.request_heal(CrewId::Eo), Ok(false));
    assert!(crew(&engine, CrewId::Med).is_idle());
}

// ── Fires ──────────────────────────────────────────────────────────────

#[test]
fn burning_task_pauses_repair_until_put_out() {
    let mut engine = engine(Difficulty::Normal, 1);
    engine
        .assign_crew_to_task(Some(CrewId::Eo), TaskId::Sonar)
        .unwrap();
    engine.advance(1.0);
    engine.spawn_event(EventKind::Fire, Some(TaskId::Sonar)).unwrap();

    let before = task(&engine, TaskId::Sonar).progress;
    let health = crew(&engine, CrewId::Eo).health;
    engine.advance(1.0);
    assert_eq!(task(&engine, TaskId::Sonar).progress, before);
    assert_eq!(crew(&engine, CrewId::Eo).health, health);
    assert_eq!(task(&engine, TaskId::Sonar).assigned, Some(CrewId::Eo));

    engine.extinguish(CrewId::Capt, TaskId::Sonar).unwrap();
    for _ in 0..20 {
        engine.advance(0.5);
    }
    assert!(!engine.state().is_on_fire(TaskId::Sonar));
    assert!(crew(&engine, CrewId::Capt).is_idle());
    assert!(task(&engine, TaskId::Sonar).progress > before);
}

// ── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn restart_does_not_duplicate_timers() {
    let mut engine = engine(Difficulty::Normal, 9);
    engine.start(0.0);
    engine.start(0.0);
    assert!(engine.is_running());

    engine.stop();
    assert!(!engine.is_running());
    assert_eq!(engine.next_event_at(), None);
    assert!(!engine.pump(10.0));

    engine.start(10.0);
    assert!(engine.is_running());
    let next = engine.next_event_at().unwrap();
    assert!((15.0..35.0).contains(&next));
}

#[test]
fn long_runs_keep_invariants() {
    for difficulty in Difficulty::ALL {
        let mut engine = engine(difficulty, 42);
        engine.start(0.0);
        let mut wall = 0.0;

        // Ten simulated minutes at the real tick cadence
        for _ in 0..5_000 {
            wall += 0.125;
            autopilot(&mut engine);
            engine.pump(wall);

            let problems = engine.state().check_invariants();
            assert!(problems.is_empty(), "{}: {:?}", difficulty, problems);
            if engine.outcome() != Outcome::InProgress {
                assert!(!engine.is_running());
                break;
            }
        }
    }
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn save_and_load_round_trip() {
    let storage = MemoryStorage::new();
    let mut first = engine(Difficulty::Hard, 3).with_storage(storage.clone());
    first.apply_difficulty(Difficulty::Easy);
    first
        .purchase_upgrade(CrewId::Med, UpgradeKind::AutoHeal)
        .unwrap();
    first
        .assign_crew_to_task(Some(CrewId::Eo), TaskId::Command)
        .unwrap();
    first.advance(2.0);
    first.spawn_event(EventKind::Electrical, Some(TaskId::Sonar)).unwrap();
    first.save().unwrap();

    let mut second = engine(Difficulty::Normal, 4).with_storage(storage.clone());
    assert!(second.load().unwrap());

    assert_eq!(second.difficulty(), Difficulty::Easy);
    assert_eq!(second.supplies(), first.supplies());
    assert_eq!(
        crew(&second, CrewId::Med).upgrades.level(UpgradeKind::AutoHeal),
        1
    );
    assert_eq!(crew(&second, CrewId::Med).auto_heal_level, 1);
    for (a, b) in first.tasks().iter().zip(second.tasks()) {
        assert_eq!(a.progress, b.progress, "{}", a.id);
        assert_eq!(a.complete, b.complete, "{}", a.id);
        assert_eq!(a.event_damage_mult, b.event_damage_mult, "{}", a.id);
        assert_eq!(a.event_speed_mult, b.event_speed_mult, "{}", a.id);
    }
    assert!(second.state().check_invariants().is_empty());
}

#[test]
fn loading_mid_patrol_rearms_event_timer() {
    let mut storage = MemoryStorage::new();
    let mut engine = engine(Difficulty::Normal, 11).with_storage(storage.clone());
    engine.save().unwrap();
    let early = storage.get(DEFAULT_SAVE_KEY).unwrap();

    engine.start(0.0);
    for _ in 0..600 {
        engine.advance(0.5);
    }
    assert!(engine.is_running());

    storage.write(DEFAULT_SAVE_KEY, &early).unwrap();
    assert!(engine.load().unwrap());

    let max_delay = Difficulty::Normal.preset().event_delay_max_ms as f64 / 1000.0;
    let delay = engine.next_event_at().unwrap() - engine.clock();
    assert_eq!(engine.clock(), 0.0);
    assert!((0.0..=max_delay).contains(&delay), "next spawn {:.2}s away", delay);
}

#[test]
fn corrupt_save_leaves_defaults() {
    let mut storage = MemoryStorage::new();
    storage.write(DEFAULT_SAVE_KEY, "{\"version\": 1, \"supplies\": ").unwrap();
    let mut engine = engine(Difficulty::Normal, 1).with_storage(storage);

    assert!(engine.load().is_err());
    assert_eq!(engine.supplies(), 50);
    assert_eq!(task(&engine, TaskId::Hull).progress, 20.0);
}

#[test]
fn file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut first =
        engine(Difficulty::Normal, 1).with_storage(FileStorage::new(dir.path()));
    first
        .purchase_upgrade(CrewId::Xo, UpgradeKind::FireSuppression)
        .unwrap();

    let mut second =
        engine(Difficulty::Normal, 1).with_storage(FileStorage::new(dir.path()));
    assert!(second.load().unwrap());
    assert!((crew(&second, CrewId::Xo).fire_suppression - 0.15).abs() < 1e-9);
    assert_eq!(second.supplies(), 20);

    second.reset_progress();
    let mut third =
        engine(Difficulty::Normal, 1).with_storage(FileStorage::new(dir.path()));
    assert!(!third.load().unwrap());
}
