//! SubSim Headless Simulation Harness
//!
//! Plays full patrols on every difficulty with a simple autopilot, checking
//! state invariants after every tick, and exercises the command API and
//! save/load path. Runs entirely in-process: no rendering, no real clock.
//!
//! Usage:
//!   cargo run -p subsim-simtest
//!   cargo run -p subsim-simtest -- --verbose --seed 7 --minutes 20

use log::LevelFilter;
use subsim_core::commands::{parse_crew, parse_difficulty, parse_task, parse_upgrade};
use subsim_core::persistence::{SaveData, DEFAULT_SAVE_KEY};
use subsim_core::prelude::*;
use subsim_core::schedule::TICK_INTERVAL;
use subsim_logic::events::weighted_pool;
use subsim_logic::upgrades::{upgrade_cost, COST_CURVE_LEVELS};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

struct Options {
    verbose: bool,
    seed: u64,
    minutes: u64,
}

impl Options {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let value = |flag: &str| -> Option<u64> {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .and_then(|v| v.parse().ok())
        };
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
            seed: value("--seed").unwrap_or(42),
            minutes: value("--minutes").unwrap_or(10),
        }
    }
}

fn main() {
    let options = Options::from_args();
    if options.verbose {
        env_logger::Builder::new().filter_level(LevelFilter::Info).init();
    }
    println!("=== SubSim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Static tables
    results.extend(validate_tables());

    // 2. Reference scenarios
    results.extend(validate_scenarios());

    // 3. Command API with wire names
    results.extend(validate_commands());

    // 4. Autopilot patrols on every difficulty
    results.extend(validate_patrols(&options));

    // 5. Save / load
    results.extend(validate_persistence(options.seed));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || options.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn engine(difficulty: Difficulty, seed: u64) -> SimulationEngine {
    SimulationEngine::new(EngineConfig {
        difficulty,
        seed,
        ..EngineConfig::default()
    })
}

// ── 1. Static tables ────────────────────────────────────────────────────

fn validate_tables() -> Vec<TestResult> {
    println!("--- Static Tables ---");
    let mut results = Vec::new();

    for difficulty in Difficulty::ALL {
        let p = difficulty.preset();
        results.push(TestResult::check(
            &format!("preset_{}", difficulty.name().to_lowercase()),
            p.event_delay_min_ms < p.event_delay_max_ms && p.task_time_mult > 0.0,
            format!(
                "dmg x{}, {} supplies, events {}-{}ms",
                p.damage_multiplier, p.start_supplies, p.event_delay_min_ms, p.event_delay_max_ms
            ),
        ));
        let pool = weighted_pool(&p.event_weights);
        results.push(TestResult::check(
            &format!("event_pool_{}", difficulty.name().to_lowercase()),
            !pool.is_empty(),
            format!("{} entries", pool.len()),
        ));
    }

    let increasing = UpgradeKind::ALL
        .iter()
        .all(|&k| (0..COST_CURVE_LEVELS).all(|n| upgrade_cost(k, n + 1) > upgrade_cost(k, n)));
    results.push(TestResult::check(
        "upgrade_costs_increase",
        increasing,
        format!("cost(n+1) > cost(n) for n < {}", COST_CURVE_LEVELS),
    ));

    results
}

// ── 2. Reference scenarios ──────────────────────────────────────────────

fn validate_scenarios() -> Vec<TestResult> {
    println!("--- Scenarios ---");
    let mut results = Vec::new();

    let fresh = engine(Difficulty::Normal, 1);
    let tasks_ok = fresh.tasks().iter().all(|t| {
        t.progress == if t.id == TaskId::Hull { 20.0 } else { 0.0 }
    });
    let crew_ok = fresh.crew().iter().all(|c| {
        c.health == if c.id == CrewId::Eo { 90.0 } else { c.max_health }
    });
    results.push(TestResult::check(
        "fresh_normal",
        fresh.supplies() == 50 && tasks_ok && crew_ok,
        format!("supplies {}", fresh.supplies()),
    ));

    let mut reactor = engine(Difficulty::Normal, 1);
    let assigned = reactor
        .assign_crew_to_task(Some(CrewId::Eo), TaskId::Reactor)
        .is_ok();
    reactor.advance(1.0);
    let progress = reactor.state().task(TaskId::Reactor).map_or(0.0, |t| t.progress);
    let health = reactor.state().crew(CrewId::Eo).map_or(0.0, |c| c.health);
    results.push(TestResult::check(
        "reactor_one_second",
        assigned && (progress - 1.0).abs() < 1e-9 && (health - 83.5).abs() < 1e-9,
        format!("progress {:.3}, EO health {:.3}", progress, health),
    ));

    let mut shop = engine(Difficulty::Normal, 1);
    let cost = shop.purchase_upgrade(CrewId::Capt, UpgradeKind::Speed);
    let speed = shop.state().crew(CrewId::Capt).map_or(0.0, |c| c.repair_speed_mult);
    results.push(TestResult::check(
        "buy_tool_kit",
        cost == Ok(20) && (speed - 1.10).abs() < 1e-9,
        format!("cost {:?}, speed x{:.2}", cost, speed),
    ));

    let mut fire = engine(Difficulty::Normal, 1);
    let spawned = fire.spawn_event(EventKind::Fire, Some(TaskId::Reactor)).is_ok();
    let raised = fire
        .state()
        .task(TaskId::Reactor)
        .map_or(false, |t| t.event_damage_mult > 1.0 && t.event_speed_mult < 1.0);
    while !fire.active_events().is_empty() && fire.clock() < 60.0 {
        fire.advance(0.5);
    }
    let restored = fire
        .state()
        .task(TaskId::Reactor)
        .map_or(false, |t| t.event_damage_mult == 1.0 && t.event_speed_mult == 1.0);
    results.push(TestResult::check(
        "fire_expiry_restores",
        spawned && raised && restored,
        format!("expired at t={:.1}s", fire.clock()),
    ));

    let mut comms = engine(Difficulty::Normal, 1);
    let _ = comms.assign_crew_to_task(Some(CrewId::Xo), TaskId::Comms);
    for _ in 0..10 {
        comms.advance(1.0);
    }
    let done = comms
        .state()
        .task(TaskId::Comms)
        .map_or(false, |t| t.complete && t.assigned.is_none());
    results.push(TestResult::check(
        "comms_reward",
        done && comms.supplies() == 110,
        format!("supplies {}", comms.supplies()),
    ));

    let mut medic = engine(Difficulty::Normal, 1);
    let on = medic.request_heal(CrewId::Eo);
    let off = medic.request_heal(CrewId::Eo);
    results.push(TestResult::check(
        "heal_toggle",
        on == Ok(true) && off == Ok(false),
        format!("{:?} then {:?}", on, off),
    ));

    results
}

// ── 3. Command API ──────────────────────────────────────────────────────

fn validate_commands() -> Vec<TestResult> {
    println!("--- Commands ---");
    let mut results = Vec::new();
    let mut engine = engine(Difficulty::Normal, 1);

    // (crew, task) pairs as a front end would send them
    let script = [("eo", "reactor"), ("capt", "hull"), ("cook", "sonar"), ("xo", "galley")];
    let mut accepted = 0;
    let mut rejected = Vec::new();
    for (crew, task) in script {
        let outcome = parse_crew(crew)
            .and_then(|c| parse_task(task).map(|t| (c, t)))
            .and_then(|(c, t)| engine.assign_crew_to_task(Some(c), t));
        match outcome {
            Ok(()) => accepted += 1,
            Err(err) => rejected.push(err.to_string()),
        }
    }
    results.push(TestResult::check(
        "wire_assignments",
        accepted == 2 && rejected.len() == 2,
        format!("{} accepted, rejected: {:?}", accepted, rejected),
    ));

    let restricted = parse_upgrade("autoHeal").and_then(|u| engine.purchase_upgrade(CrewId::Capt, u));
    results.push(TestResult::check(
        "role_restriction",
        matches!(restricted, Err(CommandError::RoleRestricted { .. })),
        format!("{:?}", restricted),
    ));

    let broke = engine.purchase_upgrade(CrewId::Eo, UpgradeKind::Drills);
    results.push(TestResult::check(
        "insufficient_supplies",
        matches!(broke, Err(CommandError::InsufficientSupplies { needed: 60, .. })),
        format!("{:?}", broke),
    ));

    let difficulty = parse_difficulty("HARD");
    results.push(TestResult::check(
        "difficulty_names",
        difficulty == Ok(Difficulty::Hard) && parse_difficulty("insane").is_err(),
        format!("{:?}", difficulty),
    ));

    let notifications = serde_json::to_string(&Notification::TaskCompleted {
        id: TaskId::Comms,
        title: "Communications".into(),
        reward: 60,
    });
    results.push(TestResult::check(
        "notification_json",
        notifications
            .as_deref()
            .map_or(false, |j| j.contains("\"type\":\"taskCompleted\"")),
        notifications.unwrap_or_else(|e| e.to_string()),
    ));

    results
}

// ── 4. Autopilot patrols ────────────────────────────────────────────────

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
        if let Some(task) = burning {
            let _ = engine.extinguish(id, task);
            continue;
        }

        let open = engine
            .tasks()
            .iter()
            .find(|t| !t.complete && t.assigned.is_none() && !engine.state().is_on_fire(t.id))
            .map(|t| t.id);
        if let Some(task) = open {
            let _ = engine.assign_crew_to_task(Some(id), task);
        }
    }

    // Spend spare supplies on armor for whoever is worst off
    if let Some(target) = engine
        .crew()
        .iter()
        .filter(|c| c.is_alive())
        .min_by(|a, b| a.health.total_cmp(&b.health))
        .map(|c| c.id)
    {
        if engine
            .upgrade_cost(target, UpgradeKind::Armor)
            .map_or(false, |cost| engine.supplies() >= cost + 30)
        {
            let _ = engine.purchase_upgrade(target, UpgradeKind::Armor);
        }
    }
}

fn validate_patrols(options: &Options) -> Vec<TestResult> {
    println!("--- Patrols ---");
    let mut results = Vec::new();
    let ticks = (options.minutes as f64 * 60.0 / TICK_INTERVAL).ceil() as u64;

    for difficulty in Difficulty::ALL {
        let mut engine = engine(difficulty, options.seed);
        engine.start(0.0);
        let mut wall = 0.0;
        let mut violations = Vec::new();
        let mut peak_events = 0;

        for _ in 0..ticks {
            wall += TICK_INTERVAL + 0.001;
            autopilot(&mut engine);
            engine.pump(wall);
            peak_events = peak_events.max(engine.active_events().len());

            for problem in engine.state().check_invariants() {
                if violations.len() < 5 {
                    violations.push(format!("t={:.1}s {}", engine.clock(), problem));
                }
            }
            if engine.outcome() != Outcome::InProgress {
                break;
            }
        }

        let name = difficulty.name().to_lowercase();
        results.push(TestResult::check(
            &format!("invariants_{}", name),
            violations.is_empty(),
            if violations.is_empty() {
                format!("clean over {:.0}s", engine.clock())
            } else {
                violations.join("; ")
            },
        ));

        let finished = engine.outcome() == Outcome::InProgress || !engine.is_running();
        results.push(TestResult::check(
            &format!("outcome_{}", name),
            finished,
            format!(
                "{:?} at t={:.0}s, {} supplies, {} events spawned, peak {} active",
                engine.outcome(),
                engine.clock(),
                engine.supplies(),
                engine.state().next_event_id.saturating_sub(1),
                peak_events
            ),
        ));
    }

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(seed: u64) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let storage = MemoryStorage::new();

    let mut first = engine(Difficulty::Normal, seed).with_storage(storage.clone());
    let _ = first.purchase_upgrade(CrewId::Eo, UpgradeKind::Engineer);
    let _ = first.assign_crew_to_task(Some(CrewId::Eo), TaskId::Command);
    first.advance(3.0);
    let _ = first.spawn_event(EventKind::Fire, Some(TaskId::Sonar));
    let _ = first.extinguish(CrewId::Xo, TaskId::Sonar);
    let saved = first.save();
    results.push(TestResult::check(
        "save",
        saved.is_ok() && storage.get(DEFAULT_SAVE_KEY).is_some(),
        format!("{:?}", saved.map(|_| "ok")),
    ));

    let parsed = storage
        .get(DEFAULT_SAVE_KEY)
        .map(|raw| SaveData::from_json(&raw));
    results.push(TestResult::check(
        "save_parses",
        matches!(parsed, Some(Ok(_))),
        match &parsed {
            Some(Ok(data)) => format!("{} events, {} tasks", data.active_events.len(), data.tasks.len()),
            Some(Err(e)) => e.to_string(),
            None => "missing".into(),
        },
    ));

    let mut second = engine(Difficulty::Easy, seed + 1).with_storage(storage.clone());
    let loaded = second.load();
    let same_tasks = first.tasks().iter().zip(second.tasks()).all(|(a, b)| {
        a.progress == b.progress
            && a.complete == b.complete
            && a.event_damage_mult == b.event_damage_mult
            && a.event_speed_mult == b.event_speed_mult
    });
    let same_upgrades = first
        .crew()
        .iter()
        .zip(second.crew())
        .all(|(a, b)| a.upgrades == b.upgrades && a.repair_speed_mult == b.repair_speed_mult);
    results.push(TestResult::check(
        "load_round_trip",
        matches!(loaded, Ok(true))
            && second.difficulty() == Difficulty::Normal
            && second.supplies() == first.supplies()
            && same_tasks
            && same_upgrades,
        format!("supplies {} vs {}", first.supplies(), second.supplies()),
    ));

    let fighting = second.state().task(TaskId::Sonar).and_then(|t| t.extinguisher);
    results.push(TestResult::check(
        "extinguisher_restored",
        fighting == Some(CrewId::Xo),
        format!("sonar extinguisher {:?}", fighting),
    ));

    second.reset_progress();
    let mut third = engine(Difficulty::Normal, seed).with_storage(storage.clone());
    results.push(TestResult::check(
        "reset_clears_save",
        matches!(third.load(), Ok(false)) && third.supplies() == 50,
        format!("supplies {}", third.supplies()),
    ));

    results
}
