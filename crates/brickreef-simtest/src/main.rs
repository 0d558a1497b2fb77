//! Brick Reef Headless Simulation Harness
//!
//! Validates behavior policy, consumption invariants, and population control
//! without a renderer. Runs entirely in-process - no graphics, no audio,
//! no input devices.
//!
//! Usage:
//!   cargo run -p brickreef-simtest
//!   cargo run -p brickreef-simtest -- --verbose

use brickreef_core::components::{
    AiFish, AiState, Behavior, Body, BrickColor, BrickPart, BrickShape, Fish, FishTier,
    PlayerFish, Position, PowerUpKind, Vec3,
};
use brickreef_core::engine::Aquarium;
use brickreef_core::events::{EventLog, GameEvent};
use brickreef_core::spatial::SpatialGrid;
use brickreef_core::systems::{
    ai_system, consumption_system, FishSpawner, GameState, GlobalEffects,
};
use hecs::World;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Brick Reef Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. AI state selection policy
    results.extend(validate_state_policy());

    // 2. Consumption invariants
    results.extend(validate_consumption());

    // 3. Population control
    results.extend(validate_spawning());

    // 4. Power-up effects
    results.extend(validate_power_ups());

    // 5. Scoring & level progression
    results.extend(validate_progression());

    // 6. Persistence round-trip
    results.extend(validate_persistence());

    // 7. Long soak of the full ecosystem
    results.extend(run_soak(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
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

// ── Shared builders ─────────────────────────────────────────────────────

fn brick_body(parts: usize) -> Body {
    Body::new(
        (0..parts)
            .map(|i| {
                BrickPart::new(
                    BrickShape::Brick1x2,
                    Vec3::new(i as f32 * 0.4, 0.0, 0.0),
                    Vec3::ZERO,
                    BrickColor::WHITE,
                )
            })
            .collect(),
    )
}

fn spawn_ai(world: &mut World, point: Vec3, size: i32, ai: AiFish) -> hecs::Entity {
    world.spawn((
        Fish::new(size, 3.0),
        Position::new(point),
        ai,
        Behavior::AiControlled,
        brick_body(3),
    ))
}

fn spawn_player(world: &mut World, point: Vec3, size: i32, parts: usize) -> hecs::Entity {
    world.spawn((
        Fish::new(size, 4.0),
        Position::new(point),
        PlayerFish::default(),
        Behavior::PlayerControlled,
        brick_body(parts),
    ))
}

// ── 1. State selection policy ───────────────────────────────────────────

fn validate_state_policy() -> Vec<TestResult> {
    let mut results = Vec::new();

    // Survival outranks everything
    {
        let mut world = World::new();
        let fish = spawn_ai(&mut world, Vec3::ZERO, 5, AiFish::new(1.0, 1.0));
        spawn_player(&mut world, Vec3::new(3.0, 0.0, 0.0), 50, 5);
        spawn_ai(&mut world, Vec3::new(1.0, 0.0, 0.0), 2, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let state = world.get::<&AiFish>(fish).unwrap().state;
        results.push(TestResult::new(
            "flee_priority",
            state == AiState::FleeingPredator,
            format!("state after evaluation: {:?}", state),
        ));
    }

    // Full aggression takes the chase every time
    {
        let mut world = World::new();
        let fish = spawn_ai(&mut world, Vec3::ZERO, 10, AiFish::new(1.0, 0.0));
        spawn_ai(&mut world, Vec3::new(5.0, 0.0, 0.0), 4, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let state = world.get::<&AiFish>(fish).unwrap().state;
        results.push(TestResult::new(
            "aggression_chases",
            state == AiState::ChasingPrey,
            format!("state after evaluation: {:?}", state),
        ));
    }

    // One or zero schoolmates falls back to wandering
    {
        let mut world = World::new();
        let fish = spawn_ai(&mut world, Vec3::ZERO, 5, AiFish::new(0.0, 1.0));
        spawn_ai(&mut world, Vec3::new(2.0, 0.0, 0.0), 5, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        let mut schooled = false;
        for _ in 0..30 {
            ai_system(&mut world, &grid, 0.1, 1.0);
            if world.get::<&AiFish>(fish).unwrap().state == AiState::Schooling {
                schooled = true;
            }
        }
        results.push(TestResult::new(
            "school_needs_neighbors",
            !schooled,
            "never schooled with a single neighbor",
        ));
    }

    results
}

// ── 2. Consumption invariants ──────────────────────────────────────────

fn validate_consumption() -> Vec<TestResult> {
    let mut results = Vec::new();

    // Growth arithmetic: 10 + floor(4/2) = 12
    {
        let mut world = World::new();
        let hunter = spawn_ai(&mut world, Vec3::ZERO, 10, AiFish::new(1.0, 0.0));
        spawn_ai(&mut world, Vec3::new(0.5, 0.0, 0.0), 4, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        let size = world.get::<&Fish>(hunter).unwrap().size;
        results.push(TestResult::new(
            "growth_transfer",
            size == 12,
            format!("hunter size after bite: {}", size),
        ));
    }

    // Two consumers, one prey, exactly one resolution
    {
        let mut world = World::new();
        let a = spawn_ai(&mut world, Vec3::new(-0.6, 0.0, 0.0), 10, AiFish::default());
        let b = spawn_ai(&mut world, Vec3::new(0.6, 0.0, 0.0), 10, AiFish::default());
        let prey = spawn_ai(&mut world, Vec3::ZERO, 4, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        let total = world.get::<&Fish>(a).unwrap().size + world.get::<&Fish>(b).unwrap().size;
        let eaten_events = log.count(|e| matches!(e, GameEvent::FishEaten { .. }));
        results.push(TestResult::new(
            "idempotent_destroy",
            !world.contains(prey) && total == 22 && eaten_events == 1,
            format!("combined size {}, {} eat events", total, eaten_events),
        ));
    }

    // Player part loss is bounded and opens invincibility
    {
        let mut world = World::new();
        let player = spawn_player(&mut world, Vec3::ZERO, 20, 10);
        spawn_ai(&mut world, Vec3::new(0.5, 0.0, 0.0), 25, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);
        consumption_system(&mut world, &grid, &mut state, &mut log);

        let parts = world.get::<&Body>(player).unwrap().part_count();
        let invincible = world.get::<&PlayerFish>(player).unwrap().invincibility > 0.0;
        results.push(TestResult::new(
            "bounded_part_loss",
            parts == 7 && invincible,
            format!("{} parts left, invincible: {}", parts, invincible),
        ));
    }

    results
}

// ── 3. Population control ──────────────────────────────────────────────

fn validate_spawning() -> Vec<TestResult> {
    let mut results = Vec::new();
    let mut rng = rand::thread_rng();

    {
        let mut world = World::new();
        let mut spawner = FishSpawner::default();
        let mut log = EventLog::new();
        spawner.spawn_wave(&mut world, 20, &mut log, &mut rng);

        let tiny = FishSpawner::count_tier(&world, FishTier::Tiny);
        results.push(TestResult::new(
            "population_ceiling",
            tiny <= 30,
            format!("{} tiny fish against a cap of 30", tiny),
        ));
    }

    {
        let mut world = World::new();
        let mut spawner = FishSpawner::default();
        let mut log = EventLog::new();
        spawner.spawn_wave(&mut world, 5, &mut log, &mut rng);

        let bosses = FishSpawner::count_tier(&world, FishTier::Boss);
        let announced = log.contains(|e| matches!(e, GameEvent::BossSpawned { .. }));
        results.push(TestResult::new(
            "boss_cadence",
            bosses == 1 && announced,
            format!("{} boss at level 5", bosses),
        ));
    }

    results
}

// ── 4. Power-up effects ────────────────────────────────────────────────

fn validate_power_ups() -> Vec<TestResult> {
    let mut results = Vec::new();

    let durations_ok = PowerUpKind::SpeedBoost.duration() == 5.0
        && PowerUpKind::Magnet.duration() == 8.0
        && PowerUpKind::SizeBoost.is_instant()
        && PowerUpKind::Demolisher.is_instant();
    results.push(TestResult::new(
        "power_up_durations",
        durations_ok,
        "closed set with defined durations",
    ));

    let mut globals = GlobalEffects::default();
    globals.slow_motion = 5.0;
    let scaled = globals.ai_time_scale();
    globals.advance(6.0);
    let restored = globals.ai_time_scale();
    results.push(TestResult::new(
        "slow_motion_scale",
        scaled == 0.5 && restored == 1.0,
        format!("scale under effect {}, after expiry {}", scaled, restored),
    ));

    results
}

// ── 5. Scoring & progression ───────────────────────────────────────────

fn validate_progression() -> Vec<TestResult> {
    let mut results = Vec::new();

    let mut state = GameState::new();
    state.score = 950;
    state.add_score(10);
    let first = state.score;
    let premature = state.level_complete_pending();
    state.add_score(50);
    let second = state.score;
    let armed = state.level_complete_pending();
    state.complete_level(0);
    state.add_score(10);
    let rearmed = state.level_complete_pending();

    results.push(TestResult::new(
        "score_threshold",
        first == 960 && !premature && second == 1010 && armed && !rearmed,
        format!("950 -> {} -> {} (armed: {})", first, second, armed),
    ));

    let mut state = GameState::new();
    state.complete_level(0);
    results.push(TestResult::new(
        "difficulty_ramp",
        (state.difficulty_multiplier - 1.2).abs() < 0.001 && state.target_score == 2000,
        format!(
            "level {} at x{} toward {}",
            state.level, state.difficulty_multiplier, state.target_score
        ),
    ));

    results
}

// ── 6. Persistence ─────────────────────────────────────────────────────

fn validate_persistence() -> Vec<TestResult> {
    let mut results = Vec::new();

    let mut aquarium = Aquarium::new();
    aquarium.generate();
    for _ in 0..60 {
        aquarium.update(1.0 / 30.0);
    }

    let fish_before = aquarium.fish_count();
    let mut buffer = Vec::new();
    let saved = aquarium.save(&mut buffer).is_ok();

    let mut restored = Aquarium::new();
    let loaded = restored.load(buffer.as_slice()).is_ok();

    results.push(TestResult::new(
        "save_load_roundtrip",
        saved && loaded && restored.fish_count() == fish_before,
        format!(
            "{} fish before, {} after ({} bytes)",
            fish_before,
            restored.fish_count(),
            buffer.len()
        ),
    ));

    results
}

// ── 7. Ecosystem soak ──────────────────────────────────────────────────

fn run_soak(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();

    let mut aquarium = Aquarium::new();
    aquarium.generate();

    let mut negative_sizes = 0;
    let minutes = 2;
    for _ in 0..(30 * 60 * minutes) {
        aquarium.update(1.0 / 30.0);
        for (_, fish) in aquarium.world.query::<&Fish>().iter() {
            if fish.size < 0 {
                negative_sizes += 1;
            }
        }
    }

    results.push(TestResult::new(
        "soak_invariants",
        negative_sizes == 0 && aquarium.fish_count() > 5,
        format!(
            "{} fish alive after {} sim-minutes, {} invariant violations",
            aquarium.fish_count(),
            minutes,
            negative_sizes
        ),
    ));

    if verbose {
        let stats = serde_json::json!({
            "sim_time_seconds": aquarium.sim_time(),
            "score": aquarium.state.score,
            "level": aquarium.state.level,
            "fish_total": aquarium.fish_count(),
            "debris": aquarium.debris_count(),
            "population": {
                "tiny": aquarium.tier_count(FishTier::Tiny),
                "small": aquarium.tier_count(FishTier::Small),
                "medium": aquarium.tier_count(FishTier::Medium),
                "large": aquarium.tier_count(FishTier::Large),
                "giant": aquarium.tier_count(FishTier::Giant),
                "boss": aquarium.tier_count(FishTier::Boss),
            },
        });
        println!("soak stats: {}", stats);
    }

    results
}
