//! Integration tests for the predator/prey loop.
//!
//! Exercises: state selection → steering → consumption → scoring
//! → level progression, end to end on a hand-built world.
//!
//! All tests are pure logic - no rendering, no physics engine.

use brickreef_core::components::{
    AiFish, AiState, Behavior, Body, BrickColor, BrickPart, BrickShape, Fish, PlayerFish,
    Position, Vec3,
};
use brickreef_core::engine::Aquarium;
use brickreef_core::events::{EventLog, GameEvent};
use brickreef_core::spatial::SpatialGrid;
use brickreef_core::systems::{
    ai_system, consumption_system, swim_system, GameState,
};
use hecs::{Entity, World};

// ── Helpers ────────────────────────────────────────────────────────────

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

fn spawn_hunter(world: &mut World, point: Vec3, size: i32, aggressiveness: f32) -> Entity {
    world.spawn((
        Fish::new(size, 3.0),
        Position::new(point),
        AiFish::new(aggressiveness, 0.0),
        Behavior::AiControlled,
        brick_body(3),
    ))
}

fn spawn_player_at(world: &mut World, point: Vec3, size: i32, parts: usize) -> Entity {
    world.spawn((
        Fish::new(size, 4.0),
        Position::new(point),
        PlayerFish::default(),
        Behavior::PlayerControlled,
        brick_body(parts),
    ))
}

/// One full sense → decide → move → resolve step over a bare world
fn tick(world: &mut World, state: &mut GameState, log: &mut EventLog, delta: f32) {
    let bounds = brickreef_core::components::BoundingBox::centered(200.0, 40.0, 200.0);
    let spatial = SpatialGrid::build(world, 8.0);
    ai_system(world, &spatial, delta, 1.0);
    swim_system(world, &bounds, delta);
    let spatial = SpatialGrid::build(world, 8.0);
    consumption_system(world, &spatial, state, log);
}

// ── Chase-and-eat scenario (sizes 10 and 4) ────────────────────────────

#[test]
fn hunter_chases_and_eats_smaller_fish() {
    let mut world = World::new();
    // Entity A: size 10, wandering; entity B: size 4, within detection range 15
    let hunter = spawn_hunter(&mut world, Vec3::ZERO, 10, 1.0);
    let prey = world.spawn((
        Fish::new(4, 0.0), // holds still to keep the chase deterministic
        Position::new(Vec3::new(6.0, 0.0, 0.0)),
        Behavior::AiControlled,
        brick_body(3),
    ));

    let mut state = GameState::new();
    let mut log = EventLog::new();

    // First evaluation flips A into ChasingPrey
    tick(&mut world, &mut state, &mut log, 0.05);
    assert_eq!(
        world.get::<&AiFish>(hunter).unwrap().state,
        AiState::ChasingPrey
    );

    // Keep ticking until contact resolves the bite
    for _ in 0..600 {
        if !world.contains(prey) {
            break;
        }
        tick(&mut world, &mut state, &mut log, 0.05);
    }

    assert!(!world.contains(prey), "prey was never caught");
    assert_eq!(world.get::<&Fish>(hunter).unwrap().size, 12); // 10 + floor(4/2)
}

// ── Exactly-once destruction under two consumers ───────────────────────

#[test]
fn two_consumers_resolve_one_prey_once() {
    let mut world = World::new();
    let left = spawn_hunter(&mut world, Vec3::new(-0.6, 0.0, 0.0), 10, 0.0);
    let right = spawn_hunter(&mut world, Vec3::new(0.6, 0.0, 0.0), 10, 0.0);
    let prey = spawn_hunter(&mut world, Vec3::ZERO, 4, 0.0);

    let mut state = GameState::new();
    let mut log = EventLog::new();
    let spatial = SpatialGrid::build(&world, 8.0);
    consumption_system(&mut world, &spatial, &mut state, &mut log);

    assert!(!world.contains(prey));
    assert_eq!(log.count(|e| matches!(e, GameEvent::FishEaten { .. })), 1);

    // The reward went to exactly one of them
    let total = world.get::<&Fish>(left).unwrap().size + world.get::<&Fish>(right).unwrap().size;
    assert_eq!(total, 22);

    // Sizes stay non-negative everywhere
    for (_, fish) in world.query::<&Fish>().iter() {
        assert!(fish.size >= 0);
    }
}

// ── Flee priority ──────────────────────────────────────────────────────

#[test]
fn larger_player_in_flee_range_always_wins() {
    let mut world = World::new();
    let fish = spawn_hunter(&mut world, Vec3::ZERO, 5, 1.0);
    spawn_player_at(&mut world, Vec3::new(4.0, 0.0, 0.0), 50, 5);
    // Tempting prey nearby must not matter
    spawn_hunter(&mut world, Vec3::new(-2.0, 0.0, 0.0), 2, 0.0);

    let mut state = GameState::new();
    let mut log = EventLog::new();
    for _ in 0..20 {
        tick(&mut world, &mut state, &mut log, 0.01);
        if !world.contains(fish) {
            return; // eaten by nothing in this setup; defensive
        }
        assert_eq!(
            world.get::<&AiFish>(fish).unwrap().state,
            AiState::FleeingPredator
        );
    }
}

// ── Player damage scenario (sizes 20 vs 25) ────────────────────────────

#[test]
fn player_contact_with_larger_fish_costs_parts_once() {
    let mut world = World::new();
    let player = spawn_player_at(&mut world, Vec3::ZERO, 20, 8);
    spawn_hunter(&mut world, Vec3::new(0.5, 0.0, 0.0), 25, 0.0);

    let mut state = GameState::new();
    let mut log = EventLog::new();
    let spatial = SpatialGrid::build(&world, 8.0);
    consumption_system(&mut world, &spatial, &mut state, &mut log);

    // Bounded loss: exactly 3 parts, invincibility window opened
    assert_eq!(world.get::<&Body>(player).unwrap().part_count(), 5);
    assert_eq!(world.get::<&Fish>(player).unwrap().size, 17);
    assert!(world.get::<&PlayerFish>(player).unwrap().invincibility > 0.0);

    // Second resolution in the same window is a no-op
    let spatial = SpatialGrid::build(&world, 8.0);
    consumption_system(&mut world, &spatial, &mut state, &mut log);
    assert_eq!(world.get::<&Body>(player).unwrap().part_count(), 5);
    assert_eq!(
        log.count(|e| matches!(e, GameEvent::PlayerDamaged { .. })),
        1
    );
}

// ── Scoring and exactly-once level completion ──────────────────────────

#[test]
fn level_complete_fires_exactly_once_at_the_threshold() {
    let mut aquarium = Aquarium::new();
    aquarium.generate();
    aquarium.take_events();

    // Score 950, then a 10-point event at difficulty 1.0
    aquarium.state.score = 950;
    aquarium.state.add_score(10);
    assert_eq!(aquarium.state.score, 960);
    assert!(!aquarium.state.level_complete_pending());

    // A 50-point event crosses 1000
    aquarium.state.add_score(50);
    assert_eq!(aquarium.state.score, 1010);
    assert!(aquarium.state.level_complete_pending());

    // Run the engine forward through the transition
    for _ in 0..240 {
        aquarium.update(1.0 / 30.0);
    }

    let events = aquarium.take_events();
    let completions = events
        .iter()
        .filter(|e| matches!(e, GameEvent::LevelComplete { .. }))
        .count();
    let starts = events
        .iter()
        .filter(|e| matches!(e, GameEvent::LevelStart { level: 2 }))
        .count();
    assert_eq!(completions, 1);
    assert_eq!(starts, 1);
    assert_eq!(aquarium.state.level, 2);
    assert_eq!(aquarium.state.target_score, 2000);
}

// ── Full-engine smoke run ──────────────────────────────────────────────

#[test]
fn simulation_runs_minutes_without_violating_invariants() {
    let mut aquarium = Aquarium::new();
    aquarium.generate();

    for _ in 0..(30 * 60) {
        aquarium.update(1.0 / 30.0);

        for (_, fish) in aquarium.world.query::<&Fish>().iter() {
            assert!(fish.size >= 0, "negative fish size");
        }
    }

    // The ecosystem keeps itself populated
    assert!(aquarium.fish_count() > 5);
}
