//! Consumption resolution - bites, break-apart, growth, and the player
//! damage path.
//!
//! Contact is proximity within a threshold (physics overlap is a boundary
//! concern). Every resolution is guarded by the `Consumed` claim marker:
//! the first consumer to reach a prey in the pass wins, later consumers
//! no-op. Size never goes negative and the destroy path runs exactly once.

use hecs::{Entity, World};
use log::debug;
use rand::Rng;

use crate::components::{
    AiFish, AiState, Behavior, Body, BrickPart, Consumed, DebrisMotion, Fish, Lifetime,
    LooseBrick, PlayerFish, Position, Stud, Vec3,
};
use crate::events::{EventSink, GameEvent};
use crate::generation::growth_brick;
use crate::spatial::SpatialQuery;
use crate::systems::progression::GameState;

/// Overlap distance that counts as contact
pub const CONTACT_RADIUS: f32 = 1.0;

/// Debris tuning
const BRICK_LIFETIME: f32 = 5.0;
const STUD_LIFETIME: f32 = 10.0;
const EJECT_IMPULSE: f32 = 5.0;
const SCATTER_IMPULSE: f32 = 3.0;
const SPIN_IMPULSE: f32 = 5.0;

/// Player damage tuning
const INVINCIBILITY_SECONDS: f32 = 2.0;
const MAX_PARTS_LOST: usize = 3;
const MIN_PARTS_KEPT: usize = 3;

/// Points per unit of prey size when the player eats
const SCORE_PER_SIZE: i32 = 10;

/// Resolve all predator/prey contacts for this tick
pub fn consumption_system(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    state: &mut GameState,
    sink: &mut dyn EventSink,
) {
    let mut rng = rand::thread_rng();
    resolve_player_bites(world, spatial, state, sink, &mut rng);
    resolve_ai_bites(world, spatial, sink, &mut rng);
    resolve_player_damage(world, spatial, state, sink, &mut rng);
}

/// The player's mouth sweeps a small sphere ahead of the body
fn mouth_origin(pos: &Position) -> Vec3 {
    pos.point + pos.heading * 0.5
}

/// Player eats every strictly smaller fish within mouth reach
fn resolve_player_bites(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    state: &mut GameState,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    let Some((player, origin, player_size, eat_range)) = world
        .query::<(&Fish, &Position, &PlayerFish)>()
        .iter()
        .next()
        .map(|(entity, (fish, pos, player))| {
            (entity, mouth_origin(pos), fish.size, player.eat_range)
        })
    else {
        return;
    };

    let prey: Vec<Entity> = spatial
        .nearby(origin, eat_range)
        .into_iter()
        .filter(|s| s.entity != player && s.size < player_size)
        .map(|s| s.entity)
        .collect();

    for target in prey {
        let Some((position, size, parts)) = claim_and_break(world, target, rng) else {
            continue;
        };

        // Bank growth, count bricks, award score
        let mut grew = false;
        if let Ok(mut p) = world.get::<&mut PlayerFish>(player) {
            p.bricks_collected += parts as i32;
            grew = p.bank_growth(size);
        }
        if grew {
            grow_player(world, player, sink, rng);
        }

        state.add_score(size * SCORE_PER_SIZE);
        sink.notify(GameEvent::ScoreChanged { score: state.score });
        sink.notify(GameEvent::CameraShake {
            duration: 0.1,
            magnitude: 0.2,
        });
        sink.notify(GameEvent::FishEaten {
            position,
            size,
            by_player: true,
        });
    }
}

/// AI fish eat any strictly smaller non-player fish they overlap.
///
/// Contact with the player routes through the damage path instead: AI never
/// consumes the player outright.
fn resolve_ai_bites(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    let predators: Vec<(Entity, Vec3, i32)> = world
        .query::<(&Fish, &Position, &Behavior)>()
        .iter()
        .filter(|(_, (_, _, behavior))| **behavior == Behavior::AiControlled)
        .map(|(entity, (fish, pos, _))| (entity, pos.point, fish.size))
        .collect();

    for (predator, point, size) in predators {
        // The predator itself may have been eaten earlier in this pass
        if !world.contains(predator) || world.get::<&Consumed>(predator).is_ok() {
            continue;
        }

        let target = spatial
            .nearby(point, CONTACT_RADIUS)
            .into_iter()
            .find(|s| {
                s.entity != predator
                    && s.size < size
                    && s.behavior != Behavior::PlayerControlled
            })
            .map(|s| s.entity);

        let Some(target) = target else { continue };
        let Some((position, prey_size, _)) = claim_and_break(world, target, rng) else {
            continue;
        };

        // AI growth transfers half the prey's mass
        if let Ok(mut fish) = world.get::<&mut Fish>(predator) {
            fish.gain(prey_size / 2);
        }
        if let Ok(mut ai) = world.get::<&mut AiFish>(predator) {
            ai.state = AiState::Eating;
        }

        debug!("fish {:?} ate prey of size {}", predator, prey_size);
        sink.notify(GameEvent::FishEaten {
            position,
            size: prey_size,
            by_player: false,
        });
    }
}

/// A larger fish overlapping the player knocks bricks loose.
///
/// Only the first contact applies per tick - the invincibility window opens
/// immediately and shields the rest.
fn resolve_player_damage(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    state: &mut GameState,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    let Some((player, point, player_size)) = world
        .query::<(&Fish, &Position, &PlayerFish)>()
        .iter()
        .next()
        .map(|(entity, (fish, pos, _))| (entity, pos.point, fish.size))
    else {
        return;
    };

    if let Ok(p) = world.get::<&PlayerFish>(player) {
        if !p.is_vulnerable() {
            return;
        }
    }

    let predator = spatial
        .nearby(point, CONTACT_RADIUS)
        .into_iter()
        .find(|s| s.entity != player && s.size > player_size)
        .copied();
    let Some(predator) = predator else { return };
    if !world.contains(predator.entity) {
        return;
    }

    // Pop up to three parts, keeping at least three on the body
    let mut ejected: Vec<BrickPart> = Vec::new();
    if let Ok(mut body) = world.get::<&mut Body>(player) {
        while ejected.len() < MAX_PARTS_LOST && body.parts.len() > MIN_PARTS_KEPT {
            if let Some(part) = body.pop_part() {
                ejected.push(part);
            } else {
                break;
            }
        }
    }

    let eject_dir = (point - predator.point).normalize();
    let parts_lost = ejected.len() as i32;
    for part in ejected {
        spawn_loose_brick(world, point + part.offset, eject_dir * (EJECT_IMPULSE * 2.0), rng);
    }

    let mut remaining_size = player_size;
    if let Ok(mut fish) = world.get::<&mut Fish>(player) {
        fish.shrink(parts_lost);
        remaining_size = fish.size;
    }
    if let Ok(mut p) = world.get::<&mut PlayerFish>(player) {
        p.invincibility = INVINCIBILITY_SECONDS;
    }

    sink.notify(GameEvent::PlayerDamaged {
        parts_lost,
        remaining_size,
    });

    if remaining_size <= 0 {
        player_death(world, player, state, sink, rng);
    }
}

/// Break the player apart and end the run exactly once
fn player_death(
    world: &mut World,
    player: Entity,
    state: &mut GameState,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    claim_and_break(world, player, rng);
    if state.set_game_over() {
        log::info!("game over at level {} with score {}", state.level, state.score);
        sink.notify(GameEvent::GameOver {
            score: state.score,
            level: state.level,
        });
    }
}

/// Break apart the single largest AI fish (demolisher power-up)
pub fn demolish_largest(world: &mut World, sink: &mut dyn EventSink, rng: &mut impl Rng) {
    let target = world
        .query::<(&Fish, &Behavior)>()
        .iter()
        .filter(|(_, (_, behavior))| **behavior == Behavior::AiControlled)
        .max_by_key(|(_, (fish, _))| fish.size)
        .map(|(entity, _)| entity);

    let Some(target) = target else { return };
    if let Some((position, size, _)) = claim_and_break(world, target, rng) {
        sink.notify(GameEvent::FishEaten {
            position,
            size,
            by_player: false,
        });
    }
}

/// Claim an entity for consumption and break it apart into debris.
///
/// Returns the entity's position, size, and part count, or `None` if the
/// claim failed (already consumed, or gone) - callers must then skip all
/// consequences.
pub fn claim_and_break(
    world: &mut World,
    target: Entity,
    rng: &mut impl Rng,
) -> Option<(Vec3, i32, usize)> {
    if !world.contains(target) || world.get::<&Consumed>(target).is_ok() {
        return None;
    }
    let origin = world.get::<&Position>(target).map(|p| p.point);
    let origin = match origin {
        Ok(point) => point,
        Err(_) => {
            // Malformed entity - remove it, but there is nothing to scatter
            let _ = world.despawn(target);
            return None;
        }
    };
    world.insert_one(target, Consumed).ok()?;
    let size = world.get::<&Fish>(target).map(|f| f.size).unwrap_or(0);
    let parts: Vec<BrickPart> = world
        .get::<&Body>(target)
        .map(|b| b.parts.clone())
        .unwrap_or_default();
    let part_count = parts.len();

    let _ = world.despawn(target);

    // Detach every part with an outward impulse and random spin
    for part in &parts {
        let outward = if part.offset.length() > 0.001 {
            part.offset.normalize() * EJECT_IMPULSE
        } else {
            Vec3::random_in_sphere(rng) * EJECT_IMPULSE
        };
        let velocity = outward + Vec3::random_in_sphere(rng) * SCATTER_IMPULSE;
        spawn_loose_brick(world, origin + part.offset, velocity, rng);
    }

    // Scatter studs proportional to size
    let stud_count = (size / 2).max(1);
    for _ in 0..stud_count {
        let offset = Vec3::random_in_sphere(rng) * 1.5;
        world.spawn((
            Position::new(origin + offset),
            Stud::new(1),
            DebrisMotion::new(Vec3::random_in_sphere(rng) * EJECT_IMPULSE, Vec3::ZERO),
            Lifetime::new(STUD_LIFETIME),
        ));
    }

    Some((origin, size, part_count))
}

fn spawn_loose_brick(world: &mut World, point: Vec3, velocity: Vec3, rng: &mut impl Rng) {
    world.spawn((
        Position::new(point),
        LooseBrick::new(1),
        DebrisMotion::new(velocity, Vec3::random_in_sphere(rng) * SPIN_IMPULSE),
        Lifetime::new(BRICK_LIFETIME),
    ));
}

/// Apply a growth threshold crossing to the player: more mass, one more
/// brick on the body, slightly slower swim
pub fn grow_player(world: &mut World, player: Entity, sink: &mut dyn EventSink, rng: &mut impl Rng) {
    let mut new_size = 0;
    let mut tier = None;
    if let Ok(mut fish) = world.get::<&mut Fish>(player) {
        fish.gain(5);
        fish.swim_speed = (fish.swim_speed - 0.1).max(2.0);
        new_size = fish.size;
        tier = Some(fish.tier);
    }

    if let Ok(mut body) = world.get::<&mut Body>(player) {
        let color = body.hull_color();
        body.parts.push(growth_brick(color, rng));
    }

    if let Some(tier) = tier {
        sink.notify(GameEvent::PlayerGrew { new_size, tier });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AiFish, BrickColor, BrickShape};
    use crate::events::EventLog;
    use crate::spatial::SpatialGrid;

    fn body_of(parts: usize) -> Body {
        Body::new(
            (0..parts)
                .map(|i| {
                    BrickPart::new(
                        BrickShape::Brick1x2,
                        Vec3::new(i as f32 * 0.5, 0.0, 0.0),
                        Vec3::ZERO,
                        BrickColor::WHITE,
                    )
                })
                .collect(),
        )
    }

    fn spawn_ai(world: &mut World, point: Vec3, size: i32) -> Entity {
        world.spawn((
            Fish::new(size, 3.0),
            Position::new(point),
            AiFish::default(),
            Behavior::AiControlled,
            body_of(3),
        ))
    }

    #[test]
    fn test_ai_eats_smaller_neighbor_and_gains_half() {
        let mut world = World::new();
        let predator = spawn_ai(&mut world, Vec3::ZERO, 10);
        let prey = spawn_ai(&mut world, Vec3::new(0.5, 0.0, 0.0), 4);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        assert!(!world.contains(prey));
        assert_eq!(world.get::<&Fish>(predator).unwrap().size, 12); // 10 + floor(4/2)
        assert!(log.contains(|e| matches!(e, GameEvent::FishEaten { by_player: false, .. })));
    }

    #[test]
    fn test_double_resolution_is_idempotent() {
        let mut world = World::new();
        // Two predators flanking one prey within contact range of both
        let a = spawn_ai(&mut world, Vec3::new(-0.5, 0.0, 0.0), 10);
        let b = spawn_ai(&mut world, Vec3::new(0.5, 0.0, 0.0), 10);
        let prey = spawn_ai(&mut world, Vec3::ZERO, 4);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        assert!(!world.contains(prey));

        // Exactly one predator got the reward
        let size_a = world.get::<&Fish>(a).unwrap().size;
        let size_b = world.get::<&Fish>(b).unwrap().size;
        assert_eq!(size_a + size_b, 22); // one at 12, one untouched at 10
        assert_eq!(
            log.count(|e| matches!(e, GameEvent::FishEaten { .. })),
            1
        );
    }

    #[test]
    fn test_break_apart_spawns_debris_and_studs() {
        let mut world = World::new();
        let prey = spawn_ai(&mut world, Vec3::ZERO, 8);
        let mut rng = rand::thread_rng();

        let result = claim_and_break(&mut world, prey, &mut rng);
        let (_, size, parts) = result.unwrap();
        assert_eq!(size, 8);
        assert_eq!(parts, 3);

        let bricks = world.query::<&LooseBrick>().iter().count();
        let studs = world.query::<&Stud>().iter().count();
        assert_eq!(bricks, 3);
        assert_eq!(studs, 4); // max(1, 8/2)

        // Debris expires on its own
        for (_, lifetime) in world.query::<&Lifetime>().iter() {
            assert!(lifetime.remaining > 0.0);
        }
    }

    #[test]
    fn test_claim_fails_second_time() {
        let mut world = World::new();
        let prey = spawn_ai(&mut world, Vec3::ZERO, 4);
        let mut rng = rand::thread_rng();

        assert!(claim_and_break(&mut world, prey, &mut rng).is_some());
        assert!(claim_and_break(&mut world, prey, &mut rng).is_none());
    }

    #[test]
    fn test_player_eats_and_scores() {
        let mut world = World::new();
        let player = world.spawn((
            Fish::new(10, 4.0),
            Position::new(Vec3::ZERO),
            PlayerFish::default(),
            Behavior::PlayerControlled,
            body_of(4),
        ));
        spawn_ai(&mut world, Vec3::new(0.8, 0.0, 0.0), 4);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        assert_eq!(state.score, 40); // 4 * 10 * 1.0
        let p = world.get::<&PlayerFish>(player).unwrap();
        assert_eq!(p.bricks_collected, 3);
        assert_eq!(p.growth_progress, 4);
        assert!(log.contains(|e| matches!(e, GameEvent::CameraShake { .. })));
        assert!(log.contains(|e| matches!(e, GameEvent::FishEaten { by_player: true, .. })));
    }

    #[test]
    fn test_player_growth_threshold() {
        let mut world = World::new();
        let player = world.spawn((
            Fish::new(10, 4.0),
            Position::new(Vec3::ZERO),
            PlayerFish::default(),
            Behavior::PlayerControlled,
            body_of(4),
        ));
        // Size 12 prey crosses the default threshold of 10 in one bite
        world.spawn((
            Fish::new(12, 3.0),
            Position::new(Vec3::new(0.8, 0.0, 0.0)),
            AiFish::default(),
            Behavior::AiControlled,
            body_of(3),
        ));

        // Make the player large enough to eat it
        world.get::<&mut Fish>(player).unwrap().gain(10);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        let fish = world.get::<&Fish>(player).unwrap();
        assert_eq!(fish.size, 25); // 20 + 5 growth
        drop(fish);

        let body = world.get::<&Body>(player).unwrap();
        assert_eq!(body.part_count(), 5); // one growth brick appended
        drop(body);

        assert!(log.contains(|e| matches!(e, GameEvent::PlayerGrew { .. })));
        let p = world.get::<&PlayerFish>(player).unwrap();
        assert_eq!(p.bricks_to_grow, 15);
    }

    #[test]
    fn test_player_damage_bounded_part_loss() {
        let mut world = World::new();
        let player = world.spawn((
            Fish::new(20, 4.0),
            Position::new(Vec3::ZERO),
            PlayerFish::default(),
            Behavior::PlayerControlled,
            body_of(10),
        ));
        spawn_big_predator(&mut world, Vec3::new(0.5, 0.0, 0.0), 25);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        let body = world.get::<&Body>(player).unwrap();
        assert_eq!(body.part_count(), 7); // lost exactly 3
        drop(body);

        let fish = world.get::<&Fish>(player).unwrap();
        assert_eq!(fish.size, 17);
        drop(fish);

        let p = world.get::<&PlayerFish>(player).unwrap();
        assert!(p.invincibility > 0.0);
        drop(p);

        // Ejected parts became collectible debris
        assert_eq!(world.query::<&LooseBrick>().iter().count(), 3);
        assert!(log.contains(|e| matches!(e, GameEvent::PlayerDamaged { parts_lost: 3, .. })));
    }

    #[test]
    fn test_invincible_player_takes_no_damage() {
        let mut world = World::new();
        let mut player_fish = PlayerFish::default();
        player_fish.invincibility = 2.0;
        let player = world.spawn((
            Fish::new(20, 4.0),
            Position::new(Vec3::ZERO),
            player_fish,
            Behavior::PlayerControlled,
            body_of(10),
        ));
        spawn_big_predator(&mut world, Vec3::new(0.5, 0.0, 0.0), 25);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        assert_eq!(world.get::<&Body>(player).unwrap().part_count(), 10);
        assert!(!log.contains(|e| matches!(e, GameEvent::PlayerDamaged { .. })));
    }

    #[test]
    fn test_small_body_keeps_minimum_parts() {
        let mut world = World::new();
        let player = world.spawn((
            Fish::new(3, 4.0),
            Position::new(Vec3::ZERO),
            PlayerFish::default(),
            Behavior::PlayerControlled,
            body_of(3),
        ));
        spawn_big_predator(&mut world, Vec3::new(0.5, 0.0, 0.0), 25);

        let grid = SpatialGrid::build(&world, 8.0);
        let mut state = GameState::new();
        let mut log = EventLog::new();
        consumption_system(&mut world, &grid, &mut state, &mut log);

        // Nothing to lose below the floor of 3 parts; size untouched
        assert_eq!(world.get::<&Body>(player).unwrap().part_count(), 3);
        assert_eq!(world.get::<&Fish>(player).unwrap().size, 3);
    }

    #[test]
    fn test_demolisher_breaks_largest() {
        let mut world = World::new();
        spawn_ai(&mut world, Vec3::ZERO, 10);
        let biggest = spawn_ai(&mut world, Vec3::new(5.0, 0.0, 0.0), 50);
        let mut rng = rand::thread_rng();
        let mut log = EventLog::new();

        demolish_largest(&mut world, &mut log, &mut rng);

        assert!(!world.contains(biggest));
        assert_eq!(world.query::<(&Fish, &AiFish)>().iter().count(), 1);
    }

    fn spawn_big_predator(world: &mut World, point: Vec3, size: i32) -> Entity {
        world.spawn((
            Fish::new(size, 3.0),
            Position::new(point),
            AiFish::default(),
            Behavior::AiControlled,
            body_of(5),
        ))
    }
}
