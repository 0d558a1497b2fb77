//! Player pickups - loose bricks, studs, power-ups - and the magnet pull.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    ActiveEffects, Fish, LooseBrick, PlayerFish, Position, PowerUp, PowerUpKind, Stud, Vec3,
};
use crate::events::{EventSink, GameEvent};
use crate::systems::consumption::grow_player;
use crate::systems::effects::{apply_power_up, GlobalEffects};

/// Reach of the magnet power-up
const MAGNET_RADIUS: f32 = 5.0;
const MAGNET_PULL_SPEED: f32 = 5.0;

/// Absorb collectibles within the player's reach and run the magnet
pub fn collection_system(
    world: &mut World,
    delta_seconds: f32,
    globals: &mut GlobalEffects,
    sink: &mut dyn EventSink,
) {
    let mut rng = rand::thread_rng();

    let Some((player, point, eat_range)) = world
        .query::<(&Position, &PlayerFish)>()
        .iter()
        .next()
        .map(|(entity, (pos, p))| (entity, pos.point, p.eat_range))
    else {
        return;
    };

    collect_bricks(world, player, point, eat_range, sink, &mut rng);
    collect_studs(world, player, point, eat_range, sink);
    collect_power_ups(world, player, point, eat_range, globals, sink, &mut rng);

    let magnet_active = world
        .get::<&ActiveEffects>(player)
        .map(|e| e.has(PowerUpKind::Magnet))
        .unwrap_or(false);
    if magnet_active {
        magnet_pull(world, point, delta_seconds);
    }
}

fn collect_bricks(
    world: &mut World,
    player: Entity,
    point: Vec3,
    eat_range: f32,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    let collected: Vec<(Entity, i32)> = world
        .query::<(&LooseBrick, &Position)>()
        .iter()
        .filter(|(_, (_, pos))| pos.point.distance(&point) < eat_range)
        .map(|(entity, (brick, _))| (entity, brick.value))
        .collect();

    for (entity, value) in collected {
        let _ = world.despawn(entity);

        let mut grew = false;
        if let Ok(mut p) = world.get::<&mut PlayerFish>(player) {
            p.bricks_collected += 1;
            grew = p.bank_growth(value);
        }
        if grew {
            grow_player(world, player, sink, rng);
        }
        sink.notify(GameEvent::BrickCollected { value });
    }
}

fn collect_studs(
    world: &mut World,
    player: Entity,
    point: Vec3,
    eat_range: f32,
    sink: &mut dyn EventSink,
) {
    let collected: Vec<(Entity, Vec3, i32)> = world
        .query::<(&Stud, &Position)>()
        .iter()
        .filter(|(_, (_, pos))| pos.point.distance(&point) < eat_range)
        .map(|(entity, (stud, pos))| (entity, pos.point, stud.value))
        .collect();

    for (entity, position, value) in collected {
        let _ = world.despawn(entity);
        if let Ok(mut p) = world.get::<&mut PlayerFish>(player) {
            p.studs += value;
        }
        sink.notify(GameEvent::StudCollected { position, value });
    }
}

fn collect_power_ups(
    world: &mut World,
    player: Entity,
    point: Vec3,
    eat_range: f32,
    globals: &mut GlobalEffects,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    let collected: Vec<(Entity, PowerUpKind)> = world
        .query::<(&PowerUp, &Position)>()
        .iter()
        .filter(|(_, (_, pos))| pos.point.distance(&point) < eat_range)
        .map(|(entity, (power_up, _))| (entity, power_up.kind))
        .collect();

    for (entity, kind) in collected {
        let _ = world.despawn(entity);
        sink.notify(GameEvent::PowerUpCollected { kind });
        apply_power_up(world, player, kind, globals, sink, rng);
    }
}

/// Pull loose bricks and studs toward the player
fn magnet_pull(world: &mut World, point: Vec3, delta_seconds: f32) {
    for (_, (_, pos)) in world.query_mut::<(&LooseBrick, &mut Position)>() {
        pull_toward(pos, point, delta_seconds);
    }
    for (_, (_, pos)) in world.query_mut::<(&Stud, &mut Position)>() {
        pull_toward(pos, point, delta_seconds);
    }
}

fn pull_toward(pos: &mut Position, point: Vec3, delta_seconds: f32) {
    let offset = point - pos.point;
    if offset.length() < MAGNET_RADIUS && offset.length() > 0.001 {
        pos.point += offset.normalize() * (MAGNET_PULL_SPEED * delta_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Behavior, Body, DebrisMotion, Lifetime};
    use crate::events::EventLog;

    fn spawn_player(world: &mut World) -> Entity {
        world.spawn((
            Fish::new(10, 4.0),
            Position::new(Vec3::ZERO),
            PlayerFish::default(),
            Behavior::PlayerControlled,
            Body::default(),
        ))
    }

    #[test]
    fn test_collects_nearby_stud() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        let stud = world.spawn((
            Stud::new(2),
            Position::new(Vec3::new(0.5, 0.0, 0.0)),
            Lifetime::new(10.0),
        ));

        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        collection_system(&mut world, 0.1, &mut globals, &mut log);

        assert!(!world.contains(stud));
        assert_eq!(world.get::<&PlayerFish>(player).unwrap().studs, 2);
        assert!(log.contains(|e| matches!(e, GameEvent::StudCollected { value: 2, .. })));
    }

    #[test]
    fn test_ignores_far_stud() {
        let mut world = World::new();
        spawn_player(&mut world);
        let stud = world.spawn((Stud::new(1), Position::new(Vec3::new(20.0, 0.0, 0.0))));

        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        collection_system(&mut world, 0.1, &mut globals, &mut log);

        assert!(world.contains(stud));
    }

    #[test]
    fn test_brick_banks_growth() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        world.spawn((LooseBrick::new(3), Position::new(Vec3::new(0.5, 0.0, 0.0))));

        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        collection_system(&mut world, 0.1, &mut globals, &mut log);

        let p = world.get::<&PlayerFish>(player).unwrap();
        assert_eq!(p.growth_progress, 3);
        assert_eq!(p.bricks_collected, 1);
    }

    #[test]
    fn test_magnet_pulls_debris_closer() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        world.insert_one(player, {
            let mut effects = ActiveEffects::new();
            effects.apply(PowerUpKind::Magnet);
            effects
        })
        .unwrap();

        let brick = world.spawn((
            LooseBrick::new(1),
            Position::new(Vec3::new(3.0, 0.0, 0.0)),
            DebrisMotion::default(),
        ));

        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        collection_system(&mut world, 0.5, &mut globals, &mut log);

        let pos = world.get::<&Position>(brick).unwrap();
        assert!(pos.point.x < 3.0);
    }

    #[test]
    fn test_power_up_pickup_applies() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        let pickup = world.spawn((
            PowerUp {
                kind: PowerUpKind::SpeedBoost,
            },
            Position::new(Vec3::new(0.5, 0.0, 0.0)),
        ));

        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        collection_system(&mut world, 0.1, &mut globals, &mut log);

        assert!(!world.contains(pickup));
        let effects = world.get::<&ActiveEffects>(player).unwrap();
        assert!(effects.has(PowerUpKind::SpeedBoost));
        assert!(log.contains(|e| matches!(
            e,
            GameEvent::PowerUpCollected {
                kind: PowerUpKind::SpeedBoost
            }
        )));
    }
}
