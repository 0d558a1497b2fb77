//! Steering for brick structures - the simpler non-state-machine preset.
//!
//! Structures pick a horizontal wander heading on a timer, chase the player
//! when they outsize it, and flee otherwise. All steering stays in the
//! horizontal plane.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Behavior, Fish, Position, StructureSteering, SwimIntent, Vec3};
use crate::spatial::SpatialQuery;

/// Speed multipliers for the structure preset
pub const STRUCTURE_WANDER_SPEED: f32 = 0.6;
pub const STRUCTURE_FLEE_SPEED: f32 = 1.2;

/// How far ahead of itself a structure projects its steering targets
const WANDER_LEAD: f32 = 5.0;
const FLEE_LEAD: f32 = 10.0;

/// Bounds for the wander heading change timer
const WANDER_INTERVAL_MIN: f32 = 1.5;
const WANDER_INTERVAL_MAX: f32 = 3.5;

/// Produce swim intents for every structure entity
pub fn structure_system(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    delta_seconds: f32,
    time_scale: f32,
) {
    let mut rng = rand::thread_rng();
    let scaled_delta = delta_seconds * time_scale;
    let player = spatial.player().copied();

    let mut updates: Vec<(Entity, StructureSteering, SwimIntent)> = Vec::new();

    for (entity, (fish, pos, steering, behavior)) in world
        .query::<(&Fish, &Position, &StructureSteering, &Behavior)>()
        .iter()
    {
        if *behavior != Behavior::Static {
            continue;
        }

        let mut steering = *steering;
        steering.wander_timer -= scaled_delta;
        if steering.wander_timer <= 0.0 {
            steering.wander_direction = new_wander_direction(&mut rng);
            steering.wander_timer = rng.gen_range(WANDER_INTERVAL_MIN..WANDER_INTERVAL_MAX);
        }

        let mut intent = match player {
            Some(player) if pos.point.distance(&player.point) < steering.detection_range => {
                if fish.size > player.size {
                    // Big enough to hunt the player directly
                    SwimIntent::planar(player.point, fish.swim_speed)
                } else {
                    let away = (pos.point - player.point).horizontal().normalize();
                    SwimIntent::planar(
                        pos.point + away * FLEE_LEAD,
                        fish.swim_speed * STRUCTURE_FLEE_SPEED,
                    )
                }
            }
            _ => SwimIntent::planar(
                pos.point + steering.wander_direction * WANDER_LEAD,
                fish.swim_speed * STRUCTURE_WANDER_SPEED,
            ),
        };

        intent.speed *= time_scale;
        updates.push((entity, steering, intent));
    }

    for (entity, steering, intent) in updates {
        if let Ok(mut current) = world.get::<&mut StructureSteering>(entity) {
            *current = steering;
        }
        let _ = world.insert_one(entity, intent);
    }
}

/// Random horizontal unit heading; degenerate samples fall back to forward
fn new_wander_direction(rng: &mut impl Rng) -> Vec3 {
    let direction = Vec3::random_in_sphere(rng).horizontal();
    if direction.length() < 0.1 {
        Vec3::FORWARD
    } else {
        direction.normalize()
    }
}
