//! Movement integration - consumes swim intents, moves entities with a
//! bounded turn rate, drifts debris, and expires lifetimes.

use hecs::{Entity, World};

use crate::components::{
    ActiveEffects, Behavior, BoundingBox, Bubble, DebrisMotion, Fish, Lifetime, PlayerFish,
    PlayerInput, Position, SwimIntent, Vec3,
};

/// Heading interpolation rate per second (damped approach, no snapping)
const TURN_RATE: f32 = 5.0;

/// Velocity damping applied to drifting debris per second
const DEBRIS_DRAG: f32 = 1.5;

/// Translate player input into a swim intent.
///
/// Speed modifiers (boost, speed power-ups) are derived at intent time from
/// the active effect set, never written back into the base stat.
pub fn player_control_system(world: &mut World) {
    let mut intents: Vec<(Entity, SwimIntent)> = Vec::new();

    for (entity, (fish, pos, input, _)) in world
        .query::<(&Fish, &Position, &PlayerInput, &PlayerFish)>()
        .iter()
    {
        let direction = input.direction.normalize();
        if direction.length() < 0.1 {
            continue; // idle stick - no intent, heading untouched
        }

        let boost = if input.boost { 1.5 } else { 1.0 };
        let effect_multiplier = world
            .get::<&ActiveEffects>(entity)
            .map(|e| e.speed_multiplier())
            .unwrap_or(1.0);

        let speed = fish.swim_speed * boost * effect_multiplier;
        intents.push((entity, SwimIntent::new(pos.point + direction * 10.0, speed)));
    }

    for (entity, intent) in intents {
        let _ = world.insert_one(entity, intent);
    }
}

/// Move every entity with a swim intent toward its target, then drop the
/// intent; behavior systems issue a fresh one next tick.
pub fn swim_system(world: &mut World, bounds: &BoundingBox, delta_seconds: f32) {
    let mut updates: Vec<(Entity, Position)> = Vec::new();
    let mut consumed: Vec<Entity> = Vec::new();

    for (entity, (pos, intent)) in world.query::<(&Position, &SwimIntent)>().iter() {
        consumed.push(entity);

        let mut direction = intent.target - pos.point;
        if intent.planar {
            direction = direction.horizontal();
        }

        // Zero-length directions are a no-op: no step, no heading change
        if direction.length() < 0.0001 {
            continue;
        }

        let distance = direction.length();
        let direction = direction.normalize();
        let step = (intent.speed * delta_seconds).min(distance); // land, don't overshoot

        let new_point = bounds.clamp(pos.point + direction * step);
        let blend = (TURN_RATE * delta_seconds).min(1.0);
        let new_heading = interpolate_heading(pos.heading, direction, blend);

        updates.push((
            entity,
            Position {
                point: new_point,
                heading: new_heading,
            },
        ));
    }

    for (entity, new_pos) in updates {
        if let Ok(mut pos) = world.get::<&mut Position>(entity) {
            *pos = new_pos;
        }
    }

    for entity in consumed {
        let _ = world.remove_one::<SwimIntent>(entity);
    }
}

/// Damped approach of the facing vector toward the movement direction
fn interpolate_heading(current: Vec3, target: Vec3, blend: f32) -> Vec3 {
    let mixed = current + (target - current) * blend;
    let mixed = mixed.normalize();
    if mixed.length() < 0.5 {
        // Opposite headings can cancel out; snap-free fallback to the target
        target
    } else {
        mixed
    }
}

/// Drift ejected debris along its impulse, damping velocity and spin, and
/// wobble bubbles upward
pub fn debris_system(world: &mut World, delta_seconds: f32) {
    let damping = (1.0 - DEBRIS_DRAG * delta_seconds).max(0.0);

    for (_, (pos, motion)) in world.query_mut::<(&mut Position, &mut DebrisMotion)>() {
        pos.point += motion.velocity * delta_seconds;
        motion.velocity = motion.velocity * damping;
        motion.spin = motion.spin * damping;
    }

    for (_, (pos, bubble)) in world.query_mut::<(&mut Position, &mut Bubble)>() {
        bubble.phase += delta_seconds;
        pos.point.y += bubble.rise_speed * delta_seconds;
        pos.point.x = bubble.anchor_x + (bubble.phase * 3.0).sin() * bubble.wobble_amount;
        pos.point.z = bubble.anchor_z + (bubble.phase * 2.1).cos() * bubble.wobble_amount;
    }
}

/// Count down lifetimes and remove expired entities.
///
/// Removal here also cancels any timed effects tracked on the entity - the
/// effect collection is a component and dies with it.
pub fn lifetime_system(world: &mut World, delta_seconds: f32) -> usize {
    let mut expired: Vec<Entity> = Vec::new();

    for (entity, lifetime) in world.query_mut::<&mut Lifetime>() {
        if lifetime.tick(delta_seconds) {
            expired.push(entity);
        }
    }

    let count = expired.len();
    for entity in expired {
        let _ = world.despawn(entity);
    }
    count
}
