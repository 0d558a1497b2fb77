//! AI fish behavior - state selection and per-state steering.
//!
//! The policy is layered: survival first (flee a larger player), then
//! opportunism (chase smaller fish), then social (school with same-tier
//! neighbors), then idle wandering. Probability gates are independent
//! Bernoulli draws per evaluation; re-rolling into the current state is
//! accepted behavior, not debounced.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    AiFish, AiState, Behavior, Fish, Position, SwimIntent, Vec3,
};
use crate::spatial::{SensedFish, SpatialQuery};

/// Speed multipliers for the AI steering preset
pub const AI_WANDER_SPEED: f32 = 0.7;
pub const AI_CHASE_SPEED: f32 = 1.2;
pub const AI_FLEE_SPEED: f32 = 1.5;
pub const AI_SCHOOL_SPEED: f32 = 1.0;

/// Arrival radius for wander targets and prey
pub const ARRIVAL_RADIUS: f32 = 1.0;

/// Neighbors closer than this contribute to the separation term
const SEPARATION_RADIUS: f32 = 2.0;

/// Vertical band fish wander within
const WATER_COLUMN_MIN_Y: f32 = -8.0;
const WATER_COLUMN_MAX_Y: f32 = 8.0;

struct AiUpdate {
    entity: Entity,
    state: AiState,
    wander_target: Vec3,
    state_timer: f32,
    intent: Option<SwimIntent>,
}

/// Evaluate state transitions and produce swim intents for every AI fish.
///
/// `time_scale` slows AI decision timers and movement under slow-motion
/// without affecting the player.
pub fn ai_system(
    world: &mut World,
    spatial: &dyn SpatialQuery,
    delta_seconds: f32,
    time_scale: f32,
) {
    let mut rng = rand::thread_rng();
    let scaled_delta = delta_seconds * time_scale;
    let player = spatial.player().copied();
    let mut updates = Vec::new();

    for (entity, (fish, pos, ai, behavior)) in world
        .query::<(&Fish, &Position, &AiFish, &Behavior)>()
        .iter()
    {
        if *behavior != Behavior::AiControlled {
            continue;
        }

        let mut next = AiUpdate {
            entity,
            state: ai.state,
            wander_target: ai.wander_target,
            state_timer: ai.state_timer - scaled_delta,
            intent: None,
        };

        // Eating is a transient resolution step, never carried into the
        // next evaluation
        if next.state == AiState::Eating {
            next.state = AiState::Wandering;
        }

        select_state(&mut next, entity, fish, pos, ai, player.as_ref(), spatial, &mut rng);
        steer(&mut next, entity, fish, pos, ai, player.as_ref(), spatial, &mut rng);

        if let Some(intent) = next.intent.as_mut() {
            intent.speed *= time_scale;
        }

        updates.push(next);
    }

    for update in updates {
        if let Ok(mut ai) = world.get::<&mut AiFish>(update.entity) {
            ai.state = update.state;
            ai.wander_target = update.wander_target;
            ai.state_timer = update.state_timer;
        }
        if let Some(intent) = update.intent {
            let _ = world.insert_one(update.entity, intent);
        }
    }
}

/// The transition policy - first matching rule wins, re-evaluated every tick
fn select_state(
    next: &mut AiUpdate,
    entity: Entity,
    fish: &Fish,
    pos: &Position,
    ai: &AiFish,
    player: Option<&SensedFish>,
    spatial: &dyn SpatialQuery,
    rng: &mut impl Rng,
) {
    if let Some(player) = player {
        let distance = pos.point.distance(&player.point);

        // 1. Survival: a larger player inside flee range always wins
        if player.size > fish.size && distance < ai.flee_range {
            next.state = AiState::FleeingPredator;
            return;
        }

        // 2. A smaller player inside detection range is prey, gated on
        //    aggressiveness
        if player.size < fish.size
            && distance < ai.detection_range
            && rng.gen::<f32>() < ai.aggressiveness
        {
            next.state = AiState::ChasingPrey;
            return;
        }
    }

    // 3. Any other smaller fish nearby, same gate
    if nearest_prey(entity, fish, pos, ai, spatial).is_some()
        && rng.gen::<f32>() < ai.aggressiveness
    {
        next.state = AiState::ChasingPrey;
        return;
    }

    // 4. Social: join a school if enough same-tier neighbors are around
    if rng.gen::<f32>() < ai.schooling_tendency {
        let mates = school_mates(entity, fish, pos, ai, spatial);
        if mates.len() > 2 {
            next.state = AiState::Schooling;
            return;
        }
    }

    // 5. Timer expiry resets to wandering with a fresh target
    if next.state_timer <= 0.0 {
        next.state = AiState::Wandering;
        next.wander_target = new_wander_target(pos.point, ai.wander_radius, rng);
        next.state_timer = ai.state_change_interval;
    }

    // 6. Otherwise the current state is retained
}

/// Convert the active state into a steering target and speed
fn steer(
    next: &mut AiUpdate,
    entity: Entity,
    fish: &Fish,
    pos: &Position,
    ai: &AiFish,
    player: Option<&SensedFish>,
    spatial: &dyn SpatialQuery,
    rng: &mut impl Rng,
) {
    match next.state {
        AiState::Wandering => {
            next.intent = Some(SwimIntent::new(
                next.wander_target,
                fish.swim_speed * AI_WANDER_SPEED,
            ));

            // Regenerate the target on arrival so the fish keeps drifting
            if pos.point.distance(&next.wander_target) < ARRIVAL_RADIUS {
                next.wander_target = new_wander_target(pos.point, ai.wander_radius, rng);
            }
        }
        AiState::ChasingPrey => {
            let player_is_prey = player.map(|p| p.size < fish.size).unwrap_or(false);

            let target = if player_is_prey {
                player.map(|p| p.point)
            } else {
                nearest_prey(entity, fish, pos, ai, spatial).map(|p| p.point)
            };

            match target {
                Some(target) => {
                    next.intent = Some(SwimIntent::new(target, fish.swim_speed * AI_CHASE_SPEED));
                    if pos.point.distance(&target) < ARRIVAL_RADIUS {
                        // Contact; the consumption pass resolves the bite
                        next.state = AiState::Eating;
                    }
                }
                None => {
                    // Prey vanished between ticks - a valid sensed state
                    next.state = AiState::Wandering;
                    next.intent = Some(SwimIntent::new(
                        next.wander_target,
                        fish.swim_speed * AI_WANDER_SPEED,
                    ));
                }
            }
        }
        AiState::FleeingPredator => match player {
            Some(player) => {
                let away = (pos.point - player.point).normalize();
                let target = pos.point + away * 5.0;
                next.intent = Some(SwimIntent::new(target, fish.swim_speed * AI_FLEE_SPEED));

                if pos.point.distance(&player.point) > ai.flee_range * 1.5 {
                    next.state = AiState::Wandering;
                }
            }
            None => {
                next.state = AiState::Wandering;
            }
        },
        AiState::Schooling => {
            let mates = school_mates(entity, fish, pos, ai, spatial);
            if mates.len() < 2 {
                // Not enough of a school left - fall back immediately
                next.state = AiState::Wandering;
                next.intent = Some(SwimIntent::new(
                    next.wander_target,
                    fish.swim_speed * AI_WANDER_SPEED,
                ));
                return;
            }

            let target = pos.point + flock_offset(pos.point, &mates);
            next.intent = Some(SwimIntent::new(target, fish.swim_speed * AI_SCHOOL_SPEED));
        }
        AiState::Eating => {
            // Resolved by the consumption pass this tick; hold position
        }
    }
}

/// Cohesion toward the neighbor centroid (0.5), alignment with the average
/// neighbor heading (0.3), and inverse-distance separation from neighbors
/// inside the separation radius (unweighted sum)
fn flock_offset(point: Vec3, mates: &[SensedFish]) -> Vec3 {
    let count = mates.len() as f32;

    let mut center = Vec3::ZERO;
    let mut average_heading = Vec3::ZERO;
    for mate in mates {
        center += mate.point;
        average_heading += mate.heading;
    }
    center = center * (1.0 / count);
    average_heading = average_heading * (1.0 / count);

    let cohesion = (center - point) * 0.5;
    let alignment = average_heading * 0.3;

    let mut separation = Vec3::ZERO;
    for mate in mates {
        let distance = point.distance(&mate.point);
        if distance > 0.0 && distance < SEPARATION_RADIUS {
            separation += (point - mate.point) * (1.0 / distance);
        }
    }

    cohesion + alignment + separation
}

/// Nearest strictly smaller fish within detection range (the player counts
/// as prey here too; rule ordering handles the larger-player case first)
fn nearest_prey<'a>(
    entity: Entity,
    fish: &Fish,
    pos: &Position,
    ai: &AiFish,
    spatial: &'a dyn SpatialQuery,
) -> Option<SensedFish> {
    spatial
        .nearby(pos.point, ai.detection_range)
        .into_iter()
        .filter(|s| s.entity != entity && s.size < fish.size)
        .min_by(|a, b| {
            let da = a.point.distance_squared(&pos.point);
            let db = b.point.distance_squared(&pos.point);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
}

/// Same-tier AI fish within detection range
fn school_mates(
    entity: Entity,
    fish: &Fish,
    pos: &Position,
    ai: &AiFish,
    spatial: &dyn SpatialQuery,
) -> Vec<SensedFish> {
    spatial
        .nearby(pos.point, ai.detection_range)
        .into_iter()
        .filter(|s| {
            s.entity != entity && s.tier == fish.tier && s.behavior == Behavior::AiControlled
        })
        .copied()
        .collect()
}

/// Random point inside the wander radius, clamped to the water column
pub fn new_wander_target(origin: Vec3, radius: f32, rng: &mut impl Rng) -> Vec3 {
    let target = origin + Vec3::random_in_sphere(rng) * radius;
    target.with_y(target.y.clamp(WATER_COLUMN_MIN_Y, WATER_COLUMN_MAX_Y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SpatialGrid;

    fn spawn_ai(world: &mut World, point: Vec3, size: i32, ai: AiFish) -> Entity {
        world.spawn((
            Fish::new(size, 3.0),
            Position::new(point),
            ai,
            Behavior::AiControlled,
        ))
    }

    fn spawn_player(world: &mut World, point: Vec3, size: i32) -> Entity {
        world.spawn((
            Fish::new(size, 5.0),
            Position::new(point),
            Behavior::PlayerControlled,
        ))
    }

    #[test]
    fn test_flee_priority_overrides_everything() {
        let mut world = World::new();
        // Maximal aggressiveness and schooling cannot outrank survival
        let ai = AiFish::new(1.0, 1.0);
        let entity = spawn_ai(&mut world, Vec3::ZERO, 5, ai);
        spawn_player(&mut world, Vec3::new(3.0, 0.0, 0.0), 50);
        // Prey and schoolmates right next door
        spawn_ai(&mut world, Vec3::new(1.0, 0.0, 0.0), 2, AiFish::default());
        spawn_ai(&mut world, Vec3::new(-1.0, 0.0, 0.0), 5, AiFish::default());
        spawn_ai(&mut world, Vec3::new(0.0, 1.0, 0.0), 5, AiFish::default());
        spawn_ai(&mut world, Vec3::new(0.0, -1.0, 0.0), 5, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let ai = world.get::<&AiFish>(entity).unwrap();
        assert_eq!(ai.state, AiState::FleeingPredator);
    }

    #[test]
    fn test_chases_smaller_fish_when_fully_aggressive() {
        let mut world = World::new();
        let entity = spawn_ai(&mut world, Vec3::ZERO, 10, AiFish::new(1.0, 0.0));
        spawn_ai(&mut world, Vec3::new(5.0, 0.0, 0.0), 4, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let ai = world.get::<&AiFish>(entity).unwrap();
        assert_eq!(ai.state, AiState::ChasingPrey);

        // Chasing produces an intent toward the prey at chase speed
        let intent = world.get::<&SwimIntent>(entity).unwrap();
        assert!((intent.speed - 3.0 * AI_CHASE_SPEED).abs() < 0.001);
        assert!(intent.target.x > 0.0);
    }

    #[test]
    fn test_never_chases_with_zero_aggressiveness() {
        let mut world = World::new();
        let entity = spawn_ai(&mut world, Vec3::ZERO, 10, AiFish::new(0.0, 0.0));
        spawn_ai(&mut world, Vec3::new(5.0, 0.0, 0.0), 4, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        for _ in 0..50 {
            ai_system(&mut world, &grid, 0.1, 1.0);
            let ai = world.get::<&AiFish>(entity).unwrap();
            assert_ne!(ai.state, AiState::ChasingPrey);
        }
    }

    #[test]
    fn test_schooling_requires_three_nearby_mates() {
        let mut world = World::new();
        let entity = spawn_ai(&mut world, Vec3::ZERO, 5, AiFish::new(0.0, 1.0));
        // Only two same-tier mates: rule 4 needs more than 2
        spawn_ai(&mut world, Vec3::new(2.0, 0.0, 0.0), 5, AiFish::default());
        spawn_ai(&mut world, Vec3::new(-2.0, 0.0, 0.0), 5, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let state = world.get::<&AiFish>(entity).unwrap().state;
        assert_ne!(state, AiState::Schooling);
    }

    #[test]
    fn test_schooling_with_enough_mates() {
        let mut world = World::new();
        let entity = spawn_ai(&mut world, Vec3::ZERO, 5, AiFish::new(0.0, 1.0));
        spawn_ai(&mut world, Vec3::new(2.0, 0.0, 0.0), 5, AiFish::default());
        spawn_ai(&mut world, Vec3::new(-2.0, 0.0, 0.0), 5, AiFish::default());
        spawn_ai(&mut world, Vec3::new(0.0, 0.0, 2.0), 5, AiFish::default());

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let state = world.get::<&AiFish>(entity).unwrap().state;
        assert_eq!(state, AiState::Schooling);
    }

    #[test]
    fn test_wander_target_regenerates_on_arrival() {
        let mut world = World::new();
        let mut ai = AiFish::new(0.0, 0.0);
        ai.wander_target = Vec3::new(0.5, 0.0, 0.0); // already within arrival radius
        ai.state_timer = 100.0; // timer must not be the trigger
        let entity = spawn_ai(&mut world, Vec3::ZERO, 5, ai);

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let ai = world.get::<&AiFish>(entity).unwrap();
        assert!(ai.wander_target.distance(&Vec3::ZERO) >= 0.0);
        assert_ne!(ai.wander_target, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_eating_state_is_transient() {
        let mut world = World::new();
        let mut ai = AiFish::new(0.0, 0.0);
        ai.state = AiState::Eating;
        ai.state_timer = 100.0;
        let entity = spawn_ai(&mut world, Vec3::ZERO, 5, ai);

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let state = world.get::<&AiFish>(entity).unwrap().state;
        assert_eq!(state, AiState::Wandering);
    }

    #[test]
    fn test_no_player_degrades_to_wandering() {
        let mut world = World::new();
        let mut ai = AiFish::new(0.0, 0.0);
        ai.state = AiState::FleeingPredator;
        let entity = spawn_ai(&mut world, Vec3::ZERO, 5, ai);

        let grid = SpatialGrid::build(&world, 8.0);
        ai_system(&mut world, &grid, 0.1, 1.0);

        let state = world.get::<&AiFish>(entity).unwrap().state;
        assert_eq!(state, AiState::Wandering);
    }

    #[test]
    fn test_wander_target_stays_in_water_column() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let target = new_wander_target(Vec3::new(0.0, 7.0, 0.0), 10.0, &mut rng);
            assert!(target.y <= 8.0 && target.y >= -8.0);
        }
    }
}
