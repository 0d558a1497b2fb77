//! Spatial query provider - a per-tick snapshot of every fish, bucketed into
//! a uniform grid for radius queries.
//!
//! Behavior systems receive this through the `SpatialQuery` trait instead of
//! scanning the world themselves. The snapshot is read-only and valid for one
//! tick; consumers must re-check that an entity still exists (and is not
//! already consumed) before acting on a result.

use std::collections::HashMap;

use hecs::{Entity, World};

use crate::components::{Behavior, Consumed, Fish, FishTier, Position, Vec3};

/// Typed handle to a sensed fish - everything a behavior system needs,
/// resolved once when the snapshot is built
#[derive(Debug, Clone, Copy)]
pub struct SensedFish {
    pub entity: Entity,
    pub point: Vec3,
    pub heading: Vec3,
    pub size: i32,
    pub tier: FishTier,
    pub behavior: Behavior,
}

/// Radius queries over a point-in-time snapshot
pub trait SpatialQuery {
    /// All sensed fish within `radius` of `origin`
    fn nearby(&self, origin: Vec3, radius: f32) -> Vec<&SensedFish>;

    /// The sensed player, if one exists
    fn player(&self) -> Option<&SensedFish>;
}

/// Uniform hash grid over sensed fish
pub struct SpatialGrid {
    cell_size: f32,
    fish: Vec<SensedFish>,
    cells: HashMap<(i32, i32, i32), Vec<usize>>,
    player_index: Option<usize>,
}

impl SpatialGrid {
    /// Snapshot every live, unconsumed fish in the world
    pub fn build(world: &World, cell_size: f32) -> Self {
        let mut fish = Vec::new();
        let mut cells: HashMap<(i32, i32, i32), Vec<usize>> = HashMap::new();
        let mut player_index = None;

        for (entity, (stats, pos, behavior)) in
            world.query::<(&Fish, &Position, &Behavior)>().iter()
        {
            if world.get::<&Consumed>(entity).is_ok() {
                continue;
            }

            let index = fish.len();
            fish.push(SensedFish {
                entity,
                point: pos.point,
                heading: pos.heading,
                size: stats.size,
                tier: stats.tier,
                behavior: *behavior,
            });

            if *behavior == Behavior::PlayerControlled {
                player_index = Some(index);
            }

            let key = cell_key(pos.point, cell_size);
            cells.entry(key).or_default().push(index);
        }

        Self {
            cell_size,
            fish,
            cells,
            player_index,
        }
    }

    pub fn len(&self) -> usize {
        self.fish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fish.is_empty()
    }
}

fn cell_key(point: Vec3, cell_size: f32) -> (i32, i32, i32) {
    (
        (point.x / cell_size).floor() as i32,
        (point.y / cell_size).floor() as i32,
        (point.z / cell_size).floor() as i32,
    )
}

impl SpatialQuery for SpatialGrid {
    fn nearby(&self, origin: Vec3, radius: f32) -> Vec<&SensedFish> {
        let mut results = Vec::new();
        if self.fish.is_empty() || radius <= 0.0 {
            return results;
        }

        let min = cell_key(origin - Vec3::new(radius, radius, radius), self.cell_size);
        let max = cell_key(origin + Vec3::new(radius, radius, radius), self.cell_size);
        let radius_squared = radius * radius;

        for cx in min.0..=max.0 {
            for cy in min.1..=max.1 {
                for cz in min.2..=max.2 {
                    let Some(indices) = self.cells.get(&(cx, cy, cz)) else {
                        continue;
                    };
                    for &index in indices {
                        let sensed = &self.fish[index];
                        if sensed.point.distance_squared(&origin) <= radius_squared {
                            results.push(sensed);
                        }
                    }
                }
            }
        }

        results
    }

    fn player(&self) -> Option<&SensedFish> {
        self.player_index.map(|i| &self.fish[i])
    }
}
