//! Population-capped spawning - level waves, continuous respawn, power-up
//! drops, and the ambient bubble/sway loops.
//!
//! Every periodic action is a cooldown timer that performs one action on
//! expiry and resets; nothing blocks.

use hecs::World;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    Behavior, BoundingBox, Bubble, BubbleEmitter, Fish, FishTier, Lifetime, PlayerFish, Position,
    PowerUp, PowerUpKind, Sway, Vec3,
};
use crate::events::{EventSink, GameEvent};
use crate::generation::spawn_ai_fish;

/// Seconds a bubble lives before popping
const BUBBLE_LIFETIME: f32 = 10.0;

/// Spawner tuning - population ceilings and cooldowns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnerConfig {
    /// Volume fish spawn into
    pub spawn_area: BoundingBox,
    /// Fish never spawn closer to the player than this
    pub min_spawn_distance: f32,
    /// Cooldown between continuous respawn passes
    pub respawn_interval: f32,
    /// Cooldown between power-up drops
    pub power_up_interval: f32,
    pub max_power_ups: usize,
    pub max_tiny: usize,
    pub max_small: usize,
    pub max_medium: usize,
    pub max_large: usize,
    pub max_giant: usize,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_area: BoundingBox::centered(40.0, 20.0, 40.0),
            min_spawn_distance: 10.0,
            respawn_interval: 5.0,
            power_up_interval: 20.0,
            max_power_ups: 3,
            max_tiny: 30,
            max_small: 20,
            max_medium: 10,
            max_large: 5,
            max_giant: 2,
        }
    }
}

impl SpawnerConfig {
    /// Population ceiling for a tier
    pub fn cap(&self, tier: FishTier) -> usize {
        match tier {
            FishTier::Tiny => self.max_tiny,
            FishTier::Small => self.max_small,
            FishTier::Medium => self.max_medium,
            FishTier::Large => self.max_large,
            FishTier::Giant => self.max_giant,
            FishTier::Boss => 1,
        }
    }
}

/// Wave and respawn driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishSpawner {
    pub config: SpawnerConfig,
    respawn_timer: f32,
    power_up_timer: f32,
}

impl FishSpawner {
    pub fn new(config: SpawnerConfig) -> Self {
        let respawn_timer = config.respawn_interval;
        let power_up_timer = config.power_up_interval;
        Self {
            config,
            respawn_timer,
            power_up_timer,
        }
    }

    /// Count live non-player fish of a tier
    pub fn count_tier(world: &World, tier: FishTier) -> usize {
        world
            .query::<(&Fish, &Behavior)>()
            .iter()
            .filter(|(_, (fish, behavior))| {
                fish.tier == tier && **behavior != Behavior::PlayerControlled
            })
            .count()
    }

    /// Populate the reef for a level. Larger tiers only appear from level 3,
    /// giants from level 5, and a boss every fifth level.
    pub fn spawn_wave(
        &mut self,
        world: &mut World,
        level: u32,
        sink: &mut dyn EventSink,
        rng: &mut impl Rng,
    ) {
        let level_i = level as usize;
        self.spawn_capped(world, FishTier::Tiny, 10 + level_i * 2, rng);
        self.spawn_capped(world, FishTier::Small, 5 + level_i, rng);
        self.spawn_capped(world, FishTier::Medium, 2 + level_i / 2, rng);
        if level >= 3 {
            self.spawn_capped(world, FishTier::Large, level_i / 2, rng);
        }
        if level >= 5 {
            self.spawn_capped(world, FishTier::Giant, 1, rng);
        }

        if level % 5 == 0 {
            if let Some(position) = self.valid_position(world, rng) {
                // Bosses patrol the mid-column
                let position = position.with_y(0.0);
                spawn_ai_fish(world, FishTier::Boss, position, rng);
                info!("boss spawned at level {}", level);
                sink.notify(GameEvent::BossSpawned { position });
            }
        }

        info!(
            "wave spawned for level {}: {} fish in water",
            level,
            world.query::<(&Fish, &Behavior)>().iter().count()
        );
    }

    /// Cooldown-driven maintenance: top up depleted tiers and drop the
    /// occasional power-up
    pub fn update(&mut self, world: &mut World, delta_seconds: f32, rng: &mut impl Rng) {
        self.respawn_timer -= delta_seconds;
        if self.respawn_timer <= 0.0 {
            self.respawn_timer = self.config.respawn_interval;

            // Tiers below half their ceiling get topped up
            if Self::count_tier(world, FishTier::Tiny) < self.config.max_tiny / 2 {
                self.spawn_capped(world, FishTier::Tiny, 5, rng);
            }
            if Self::count_tier(world, FishTier::Small) < self.config.max_small / 2 {
                self.spawn_capped(world, FishTier::Small, 3, rng);
            }
            if Self::count_tier(world, FishTier::Medium) < self.config.max_medium / 2 {
                self.spawn_capped(world, FishTier::Medium, 2, rng);
            }
        }

        self.power_up_timer -= delta_seconds;
        if self.power_up_timer <= 0.0 {
            self.power_up_timer = self.config.power_up_interval;
            let current = world.query::<&PowerUp>().iter().count();
            if current < self.config.max_power_ups {
                self.spawn_power_up(world, rng);
            }
        }
    }

    /// Spawn up to `count` fish of a tier, respecting its ceiling
    fn spawn_capped(
        &self,
        world: &mut World,
        tier: FishTier,
        count: usize,
        rng: &mut impl Rng,
    ) {
        let current = Self::count_tier(world, tier);
        let cap = self.config.cap(tier);
        let room = cap.saturating_sub(current);

        for _ in 0..count.min(room) {
            if let Some(position) = self.valid_position(world, rng) {
                spawn_ai_fish(world, tier, position, rng);
            }
        }
        debug!("spawned {} {:?} (cap {})", count.min(room), tier, cap);
    }

    /// A spawn point away from the player; bounded retry, then accept
    fn valid_position(&self, world: &World, rng: &mut impl Rng) -> Option<Vec3> {
        let player_point = world
            .query::<(&Position, &PlayerFish)>()
            .iter()
            .next()
            .map(|(_, (pos, _))| pos.point);

        let mut position = self.config.spawn_area.random_point(rng);
        if let Some(player_point) = player_point {
            let mut attempts = 0;
            while position.distance(&player_point) < self.config.min_spawn_distance
                && attempts < 50
            {
                position = self.config.spawn_area.random_point(rng);
                attempts += 1;
            }
        }
        Some(position)
    }

    fn spawn_power_up(&self, world: &mut World, rng: &mut impl Rng) {
        const KINDS: [PowerUpKind; 6] = [
            PowerUpKind::SpeedBoost,
            PowerUpKind::Magnet,
            PowerUpKind::Shield,
            PowerUpKind::SizeBoost,
            PowerUpKind::SlowMotion,
            PowerUpKind::Demolisher,
        ];
        let kind = KINDS[rng.gen_range(0..KINDS.len())];
        let position = self.config.spawn_area.random_point(rng);
        world.spawn((PowerUp { kind }, Position::new(position)));
        debug!("power-up dropped: {:?}", kind);
    }
}

impl Default for FishSpawner {
    fn default() -> Self {
        Self::new(SpawnerConfig::default())
    }
}

/// Ambient loops: bubble emitters and seaweed sway phases
pub fn ambient_system(world: &mut World, delta_seconds: f32) {
    let mut rng = rand::thread_rng();
    let mut bursts: Vec<(Vec3, u32)> = Vec::new();

    for (_, (emitter, pos)) in world.query_mut::<(&mut BubbleEmitter, &Position)>() {
        emitter.timer -= delta_seconds;
        if emitter.timer <= 0.0 {
            // Re-arm with a little jitter so emitters drift out of phase
            emitter.timer = emitter.interval + rand_jitter(&mut rng);
            bursts.push((pos.point, emitter.per_emit));
        }
    }

    for (origin, count) in bursts {
        for _ in 0..count {
            let offset = Vec3::new(
                rng.gen_range(-0.5..0.5),
                0.0,
                rng.gen_range(-0.5..0.5),
            );
            let point = origin + offset;
            world.spawn((
                Position::new(point),
                Bubble {
                    rise_speed: 2.0,
                    wobble_amount: 0.3,
                    phase: rng.gen_range(0.0..100.0),
                    anchor_x: point.x,
                    anchor_z: point.z,
                },
                Lifetime::new(BUBBLE_LIFETIME),
            ));
        }
    }

    for (_, sway) in world.query_mut::<&mut Sway>() {
        sway.phase += delta_seconds * sway.speed;
    }
}

fn rand_jitter(rng: &mut impl Rng) -> f32 {
    rng.gen_range(-0.5..0.5)
}
