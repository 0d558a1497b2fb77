//! Timed effect bookkeeping - power-up application, countdowns, expiry.
//!
//! Nothing here blocks: durations are countdown state advanced once per
//! tick, and expiry consequences run inline when a countdown elapses.

use hecs::{Entity, World};
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{ActiveEffects, Fish, PlayerFish, PowerUpKind};
use crate::events::{EventSink, GameEvent};
use crate::systems::consumption::demolish_largest;

/// World-level timed effects that are not tied to one entity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GlobalEffects {
    /// Remaining slow-motion seconds; while positive, AI time runs at half
    /// rate (the player is unaffected)
    pub slow_motion: f32,
}

impl GlobalEffects {
    /// Time scale applied to AI and structure updates
    pub fn ai_time_scale(&self) -> f32 {
        if self.slow_motion > 0.0 {
            0.5
        } else {
            1.0
        }
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        self.slow_motion = (self.slow_motion - delta_seconds).max(0.0);
    }
}

/// Apply a collected power-up to the player
pub fn apply_power_up(
    world: &mut World,
    player: Entity,
    kind: PowerUpKind,
    globals: &mut GlobalEffects,
    sink: &mut dyn EventSink,
    rng: &mut impl Rng,
) {
    debug!("power-up applied: {:?}", kind);
    match kind {
        PowerUpKind::SizeBoost => {
            if let Ok(mut fish) = world.get::<&mut Fish>(player) {
                fish.gain(10);
            }
        }
        PowerUpKind::Demolisher => {
            demolish_largest(world, sink, rng);
        }
        PowerUpKind::SlowMotion => {
            globals.slow_motion = kind.duration();
        }
        PowerUpKind::SpeedBoost | PowerUpKind::Magnet | PowerUpKind::Shield => {
            // Ensure the tracking collection exists, then start the countdown
            if world.get::<&ActiveEffects>(player).is_err() {
                let _ = world.insert_one(player, ActiveEffects::new());
            }
            if let Ok(mut effects) = world.get::<&mut ActiveEffects>(player) {
                effects.apply(kind);
            }
            if kind == PowerUpKind::Shield {
                if let Ok(mut p) = world.get::<&mut PlayerFish>(player) {
                    p.shielded = true;
                }
            }
        }
    }
}

/// Advance every countdown: per-entity effects, the invincibility window,
/// and emit expiry notifications
pub fn effects_system(world: &mut World, delta_seconds: f32, sink: &mut dyn EventSink) {
    let mut expirations: Vec<(Entity, PowerUpKind)> = Vec::new();

    for (entity, effects) in world.query_mut::<&mut ActiveEffects>() {
        for kind in effects.advance(delta_seconds) {
            expirations.push((entity, kind));
        }
    }

    for (entity, kind) in expirations {
        if kind == PowerUpKind::Shield {
            if let Ok(mut p) = world.get::<&mut PlayerFish>(entity) {
                p.shielded = false;
            }
        }
        sink.notify(GameEvent::PowerUpExpired { kind });
    }

    for (_, player) in world.query_mut::<&mut PlayerFish>() {
        player.invincibility = (player.invincibility - delta_seconds).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Behavior, Position, Vec3};
    use crate::events::EventLog;

    fn spawn_player(world: &mut World) -> Entity {
        world.spawn((
            Fish::new(10, 4.0),
            Position::new(Vec3::ZERO),
            PlayerFish::default(),
            Behavior::PlayerControlled,
        ))
    }

    #[test]
    fn test_size_boost_is_instant() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        let mut rng = rand::thread_rng();

        apply_power_up(
            &mut world,
            player,
            PowerUpKind::SizeBoost,
            &mut globals,
            &mut log,
            &mut rng,
        );

        assert_eq!(world.get::<&Fish>(player).unwrap().size, 20);
        assert!(world.get::<&ActiveEffects>(player).is_err());
    }

    #[test]
    fn test_shield_sets_and_clears_flag() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        let mut globals = GlobalEffects::default();
        let mut log = EventLog::new();
        let mut rng = rand::thread_rng();

        apply_power_up(
            &mut world,
            player,
            PowerUpKind::Shield,
            &mut globals,
            &mut log,
            &mut rng,
        );
        assert!(world.get::<&PlayerFish>(player).unwrap().shielded);

        effects_system(&mut world, 6.0, &mut log);
        assert!(!world.get::<&PlayerFish>(player).unwrap().shielded);
        assert!(log.contains(|e| matches!(
            e,
            GameEvent::PowerUpExpired {
                kind: PowerUpKind::Shield
            }
        )));
    }

    #[test]
    fn test_slow_motion_scales_ai_time() {
        let mut globals = GlobalEffects::default();
        assert_eq!(globals.ai_time_scale(), 1.0);

        globals.slow_motion = 5.0;
        assert_eq!(globals.ai_time_scale(), 0.5);

        globals.advance(5.5);
        assert_eq!(globals.ai_time_scale(), 1.0);
    }

    #[test]
    fn test_invincibility_counts_down() {
        let mut world = World::new();
        let player = spawn_player(&mut world);
        world.get::<&mut PlayerFish>(player).unwrap().invincibility = 2.0;

        let mut log = EventLog::new();
        effects_system(&mut world, 1.5, &mut log);
        assert!(world.get::<&PlayerFish>(player).unwrap().invincibility > 0.0);

        effects_system(&mut world, 1.0, &mut log);
        assert_eq!(world.get::<&PlayerFish>(player).unwrap().invincibility, 0.0);
    }
}
