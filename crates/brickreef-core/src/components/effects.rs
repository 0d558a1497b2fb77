//! Power-up components and per-entity timed effect tracking.
//!
//! Every duration is countdown state advanced by the tick loop; expiry logic
//! runs inline when the countdown elapses. Destroying an entity removes its
//! effect collection with it, so no continuation can fire against a dead
//! entity.

use serde::{Deserialize, Serialize};

/// The closed set of power-up modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Doubled swim speed for the duration
    SpeedBoost,
    /// Pulls nearby loose bricks and studs toward the player
    Magnet,
    /// Blocks the damage path for the duration
    Shield,
    /// Instant size increase
    SizeBoost,
    /// Halves AI time for the duration (the player is unaffected)
    SlowMotion,
    /// Instantly breaks apart the largest AI fish
    Demolisher,
}

impl PowerUpKind {
    /// Effect duration in seconds; 0 for instant effects
    pub fn duration(&self) -> f32 {
        match self {
            PowerUpKind::SpeedBoost => 5.0,
            PowerUpKind::Magnet => 8.0,
            PowerUpKind::Shield => 5.0,
            PowerUpKind::SizeBoost => 0.0,
            PowerUpKind::SlowMotion => 5.0,
            PowerUpKind::Demolisher => 0.0,
        }
    }

    pub fn is_instant(&self) -> bool {
        self.duration() <= 0.0
    }
}

/// Floating pickup entity
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
}

/// One running timed effect
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: PowerUpKind,
    pub remaining: f32,
}

/// Collection of running timed effects on one entity.
///
/// Modifiers are derived from the active set each query (e.g. the speed
/// multiplier) rather than written into the stats and restored later, so
/// overlapping pickups of the same kind cannot corrupt the base value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub effects: Vec<ActiveEffect>,
}

impl ActiveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or refresh) a timed effect
    pub fn apply(&mut self, kind: PowerUpKind) {
        let duration = kind.duration();
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == kind) {
            existing.remaining = existing.remaining.max(duration);
        } else {
            self.effects.push(ActiveEffect {
                kind,
                remaining: duration,
            });
        }
    }

    pub fn has(&self, kind: PowerUpKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Combined swim-speed multiplier from the active set
    pub fn speed_multiplier(&self) -> f32 {
        if self.has(PowerUpKind::SpeedBoost) {
            2.0
        } else {
            1.0
        }
    }

    /// Count down all effects; returns the kinds that expired this tick
    pub fn advance(&mut self, delta_seconds: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        for effect in &mut self.effects {
            effect.remaining -= delta_seconds;
            if effect.remaining <= 0.0 {
                expired.push(effect.kind);
            }
        }
        self.effects.retain(|e| e.remaining > 0.0);
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        assert_eq!(PowerUpKind::SpeedBoost.duration(), 5.0);
        assert_eq!(PowerUpKind::Magnet.duration(), 8.0);
        assert!(PowerUpKind::SizeBoost.is_instant());
        assert!(PowerUpKind::Demolisher.is_instant());
    }

    #[test]
    fn test_apply_and_expire() {
        let mut effects = ActiveEffects::new();
        effects.apply(PowerUpKind::SpeedBoost);
        assert!(effects.has(PowerUpKind::SpeedBoost));
        assert_eq!(effects.speed_multiplier(), 2.0);

        let expired = effects.advance(6.0);
        assert_eq!(expired, vec![PowerUpKind::SpeedBoost]);
        assert!(!effects.has(PowerUpKind::SpeedBoost));
        assert_eq!(effects.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_reapply_refreshes_instead_of_stacking() {
        let mut effects = ActiveEffects::new();
        effects.apply(PowerUpKind::Shield);
        effects.advance(3.0);
        effects.apply(PowerUpKind::Shield);

        assert_eq!(effects.effects.len(), 1);
        assert!((effects.effects[0].remaining - 5.0).abs() < 0.001);
    }
}
