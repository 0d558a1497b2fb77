//! Player-specific components: progression counters and movement intent.

use serde::{Deserialize, Serialize};

use super::common::Vec3;

/// Player progression state - studs, growth banking, damage windows
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerFish {
    /// Currency collected from scattered studs
    pub studs: i32,
    /// Total loose bricks absorbed
    pub bricks_collected: i32,
    /// Growth banked toward the next size-up
    pub growth_progress: i32,
    /// Banked growth required for the next size-up; scales by 1.5 per growth
    pub bricks_to_grow: i32,
    /// Reach of the mouth when eating and collecting
    pub eat_range: f32,
    /// Seconds of invincibility remaining after taking damage
    pub invincibility: f32,
    /// Set while a shield power-up is active
    pub shielded: bool,
}

impl Default for PlayerFish {
    fn default() -> Self {
        Self {
            studs: 0,
            bricks_collected: 0,
            growth_progress: 0,
            bricks_to_grow: 10,
            eat_range: 1.0,
            invincibility: 0.0,
            shielded: false,
        }
    }
}

impl PlayerFish {
    /// Damage only applies when neither invincible nor shielded
    pub fn is_vulnerable(&self) -> bool {
        self.invincibility <= 0.0 && !self.shielded
    }

    /// Bank growth progress; returns true when the growth threshold was
    /// crossed (progress resets and the threshold scales up by 1.5)
    pub fn bank_growth(&mut self, amount: i32) -> bool {
        self.growth_progress += amount.max(0);
        if self.growth_progress >= self.bricks_to_grow {
            self.growth_progress = 0;
            self.bricks_to_grow = (self.bricks_to_grow as f32 * 1.5).round() as i32;
            true
        } else {
            false
        }
    }
}

/// Externally-polled movement intent for the player. Input devices are a
/// boundary concern; the simulation only sees the resulting direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Desired swim direction; zero means idle
    pub direction: Vec3,
    /// Extra thrust (half base speed on top)
    pub boost: bool,
}

impl PlayerInput {
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction,
            boost: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_growth_threshold() {
        let mut player = PlayerFish::default();
        assert!(!player.bank_growth(4));
        assert_eq!(player.growth_progress, 4);

        assert!(player.bank_growth(6));
        assert_eq!(player.growth_progress, 0);
        assert_eq!(player.bricks_to_grow, 15);
    }

    #[test]
    fn test_vulnerability_windows() {
        let mut player = PlayerFish::default();
        assert!(player.is_vulnerable());

        player.invincibility = 2.0;
        assert!(!player.is_vulnerable());

        player.invincibility = 0.0;
        player.shielded = true;
        assert!(!player.is_vulnerable());
    }
}
