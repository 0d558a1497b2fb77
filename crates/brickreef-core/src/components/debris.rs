//! Debris and ambient components: loose bricks, studs, bubbles, lifetimes.

use serde::{Deserialize, Serialize};

use super::common::Vec3;

/// Collectible brick detached from a broken body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LooseBrick {
    pub value: i32,
}

impl LooseBrick {
    pub fn new(value: i32) -> Self {
        Self {
            value: value.max(1),
        }
    }
}

/// Collectible stud currency scattered when a fish breaks apart
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stud {
    pub value: i32,
}

impl Stud {
    pub fn new(value: i32) -> Self {
        Self {
            value: value.max(1),
        }
    }
}

/// Remaining seconds before the entity is removed from the simulation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Count down; returns true once expired
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        self.remaining -= delta_seconds;
        self.remaining <= 0.0
    }
}

/// Ballistic drift for ejected debris - impulse velocity plus spin, both
/// damped toward rest by the debris system
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DebrisMotion {
    pub velocity: Vec3,
    pub spin: Vec3,
}

impl DebrisMotion {
    pub fn new(velocity: Vec3, spin: Vec3) -> Self {
        Self { velocity, spin }
    }
}

/// Rising, wobbling bubble
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bubble {
    pub rise_speed: f32,
    pub wobble_amount: f32,
    /// Wobble phase offset so bubbles don't move in lockstep
    pub phase: f32,
    /// Anchor in the horizontal plane the wobble oscillates around
    pub anchor_x: f32,
    pub anchor_z: f32,
}

/// Periodic bubble source - a cooldown that emits a burst and resets
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BubbleEmitter {
    pub interval: f32,
    pub timer: f32,
    pub per_emit: u32,
}

impl BubbleEmitter {
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            timer: interval,
            per_emit: 3,
        }
    }
}
