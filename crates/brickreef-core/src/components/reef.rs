//! Reef decoration components - static scenery assembled from bricks.

use serde::{Deserialize, Serialize};

/// Marks an entity as non-interactive reef scenery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decor {
    FloorPlate,
    Coral(CoralKind),
    Seaweed,
    Rock,
    Treasure,
}

/// Parametric coral families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoralKind {
    Brain,
    Branch,
    Tube,
    Fan,
    Mushroom,
}

impl CoralKind {
    pub const ALL: [CoralKind; 5] = [
        CoralKind::Brain,
        CoralKind::Branch,
        CoralKind::Tube,
        CoralKind::Fan,
        CoralKind::Mushroom,
    ];
}

/// Sway parameters for seaweed; the phase is advanced by the ambient system
/// so a renderer can pose segments from it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Sway {
    pub speed: f32,
    pub amount: f32,
    pub phase: f32,
}

impl Sway {
    pub fn new(speed: f32, amount: f32, phase: f32) -> Self {
        Self {
            speed,
            amount,
            phase,
        }
    }
}
