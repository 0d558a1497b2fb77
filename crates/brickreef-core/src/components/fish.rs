//! Fish components: stats, tiers, behavior tags, brick bodies, AI state.

use serde::{Deserialize, Serialize};

use super::common::Vec3;

/// Core fish stats - present on every fish-like actor (player, AI, structure)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fish {
    /// Brick-mass proxy; never negative
    pub size: i32,
    /// Base swim speed in units per second
    pub swim_speed: f32,
    /// Size-derived category, kept in sync whenever size changes
    pub tier: FishTier,
}

impl Fish {
    pub fn new(size: i32, swim_speed: f32) -> Self {
        let size = size.max(0);
        Self {
            size,
            swim_speed,
            tier: FishTier::for_size(size),
        }
    }

    /// Increase size and re-derive the tier
    pub fn gain(&mut self, amount: i32) {
        self.size += amount.max(0);
        self.tier = FishTier::for_size(self.size);
    }

    /// Decrease size (floored at zero) and re-derive the tier
    pub fn shrink(&mut self, amount: i32) {
        self.size = (self.size - amount.max(0)).max(0);
        self.tier = FishTier::for_size(self.size);
    }
}

/// Size-keyed category from tiny to boss
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FishTier {
    Tiny,
    Small,
    Medium,
    Large,
    Giant,
    Boss,
}

impl FishTier {
    pub const ALL: [FishTier; 6] = [
        FishTier::Tiny,
        FishTier::Small,
        FishTier::Medium,
        FishTier::Large,
        FishTier::Giant,
        FishTier::Boss,
    ];

    /// Map a size onto its tier (breakpoints ascending: 5, 10, 20, 40, 60)
    pub fn for_size(size: i32) -> Self {
        if size >= 60 {
            FishTier::Boss
        } else if size >= 40 {
            FishTier::Giant
        } else if size >= 20 {
            FishTier::Large
        } else if size >= 10 {
            FishTier::Medium
        } else if size >= 5 {
            FishTier::Small
        } else {
            FishTier::Tiny
        }
    }

    /// Representative size for a freshly assembled fish of this tier
    pub fn spawn_size(&self) -> i32 {
        match self {
            FishTier::Tiny => 3,
            FishTier::Small => 8,
            FishTier::Medium => 15,
            FishTier::Large => 30,
            FishTier::Giant => 50,
            FishTier::Boss => 70,
        }
    }

    /// Base swim speed for a freshly assembled fish of this tier
    pub fn spawn_speed(&self) -> f32 {
        match self {
            FishTier::Tiny => 3.5,
            FishTier::Small => 3.0,
            FishTier::Medium => 2.8,
            FishTier::Large => 2.5,
            FishTier::Giant => 2.2,
            FishTier::Boss => 2.0,
        }
    }
}

/// Behavioral role, selected at construction. Systems switch on this tag
/// instead of dispatching through a fish trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    /// Driven by `PlayerInput`
    PlayerControlled,
    /// Full wander/chase/flee/school state machine
    AiControlled,
    /// Brick structure with the simpler chase-or-flee steering preset
    Static,
}

/// Brick shape vocabulary for assembled bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrickShape {
    Stud1x1,
    Brick1x2,
    Brick2x2,
    Brick2x4,
    Plate,
    Slope,
    Cylinder1x1,
    Cone1x1,
}

/// RGB color of a brick (0.0 - 1.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrickColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl BrickColor {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// One brick in an assembled body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BrickPart {
    pub shape: BrickShape,
    /// Local offset from the body origin
    pub offset: Vec3,
    /// Local euler rotation in degrees
    pub rotation: Vec3,
    pub color: BrickColor,
}

impl BrickPart {
    pub fn new(shape: BrickShape, offset: Vec3, rotation: Vec3, color: BrickColor) -> Self {
        Self {
            shape,
            offset,
            rotation,
            color,
        }
    }
}

/// The assembled brick body of a fish or structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Body {
    pub parts: Vec<BrickPart>,
}

impl Body {
    pub fn new(parts: Vec<BrickPart>) -> Self {
        Self { parts }
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Color of the first (hull) brick, used when appending growth bricks
    pub fn hull_color(&self) -> BrickColor {
        self.parts.first().map(|p| p.color).unwrap_or(BrickColor::WHITE)
    }

    /// Detach the last-attached part, if any
    pub fn pop_part(&mut self) -> Option<BrickPart> {
        self.parts.pop()
    }
}

/// AI behavioral state - exactly one active per AI fish.
///
/// `Eating` is a transient resolution step; the next state evaluation leaves
/// it immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    Wandering,
    ChasingPrey,
    FleeingPredator,
    Schooling,
    Eating,
}

/// Per-fish AI parameters and current state
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiFish {
    pub detection_range: f32,
    pub flee_range: f32,
    pub wander_radius: f32,
    pub state_change_interval: f32,
    /// Probability per evaluation of taking a chase opportunity (0.0 - 1.0)
    pub aggressiveness: f32,
    /// Probability per evaluation of joining a school (0.0 - 1.0)
    pub schooling_tendency: f32,
    pub state: AiState,
    pub wander_target: Vec3,
    pub state_timer: f32,
}

impl AiFish {
    pub fn new(aggressiveness: f32, schooling_tendency: f32) -> Self {
        Self {
            detection_range: 15.0,
            flee_range: 8.0,
            wander_radius: 10.0,
            state_change_interval: 3.0,
            aggressiveness: aggressiveness.clamp(0.0, 1.0),
            schooling_tendency: schooling_tendency.clamp(0.0, 1.0),
            state: AiState::Wandering,
            wander_target: Vec3::ZERO,
            state_timer: 0.0,
        }
    }
}

impl Default for AiFish {
    fn default() -> Self {
        Self::new(0.5, 0.3)
    }
}

/// Steering state for `Behavior::Static` brick structures - a heading picked
/// on a timer instead of a full state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StructureSteering {
    pub detection_range: f32,
    pub wander_direction: Vec3,
    pub wander_timer: f32,
}

impl Default for StructureSteering {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            wander_direction: Vec3::FORWARD,
            wander_timer: 0.0,
        }
    }
}

/// Movement intent produced by a behavior system for this tick, consumed
/// (and removed) by the swim system
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwimIntent {
    pub target: Vec3,
    pub speed: f32,
    /// Clamp steering to the horizontal plane (structure variant)
    pub planar: bool,
}

impl SwimIntent {
    pub fn new(target: Vec3, speed: f32) -> Self {
        Self {
            target,
            speed,
            planar: false,
        }
    }

    pub fn planar(target: Vec3, speed: f32) -> Self {
        Self {
            target,
            speed,
            planar: true,
        }
    }
}

/// Claim marker set by the first consumer to resolve against this entity.
/// Everything downstream checks it before applying consequences, making the
/// destroy path idempotent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Consumed;
