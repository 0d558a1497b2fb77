//! Common components used across multiple entity types.

use serde::{Deserialize, Serialize};

/// 3D position vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };
    pub const FORWARD: Self = Self { x: 1.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Projection onto the horizontal plane (y zeroed)
    pub fn horizontal(&self) -> Self {
        Self {
            x: self.x,
            y: 0.0,
            z: self.z,
        }
    }

    pub fn with_y(&self, y: f32) -> Self {
        Self { x: self.x, y, z: self.z }
    }

    /// Uniform random point inside the unit sphere (rejection sampled,
    /// falls back to a normalized cube sample if unlucky)
    pub fn random_in_sphere(rng: &mut impl rand::Rng) -> Self {
        for _ in 0..16 {
            let v = Self::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            );
            if v.length() <= 1.0 {
                return v;
            }
        }
        Self::new(
            rng.gen_range(-1.0..=1.0f32),
            rng.gen_range(-1.0..=1.0f32),
            rng.gen_range(-1.0..=1.0f32),
        )
        .normalize()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
        self.z += other.z;
    }
}

/// Axis-aligned bounding box - used for the water volume and spawn areas
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered on the origin with the given total extents
    pub fn centered(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width / 2.0, height / 2.0, depth / 2.0);
        Self {
            min: Vec3::ZERO - half,
            max: half,
        }
    }

    pub fn contains(&self, point: &Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Clamp a point into the box
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    pub fn random_point(&self, rng: &mut impl rand::Rng) -> Vec3 {
        Vec3::new(
            rng.gen_range(self.min.x..=self.max.x),
            rng.gen_range(self.min.y..=self.max.y),
            rng.gen_range(self.min.z..=self.max.z),
        )
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Spatial component - world-space location and unit facing vector.
///
/// The heading is interpolated toward the movement direction by the swim
/// system; it never snaps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub point: Vec3,
    pub heading: Vec3,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            point: Vec3::ZERO,
            heading: Vec3::FORWARD,
        }
    }
}

impl Position {
    pub fn new(point: Vec3) -> Self {
        Self {
            point,
            heading: Vec3::FORWARD,
        }
    }

    pub fn with_heading(mut self, heading: Vec3) -> Self {
        self.heading = heading.normalize();
        self
    }
}
