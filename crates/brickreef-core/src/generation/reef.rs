//! Reef generation - sand floor, corals, seaweed, rocks, treasure, and
//! bubble emitters, all assembled from bricks.

use hecs::World;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    Body, BrickColor, BrickPart, BrickShape, BubbleEmitter, CoralKind, Decor, Position, Sway,
    Vec3,
};

use super::fish::spawn_structure;

/// Coral palette
const CORAL_COLORS: [BrickColor; 5] = [
    BrickColor { r: 1.0, g: 0.4, b: 0.5 },
    BrickColor { r: 1.0, g: 0.6, b: 0.3 },
    BrickColor { r: 0.8, g: 0.4, b: 0.8 },
    BrickColor { r: 1.0, g: 0.9, b: 0.5 },
    BrickColor { r: 0.4, g: 0.9, b: 0.9 },
];

/// Configuration for reef generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReefConfig {
    pub name: String,
    /// Horizontal extent of the reef floor
    pub width: f32,
    pub depth: f32,
    /// Height of the sea floor
    pub floor_y: f32,
    pub coral_count: usize,
    pub seaweed_count: usize,
    pub rock_count: usize,
    pub treasure_count: usize,
    pub emitter_count: usize,
    /// Hostile brick structures placed at generation time
    pub structure_count: usize,
}

impl Default for ReefConfig {
    fn default() -> Self {
        Self {
            name: "Brick Reef".to_string(),
            width: 50.0,
            depth: 30.0,
            floor_y: -10.0,
            coral_count: 20,
            seaweed_count: 30,
            rock_count: 15,
            treasure_count: 5,
            emitter_count: 10,
            structure_count: 4,
        }
    }
}

/// Summary of what generation produced (counts only - entities are found by
/// querying the world)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReefLayout {
    pub name: String,
    pub floor_plates: usize,
    pub corals: usize,
    pub seaweed: usize,
    pub rocks: usize,
    pub treasures: usize,
    pub emitters: usize,
    pub structures: usize,
}

/// Generate the full reef into the world
pub fn generate_reef(world: &mut World, config: &ReefConfig, rng: &mut impl Rng) -> ReefLayout {
    let floor_plates = build_sea_floor(world, config, rng);

    for _ in 0..config.coral_count {
        let kind = CoralKind::ALL[rng.gen_range(0..CoralKind::ALL.len())];
        let color = CORAL_COLORS[rng.gen_range(0..CORAL_COLORS.len())];
        let position = floor_position(config, rng);
        let body = build_coral(kind, color, rng);
        world.spawn((Position::new(position), Decor::Coral(kind), body));
    }

    for _ in 0..config.seaweed_count {
        let position = floor_position(config, rng);
        let body = build_seaweed(rng);
        world.spawn((
            Position::new(position),
            Decor::Seaweed,
            body,
            Sway::new(1.0, 10.0, rng.gen_range(0.0..100.0)),
        ));
    }

    for _ in 0..config.rock_count {
        let position = floor_position(config, rng);
        let body = build_rock(rng);
        world.spawn((Position::new(position), Decor::Rock, body));
    }

    for _ in 0..config.treasure_count {
        let position = floor_position(config, rng);
        let body = build_treasure();
        world.spawn((Position::new(position), Decor::Treasure, body));
    }

    for _ in 0..config.emitter_count {
        let position = floor_position(config, rng);
        world.spawn((
            Position::new(position),
            BubbleEmitter::new(2.0 + rng.gen_range(-0.5..0.5)),
        ));
    }

    for _ in 0..config.structure_count {
        let position = floor_position(config, rng).with_y(config.floor_y + 1.0);
        let size = rng.gen_range(4..=12);
        spawn_structure(world, size, position, rng);
    }

    ReefLayout {
        name: config.name.clone(),
        floor_plates,
        corals: config.coral_count,
        seaweed: config.seaweed_count,
        rocks: config.rock_count,
        treasures: config.treasure_count,
        emitters: config.emitter_count,
        structures: config.structure_count,
    }
}

/// Random spot just above the sea floor
fn floor_position(config: &ReefConfig, rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-config.width / 2.0..config.width / 2.0),
        config.floor_y + 0.5,
        rng.gen_range(-config.depth / 2.0..config.depth / 2.0),
    )
}

/// Tile the floor with sand plates, one entity per 2x2 tile
fn build_sea_floor(world: &mut World, config: &ReefConfig, rng: &mut impl Rng) -> usize {
    let tiles_x = (config.width / 2.0).ceil() as i32;
    let tiles_z = (config.depth / 2.0).ceil() as i32;
    let mut count = 0;

    for x in -tiles_x / 2..tiles_x / 2 {
        for z in -tiles_z / 2..tiles_z / 2 {
            let sand = BrickColor::new(
                0.9 + rng.gen_range(-0.1..0.1),
                0.8 + rng.gen_range(-0.1..0.1),
                0.6 + rng.gen_range(-0.1..0.1),
            );
            world.spawn((
                Position::new(Vec3::new(x as f32 * 2.0, config.floor_y, z as f32 * 2.0)),
                Decor::FloorPlate,
                Body::new(vec![BrickPart::new(
                    BrickShape::Plate,
                    Vec3::ZERO,
                    Vec3::ZERO,
                    sand,
                )]),
            ));
            count += 1;
        }
    }

    count
}

/// Coral families share a palette but differ in silhouette
pub fn build_coral(kind: CoralKind, color: BrickColor, rng: &mut impl Rng) -> Body {
    match kind {
        CoralKind::Brain => brain_coral(color),
        CoralKind::Branch => {
            let mut parts = Vec::new();
            grow_branch(&mut parts, Vec3::ZERO, Vec3::UP, 4, 0, color, rng);
            Body::new(parts)
        }
        CoralKind::Tube => tube_coral(color, rng),
        CoralKind::Fan => fan_coral(color),
        CoralKind::Mushroom => mushroom_coral(color),
    }
}

/// Concentric brick rings, shrinking per layer
fn brain_coral(color: BrickColor) -> Body {
    let layers = 4;
    let base_radius = 2.0_f32;
    let mut parts = Vec::new();

    for layer in 0..layers {
        let radius = base_radius * (1.0 - layer as f32 / layers as f32);
        let bricks_in_layer = ((radius * 4.0).round() as usize).max(1);

        for i in 0..bricks_in_layer {
            let angle = (360.0 / bricks_in_layer as f32) * i as f32;
            let radians = angle.to_radians();
            parts.push(BrickPart::new(
                BrickShape::Stud1x1,
                Vec3::new(
                    radians.cos() * radius,
                    layer as f32 * 0.3,
                    radians.sin() * radius,
                ),
                Vec3::ZERO,
                color,
            ));
        }
    }

    Body::new(parts)
}

/// Recursive branching: each segment may fork into a tilted child branch
fn grow_branch(
    parts: &mut Vec<BrickPart>,
    position: Vec3,
    direction: Vec3,
    length: i32,
    generation: i32,
    color: BrickColor,
    rng: &mut impl Rng,
) {
    if generation > 3 || length <= 0 {
        return;
    }

    for i in 0..length {
        let point = position + direction * (i as f32 * 0.5);
        parts.push(BrickPart::new(
            BrickShape::Cylinder1x1,
            point,
            Vec3::ZERO,
            color,
        ));

        if rng.gen::<f32>() > 0.6 && generation < 3 {
            // Tilt the child direction away from the parent
            let tilt = Vec3::new(
                rng.gen_range(-0.7..0.7),
                1.0,
                rng.gen_range(-0.7..0.7),
            )
            .normalize();
            grow_branch(parts, point, tilt, length - 1, generation + 1, color, rng);
        }
    }
}

/// Clustered columns capped with a wider ring
fn tube_coral(color: BrickColor, rng: &mut impl Rng) -> Body {
    let tube_count = rng.gen_range(3..7);
    let mut parts = Vec::new();

    for _ in 0..tube_count {
        let base = Vec3::random_in_sphere(rng).horizontal();
        let height = rng.gen_range(3..8);

        for h in 0..height {
            parts.push(BrickPart::new(
                BrickShape::Cylinder1x1,
                base + Vec3::UP * (h as f32 * 0.4),
                Vec3::ZERO,
                color,
            ));
        }
        parts.push(BrickPart::new(
            BrickShape::Cone1x1,
            base + Vec3::UP * (height as f32 * 0.4),
            Vec3::ZERO,
            color,
        ));
    }

    Body::new(parts)
}

/// Triangular wall of bricks, tallest at the center column
fn fan_coral(color: BrickColor) -> Body {
    let width = 5_i32;
    let height = 4_i32;
    let mut parts = Vec::new();

    for x in 0..width {
        let column_height = height - (x - width / 2).abs();
        for y in 0..column_height {
            parts.push(BrickPart::new(
                BrickShape::Stud1x1,
                Vec3::new((x - width / 2) as f32 * 0.5, y as f32 * 0.3, 0.0),
                Vec3::ZERO,
                color,
            ));
        }
    }

    Body::new(parts)
}

/// Short stem with a round cap
fn mushroom_coral(color: BrickColor) -> Body {
    let mut parts = Vec::new();

    for i in 0..3 {
        parts.push(BrickPart::new(
            BrickShape::Cylinder1x1,
            Vec3::UP * (i as f32 * 0.4),
            Vec3::ZERO,
            color,
        ));
    }

    for x in -2..=2_i32 {
        for z in -2..=2_i32 {
            if x * x + z * z <= 4 {
                parts.push(BrickPart::new(
                    BrickShape::Stud1x1,
                    Vec3::new(x as f32 * 0.4, 1.2, z as f32 * 0.4),
                    Vec3::ZERO,
                    color,
                ));
            }
        }
    }

    Body::new(parts)
}

/// Stacked green plates of varying height
fn build_seaweed(rng: &mut impl Rng) -> Body {
    let height = rng.gen_range(3..7);
    let green = BrickColor::new(0.2, 0.7 + rng.gen_range(-0.1..0.1), 0.3);
    Body::new(
        (0..height)
            .map(|i| {
                BrickPart::new(
                    BrickShape::Plate,
                    Vec3::UP * (i as f32 * 0.3),
                    Vec3::ZERO,
                    green,
                )
            })
            .collect(),
    )
}

/// A small mound of grey bricks
fn build_rock(rng: &mut impl Rng) -> Body {
    let grey = BrickColor::new(
        0.5 + rng.gen_range(-0.1..0.1),
        0.5 + rng.gen_range(-0.1..0.1),
        0.5 + rng.gen_range(-0.1..0.1),
    );
    Body::new(vec![
        BrickPart::new(BrickShape::Brick2x4, Vec3::ZERO, Vec3::ZERO, grey),
        BrickPart::new(BrickShape::Brick2x2, Vec3::new(0.3, 0.4, 0.0), Vec3::ZERO, grey),
        BrickPart::new(BrickShape::Brick1x2, Vec3::new(-0.3, 0.7, 0.2), Vec3::ZERO, grey),
    ])
}

fn build_treasure() -> Body {
    let gold = BrickColor::new(1.0, 0.85, 0.2);
    Body::new(vec![
        BrickPart::new(BrickShape::Brick2x2, Vec3::ZERO, Vec3::ZERO, gold),
        BrickPart::new(BrickShape::Cone1x1, Vec3::UP * 0.4, Vec3::ZERO, gold),
    ])
}
