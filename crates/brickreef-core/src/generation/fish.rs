//! Fish assembly - per-tier brick layouts and actor spawning.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    AiFish, Behavior, Body, BrickColor, BrickPart, BrickShape, Fish, FishTier, PlayerFish,
    PlayerInput, Position, StructureSteering, Vec3,
};
use crate::systems::new_wander_target;

/// The fish body palette
const FISH_COLORS: [BrickColor; 8] = [
    BrickColor { r: 1.0, g: 0.4, b: 0.4 },
    BrickColor { r: 1.0, g: 0.6, b: 0.2 },
    BrickColor { r: 1.0, g: 0.9, b: 0.3 },
    BrickColor { r: 0.4, g: 0.8, b: 0.4 },
    BrickColor { r: 0.3, g: 0.6, b: 1.0 },
    BrickColor { r: 0.6, g: 0.3, b: 0.8 },
    BrickColor { r: 1.0, g: 0.5, b: 0.7 },
    BrickColor { r: 0.0, g: 0.8, b: 0.8 },
];

pub fn random_fish_color(rng: &mut impl Rng) -> BrickColor {
    FISH_COLORS[rng.gen_range(0..FISH_COLORS.len())]
}

/// Assemble a brick body for a tier. The part layouts scale with the tier;
/// the returned size matches `FishTier::spawn_size`.
pub fn assemble_body(tier: FishTier, rng: &mut impl Rng) -> Body {
    match tier {
        FishTier::Tiny => tiny_body(rng),
        FishTier::Small => small_body(rng),
        FishTier::Medium => medium_body(rng),
        FishTier::Large => elongated_body(6, rng),
        FishTier::Giant => elongated_body(10, rng),
        FishTier::Boss => elongated_body(14, rng),
    }
}

fn part(shape: BrickShape, x: f32, y: f32, z: f32, color: BrickColor) -> BrickPart {
    BrickPart::new(shape, Vec3::new(x, y, z), Vec3::ZERO, color)
}

fn rotated(
    shape: BrickShape,
    offset: Vec3,
    rotation: Vec3,
    color: BrickColor,
) -> BrickPart {
    BrickPart::new(shape, offset, rotation, color)
}

/// Three bricks: hull, tail slope, one eye stud
fn tiny_body(rng: &mut impl Rng) -> Body {
    let color = random_fish_color(rng);
    Body::new(vec![
        part(BrickShape::Brick1x2, 0.0, 0.0, 0.0, color),
        rotated(
            BrickShape::Slope,
            Vec3::new(-0.5, 0.0, 0.0),
            Vec3::new(0.0, 180.0, 0.0),
            color,
        ),
        part(BrickShape::Stud1x1, 0.3, 0.25, 0.0, BrickColor::WHITE),
    ])
}

/// Hull, nose, tail fins, dorsal plate, and a pair of eyes
fn small_body(rng: &mut impl Rng) -> Body {
    let main = random_fish_color(rng);
    let accent = random_fish_color(rng);
    Body::new(vec![
        part(BrickShape::Brick2x2, 0.0, 0.0, 0.0, main),
        part(BrickShape::Brick1x2, 0.75, 0.0, 0.0, main),
        rotated(
            BrickShape::Slope,
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 180.0, 0.0),
            accent,
        ),
        rotated(
            BrickShape::Slope,
            Vec3::new(-1.0, 0.3, 0.0),
            Vec3::new(0.0, 180.0, 180.0),
            accent,
        ),
        rotated(
            BrickShape::Plate,
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.0, 0.0, 45.0),
            accent,
        ),
        part(BrickShape::Stud1x1, 1.0, 0.25, 0.3, BrickColor::WHITE),
        part(BrickShape::Stud1x1, 1.0, 0.25, -0.3, BrickColor::WHITE),
        part(BrickShape::Stud1x1, 1.05, 0.25, 0.3, BrickColor::BLACK),
        part(BrickShape::Stud1x1, 1.05, 0.25, -0.3, BrickColor::BLACK),
    ])
}

/// Two-tone hull with belly, tail assembly, three fins, and eyes
fn medium_body(rng: &mut impl Rng) -> Body {
    let main = random_fish_color(rng);
    let belly = BrickColor::WHITE;
    let fin = random_fish_color(rng);
    Body::new(vec![
        part(BrickShape::Brick2x4, 0.0, 0.0, 0.0, main),
        part(BrickShape::Brick2x4, 0.0, -0.3, 0.0, belly),
        part(BrickShape::Brick2x2, 1.25, 0.0, 0.0, main),
        part(BrickShape::Brick2x2, 1.25, -0.3, 0.0, belly),
        part(BrickShape::Brick1x2, -1.5, 0.0, 0.0, main),
        rotated(
            BrickShape::Slope,
            Vec3::new(-2.0, 0.25, 0.0),
            Vec3::new(0.0, 180.0, 0.0),
            fin,
        ),
        rotated(
            BrickShape::Slope,
            Vec3::new(-2.0, -0.25, 0.0),
            Vec3::new(0.0, 180.0, 180.0),
            fin,
        ),
        part(BrickShape::Plate, 0.0, 0.6, 0.0, fin),
        part(BrickShape::Plate, -0.5, -0.6, 0.0, fin),
        part(BrickShape::Plate, 0.5, -0.6, 0.0, fin),
        part(BrickShape::Stud1x1, 1.75, 0.15, 0.5, BrickColor::WHITE),
        part(BrickShape::Stud1x1, 1.75, 0.15, -0.5, BrickColor::WHITE),
    ])
}

/// Parametric hull for the big tiers: a row of 2x4 segments with belly
/// plates, tail slopes, and dorsal fins every other segment
fn elongated_body(segments: usize, rng: &mut impl Rng) -> Body {
    let main = random_fish_color(rng);
    let belly = BrickColor::WHITE;
    let fin = random_fish_color(rng);
    let mut parts = Vec::new();

    for i in 0..segments {
        let x = i as f32 * 1.25 - segments as f32 * 0.625;
        parts.push(part(BrickShape::Brick2x4, x, 0.0, 0.0, main));
        parts.push(part(BrickShape::Brick2x4, x, -0.35, 0.0, belly));
        if i % 2 == 0 {
            parts.push(part(BrickShape::Plate, x, 0.6, 0.0, fin));
        }
    }

    let tail_x = -(segments as f32) * 0.625 - 0.75;
    parts.push(rotated(
        BrickShape::Slope,
        Vec3::new(tail_x, 0.3, 0.0),
        Vec3::new(0.0, 180.0, 0.0),
        fin,
    ));
    parts.push(rotated(
        BrickShape::Slope,
        Vec3::new(tail_x, -0.3, 0.0),
        Vec3::new(0.0, 180.0, 180.0),
        fin,
    ));

    let nose_x = segments as f32 * 0.625 + 0.5;
    parts.push(part(BrickShape::Stud1x1, nose_x, 0.2, 0.5, BrickColor::WHITE));
    parts.push(part(BrickShape::Stud1x1, nose_x, 0.2, -0.5, BrickColor::WHITE));

    Body::new(parts)
}

/// One brick appended when the player grows
pub fn growth_brick(color: BrickColor, rng: &mut impl Rng) -> BrickPart {
    let offset = Vec3::new(
        rng.gen_range(-0.3..0.3),
        rng.gen_range(-0.2..0.2),
        0.0,
    );
    BrickPart::new(BrickShape::Brick1x2, offset, Vec3::ZERO, color)
}

/// Disposition presets per tier: small fish school, big fish hunt
fn ai_profile(tier: FishTier) -> (f32, f32) {
    match tier {
        FishTier::Tiny => (0.2, 0.7),
        FishTier::Small => (0.3, 0.5),
        FishTier::Medium => (0.5, 0.3),
        FishTier::Large => (0.7, 0.1),
        FishTier::Giant => (0.8, 0.0),
        FishTier::Boss => (0.9, 0.0),
    }
}

/// Spawn an AI fish of a tier at a position
pub fn spawn_ai_fish(
    world: &mut World,
    tier: FishTier,
    position: Vec3,
    rng: &mut impl Rng,
) -> Entity {
    let (aggressiveness, schooling) = ai_profile(tier);
    let mut ai = AiFish::new(aggressiveness, schooling);
    ai.wander_target = new_wander_target(position, ai.wander_radius, rng);
    ai.state_timer = rng.gen_range(0.0..ai.state_change_interval);

    world.spawn((
        Fish::new(tier.spawn_size(), tier.spawn_speed()),
        Position::new(position),
        Behavior::AiControlled,
        ai,
        assemble_body(tier, rng),
    ))
}

/// Spawn the player fish - starts tiny, with idle input
pub fn spawn_player(world: &mut World, position: Vec3, rng: &mut impl Rng) -> Entity {
    world.spawn((
        Fish::new(FishTier::Tiny.spawn_size(), 4.0),
        Position::new(position),
        Behavior::PlayerControlled,
        PlayerFish::default(),
        PlayerInput::default(),
        tiny_body(rng),
    ))
}

/// Spawn a brick structure of the given size
pub fn spawn_structure(
    world: &mut World,
    size: i32,
    position: Vec3,
    rng: &mut impl Rng,
) -> Entity {
    let color = random_fish_color(rng);
    let mut parts = Vec::new();
    let layers = (size / 2).clamp(2, 6);
    for layer in 0..layers {
        parts.push(part(
            BrickShape::Brick2x2,
            0.0,
            layer as f32 * 0.4,
            0.0,
            color,
        ));
    }

    world.spawn((
        Fish::new(size, 3.0),
        Position::new(position),
        Behavior::Static,
        StructureSteering::default(),
        Body::new(parts),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_part_counts_scale_with_tier() {
        let mut rng = rand::thread_rng();
        let tiny = assemble_body(FishTier::Tiny, &mut rng).part_count();
        let small = assemble_body(FishTier::Small, &mut rng).part_count();
        let medium = assemble_body(FishTier::Medium, &mut rng).part_count();
        let large = assemble_body(FishTier::Large, &mut rng).part_count();
        let boss = assemble_body(FishTier::Boss, &mut rng).part_count();

        assert_eq!(tiny, 3);
        assert_eq!(small, 9);
        assert!(medium > small);
        assert!(large > medium);
        assert!(boss > large);
    }

    #[test]
    fn test_spawned_fish_matches_tier() {
        let mut world = World::new();
        let mut rng = rand::thread_rng();
        let entity = spawn_ai_fish(&mut world, FishTier::Medium, Vec3::ZERO, &mut rng);

        let fish = world.get::<&Fish>(entity).unwrap();
        assert_eq!(fish.size, 15);
        assert_eq!(fish.tier, FishTier::Medium);
        drop(fish);

        let ai = world.get::<&AiFish>(entity).unwrap();
        assert!(ai.aggressiveness > 0.0);
        assert_ne!(ai.wander_target, Vec3::ZERO);
    }

    #[test]
    fn test_player_starts_tiny() {
        let mut world = World::new();
        let mut rng = rand::thread_rng();
        let entity = spawn_player(&mut world, Vec3::ZERO, &mut rng);

        assert_eq!(world.get::<&Fish>(entity).unwrap().tier, FishTier::Tiny);
        assert_eq!(world.get::<&Body>(entity).unwrap().part_count(), 3);
        assert!(world.get::<&PlayerInput>(entity).is_ok());
    }

    #[test]
    fn test_structure_has_steering() {
        let mut world = World::new();
        let mut rng = rand::thread_rng();
        let entity = spawn_structure(&mut world, 8, Vec3::ZERO, &mut rng);

        assert_eq!(*world.get::<&Behavior>(entity).unwrap(), Behavior::Static);
        assert!(world.get::<&StructureSteering>(entity).is_ok());
        assert_eq!(world.get::<&Body>(entity).unwrap().part_count(), 4);
    }
}
