//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for efficient binary serialization of the entire simulation.
//! Components are serialized individually then reconstructed on load.
//! Intra-tick transients (swim intents, consumption claims) are never
//! persisted - saves happen between ticks, where none exist.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::*;
use crate::generation::ReefLayout;
use crate::systems::{FishSpawner, GameState, GlobalEffects};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Simulation time in seconds
    pub sim_time: f64,
    /// Score and level state
    pub state: GameState,
    /// Spawner cooldowns and caps
    pub spawner: FishSpawner,
    /// Global timed effects
    pub globals: GlobalEffects,
    /// Generation summary
    pub reef: Option<ReefLayout>,
    /// All entities with their components
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    // Core
    pub fish: Option<Fish>,
    pub position: Option<Position>,
    pub behavior: Option<Behavior>,
    pub body: Option<Body>,

    // Behavior state
    pub ai: Option<AiFish>,
    pub structure: Option<StructureSteering>,
    pub player: Option<PlayerFish>,
    pub player_input: Option<PlayerInput>,
    pub active_effects: Option<ActiveEffects>,

    // Debris and pickups
    pub loose_brick: Option<LooseBrick>,
    pub stud: Option<Stud>,
    pub lifetime: Option<Lifetime>,
    pub debris_motion: Option<DebrisMotion>,
    pub power_up: Option<PowerUp>,

    // Scenery
    pub decor: Option<Decor>,
    pub sway: Option<Sway>,
    pub bubble: Option<Bubble>,
    pub bubble_emitter: Option<BubbleEmitter>,
}

/// Extract all entities from a world into serializable form
fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();

    for entity in world.iter() {
        let mut se = SerializableEntity::default();
        let entity_ref = entity;

        if let Some(c) = entity_ref.get::<&Fish>() {
            se.fish = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Position>() {
            se.position = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Behavior>() {
            se.behavior = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Body>() {
            se.body = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&AiFish>() {
            se.ai = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&StructureSteering>() {
            se.structure = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PlayerFish>() {
            se.player = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PlayerInput>() {
            se.player_input = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&ActiveEffects>() {
            se.active_effects = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&LooseBrick>() {
            se.loose_brick = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Stud>() {
            se.stud = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Lifetime>() {
            se.lifetime = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&DebrisMotion>() {
            se.debris_motion = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PowerUp>() {
            se.power_up = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Decor>() {
            se.decor = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Sway>() {
            se.sway = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Bubble>() {
            se.bubble = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&BubbleEmitter>() {
            se.bubble_emitter = Some(*c);
        }

        entities.push(se);
    }

    entities
}

/// Spawn an entity with all its components
fn spawn_entity(world: &mut World, se: SerializableEntity) {
    let entity = world.spawn(());

    if let Some(c) = se.fish {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.position {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.behavior {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.body {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.ai {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.structure {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.player {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.player_input {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.active_effects {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.loose_brick {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.stud {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.lifetime {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.debris_motion {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.power_up {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.decor {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.sway {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.bubble {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.bubble_emitter {
        let _ = world.insert_one(entity, c);
    }
}

/// Save the complete simulation to a writer
pub fn save_aquarium<W: Write>(
    writer: W,
    world: &World,
    sim_time: f64,
    state: &GameState,
    spawner: &FishSpawner,
    globals: &GlobalEffects,
    reef: Option<&ReefLayout>,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        state: state.clone(),
        spawner: spawner.clone(),
        globals: *globals,
        reef: reef.cloned(),
        entities: serialize_entities(world),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Result of loading a save file
pub struct LoadedAquarium {
    pub world: World,
    pub sim_time: f64,
    pub state: GameState,
    pub spawner: FishSpawner,
    pub globals: GlobalEffects,
    pub reef: Option<ReefLayout>,
}

/// Load simulation state from a reader
pub fn load_aquarium<R: Read>(reader: R) -> Result<LoadedAquarium, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    for se in save_data.entities {
        spawn_entity(&mut world, se);
    }

    Ok(LoadedAquarium {
        world,
        sim_time: save_data.sim_time,
        state: save_data.state,
        spawner: save_data.spawner,
        globals: save_data.globals,
        reef: save_data.reef,
    })
}

#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Aquarium;

    #[test]
    fn test_save_load_roundtrip() {
        let mut aquarium = Aquarium::new();
        aquarium.generate();
        for _ in 0..30 {
            aquarium.update(1.0 / 30.0);
        }

        let fish_before = aquarium.fish_count();
        let score_before = aquarium.state.score;
        let time_before = aquarium.sim_time();

        let mut buffer = Vec::new();
        aquarium.save(&mut buffer).unwrap();

        let mut restored = Aquarium::new();
        restored.load(buffer.as_slice()).unwrap();

        assert_eq!(restored.fish_count(), fish_before);
        assert_eq!(restored.state.score, score_before);
        assert!((restored.sim_time() - time_before).abs() < 1e-9);
        assert!(restored.player().is_some());

        // The restored world keeps simulating
        restored.update(1.0 / 30.0);
        assert!(restored.sim_time() > time_before);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let save_data = SaveData {
            version: 99,
            sim_time: 0.0,
            state: GameState::new(),
            spawner: FishSpawner::default(),
            globals: GlobalEffects::default(),
            reef: None,
            entities: Vec::new(),
        };

        let bytes = bincode::serialize(&save_data).unwrap();
        let result = load_aquarium(bytes.as_slice());

        assert!(matches!(
            result,
            Err(SaveError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }
}
