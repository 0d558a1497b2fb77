//! Simulation engine - main entry point for running the reef.

use hecs::{Entity, World};
use log::info;

use crate::components::*;
use crate::events::{EventLog, EventSink, FanoutSink, GameEvent};
use crate::generation::{generate_reef, spawn_player, ReefConfig, ReefLayout};
use crate::spatial::SpatialGrid;
use crate::systems::*;

/// Cell size for the per-tick spatial snapshot; matches the largest common
/// query radius so most lookups touch few cells
const GRID_CELL: f32 = 8.0;

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct AquariumConfig {
    pub reef: ReefConfig,
    pub spawner: SpawnerConfig,
    /// Hard bounds on every swimming entity
    pub water_bounds: BoundingBox,
    pub starting_level: u32,
}

impl Default for AquariumConfig {
    fn default() -> Self {
        Self {
            reef: ReefConfig::default(),
            spawner: SpawnerConfig::default(),
            water_bounds: BoundingBox::new(
                Vec3::new(-30.0, -10.0, -20.0),
                Vec3::new(30.0, 10.0, 20.0),
            ),
            starting_level: 1,
        }
    }
}

/// Main simulation engine
pub struct Aquarium {
    /// ECS world containing all entities
    pub world: World,
    /// Simulation time in seconds since start
    pub sim_time: f64,
    /// Score, level, and difficulty state
    pub state: GameState,
    /// Wave and respawn driver
    pub spawner: FishSpawner,
    /// World-level timed effects (slow motion)
    pub globals: GlobalEffects,
    /// Generation summary, if the reef was generated
    pub reef: Option<ReefLayout>,
    /// Collected notification stream; drain with `take_events`
    pub events: EventLog,
    external_sink: Option<Box<dyn EventSink>>,
    config: AquariumConfig,
    paused: bool,
}

impl Aquarium {
    /// Create an empty simulation with default configuration
    pub fn new() -> Self {
        Self::with_config(AquariumConfig::default())
    }

    pub fn with_config(config: AquariumConfig) -> Self {
        let spawner = FishSpawner::new(config.spawner.clone());
        Self {
            world: World::new(),
            sim_time: 0.0,
            state: GameState::new(),
            spawner,
            globals: GlobalEffects::default(),
            reef: None,
            events: EventLog::new(),
            external_sink: None,
            config,
            paused: false,
        }
    }

    /// Inject an external notification sink; the engine's own event log
    /// keeps collecting either way
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.external_sink = Some(sink);
    }

    /// Generate the reef, the player, and the first wave
    pub fn generate(&mut self) {
        let mut rng = rand::thread_rng();

        let layout = generate_reef(&mut self.world, &self.config.reef, &mut rng);
        info!(
            "generated reef '{}': {} corals, {} structures",
            layout.name, layout.corals, layout.structures
        );
        self.reef = Some(layout);

        spawn_player(&mut self.world, Vec3::ZERO, &mut rng);

        let mut sink = FanoutSink {
            log: &mut self.events,
            external: self.external_sink.as_deref_mut(),
        };
        let level = self.config.starting_level.max(1);
        self.state.score = 0;
        self.spawner
            .spawn_wave(&mut self.world, level, &mut sink, &mut rng);
        sink.notify(GameEvent::LevelStart { level });
    }

    /// Advance the simulation by `delta_seconds`.
    ///
    /// All entity updates run inside this call; shared counters are only
    /// mutated here, so readers are safe between ticks.
    pub fn update(&mut self, delta_seconds: f32) {
        if self.paused || self.state.game_over {
            return;
        }
        self.sim_time += delta_seconds as f64;

        let Self {
            world,
            state,
            spawner,
            globals,
            events,
            external_sink,
            config,
            ..
        } = self;

        let mut rng = rand::thread_rng();
        let mut sink = FanoutSink {
            log: events,
            external: external_sink.as_deref_mut(),
        };

        // Sense: one spatial snapshot for the whole tick
        let spatial = SpatialGrid::build(world, GRID_CELL);

        // Decide: behavior systems produce swim intents
        let ai_scale = globals.ai_time_scale();
        player_control_system(world);
        ai_system(world, &spatial, delta_seconds, ai_scale);
        structure_system(world, &spatial, delta_seconds, ai_scale);

        // Act: integrate movement and drift
        swim_system(world, &config.water_bounds, delta_seconds);
        debris_system(world, delta_seconds);
        lifetime_system(world, delta_seconds);

        // Resolve: bites, pickups, countdowns
        consumption_system(world, &spatial, state, &mut sink);
        collection_system(world, delta_seconds, globals, &mut sink);
        effects_system(world, delta_seconds, &mut sink);
        globals.advance(delta_seconds);

        // Maintain: ambient loops, population, progression
        ambient_system(world, delta_seconds);
        spawner.update(world, delta_seconds, &mut rng);
        progression_system(world, state, spawner, &mut sink, delta_seconds);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Drain the events collected since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.events.take()
    }

    /// The player entity, if alive
    pub fn player(&self) -> Option<Entity> {
        self.world
            .query::<&PlayerFish>()
            .iter()
            .next()
            .map(|(entity, _)| entity)
    }

    pub fn player_size(&self) -> Option<i32> {
        let player = self.player()?;
        self.world.get::<&Fish>(player).map(|f| f.size).ok()
    }

    /// Poll the per-level size target (level progression collaborator)
    pub fn player_reached_size_target(&self) -> bool {
        self.player_size()
            .map(|size| size >= self.state.size_target())
            .unwrap_or(false)
    }

    /// Count all live fish (including the player)
    pub fn fish_count(&self) -> usize {
        self.world.query::<&Fish>().iter().count()
    }

    /// Count live non-player fish of a tier
    pub fn tier_count(&self, tier: FishTier) -> usize {
        FishSpawner::count_tier(&self.world, tier)
    }

    pub fn debris_count(&self) -> usize {
        self.world.query::<&LooseBrick>().iter().count()
            + self.world.query::<&Stud>().iter().count()
    }

    /// Feed a movement direction to the player (input polling is external)
    pub fn set_player_input(&mut self, direction: Vec3, boost: bool) {
        if let Some(player) = self.player() {
            if let Ok(mut input) = self.world.get::<&mut PlayerInput>(player) {
                input.direction = direction;
                input.boost = boost;
            }
        }
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_aquarium(
            writer,
            &self.world,
            self.sim_time,
            &self.state,
            &self.spawner,
            &self.globals,
            self.reef.as_ref(),
        )
    }

    /// Load simulation state from a reader
    pub fn load<R: std::io::Read>(
        &mut self,
        reader: R,
    ) -> Result<(), crate::persistence::SaveError> {
        let loaded = crate::persistence::load_aquarium(reader)?;

        self.world = loaded.world;
        self.sim_time = loaded.sim_time;
        self.state = loaded.state;
        self.spawner = loaded.spawner;
        self.globals = loaded.globals;
        self.reef = loaded.reef;
        self.events = EventLog::new();

        Ok(())
    }
}

impl Default for Aquarium {
    fn default() -> Self {
        Self::new()
    }
}
