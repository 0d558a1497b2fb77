//! Brick Reef Core - Eat-Fish-Grow-Bigger Ecosystem Engine
//!
//! A headless simulation of a reef of brick-assembled fish: AI state
//! machines, flocking, predator/prey consumption, spawning waves, timed
//! power-ups, and level progression.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Fish, debris, power-ups, reef scenery
//! - **Components**: Pure data attached to entities (Position, Fish, AiFish, etc.)
//! - **Systems**: Logic that queries and updates components
//!
//! Rendering, audio, physics, and input are boundary concerns: the engine
//! consumes movement intents and emits `GameEvent`s for a host to present.
//!
//! # Example
//!
//! ```rust,no_run
//! use brickreef_core::prelude::*;
//!
//! let mut aquarium = Aquarium::new();
//!
//! // Generate the reef, the player, and the first wave
//! aquarium.generate();
//!
//! // Run simulation
//! loop {
//!     aquarium.update(1.0 / 60.0); // 60 FPS
//!     for event in aquarium.take_events() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

pub mod components;
pub mod engine;
pub mod events;
pub mod generation;
pub mod persistence;
pub mod spatial;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{Aquarium, AquariumConfig};
    pub use crate::events::{EventLog, EventSink, GameEvent};
    pub use crate::spatial::{SpatialGrid, SpatialQuery};
}
