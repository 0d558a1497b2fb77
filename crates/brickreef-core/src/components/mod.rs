//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod debris;
mod effects;
mod fish;
mod player;
mod reef;

pub use common::*;
pub use debris::*;
pub use effects::*;
pub use fish::*;
pub use player::*;
pub use reef::*;
