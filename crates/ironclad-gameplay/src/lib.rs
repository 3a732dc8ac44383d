//! # Ironclad Gameplay
//!
//! Gameplay simulation for Ironclad.
//!
//! This crate provides the entity layer and the per-tick simulation:
//! - Entities (player tank, enemy tanks, projectiles, landmines)
//! - Hitbox footprints per kind and facing
//! - Spatial hash broad phase
//! - Collision policies and move-and-revert response
//! - Input intents, effect reporting and presentation frames
//! - The `World` simulation context tying it together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod collision;
pub mod effects;
pub mod entity;
pub mod frame;
pub mod hitbox;
pub mod input;
pub mod spatial;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::collision::*;
    pub use crate::effects::*;
    pub use crate::entity::*;
    pub use crate::frame::*;
    pub use crate::hitbox::*;
    pub use crate::input::*;
    pub use crate::spatial::*;
    pub use crate::world::*;
}

pub use prelude::*;
