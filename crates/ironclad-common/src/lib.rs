//! # Ironclad Common
//!
//! Common types, utilities, and shared abstractions for Ironclad.
//!
//! This crate provides foundational types used across all Ironclad subsystems:
//! - Coordinate types (world, chunk, spatial cell)
//! - Entity ids and their allocator
//! - Pixel rectangles for hitboxes and views
//! - Decoded rasters and the decode-service trait
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod raster;
pub mod rect;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::raster::*;
    pub use crate::rect::*;
}

pub use prelude::*;
