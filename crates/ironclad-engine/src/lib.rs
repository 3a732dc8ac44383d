//! # Ironclad Engine
//!
//! Headless driver for the Ironclad simulation.
//!
//! This crate ties the other crates together:
//! - Config: TOML engine configuration with command-line overrides
//! - Timing: fixed-timestep simulation clock
//! - App: the headless frame loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod app;
pub mod config;
pub mod timing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::app::*;
    pub use crate::config::*;
    pub use crate::timing::*;
}

pub use prelude::*;
