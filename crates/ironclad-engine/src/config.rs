//! Engine configuration.
//!
//! Loaded from a TOML file with `[world]`, `[simulation]` and `[run]`
//! sections. Every field has a default, so a partial file is fine.

use ironclad_common::{ConfigError, WorldPos};
use ironclad_gameplay::WorldConfig;
use ironclad_world::{Biome, TerrainParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

use crate::timing::ClockSettings;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "ironclad.toml";

/// Terrain and streaming settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    /// Terrain seed
    pub seed: u64,
    /// Cells along one chunk edge
    pub chunk_size_cells: u32,
    /// Pixels along one cell edge
    pub cell_size: u32,
    /// Loaded window radius in chunks
    pub window_radius: u32,
    /// Noise octaves
    pub octaves: u32,
    /// Amplitude falloff per octave
    pub persistence: f64,
    /// Cells per noise unit
    pub noise_scale: f64,
    /// Biome table
    pub biome: Biome,
}

impl Default for WorldSection {
    fn default() -> Self {
        let terrain = TerrainParams::default();
        Self {
            seed: 12345,
            chunk_size_cells: 128,
            cell_size: 4,
            window_radius: 1,
            octaves: terrain.octaves,
            persistence: terrain.persistence,
            noise_scale: terrain.noise_scale,
            biome: terrain.biome,
        }
    }
}

/// Tick scheduling and collision tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    /// Fixed updates per simulated second
    pub tick_rate: f64,
    /// Cap on fixed updates run for one frame
    pub max_steps_per_frame: u32,
    /// Cap on the frame delta fed to the accumulator, in seconds
    pub max_frame_dt: f64,
    /// Simulation speed multiplier
    pub time_scale: f64,
    /// Spatial index cell edge in pixels
    pub spatial_cell_size: u32,
    /// Seed for random spawns
    pub rng_seed: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_steps_per_frame: 10,
            max_frame_dt: 0.25,
            time_scale: 1.0,
            spatial_cell_size: 32,
            rng_seed: 0,
        }
    }
}

/// Headless run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Simulation ticks to run before stopping
    pub ticks: u64,
    /// Synthetic frame period in seconds
    pub frame_dt: f64,
    /// Hard cap on rendered frames
    pub max_frames: u64,
    /// Enemy tanks spawned near the player at start
    pub enemies: u32,
    /// Landmines spawned near the player at start
    pub landmines: u32,
    /// Drive the player with a built-in input script
    pub autopilot: bool,
    /// Log a frame summary every this many frames (0 = never)
    pub log_every: u64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            ticks: 600,
            frame_dt: 1.0 / 60.0,
            max_frames: 36_000,
            enemies: 4,
            landmines: 4,
            autopilot: true,
            log_every: 60,
        }
    }
}

/// Engine configuration parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `[world]`
    pub world: WorldSection,
    /// `[simulation]`
    pub simulation: SimulationSection,
    /// `[run]`
    pub run: RunSection,
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Parses TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Applies command-line overrides.
    pub fn apply_overrides(&mut self, seed: Option<u64>, ticks: Option<u64>, headless_fps: Option<f64>) {
        if let Some(seed) = seed {
            self.world.seed = seed;
        }
        if let Some(ticks) = ticks {
            self.run.ticks = ticks;
        }
        if let Some(fps) = headless_fps {
            self.run.frame_dt = if fps > 0.0 { 1.0 / fps } else { f64::NAN };
        }
    }

    /// Checks every numeric parameter. Bad values are reported, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_world_config().validate()?;
        self.clock_settings().validate()?;
        ConfigError::require_positive("frame_dt", self.run.frame_dt)?;
        Ok(())
    }

    /// Terrain parameters from `[world]`.
    #[must_use]
    pub fn terrain_params(&self) -> TerrainParams {
        TerrainParams {
            octaves: self.world.octaves,
            persistence: self.world.persistence,
            noise_scale: self.world.noise_scale,
            biome: self.world.biome,
        }
    }

    /// Construction parameters for the gameplay world.
    #[must_use]
    pub fn to_world_config(&self) -> WorldConfig {
        WorldConfig {
            seed: self.world.seed,
            chunk_size_cells: self.world.chunk_size_cells,
            cell_size: self.world.cell_size,
            window_radius: self.world.window_radius,
            terrain: self.terrain_params(),
            spatial_cell_size: self.simulation.spatial_cell_size,
            rng_seed: self.simulation.rng_seed,
            player_spawn: WorldPos::new(200.0, 200.0),
        }
    }

    /// Clock parameters from `[simulation]`.
    #[must_use]
    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings {
            tick_rate: self.simulation.tick_rate,
            max_steps_per_frame: self.simulation.max_steps_per_frame,
            max_frame_dt: self.simulation.max_frame_dt,
            time_scale: self.simulation.time_scale,
        }
    }
}
