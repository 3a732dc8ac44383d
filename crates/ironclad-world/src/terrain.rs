//! Fractal terrain synthesis and biome classification.
//!
//! Terrain is a multi-octave sum over [`NoiseField`]:
//!
//! ```text
//! value = Σ eval(x·2^i, y·2^i) · persistence^i / Σ persistence^i
//! ```
//!
//! sampled at global cell coordinates divided by the noise scale, then
//! classified into ground bands by a [`Biome`] table.

use ironclad_common::{ConfigError, Rgba};
use serde::{Deserialize, Serialize};

use crate::noise_field::NoiseField;

/// Kind of ground a terrain cell resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ground {
    /// Bare dirt (temperate lowlands)
    Dirt,
    /// Grass (temperate midlands)
    Grass,
    /// Stone (temperate highlands)
    Stone,
    /// Sand (arid lowlands)
    Sand,
    /// Dry scrub grass (arid midlands)
    DryGrass,
    /// Exposed rock (arid highlands)
    Rock,
}

/// Color as a linear function of the noise value: `base + slope · value`,
/// each channel truncated toward zero and clamped to `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRamp {
    base: [i32; 3],
    slope: [f64; 3],
}

impl ColorRamp {
    /// Creates a ramp.
    #[must_use]
    pub const fn new(base: [i32; 3], slope: [f64; 3]) -> Self {
        Self { base, slope }
    }

    /// Creates a ramp that ignores the noise value.
    #[must_use]
    pub const fn flat(base: [i32; 3]) -> Self {
        Self::new(base, [0.0; 3])
    }

    /// Evaluates the ramp.
    #[must_use]
    pub fn color(&self, value: f64) -> Rgba {
        let channel = |i: usize| (self.base[i] + (self.slope[i] * value) as i32).clamp(0, 255) as u8;
        Rgba::opaque(channel(0), channel(1), channel(2))
    }
}

/// One band of a biome table: values below `upper` map to `ground`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRule {
    /// Exclusive upper bound of the band
    pub upper: f64,
    /// Ground kind of the band
    pub ground: Ground,
    /// Color ramp of the band
    pub ramp: ColorRamp,
}

const TEMPERATE: &[BandRule] = &[
    BandRule {
        upper: -0.2,
        ground: Ground::Dirt,
        ramp: ColorRamp::flat([90, 60, 40]),
    },
    BandRule {
        upper: 0.3,
        ground: Ground::Grass,
        ramp: ColorRamp::new([30, 120, 30], [0.0, 100.0, 0.0]),
    },
    BandRule {
        upper: f64::INFINITY,
        ground: Ground::Stone,
        ramp: ColorRamp::new([140, 140, 140], [60.0, 60.0, 60.0]),
    },
];

const ARID: &[BandRule] = &[
    BandRule {
        upper: -0.1,
        ground: Ground::Sand,
        ramp: ColorRamp::new([194, 170, 110], [20.0, 20.0, 10.0]),
    },
    BandRule {
        upper: 0.35,
        ground: Ground::DryGrass,
        ramp: ColorRamp::new([150, 140, 60], [0.0, 40.0, 0.0]),
    },
    BandRule {
        upper: f64::INFINITY,
        ground: Ground::Rock,
        ramp: ColorRamp::new([120, 100, 80], [50.0, 40.0, 30.0]),
    },
];

/// Biome table selecting how noise values are classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    /// Dirt, grass and stone.
    #[default]
    Temperate,
    /// Sand, dry grass and rock.
    Arid,
}

impl Biome {
    /// Returns the band rules, ordered by ascending upper bound.
    #[must_use]
    pub const fn bands(self) -> &'static [BandRule] {
        match self {
            Self::Temperate => TEMPERATE,
            Self::Arid => ARID,
        }
    }

    /// Classifies a noise value into a band.
    #[must_use]
    pub fn classify(self, value: f64) -> TerrainBand {
        let bands = self.bands();
        let rule = bands
            .iter()
            .find(|rule| value < rule.upper)
            .unwrap_or(&bands[bands.len() - 1]);
        TerrainBand {
            ground: rule.ground,
            color: rule.ramp.color(value),
        }
    }
}

/// Classified terrain: ground kind plus its render color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerrainBand {
    /// Ground kind
    pub ground: Ground,
    /// Render color
    pub color: Rgba,
}

/// Tuning parameters for terrain synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Number of octaves summed
    pub octaves: u32,
    /// Amplitude falloff per octave
    pub persistence: f64,
    /// Cells per noise unit (larger = smoother)
    pub noise_scale: f64,
    /// Classification table
    pub biome: Biome,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            octaves: 5,
            persistence: 0.5,
            noise_scale: 100.0,
            biome: Biome::Temperate,
        }
    }
}

impl TerrainParams {
    /// Rejects parameter sets that would make synthesis degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_nonzero("octaves", self.octaves)?;
        ConfigError::require_positive("persistence", self.persistence)?;
        ConfigError::require_positive("noise_scale", self.noise_scale)?;
        Ok(())
    }
}

/// Fractal terrain sampler over a seeded [`NoiseField`].
#[derive(Debug, Clone)]
pub struct TerrainSynthesizer {
    noise: NoiseField,
    params: TerrainParams,
    normalization: f64,
}

impl TerrainSynthesizer {
    /// Creates a synthesizer for `seed` with validated parameters.
    pub fn new(seed: u64, params: TerrainParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let normalization = (0..params.octaves)
            .map(|i| params.persistence.powi(i as i32))
            .sum();
        Ok(Self {
            noise: NoiseField::new(seed),
            params,
            normalization,
        })
    }

    /// Returns the synthesis parameters.
    #[must_use]
    pub const fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Returns the world seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.noise.seed()
    }

    /// Multi-octave noise at noise-space coordinates, in `[-1, 1]`.
    #[must_use]
    pub fn fractal(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        for _ in 0..self.params.octaves {
            total += self.noise.eval(x * frequency, y * frequency) * amplitude;
            amplitude *= self.params.persistence;
            frequency *= 2.0;
        }
        (total / self.normalization).clamp(-1.0, 1.0)
    }

    /// Terrain value of the global cell `(gx, gy)`.
    ///
    /// The value depends only on the global cell index, so every chunk that
    /// samples the same cell gets a bit-identical result.
    #[must_use]
    pub fn sample_cell(&self, gx: i64, gy: i64) -> f64 {
        self.fractal(
            gx as f64 / self.params.noise_scale,
            gy as f64 / self.params.noise_scale,
        )
    }

    /// Classified terrain of the global cell `(gx, gy)`.
    #[must_use]
    pub fn band_at_cell(&self, gx: i64, gy: i64) -> TerrainBand {
        self.params.biome.classify(self.sample_cell(gx, gy))
    }
}
