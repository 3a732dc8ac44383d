//! # Ironclad World
//!
//! Procedural terrain for Ironclad.
//!
//! This crate handles:
//! - Seeded coherent noise
//! - Fractal terrain synthesis and biome classification
//! - Chunk baking into rasters
//! - Chunk streaming around a moving viewpoint
//!
//! Chunks are never saved; they regenerate from seed and coordinate.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod chunk;
pub mod noise_field;
pub mod streaming;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::chunk::*;
    pub use crate::noise_field::*;
    pub use crate::streaming::*;
    pub use crate::terrain::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use ironclad_common::ChunkCoord;

    #[test]
    fn test_generation_deterministic() {
        let layout = ChunkLayout::new(16, 2).expect("valid");
        let gen1 = TerrainSynthesizer::new(42, TerrainParams::default()).expect("valid");
        let gen2 = TerrainSynthesizer::new(42, TerrainParams::default()).expect("valid");

        let chunk1 = Chunk::bake(ChunkCoord::new(0, 0), layout, &gen1);
        let chunk2 = Chunk::bake(ChunkCoord::new(0, 0), layout, &gen2);

        assert_eq!(chunk1, chunk2);
    }

    #[test]
    fn test_different_seeds_different_terrain() {
        let layout = ChunkLayout::new(32, 1).expect("valid");
        let params = TerrainParams {
            noise_scale: 8.0,
            ..TerrainParams::default()
        };
        let gen1 = TerrainSynthesizer::new(42, params).expect("valid");
        let gen2 = TerrainSynthesizer::new(999, params).expect("valid");

        let chunk1 = Chunk::bake(ChunkCoord::new(0, 0), layout, &gen1);
        let chunk2 = Chunk::bake(ChunkCoord::new(0, 0), layout, &gen2);

        assert_ne!(chunk1.raster(), chunk2.raster());
    }
}
