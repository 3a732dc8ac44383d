//! Precomputed hitbox footprints keyed by entity kind and facing.

use ahash::AHashMap;
use ironclad_common::{DecodeError, PixelRect, RasterDecoder};
use tracing::debug;

use crate::entity::{EntityKind, Facing};

/// Canvas size and tight south-facing footprint of one sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSpec {
    /// Canvas width in pixels.
    pub width: i32,
    /// Canvas height in pixels.
    pub height: i32,
    /// Opaque bounds of the south-facing sprite, relative to the canvas.
    pub footprint: PixelRect,
}

impl SpriteSpec {
    /// Built-in spec for a kind.
    #[must_use]
    pub const fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::PlayerTank | EntityKind::EnemyTank => Self {
                width: 32,
                height: 32,
                footprint: PixelRect::new(6, 2, 20, 28),
            },
            EntityKind::RegularProjectile | EntityKind::GoldProjectile => Self {
                width: 8,
                height: 8,
                footprint: PixelRect::new(3, 1, 2, 6),
            },
            EntityKind::Landmine => Self {
                width: 16,
                height: 16,
                footprint: PixelRect::new(2, 2, 12, 12),
            },
        }
    }
}

/// Read-mostly footprint lookup, filled once at startup.
#[derive(Debug, Clone)]
pub struct HitboxTable {
    footprints: AHashMap<(EntityKind, Facing), PixelRect>,
}

impl Default for HitboxTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl HitboxTable {
    /// Table with the built-in sprite specs for every kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self {
            footprints: AHashMap::with_capacity(EntityKind::ALL.len() * Facing::ALL.len()),
        };
        for kind in EntityKind::ALL {
            table.register(kind, SpriteSpec::default_for(kind));
        }
        table
    }

    /// Registers all four rotations of a sprite's footprint.
    pub fn register(&mut self, kind: EntityKind, spec: SpriteSpec) {
        for facing in Facing::ALL {
            let turns = if kind.is_rotatable() {
                facing.quarter_turns()
            } else {
                0
            };
            let rect = spec.footprint.rotated_in_canvas(spec.width, spec.height, turns);
            self.footprints.insert((kind, facing), rect);
        }
    }

    /// Registers a kind from a packed south-facing sprite.
    pub fn register_encoded(
        &mut self,
        kind: EntityKind,
        bytes: &[u8],
        decoder: &dyn RasterDecoder,
    ) -> Result<(), DecodeError> {
        let raster = decoder.decode(bytes)?;
        let spec = SpriteSpec {
            width: raster.width() as i32,
            height: raster.height() as i32,
            footprint: raster.opaque_bounds(),
        };
        debug!(?kind, footprint = ?spec.footprint, "registered decoded sprite footprint");
        self.register(kind, spec);
        Ok(())
    }

    /// Footprint of a kind at a facing, relative to the sprite's top-left.
    #[must_use]
    pub fn footprint(&self, kind: EntityKind, facing: Facing) -> PixelRect {
        self.footprints
            .get(&(kind, facing))
            .copied()
            .unwrap_or_else(|| SpriteSpec::default_for(kind).footprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironclad_common::{Raster, Rgba};

    struct SolidBlock;

    impl RasterDecoder for SolidBlock {
        fn decode(&self, bytes: &[u8]) -> Result<Raster, DecodeError> {
            if bytes.len() < 2 {
                return Err(DecodeError::Truncated {
                    expected: 2,
                    actual: bytes.len(),
                });
            }
            let mut raster = Raster::new(10, 10);
            raster.fill_rect(u32::from(bytes[0]), u32::from(bytes[1]), 3, 4, Rgba::opaque(1, 2, 3));
            Ok(raster)
        }
    }

    #[test]
    fn test_tank_rotations() {
        let table = HitboxTable::with_defaults();
        let south = table.footprint(EntityKind::PlayerTank, Facing::South);
        let north = table.footprint(EntityKind::PlayerTank, Facing::North);
        let east = table.footprint(EntityKind::PlayerTank, Facing::East);
        let west = table.footprint(EntityKind::PlayerTank, Facing::West);

        assert_eq!(south, PixelRect::new(6, 2, 20, 28));
        assert_eq!(north, PixelRect::new(6, 2, 20, 28));
        assert_eq!(east, PixelRect::new(2, 6, 28, 20));
        assert_eq!(west, PixelRect::new(2, 6, 28, 20));
    }

    #[test]
    fn test_projectile_turns_about_canvas_center() {
        let table = HitboxTable::with_defaults();
        assert_eq!(
            table.footprint(EntityKind::GoldProjectile, Facing::North),
            PixelRect::new(3, 1, 2, 6)
        );
        assert_eq!(
            table.footprint(EntityKind::GoldProjectile, Facing::West),
            PixelRect::new(1, 3, 6, 2)
        );
    }

    #[test]
    fn test_landmine_never_rotates() {
        let table = HitboxTable::with_defaults();
        let base = table.footprint(EntityKind::Landmine, Facing::South);
        for facing in Facing::ALL {
            assert_eq!(table.footprint(EntityKind::Landmine, facing), base);
        }
    }

    #[test]
    fn test_register_encoded() {
        let mut table = HitboxTable::with_defaults();
        table
            .register_encoded(EntityKind::Landmine, &[1, 2], &SolidBlock)
            .expect("decodes");
        assert_eq!(
            table.footprint(EntityKind::Landmine, Facing::South),
            PixelRect::new(1, 2, 3, 4)
        );

        let err = table.register_encoded(EntityKind::Landmine, &[], &SolidBlock);
        assert!(err.is_err());
    }
}
