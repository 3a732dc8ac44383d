//! Coordinate types for world, chunk, and spatial-cell positions.

use serde::{Deserialize, Serialize};

/// World-space position in pixels (floating point).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    /// X coordinate in world space
    pub x: f64,
    /// Y coordinate in world space
    pub y: f64,
}

impl WorldPos {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns the pixel this position falls in (floor of each axis),
    /// saturating at the `i32` range.
    #[must_use]
    pub fn to_pixel(self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Converts to chunk coordinate given the chunk edge length in pixels.
    ///
    /// Saturates at the `i32` range.
    #[must_use]
    pub fn to_chunk_coord(self, chunk_px: u32) -> ChunkCoord {
        let size = f64::from(chunk_px);
        ChunkCoord {
            x: (self.x / size).floor() as i32,
            y: (self.y / size).floor() as i32,
        }
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts to the world pixel of the chunk's top-left corner.
    #[must_use]
    pub const fn origin_px(self, chunk_px: u32) -> (i64, i64) {
        (
            (self.x as i64) * (chunk_px as i64),
            (self.y as i64) * (chunk_px as i64),
        )
    }

    /// Chebyshev (chessboard) distance to another chunk coordinate.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        dx.max(dy) as u32
    }
}

/// Key of a spatial-index cell: `floor(pixel / cell_size)` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// X coordinate in cell space
    pub x: i32,
    /// Y coordinate in cell space
    pub y: i32,
}

impl CellKey {
    /// Creates a new cell key.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing the given pixel.
    #[must_use]
    pub const fn containing(px: i32, py: i32, cell_size: i32) -> Self {
        Self {
            x: px.div_euclid(cell_size),
            y: py.div_euclid(cell_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_floors_negative_positions() {
        assert_eq!(
            WorldPos::new(-1.0, 0.0).to_chunk_coord(512),
            ChunkCoord::new(-1, 0)
        );
        assert_eq!(
            WorldPos::new(511.9, 512.0).to_chunk_coord(512),
            ChunkCoord::new(0, 1)
        );
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ChunkCoord::new(0, 0);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(1, -1)), 1);
        assert_eq!(a.chebyshev_distance(ChunkCoord::new(-3, 2)), 3);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn test_cell_key_containing() {
        assert_eq!(CellKey::containing(31, 32, 32), CellKey::new(0, 1));
        assert_eq!(CellKey::containing(-1, -32, 32), CellKey::new(-1, -1));
        assert_eq!(CellKey::containing(-33, 0, 32), CellKey::new(-2, 0));
    }

    #[test]
    fn test_far_positions_saturate() {
        assert_eq!(WorldPos::new(3.0e9, -3.0e9).to_pixel(), (i32::MAX, i32::MIN));
        assert_eq!(
            WorldPos::new(1.0e15, 0.0).to_chunk_coord(512),
            ChunkCoord::new(i32::MAX, 0)
        );
    }

    #[test]
    fn test_origin_px() {
        assert_eq!(ChunkCoord::new(-2, 3).origin_px(512), (-1024, 1536));
    }
}
