//! Chunk geometry and baked chunk rasters.

use ironclad_common::{ChunkCoord, ConfigError, PixelRect, Raster, WorldPos};

use crate::terrain::{Ground, TerrainSynthesizer};

/// Largest accepted chunk edge in pixels. One bake allocates
/// `MAX_CHUNK_PX² × 4` bytes at most.
pub const MAX_CHUNK_PX: u32 = 4096;

/// Chunk geometry: cells per chunk edge and pixels per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    chunk_size_cells: u32,
    cell_size: u32,
}

impl ChunkLayout {
    /// Creates a layout. Both sizes must be non-zero and a chunk edge may
    /// span at most [`MAX_CHUNK_PX`] pixels.
    pub fn new(chunk_size_cells: u32, cell_size: u32) -> Result<Self, ConfigError> {
        ConfigError::require_nonzero("chunk_size_cells", chunk_size_cells)?;
        ConfigError::require_nonzero("cell_size", cell_size)?;
        let chunk_px = u64::from(chunk_size_cells) * u64::from(cell_size);
        ConfigError::require_at_most("chunk_size_cells * cell_size", chunk_px, u64::from(MAX_CHUNK_PX))?;
        Ok(Self {
            chunk_size_cells,
            cell_size,
        })
    }

    /// Cells along one chunk edge.
    #[must_use]
    pub const fn chunk_size_cells(&self) -> u32 {
        self.chunk_size_cells
    }

    /// Pixels along one cell edge.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Pixels along one chunk edge.
    #[must_use]
    pub const fn chunk_px(&self) -> u32 {
        self.chunk_size_cells * self.cell_size
    }

    /// Chunk containing a world position.
    #[must_use]
    pub fn chunk_of(&self, pos: WorldPos) -> ChunkCoord {
        pos.to_chunk_coord(self.chunk_px())
    }

    /// World-space bounds of a chunk.
    ///
    /// Returns `None` when the chunk does not fit in `i32` pixel space.
    #[must_use]
    pub fn chunk_bounds(&self, coord: ChunkCoord) -> Option<PixelRect> {
        let (x, y) = coord.origin_px(self.chunk_px());
        let size = i32::try_from(self.chunk_px()).ok()?;
        let x = i32::try_from(x).ok()?;
        let y = i32::try_from(y).ok()?;
        x.checked_add(size)?;
        y.checked_add(size)?;
        Some(PixelRect::new(x, y, size, size))
    }

    /// Global index of the cell containing world pixel `(px, py)`.
    #[must_use]
    pub const fn cell_of_pixel(&self, px: i64, py: i64) -> (i64, i64) {
        let size = self.cell_size as i64;
        (px.div_euclid(size), py.div_euclid(size))
    }

    /// Global cell index of a chunk-local pixel offset.
    ///
    /// Offsets may run past the chunk edge (`lx == chunk_px` is the first
    /// column of the right-hand neighbour), so shared edges resolve to the
    /// same global cell from either side.
    #[must_use]
    pub const fn local_to_global_cell(&self, coord: ChunkCoord, lx: i64, ly: i64) -> (i64, i64) {
        let (ox, oy) = coord.origin_px(self.chunk_px());
        self.cell_of_pixel(ox + lx, oy + ly)
    }

    /// Inclusive chunk range overlapped by a camera view rectangle.
    #[must_use]
    pub fn chunk_range_for_view(&self, view: PixelRect) -> (ChunkCoord, ChunkCoord) {
        let size = i64::from(self.chunk_px());
        let to_chunk = |v: i32| i64::from(v).div_euclid(size) as i32;
        (
            ChunkCoord::new(to_chunk(view.x), to_chunk(view.y)),
            ChunkCoord::new(
                to_chunk(view.x.saturating_add((view.width - 1).max(0))),
                to_chunk(view.y.saturating_add((view.height - 1).max(0))),
            ),
        )
    }

    /// Smallest window radius whose square covers a viewport of the given
    /// pixel size centred anywhere inside the center chunk.
    #[must_use]
    pub fn radius_for_viewport(&self, width: u32, height: u32) -> u32 {
        let half = f64::from(width.max(height)) / 2.0;
        (half / f64::from(self.chunk_px())).ceil() as u32
    }
}

/// A baked chunk: an immutable raster plus per-cell ground metadata.
///
/// Content is a pure function of `(seed, coord)` and never changes after
/// baking.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    coord: ChunkCoord,
    origin: (i64, i64),
    size_cells: u32,
    grounds: Vec<Ground>,
    raster: Raster,
}

impl Chunk {
    /// Bakes the chunk at `coord` by sampling every cell once.
    #[must_use]
    pub fn bake(coord: ChunkCoord, layout: ChunkLayout, terrain: &TerrainSynthesizer) -> Self {
        let cells = layout.chunk_size_cells();
        let cell_px = layout.cell_size();
        let origin = coord.origin_px(layout.chunk_px());
        let base_gx = i64::from(coord.x) * i64::from(cells);
        let base_gy = i64::from(coord.y) * i64::from(cells);

        let mut raster = Raster::new(layout.chunk_px(), layout.chunk_px());
        let mut grounds = Vec::with_capacity(cells as usize * cells as usize);

        for ly in 0..cells {
            for lx in 0..cells {
                let band = terrain.band_at_cell(base_gx + i64::from(lx), base_gy + i64::from(ly));
                grounds.push(band.ground);
                raster.fill_rect(lx * cell_px, ly * cell_px, cell_px, cell_px, band.color);
            }
        }

        Self {
            coord,
            origin,
            size_cells: cells,
            grounds,
            raster,
        }
    }

    /// Returns the chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// World-space pixel of the top-left corner.
    #[must_use]
    pub const fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// Baked raster.
    #[must_use]
    pub const fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Ground kind of the local cell `(lx, ly)`.
    #[must_use]
    pub fn ground(&self, lx: u32, ly: u32) -> Option<Ground> {
        if lx >= self.size_cells || ly >= self.size_cells {
            return None;
        }
        self.grounds
            .get(ly as usize * self.size_cells as usize + lx as usize)
            .copied()
    }
}
