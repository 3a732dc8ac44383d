//! Chunk streaming: bake-on-miss cache with a visibility window.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use ironclad_common::ChunkCoord;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::chunk::{Chunk, ChunkLayout};
use crate::terrain::TerrainSynthesizer;

/// Largest accepted window radius in chunks.
pub const MAX_WINDOW_RADIUS: u32 = 16;

/// Square neighbourhood of chunks within a Chebyshev radius of a center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    center: ChunkCoord,
    radius: u32,
}

impl ChunkWindow {
    /// Creates a window. Radius 0 covers the center chunk only; radii above
    /// [`MAX_WINDOW_RADIUS`] are clamped to it.
    #[must_use]
    pub const fn new(center: ChunkCoord, radius: u32) -> Self {
        let radius = if radius > MAX_WINDOW_RADIUS {
            MAX_WINDOW_RADIUS
        } else {
            radius
        };
        Self { center, radius }
    }

    /// Center chunk.
    #[must_use]
    pub const fn center(&self) -> ChunkCoord {
        self.center
    }

    /// Chebyshev radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Checks whether a chunk lies inside the window.
    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.center.chebyshev_distance(coord) <= self.radius
    }

    /// Number of chunk slots in the window. Near the edge of the `i32`
    /// chunk range [`ChunkWindow::coords`] yields fewer.
    #[must_use]
    pub const fn len(&self) -> usize {
        let side = 2 * self.radius as usize + 1;
        side * side
    }

    /// A window always holds at least its center.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// All chunk coordinates in the window, row by row (y, then x).
    ///
    /// Slots past the `i32` chunk range are skipped.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> {
        let r = self.radius as i32;
        let c = self.center;
        (-r..=r)
            .filter_map(move |dy| c.y.checked_add(dy))
            .flat_map(move |y| {
                (-r..=r).filter_map(move |dx| c.x.checked_add(dx).map(|x| ChunkCoord::new(x, y)))
            })
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Chunks baked since creation
    pub bakes: u64,
    /// Chunks evicted since creation
    pub evictions: u64,
    /// Chunks currently resident
    pub resident: usize,
}

/// Keyed cache of baked chunks addressed by chunk coordinate.
///
/// Chunks bake on first request and stay resident until a later window
/// excludes them. Nothing is persisted: an evicted chunk is rebaked from
/// `(seed, coord)` and comes back byte-identical.
pub struct ChunkStore {
    layout: ChunkLayout,
    terrain: TerrainSynthesizer,
    resident: RwLock<AHashMap<ChunkCoord, Arc<Chunk>>>,
    window: Option<ChunkWindow>,
    bakes: AtomicU64,
    evictions: AtomicU64,
}

impl ChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(layout: ChunkLayout, terrain: TerrainSynthesizer) -> Self {
        debug!(
            "Creating chunk store: {} cells x {} px, seed {}",
            layout.chunk_size_cells(),
            layout.cell_size(),
            terrain.seed()
        );
        Self {
            layout,
            terrain,
            resident: RwLock::new(AHashMap::new()),
            window: None,
            bakes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Chunk geometry.
    #[must_use]
    pub const fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Terrain sampler used for baking.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainSynthesizer {
        &self.terrain
    }

    /// Current visibility window, if one has been set.
    #[must_use]
    pub const fn window(&self) -> Option<ChunkWindow> {
        self.window
    }

    /// Checks whether a chunk lies inside the current window.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.window.is_some_and(|w| w.contains(coord))
    }

    /// Checks whether a chunk is baked and cached.
    #[must_use]
    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.resident.read().contains_key(&coord)
    }

    /// Returns the cached chunk, baking it on a miss.
    pub fn get_or_bake(&self, coord: ChunkCoord) -> Arc<Chunk> {
        if let Some(chunk) = self.resident.read().get(&coord) {
            return Arc::clone(chunk);
        }

        let baked = Arc::new(self.bake(coord));
        let mut resident = self.resident.write();
        Arc::clone(resident.entry(coord).or_insert(baked))
    }

    /// Moves the window and evicts every resident chunk outside it.
    ///
    /// Returns the number of evicted chunks.
    pub fn set_visible_window(&mut self, center: ChunkCoord, radius: u32) -> usize {
        let window = ChunkWindow::new(center, radius);
        if self.window != Some(window) {
            trace!("Window moved to ({}, {}) r={radius}", center.x, center.y);
        }
        self.window = Some(window);

        let resident = self.resident.get_mut();
        let before = resident.len();
        resident.retain(|coord, _| window.contains(*coord));
        let evicted = before - resident.len();
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!("Evicted {evicted} chunks outside window");
        }
        evicted
    }

    /// Bakes every chunk of the current window that is not resident.
    ///
    /// Missing chunks bake in parallel and are committed under one write
    /// lock. Returns the number of chunks baked.
    pub fn bake_window(&self) -> usize {
        let Some(window) = self.window else {
            return 0;
        };

        let missing: Vec<ChunkCoord> = {
            let resident = self.resident.read();
            window.coords().filter(|c| !resident.contains_key(c)).collect()
        };
        if missing.is_empty() {
            return 0;
        }

        let baked: Vec<Chunk> = missing.par_iter().map(|&coord| self.bake(coord)).collect();

        let mut resident = self.resident.write();
        for chunk in baked {
            resident.entry(chunk.coord()).or_insert_with(|| Arc::new(chunk));
        }
        missing.len()
    }

    /// Resident chunks of the current window in row order.
    #[must_use]
    pub fn visible_chunks(&self) -> Vec<Arc<Chunk>> {
        let Some(window) = self.window else {
            return Vec::new();
        };
        let resident = self.resident.read();
        window
            .coords()
            .filter_map(|coord| resident.get(&coord).map(Arc::clone))
            .collect()
    }

    /// Coordinates of all resident chunks, sorted.
    #[must_use]
    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.resident.read().keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Cache counters.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            bakes: self.bakes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            resident: self.resident.read().len(),
        }
    }

    fn bake(&self, coord: ChunkCoord) -> Chunk {
        self.bakes.fetch_add(1, Ordering::Relaxed);
        debug!("Baking chunk ({}, {})", coord.x, coord.y);
        Chunk::bake(coord, self.layout, &self.terrain)
    }
}

impl std::fmt::Debug for ChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("layout", &self.layout)
            .field("window", &self.window)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainParams;

    fn store(seed: u64) -> ChunkStore {
        let layout = ChunkLayout::new(8, 2).expect("valid layout");
        let terrain = TerrainSynthesizer::new(seed, TerrainParams::default()).expect("valid");
        ChunkStore::new(layout, terrain)
    }

    #[test]
    fn test_window_radius_one_around_origin() {
        let mut store = store(12345);
        store.set_visible_window(ChunkCoord::new(0, 0), 1);
        assert_eq!(store.bake_window(), 9);

        let mut expected = Vec::new();
        for cx in -1..=1 {
            for cy in -1..=1 {
                expected.push(ChunkCoord::new(cx, cy));
            }
        }
        expected.sort_unstable();
        assert_eq!(store.resident_coords(), expected);
    }

    #[test]
    fn test_radius_zero_keeps_center() {
        let mut store = store(1);
        store.set_visible_window(ChunkCoord::new(4, -2), 0);
        store.bake_window();
        assert_eq!(store.resident_coords(), vec![ChunkCoord::new(4, -2)]);
    }

    #[test]
    fn test_resident_chunk_is_not_rebaked() {
        let store = store(5);
        let a = store.get_or_bake(ChunkCoord::new(0, 0));
        let b = store.get_or_bake(ChunkCoord::new(0, 0));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.stats().bakes, 1);
    }

    #[test]
    fn test_moving_window_evicts() {
        let mut store = store(5);
        store.set_visible_window(ChunkCoord::new(0, 0), 1);
        store.bake_window();
        let evicted = store.set_visible_window(ChunkCoord::new(3, 0), 1);
        assert_eq!(evicted, 9);
        assert_eq!(store.bake_window(), 9);
        assert!(store.resident_coords().iter().all(|c| c.x >= 2));
        assert_eq!(store.stats().evictions, 9);
    }

    #[test]
    fn test_overlapping_window_keeps_shared_chunks() {
        let mut store = store(5);
        store.set_visible_window(ChunkCoord::new(0, 0), 1);
        store.bake_window();
        let evicted = store.set_visible_window(ChunkCoord::new(1, 0), 1);
        assert_eq!(evicted, 3);
        assert_eq!(store.bake_window(), 3);
        assert_eq!(store.stats().bakes, 12);
    }

    #[test]
    fn test_rebake_after_eviction_is_identical() {
        let mut store = store(12345);
        let first = store.get_or_bake(ChunkCoord::new(2, 3));
        store.set_visible_window(ChunkCoord::new(-10, -10), 0);
        assert!(!store.is_resident(ChunkCoord::new(2, 3)));
        let second = store.get_or_bake(ChunkCoord::new(2, 3));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.raster().as_bytes(), second.raster().as_bytes());
    }

    #[test]
    fn test_visible_chunks_in_row_order() {
        let mut store = store(9);
        store.set_visible_window(ChunkCoord::new(0, 0), 1);
        store.bake_window();
        let coords: Vec<_> = store.visible_chunks().iter().map(|c| c.coord()).collect();
        assert_eq!(coords.len(), 9);
        assert_eq!(coords[0], ChunkCoord::new(-1, -1));
        assert_eq!(coords[1], ChunkCoord::new(0, -1));
        assert_eq!(coords[8], ChunkCoord::new(1, 1));
    }

    #[test]
    fn test_window_radius_is_clamped() {
        let window = ChunkWindow::new(ChunkCoord::new(0, 0), u32::MAX);
        assert_eq!(window.radius(), MAX_WINDOW_RADIUS);
        assert_eq!(window.coords().count(), window.len());
    }

    #[test]
    fn test_window_at_chunk_range_edge() {
        let mut store = store(3);
        let corner = ChunkCoord::new(i32::MAX, i32::MIN);
        store.set_visible_window(corner, 1);
        assert_eq!(store.bake_window(), 4);
        assert_eq!(
            store.resident_coords(),
            vec![
                ChunkCoord::new(i32::MAX - 1, i32::MIN),
                ChunkCoord::new(i32::MAX - 1, i32::MIN + 1),
                ChunkCoord::new(i32::MAX, i32::MIN),
                ChunkCoord::new(i32::MAX, i32::MIN + 1),
            ]
        );
        assert!(store.is_loaded(corner));
    }

    #[test]
    fn test_is_loaded_follows_window() {
        let mut store = store(9);
        assert!(!store.is_loaded(ChunkCoord::new(0, 0)));
        store.set_visible_window(ChunkCoord::new(0, 0), 2);
        assert!(store.is_loaded(ChunkCoord::new(-2, 2)));
        assert!(!store.is_loaded(ChunkCoord::new(3, 0)));
        assert_eq!(store.window().map(|w| w.len()), Some(25));
    }
}
