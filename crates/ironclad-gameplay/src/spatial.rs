//! Uniform-grid spatial hash for broad-phase collision queries.
//!
//! The index is rebuilt once per tick from the entities in loaded chunks.
//! It stores a snapshot of each body's hitbox as it was at insert time, so
//! every query in a tick sees the same positions no matter how many entities
//! have already moved.
//!
//! Movement checks read the same snapshot. A body that moved earlier in the
//! tick still blocks at its old spot and not at its new one, so two movers
//! in one tick can end up overlapping. Only the player tank moves under
//! move-and-revert.

use ahash::AHashMap;
use ironclad_common::{CellKey, ConfigError, EntityId, PixelRect};
use tracing::trace;

use crate::entity::Entity;

/// Snapshot of an indexed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedBody {
    /// Hitbox at insert time.
    pub rect: PixelRect,
    /// Pass-through bodies never block movement.
    pub pass_through: bool,
}

/// Statistics about the index contents.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndexStats {
    /// Number of non-empty cells.
    pub cell_count: usize,
    /// Number of indexed bodies.
    pub body_count: usize,
    /// Total bucket entries across all cells.
    pub entry_count: usize,
    /// Mean bucket size.
    pub avg_bucket: f64,
    /// Largest bucket size.
    pub max_bucket: usize,
}

/// Spatial hash keyed by `floor(pixel / cell_size)`.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: i32,
    buckets: AHashMap<CellKey, Vec<EntityId>>,
    bodies: AHashMap<EntityId, IndexedBody>,
}

impl SpatialIndex {
    /// Creates an empty index; `cell_size` must be non-zero.
    pub fn new(cell_size: u32) -> Result<Self, ConfigError> {
        ConfigError::require_nonzero("spatial_cell_size", cell_size)?;
        let cell_size = i32::try_from(cell_size).map_err(|_| ConfigError::TooLarge {
            field: "spatial_cell_size",
            value: u64::from(cell_size),
            max: i32::MAX as u64,
        })?;
        Ok(Self {
            cell_size,
            buckets: AHashMap::new(),
            bodies: AHashMap::new(),
        })
    }

    /// Cell edge length in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> i32 {
        self.cell_size
    }

    /// Drops every bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.bodies.clear();
    }

    /// Number of indexed bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// True if `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Indexed snapshot of `id`.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<IndexedBody> {
        self.bodies.get(&id).copied()
    }

    /// Indexes an entity under its current hitbox.
    pub fn insert(&mut self, entity: &Entity) {
        self.insert_body(
            entity.id(),
            IndexedBody {
                rect: entity.hitbox(),
                pass_through: entity.kind().is_pass_through(),
            },
        );
    }

    /// Indexes a body under every cell its rectangle overlaps.
    ///
    /// Re-inserting an id replaces its previous snapshot.
    pub fn insert_body(&mut self, id: EntityId, body: IndexedBody) {
        if self.bodies.contains_key(&id) {
            self.remove_id(id);
        }
        if let Some((min, max)) = body.rect.cell_span(self.cell_size) {
            for cy in min.y..=max.y {
                for cx in min.x..=max.x {
                    self.buckets.entry(CellKey::new(cx, cy)).or_default().push(id);
                }
            }
        }
        self.bodies.insert(id, body);
    }

    /// Removes an entity from the index.
    pub fn remove(&mut self, entity: &Entity) -> bool {
        self.remove_id(entity.id())
    }

    /// Removes a body by id, dropping buckets that become empty.
    pub fn remove_id(&mut self, id: EntityId) -> bool {
        let Some(body) = self.bodies.remove(&id) else {
            return false;
        };
        if let Some((min, max)) = body.rect.cell_span(self.cell_size) {
            for cy in min.y..=max.y {
                for cx in min.x..=max.x {
                    let key = CellKey::new(cx, cy);
                    if let Some(bucket) = self.buckets.get_mut(&key) {
                        bucket.retain(|other| *other != id);
                        if bucket.is_empty() {
                            self.buckets.remove(&key);
                        }
                    }
                }
            }
        }
        true
    }

    /// Ids sharing at least one cell with `rect`, excluding `exclude`.
    ///
    /// Broad phase only: the result may contain bodies that do not overlap.
    /// Sorted ascending with no duplicates.
    #[must_use]
    pub fn candidates_for(&self, exclude: EntityId, rect: PixelRect) -> Vec<EntityId> {
        let Some((min, max)) = rect.cell_span(self.cell_size) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for cy in min.y..=max.y {
            for cx in min.x..=max.x {
                if let Some(bucket) = self.buckets.get(&CellKey::new(cx, cy)) {
                    out.extend(bucket.iter().copied().filter(|id| *id != exclude));
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Broad-phase candidates for an entity at its current hitbox.
    #[must_use]
    pub fn query_candidates(&self, entity: &Entity) -> Vec<EntityId> {
        self.candidates_for(entity.id(), entity.hitbox())
    }

    /// Every candidate whose stored rect overlaps `rect`, ascending id.
    #[must_use]
    pub fn intersecting_rect(&self, exclude: EntityId, rect: PixelRect) -> Vec<EntityId> {
        self.candidates_for(exclude, rect)
            .into_iter()
            .filter(|id| self.overlaps(*id, &rect))
            .collect()
    }

    /// Every confirmed hit for an entity, ascending id.
    #[must_use]
    pub fn all_intersecting(&self, entity: &Entity) -> Vec<EntityId> {
        self.intersecting_rect(entity.id(), entity.hitbox())
    }

    /// First confirmed hit for an entity.
    ///
    /// Ties are broken by lowest entity id, so the result does not depend on
    /// bucket iteration order.
    #[must_use]
    pub fn first_intersecting(&self, entity: &Entity) -> Option<EntityId> {
        let rect = entity.hitbox();
        let hit = self
            .candidates_for(entity.id(), rect)
            .into_iter()
            .find(|id| self.overlaps(*id, &rect));
        trace!(entity = %entity.id(), ?hit, "first_intersecting");
        hit
    }

    /// True if `rect` overlaps any blocking (non pass-through) body other than `exclude`.
    #[must_use]
    pub fn is_blocked(&self, exclude: EntityId, rect: PixelRect) -> bool {
        self.candidates_for(exclude, rect).into_iter().any(|id| {
            self.bodies
                .get(&id)
                .is_some_and(|body| !body.pass_through && body.rect.intersects(&rect))
        })
    }

    /// Returns statistics about the current contents.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let cell_count = self.buckets.len();
        let entry_count: usize = self.buckets.values().map(Vec::len).sum();
        let max_bucket = self.buckets.values().map(Vec::len).max().unwrap_or(0);
        let avg_bucket = if cell_count == 0 {
            0.0
        } else {
            entry_count as f64 / cell_count as f64
        };
        IndexStats {
            cell_count,
            body_count: self.bodies.len(),
            entry_count,
            avg_bucket,
            max_bucket,
        }
    }

    fn overlaps(&self, id: EntityId, rect: &PixelRect) -> bool {
        self.bodies
            .get(&id)
            .is_some_and(|body| body.rect.intersects(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityArena, EntityKind, Facing};
    use crate::hitbox::HitboxTable;
    use ironclad_common::WorldPos;

    fn id(n: u64) -> EntityId {
        EntityId::from_raw(n)
    }

    fn solid(x: i32, y: i32, w: i32, h: i32) -> IndexedBody {
        IndexedBody {
            rect: PixelRect::new(x, y, w, h),
            pass_through: false,
        }
    }

    #[test]
    fn test_zero_cell_size_rejected() {
        assert!(SpatialIndex::new(0).is_err());
        assert!(SpatialIndex::new(32).is_ok());
    }

    #[test]
    fn test_insert_spans_partial_cells() {
        let mut index = SpatialIndex::new(10).expect("valid");
        index.insert_body(id(1), solid(5, 5, 10, 10));
        // Covers pixels 5..=14 on both axes: cells 0 and 1.
        let stats = index.stats();
        assert_eq!(stats.cell_count, 4);
        assert_eq!(stats.entry_count, 4);
        assert_eq!(stats.max_bucket, 1);
    }

    #[test]
    fn test_negative_coordinates_floor() {
        let mut index = SpatialIndex::new(10).expect("valid");
        index.insert_body(id(1), solid(-3, -3, 2, 2));
        assert_eq!(index.stats().cell_count, 1);
        assert_eq!(index.candidates_for(id(9), PixelRect::new(-10, -10, 1, 1)), vec![id(1)]);
        assert!(index.candidates_for(id(9), PixelRect::new(0, 0, 1, 1)).is_empty());
    }

    #[test]
    fn test_candidates_exclude_self_and_are_sorted() {
        let mut index = SpatialIndex::new(16).expect("valid");
        index.insert_body(id(3), solid(0, 0, 8, 8));
        index.insert_body(id(1), solid(4, 4, 8, 8));
        index.insert_body(id(2), solid(0, 0, 40, 40));
        let got = index.candidates_for(id(1), PixelRect::new(4, 4, 8, 8));
        assert_eq!(got, vec![id(2), id(3)]);
    }

    #[test]
    fn test_empty_lookup_returns_empty() {
        let index = SpatialIndex::new(16).expect("valid");
        assert!(index.candidates_for(id(1), PixelRect::new(0, 0, 4, 4)).is_empty());
        assert!(index.intersecting_rect(id(1), PixelRect::new(0, 0, 4, 4)).is_empty());
    }

    #[test]
    fn test_shared_cell_is_not_a_hit() {
        let mut index = SpatialIndex::new(32).expect("valid");
        index.insert_body(id(1), solid(0, 0, 4, 4));
        index.insert_body(id(2), solid(20, 20, 4, 4));
        assert_eq!(index.candidates_for(id(1), PixelRect::new(0, 0, 4, 4)), vec![id(2)]);
        assert!(index.intersecting_rect(id(1), PixelRect::new(0, 0, 4, 4)).is_empty());
    }

    #[test]
    fn test_lowest_id_wins_tie() {
        let mut index = SpatialIndex::new(8).expect("valid");
        index.insert_body(id(7), solid(0, 0, 10, 10));
        index.insert_body(id(4), solid(2, 2, 10, 10));
        index.insert_body(id(5), solid(1, 1, 10, 10));
        let hits = index.intersecting_rect(id(99), PixelRect::new(3, 3, 2, 2));
        assert_eq!(hits, vec![id(4), id(5), id(7)]);
    }

    #[test]
    fn test_remove_drops_empty_buckets() {
        let mut index = SpatialIndex::new(10).expect("valid");
        index.insert_body(id(1), solid(0, 0, 25, 5));
        index.insert_body(id(2), solid(0, 0, 5, 5));
        assert!(index.remove_id(id(1)));
        assert!(!index.remove_id(id(1)));
        let stats = index.stats();
        assert_eq!(stats.cell_count, 1);
        assert_eq!(stats.body_count, 1);
    }

    #[test]
    fn test_reinsert_replaces_snapshot() {
        let mut index = SpatialIndex::new(10).expect("valid");
        index.insert_body(id(1), solid(0, 0, 5, 5));
        index.insert_body(id(1), solid(100, 100, 5, 5));
        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().cell_count, 1);
        assert!(index.candidates_for(id(2), PixelRect::new(0, 0, 5, 5)).is_empty());
    }

    #[test]
    fn test_pass_through_does_not_block() {
        let mut index = SpatialIndex::new(16).expect("valid");
        index.insert_body(
            id(1),
            IndexedBody {
                rect: PixelRect::new(0, 0, 8, 8),
                pass_through: true,
            },
        );
        let probe = PixelRect::new(2, 2, 4, 4);
        assert!(!index.is_blocked(id(2), probe));
        index.insert_body(id(3), solid(4, 4, 8, 8));
        assert!(index.is_blocked(id(2), probe));
        assert!(!index.is_blocked(id(3), PixelRect::new(4, 4, 8, 8)));
    }

    #[test]
    fn test_empty_rect_is_not_indexed() {
        let mut index = SpatialIndex::new(16).expect("valid");
        index.insert_body(id(1), solid(0, 0, 0, 5));
        assert_eq!(index.len(), 1);
        assert_eq!(index.stats().cell_count, 0);
    }

    #[test]
    fn test_all_intersecting_lists_every_overlap() {
        let table = HitboxTable::with_defaults();
        let tank = |x: f64, y: f64| Entity::new(EntityKind::EnemyTank, WorldPos::new(x, y), Facing::South, &table);
        let mut arena = EntityArena::new();
        let a = arena.spawn(tank(0.0, 0.0));
        let b = arena.spawn(tank(10.0, 5.0));
        let c = arena.spawn(tank(200.0, 0.0));
        let d = arena.spawn(tank(-8.0, 0.0));

        let mut index = SpatialIndex::new(16).expect("valid");
        let subject = arena.get(a).expect("spawned");
        assert!(index.all_intersecting(subject).is_empty());

        for entity in arena.iter() {
            index.insert(entity);
        }
        assert_eq!(index.all_intersecting(subject), vec![b, d]);
        assert_eq!(index.first_intersecting(subject), Some(b));
        assert!(index.all_intersecting(arena.get(c).expect("spawned")).is_empty());
    }

    #[test]
    fn test_movement_checks_use_insert_snapshot() {
        let table = HitboxTable::with_defaults();
        let mut arena = EntityArena::new();
        let mover = arena.spawn(Entity::new(EntityKind::EnemyTank, WorldPos::new(0.0, 0.0), Facing::South, &table));
        let mut index = SpatialIndex::new(16).expect("valid");
        index.insert(arena.get(mover).expect("spawned"));

        let old_spot = arena.get(mover).expect("spawned").hitbox();
        arena.get_mut(mover).expect("spawned").set_position(WorldPos::new(100.0, 0.0));
        let new_spot = arena.get(mover).expect("spawned").hitbox();

        let other = EntityId::from_raw(99);
        assert!(index.is_blocked(other, old_spot));
        assert!(!index.is_blocked(other, new_spot));
    }
}
