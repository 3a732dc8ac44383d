//! Entity system with arena-based storage.
//!
//! There is one [`Entity`] type; behaviour is chosen at construction by its
//! [`EntityKind`], [`Controller`] and [`CollisionPolicy`].

use ahash::AHashMap;
use ironclad_common::{EntityId, IdAllocator, PixelRect, WorldPos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::CollisionPolicy;
use crate::hitbox::HitboxTable;

/// Error types for entity operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    /// Entity not found
    #[error("Entity not found: {0}")]
    NotFound(EntityId),
    /// Entity already despawned
    #[error("Entity already despawned: {0}")]
    AlreadyDespawned(EntityId),
}

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Damage dealt by a regular projectile.
pub const REGULAR_PROJECTILE_DAMAGE: i32 = 5;
/// Damage dealt by a gold projectile.
pub const GOLD_PROJECTILE_DAMAGE: i32 = 15;

/// Type of entity in the game world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player's tank
    PlayerTank,
    /// Hostile tank
    EnemyTank,
    /// Standard shell
    RegularProjectile,
    /// Heavy shell fired by the player
    GoldProjectile,
    /// Buried mine
    Landmine,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::PlayerTank,
        Self::EnemyTank,
        Self::RegularProjectile,
        Self::GoldProjectile,
        Self::Landmine,
    ];

    /// Returns true for projectiles.
    #[must_use]
    pub const fn is_projectile(self) -> bool {
        matches!(self, Self::RegularProjectile | Self::GoldProjectile)
    }

    /// Pass-through entities never block movement.
    #[must_use]
    pub const fn is_pass_through(self) -> bool {
        self.is_projectile()
    }

    /// Whether the sprite turns with the facing.
    #[must_use]
    pub const fn is_rotatable(self) -> bool {
        !matches!(self, Self::Landmine)
    }

    /// Starting health.
    #[must_use]
    pub const fn default_health(self) -> i32 {
        match self {
            Self::PlayerTank | Self::EnemyTank => 50,
            Self::RegularProjectile | Self::GoldProjectile | Self::Landmine => 1,
        }
    }

    /// Movement speed in pixels per second.
    #[must_use]
    pub const fn default_speed(self) -> f64 {
        match self {
            Self::PlayerTank => 100.0,
            Self::RegularProjectile | Self::GoldProjectile => 500.0,
            Self::EnemyTank | Self::Landmine => 25.0,
        }
    }

    /// Damage a projectile of this kind deals, if it is one.
    #[must_use]
    pub const fn projectile_damage(self) -> Option<i32> {
        match self {
            Self::RegularProjectile => Some(REGULAR_PROJECTILE_DAMAGE),
            Self::GoldProjectile => Some(GOLD_PROJECTILE_DAMAGE),
            _ => None,
        }
    }
}

/// One of the four cardinal facings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Up the screen (-y)
    North,
    /// Right (+x)
    East,
    /// Down the screen (+y)
    #[default]
    South,
    /// Left (-x)
    West,
}

impl Facing {
    /// Every facing.
    pub const ALL: [Self; 4] = [Self::South, Self::West, Self::North, Self::East];

    /// Facing after a left turn.
    #[must_use]
    pub const fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Facing after a right turn.
    #[must_use]
    pub const fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Unit step along the facing in screen space.
    #[must_use]
    pub const fn delta(self) -> (f64, f64) {
        match self {
            Self::North => (0.0, -1.0),
            Self::East => (1.0, 0.0),
            Self::South => (0.0, 1.0),
            Self::West => (-1.0, 0.0),
        }
    }

    /// Clockwise quarter turns from the south-facing base sprite.
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::South => 0,
            Self::West => 1,
            Self::North => 2,
            Self::East => 3,
        }
    }
}

/// Health component for entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
}

impl Health {
    /// Creates a new health component with `starting` points.
    #[must_use]
    pub const fn new(starting: i32) -> Self {
        Self { current: starting }
    }

    /// Returns current health.
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Applies damage. Health may go negative.
    pub fn damage(&mut self, amount: i32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Checks if dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

/// Where an entity's per-tick behaviour comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Controller {
    /// Driven by the input source.
    Player,
    /// Stationary; only reacts to collisions.
    #[default]
    Idle,
    /// Flies straight along its facing at full speed.
    Projectile,
}

/// An entity in the game world.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    position: WorldPos,
    facing: Facing,
    speed: f64,
    footprint: PixelRect,
    health: Health,
    marked_for_removal: bool,
    policy: CollisionPolicy,
    controller: Controller,
}

impl Entity {
    /// Creates an entity with the defaults of its kind.
    ///
    /// The id stays [`EntityId::NULL`] until the entity is spawned into an
    /// [`EntityArena`].
    #[must_use]
    pub fn new(kind: EntityKind, position: WorldPos, facing: Facing, hitboxes: &HitboxTable) -> Self {
        let facing = if kind.is_rotatable() {
            facing
        } else {
            Facing::South
        };
        Self {
            id: EntityId::NULL,
            kind,
            position,
            facing,
            speed: kind.default_speed(),
            footprint: hitboxes.footprint(kind, facing),
            health: Health::new(kind.default_health()),
            marked_for_removal: false,
            policy: CollisionPolicy::None,
            controller: Controller::Idle,
        }
    }

    /// Sets the collision policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the controller.
    #[must_use]
    pub const fn with_controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    /// Returns the entity's unique ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the world position (sprite top-left).
    #[must_use]
    pub const fn position(&self) -> WorldPos {
        self.position
    }

    /// Sets the world position.
    pub fn set_position(&mut self, pos: WorldPos) {
        self.position = pos;
    }

    /// Returns the facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Turns the entity, refreshing its footprint. Non-rotatable kinds ignore this.
    pub fn rotate(&mut self, facing: Facing, hitboxes: &HitboxTable) {
        if !self.kind.is_rotatable() {
            return;
        }
        self.facing = facing;
        self.footprint = hitboxes.footprint(self.kind, facing);
    }

    /// Returns the speed in pixels per second.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Returns the health component.
    #[must_use]
    pub const fn health(&self) -> &Health {
        &self.health
    }

    /// Returns the collision policy.
    #[must_use]
    pub const fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Returns the controller.
    #[must_use]
    pub const fn controller(&self) -> Controller {
        self.controller
    }

    /// World-space hitbox: the footprint placed at the floored position.
    #[must_use]
    pub fn hitbox(&self) -> PixelRect {
        let (px, py) = self.position.to_pixel();
        self.footprint.translated(px, py)
    }

    /// Applies damage and flags the entity once health reaches zero.
    pub fn take_damage(&mut self, amount: i32) {
        self.health.damage(amount);
        if self.health.is_dead() {
            self.mark_for_removal();
        }
    }

    /// Flags the entity for removal at the end of the tick.
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    /// Returns whether the entity is flagged for removal.
    #[must_use]
    pub const fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }
}

/// Arena-based entity storage with stable slots and tombstoning.
///
/// Ids are allocated in registration order; iteration order for updates is
/// ascending id.
#[derive(Debug, Default)]
pub struct EntityArena {
    slots: Vec<Option<Entity>>,
    free_list: Vec<usize>,
    id_to_index: AHashMap<EntityId, usize>,
    ids: IdAllocator,
}

impl EntityArena {
    /// Creates a new empty entity arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_index.len()
    }

    /// Returns true if there are no live entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_index.is_empty()
    }

    /// Registers an entity, assigning its id.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = self.ids.allocate();
        entity.id = id;

        let index = if let Some(free_index) = self.free_list.pop() {
            self.slots[free_index] = Some(entity);
            free_index
        } else {
            self.slots.push(Some(entity));
            self.slots.len() - 1
        };

        self.id_to_index.insert(id, index);
        id
    }

    /// Removes an entity by ID.
    pub fn despawn(&mut self, id: EntityId) -> EntityResult<Entity> {
        let index = self
            .id_to_index
            .remove(&id)
            .ok_or(EntityError::NotFound(id))?;

        let entity = self.slots[index]
            .take()
            .ok_or(EntityError::AlreadyDespawned(id))?;

        self.free_list.push(index);
        Ok(entity)
    }

    /// Gets a reference to an entity by ID.
    pub fn get(&self, id: EntityId) -> EntityResult<&Entity> {
        let index = self.id_to_index.get(&id).ok_or(EntityError::NotFound(id))?;
        self.slots[*index].as_ref().ok_or(EntityError::NotFound(id))
    }

    /// Gets a mutable reference to an entity by ID.
    pub fn get_mut(&mut self, id: EntityId) -> EntityResult<&mut Entity> {
        let index = self.id_to_index.get(&id).ok_or(EntityError::NotFound(id))?;
        self.slots[*index].as_mut().ok_or(EntityError::NotFound(id))
    }

    /// Borrows two distinct entities mutably at once.
    ///
    /// Returns `None` if either is missing or `a == b`.
    pub fn get_pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        let ia = *self.id_to_index.get(&a)?;
        let ib = *self.id_to_index.get(&b)?;
        if ia == ib {
            return None;
        }
        if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            Some((lo[ia].as_mut()?, hi[0].as_mut()?))
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            let first = hi[0].as_mut()?;
            let second = lo[ib].as_mut()?;
            Some((first, second))
        }
    }

    /// Checks if an entity with the given ID exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_to_index.contains_key(&id)
    }

    /// Returns an iterator over all live entities (slot order).
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().filter_map(|opt| opt.as_ref())
    }

    /// Returns an iterator over entities of a specific kind.
    pub fn iter_by_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.iter().filter(move |e| e.kind() == kind)
    }

    /// Snapshot of live ids in registration order.
    #[must_use]
    pub fn ids_in_order(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.id_to_index.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Despawns every entity flagged for removal, returning them in id order.
    pub fn sweep_removed(&mut self) -> Vec<Entity> {
        let flagged: Vec<EntityId> = self
            .ids_in_order()
            .into_iter()
            .filter(|id| self.get(*id).is_ok_and(Entity::is_marked_for_removal))
            .collect();
        flagged
            .into_iter()
            .filter_map(|id| self.despawn(id).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HitboxTable {
        HitboxTable::with_defaults()
    }

    fn tank(x: f64, y: f64) -> Entity {
        Entity::new(EntityKind::EnemyTank, WorldPos::new(x, y), Facing::South, &table())
    }

    #[test]
    fn test_arena_spawn_and_get() {
        let mut arena = EntityArena::new();

        let id = arena.spawn(tank(0.0, 0.0));
        assert!(id.is_valid());
        assert_eq!(arena.len(), 1);

        let entity = arena.get(id).expect("Entity should exist");
        assert_eq!(entity.kind(), EntityKind::EnemyTank);
        assert_eq!(entity.id(), id);
    }

    #[test]
    fn test_arena_ids_follow_registration_order() {
        let mut arena = EntityArena::new();
        let a = arena.spawn(tank(0.0, 0.0));
        let b = arena.spawn(tank(10.0, 0.0));
        let _ = arena.despawn(a);
        let c = arena.spawn(tank(20.0, 0.0));

        // c reuses a's slot but still sorts after b.
        assert_eq!(arena.ids_in_order(), vec![b, c]);
    }

    #[test]
    fn test_arena_despawn() {
        let mut arena = EntityArena::new();

        let id = arena.spawn(tank(0.0, 0.0));
        let entity = arena.despawn(id).expect("Despawn should succeed");
        assert_eq!(entity.kind(), EntityKind::EnemyTank);
        assert!(arena.is_empty());
        assert_eq!(arena.get(id).map(Entity::id), Err(EntityError::NotFound(id)));
        assert!(arena.despawn(id).is_err());
    }

    #[test]
    fn test_get_pair_mut() {
        let mut arena = EntityArena::new();
        let a = arena.spawn(tank(0.0, 0.0));
        let b = arena.spawn(tank(50.0, 0.0));

        let (ea, eb) = arena.get_pair_mut(b, a).expect("distinct");
        assert_eq!(ea.id(), b);
        assert_eq!(eb.id(), a);
        eb.take_damage(5);
        assert_eq!(arena.get(a).expect("exists").health().current(), 45);

        assert!(arena.get_pair_mut(a, a).is_none());
        assert!(arena.get_pair_mut(a, EntityId::NULL).is_none());
    }

    #[test]
    fn test_take_damage_flags_at_zero() {
        let mut e = tank(0.0, 0.0);
        e.take_damage(49);
        assert!(!e.is_marked_for_removal());
        e.take_damage(1);
        assert!(e.is_marked_for_removal());
    }

    #[test]
    fn test_sweep_removed() {
        let mut arena = EntityArena::new();
        let a = arena.spawn(tank(0.0, 0.0));
        let b = arena.spawn(tank(50.0, 0.0));
        arena.get_mut(a).expect("exists").mark_for_removal();

        let removed = arena.sweep_removed();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), a);
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
    }

    #[test]
    fn test_turning_cycles() {
        let mut f = Facing::North;
        for _ in 0..4 {
            f = f.turn_left();
        }
        assert_eq!(f, Facing::North);
        assert_eq!(Facing::South.turn_left(), Facing::East);
        assert_eq!(Facing::South.turn_right(), Facing::West);
        assert_eq!(Facing::North.turn_right().turn_left(), Facing::North);
    }

    #[test]
    fn test_landmine_does_not_rotate() {
        let table = table();
        let mut mine = Entity::new(EntityKind::Landmine, WorldPos::default(), Facing::East, &table);
        assert_eq!(mine.facing(), Facing::South);
        mine.rotate(Facing::North, &table);
        assert_eq!(mine.facing(), Facing::South);
    }

    #[test]
    fn test_hitbox_uses_floored_position() {
        let e = tank(10.7, -0.5);
        let fp = table().footprint(EntityKind::EnemyTank, Facing::South);
        assert_eq!(e.hitbox(), fp.translated(10, -1));
    }
}
