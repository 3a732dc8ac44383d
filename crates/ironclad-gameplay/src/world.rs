//! Simulation context: entity registry, tick orchestration and rendering.
//!
//! A [`World`] owns everything one simulation needs. There is no shared
//! global state, so several worlds can run side by side in one process.
//!
//! Each [`World::update`] runs in a fixed order:
//!
//! 1. clear the spatial index
//! 2. index every entity whose chunk is inside the loaded window
//! 3. run each of those entities in registration order: collisions against
//!    the start-of-tick index, then its controller
//! 4. commit spawns queued during step 3
//! 5. sweep entities flagged for removal
//!
//! Entities outside the loaded window are frozen until their chunk loads
//! again.

use ironclad_common::{ChunkCoord, ConfigError, EntityId, IroncladResult, RasterDecoder, WorldPos};
use ironclad_world::{ChunkLayout, ChunkStore, TerrainParams, TerrainSynthesizer, MAX_WINDOW_RADIUS};
use tracing::{debug, trace};

use crate::collision::{handle_collisions, try_move, CollisionPolicy};
use crate::effects::EffectSink;
use crate::entity::{Controller, Entity, EntityArena, EntityKind, Facing};
use crate::frame::{ChunkView, EntityView, Frame, SpriteRef};
use crate::hitbox::HitboxTable;
use crate::input::{InputFrame, Intent};
use crate::spatial::SpatialIndex;

/// Distance from the shooter's hitbox centre to the muzzle.
pub const MUZZLE_OFFSET: f64 = 20.0;

/// Random spawn positions tried before giving up on a crowded chunk.
pub const SPAWN_ATTEMPTS: usize = 16;

/// Construction parameters for a [`World`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    /// Terrain seed.
    pub seed: u64,
    /// Cells along one chunk edge.
    pub chunk_size_cells: u32,
    /// Pixels along one cell edge.
    pub cell_size: u32,
    /// Chebyshev radius of the loaded window, in chunks.
    pub window_radius: u32,
    /// Terrain synthesis parameters.
    pub terrain: TerrainParams,
    /// Spatial index cell edge in pixels.
    pub spatial_cell_size: u32,
    /// Seed for random spawning.
    pub rng_seed: u64,
    /// Where the player tank starts.
    pub player_spawn: WorldPos,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            chunk_size_cells: 128,
            cell_size: 4,
            window_radius: 1,
            terrain: TerrainParams::default(),
            spatial_cell_size: 32,
            rng_seed: 0,
            player_spawn: WorldPos::new(200.0, 200.0),
        }
    }
}

impl WorldConfig {
    /// Checks every tuning parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ChunkLayout::new(self.chunk_size_cells, self.cell_size)?;
        ConfigError::require_at_most(
            "window_radius",
            u64::from(self.window_radius),
            u64::from(MAX_WINDOW_RADIUS),
        )?;
        self.terrain.validate()?;
        ConfigError::require_nonzero("spatial_cell_size", self.spatial_cell_size)?;
        if !self.player_spawn.x.is_finite() || !self.player_spawn.y.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "player_spawn",
                value: if self.player_spawn.x.is_finite() {
                    self.player_spawn.y
                } else {
                    self.player_spawn.x
                },
            });
        }
        Ok(())
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Entities registered by queued spawns, in commit order.
    pub spawned: Vec<EntityId>,
    /// Entities swept at the end of the tick, in id order.
    pub removed: Vec<EntityId>,
}

/// The simulation context.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    chunks: ChunkStore,
    arena: EntityArena,
    index: SpatialIndex,
    hitboxes: HitboxTable,
    player: EntityId,
    pending: Vec<Entity>,
    rng: fastrand::Rng,
    tick: u64,
}

impl World {
    /// Creates a world with the built-in hitbox table.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        Self::with_hitboxes(config, HitboxTable::with_defaults())
    }

    /// Creates a world with a custom hitbox table.
    ///
    /// The player tank is registered first and the loaded window is placed
    /// around it, so the first update already sees the player as loaded.
    pub fn with_hitboxes(config: WorldConfig, hitboxes: HitboxTable) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = ChunkLayout::new(config.chunk_size_cells, config.cell_size)?;
        let terrain = TerrainSynthesizer::new(config.seed, config.terrain)?;
        let index = SpatialIndex::new(config.spatial_cell_size)?;

        let mut world = Self {
            config,
            chunks: ChunkStore::new(layout, terrain),
            arena: EntityArena::new(),
            index,
            hitboxes,
            player: EntityId::NULL,
            pending: Vec::new(),
            rng: fastrand::Rng::with_seed(config.rng_seed),
            tick: 0,
        };

        let player = world.make_entity(EntityKind::PlayerTank, config.player_spawn, Facing::South);
        world.player = world.arena.spawn(player);
        let center = layout.chunk_of(config.player_spawn);
        world.chunks.set_visible_window(center, config.window_radius);

        debug!(
            "World created: seed {}, player {} in chunk ({}, {})",
            config.seed, world.player, center.x, center.y
        );
        Ok(world)
    }

    /// Creates a world whose footprints come from packed south-facing
    /// sprites, decoded through `decoder`. Kinds not listed keep their
    /// built-in footprint.
    pub fn with_sprites(
        config: WorldConfig,
        sprites: &[(EntityKind, &[u8])],
        decoder: &dyn RasterDecoder,
    ) -> IroncladResult<Self> {
        let mut hitboxes = HitboxTable::with_defaults();
        for (kind, bytes) in sprites {
            hitboxes.register_encoded(*kind, bytes, decoder)?;
        }
        Ok(Self::with_hitboxes(config, hitboxes)?)
    }

    /// Construction parameters.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Ticks simulated so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Chunk cache and window.
    #[must_use]
    pub const fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    /// Index built at the start of the last tick.
    #[must_use]
    pub const fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Footprint table.
    #[must_use]
    pub const fn hitboxes(&self) -> &HitboxTable {
        &self.hitboxes
    }

    /// Live entities.
    #[must_use]
    pub const fn entities(&self) -> &EntityArena {
        &self.arena
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id).ok()
    }

    /// Mutable access to a live entity.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id).ok()
    }

    /// Id the player tank was registered under.
    #[must_use]
    pub const fn player_id(&self) -> EntityId {
        self.player
    }

    /// The player tank, while it is alive.
    #[must_use]
    pub fn player(&self) -> Option<&Entity> {
        self.entity(self.player)
    }

    /// Chunk an entity currently belongs to.
    #[must_use]
    pub fn chunk_of(&self, entity: &Entity) -> ChunkCoord {
        self.chunks.layout().chunk_of(entity.position())
    }

    /// True if the entity's chunk is inside the loaded window.
    #[must_use]
    pub fn is_loaded(&self, entity: &Entity) -> bool {
        self.chunks.is_loaded(self.chunk_of(entity))
    }

    /// Builds an entity of `kind` with that kind's controller and policy.
    ///
    /// Projectiles built here have no source to spare; use
    /// [`World::make_projectile`] for fired shells.
    #[must_use]
    pub fn make_entity(&self, kind: EntityKind, position: WorldPos, facing: Facing) -> Entity {
        let entity = Entity::new(kind, position, facing, &self.hitboxes);
        match kind {
            EntityKind::PlayerTank => entity.with_controller(Controller::Player),
            EntityKind::EnemyTank => entity,
            EntityKind::Landmine => entity.with_policy(CollisionPolicy::landmine()),
            EntityKind::RegularProjectile | EntityKind::GoldProjectile => entity
                .with_controller(Controller::Projectile)
                .with_policy(CollisionPolicy::Damage {
                    amount: kind.projectile_damage().unwrap_or_default(),
                    exclude_source: None,
                }),
        }
    }

    /// Builds a projectile that never damages `shooter`.
    #[must_use]
    pub fn make_projectile(
        &self,
        kind: EntityKind,
        position: WorldPos,
        facing: Facing,
        shooter: EntityId,
    ) -> Entity {
        Entity::new(kind, position, facing, &self.hitboxes)
            .with_controller(Controller::Projectile)
            .with_policy(CollisionPolicy::projectile(kind, shooter))
    }

    /// Registers an entity of `kind` immediately.
    pub fn spawn(&mut self, kind: EntityKind, position: WorldPos, facing: Facing) -> EntityId {
        let entity = self.make_entity(kind, position, facing);
        self.spawn_entity(entity)
    }

    /// Registers a prepared entity immediately.
    ///
    /// Must not be called from inside an update; spawns during a tick go
    /// through the pending queue.
    pub fn spawn_entity(&mut self, entity: Entity) -> EntityId {
        let kind = entity.kind();
        let id = self.arena.spawn(entity);
        debug!("Spawned {:?} {}", kind, id);
        id
    }

    /// Spawns an enemy tank or a landmine at a random point of the player's chunk.
    ///
    /// Returns `None` once the player is gone, or when no free spot turned up.
    pub fn spawn_random_near_player(&mut self) -> Option<EntityId> {
        let kind = self.random_hazard();
        self.spawn_near_player(kind)
    }

    /// Spawns `kind` at a random point of the player's chunk, facing south.
    ///
    /// Spots whose hitbox would overlap a blocking entity are rejected and
    /// redrawn, up to [`SPAWN_ATTEMPTS`] times.
    pub fn spawn_near_player(&mut self, kind: EntityKind) -> Option<EntityId> {
        let entity = self.random_near_player(kind)?;
        Some(self.spawn_entity(entity))
    }

    fn random_hazard(&mut self) -> EntityKind {
        if self.rng.bool() {
            EntityKind::EnemyTank
        } else {
            EntityKind::Landmine
        }
    }

    fn random_near_player(&mut self, kind: EntityKind) -> Option<Entity> {
        let center = self.chunk_of(self.player()?);
        let Some(bounds) = self.chunks.layout().chunk_bounds(center) else {
            debug!("No spawn: chunk ({}, {}) is outside pixel range", center.x, center.y);
            return None;
        };
        for _ in 0..SPAWN_ATTEMPTS {
            let x = f64::from(bounds.x) + self.rng.f64() * f64::from(bounds.width);
            let y = f64::from(bounds.y) + self.rng.f64() * f64::from(bounds.height);
            let entity = self.make_entity(kind, WorldPos::new(x, y), Facing::South);
            if self.is_free(&entity) {
                return Some(entity);
            }
        }
        debug!("No free spot for {:?} after {} attempts", kind, SPAWN_ATTEMPTS);
        None
    }

    /// True if `entity` overlaps no blocking entity, registered or queued.
    fn is_free(&self, entity: &Entity) -> bool {
        let rect = entity.hitbox();
        self.arena
            .iter()
            .chain(&self.pending)
            .filter(|other| !other.kind().is_pass_through())
            .all(|other| !other.hitbox().intersects(&rect))
    }

    /// Advances the simulation by one fixed step of `dt` seconds.
    pub fn update(&mut self, dt: f64, input: &InputFrame, effects: &mut dyn EffectSink) -> TickReport {
        self.index.clear();
        let active: Vec<EntityId> = self
            .arena
            .ids_in_order()
            .into_iter()
            .filter(|id| self.arena.get(*id).is_ok_and(|e| self.is_loaded(e)))
            .collect();
        for id in &active {
            if let Ok(entity) = self.arena.get(*id) {
                self.index.insert(entity);
            }
        }
        trace!(tick = self.tick, active = active.len(), "index rebuilt");

        for id in active {
            if self.arena.get(id).map_or(true, Entity::is_marked_for_removal) {
                continue;
            }
            handle_collisions(&mut self.arena, &self.index, id, effects);
            self.run_controller(id, dt, input);
        }

        let mut report = TickReport::default();
        for entity in std::mem::take(&mut self.pending) {
            report.spawned.push(self.spawn_entity(entity));
        }
        for entity in self.arena.sweep_removed() {
            debug!("Removed {:?} {}", entity.kind(), entity.id());
            report.removed.push(entity.id());
        }

        self.tick += 1;
        report
    }

    fn run_controller(&mut self, id: EntityId, dt: f64, input: &InputFrame) {
        let Some(controller) = self.entity(id).map(Entity::controller) else {
            return;
        };
        match controller {
            Controller::Idle => {}
            Controller::Player => self.drive_player(id, dt, input),
            Controller::Projectile => self.fly_projectile(id, dt),
        }
    }

    fn drive_player(&mut self, id: EntityId, dt: f64, input: &InputFrame) {
        if input.active(Intent::TurnLeft) {
            self.turn(id, Facing::turn_left);
        }
        if input.active(Intent::TurnRight) {
            self.turn(id, Facing::turn_right);
        }
        if input.active(Intent::Fire) {
            self.fire(id, EntityKind::GoldProjectile);
        }
        if input.active(Intent::SpawnNearby) {
            let kind = self.random_hazard();
            if let Some(entity) = self.random_near_player(kind) {
                self.pending.push(entity);
            }
        }

        let mut step = 0.0;
        if input.active(Intent::MoveForward) {
            step += 1.0;
        }
        if input.active(Intent::MoveBackward) {
            step -= 1.0;
        }
        if step != 0.0 {
            self.drive(id, step, dt);
        }
    }

    fn turn(&mut self, id: EntityId, turn: fn(Facing) -> Facing) {
        let hitboxes = &self.hitboxes;
        if let Ok(entity) = self.arena.get_mut(id) {
            let facing = turn(entity.facing());
            entity.rotate(facing, hitboxes);
        }
    }

    /// Moves an entity along (or against, for negative `direction`) its facing,
    /// reverting if it would end up inside a blocking entity.
    fn drive(&mut self, id: EntityId, direction: f64, dt: f64) {
        let index = &self.index;
        if let Ok(entity) = self.arena.get_mut(id) {
            let (ux, uy) = entity.facing().delta();
            let distance = entity.speed() * dt * direction;
            if !try_move(entity, index, ux * distance, uy * distance) {
                trace!("{} blocked", id);
            }
        }
    }

    /// Queues a projectile fired from `shooter`'s muzzle.
    fn fire(&mut self, shooter: EntityId, kind: EntityKind) {
        let Some(entity) = self.entity(shooter) else {
            return;
        };
        let facing = entity.facing();
        let (cx, cy) = entity.hitbox().center();
        let (ux, uy) = facing.delta();
        let muzzle = WorldPos::new(cx + ux * MUZZLE_OFFSET, cy + uy * MUZZLE_OFFSET);
        let projectile = self.make_projectile(kind, muzzle, facing, shooter);
        trace!("{} fired {:?} {:?}", shooter, kind, facing);
        self.pending.push(projectile);
    }

    fn fly_projectile(&mut self, id: EntityId, dt: f64) {
        let Ok(entity) = self.arena.get_mut(id) else {
            return;
        };
        let (ux, uy) = entity.facing().delta();
        let distance = entity.speed() * dt;
        entity.set_position(entity.position().offset(ux * distance, uy * distance));

        let chunk = self.chunks.layout().chunk_of(entity.position());
        if !self.chunks.is_loaded(chunk) {
            entity.mark_for_removal();
        }
    }

    /// Renders from the player's position, or from the last window centre
    /// once the player is gone.
    pub fn render(&mut self) -> Frame {
        let center = match self.player() {
            Some(player) => self.chunk_of(player),
            None => self
                .chunks
                .window()
                .map(|w| w.center())
                .unwrap_or_default(),
        };
        self.render_around(center)
    }

    /// Renders from an arbitrary viewer position.
    pub fn render_from(&mut self, viewer: WorldPos) -> Frame {
        let center = self.chunks.layout().chunk_of(viewer);
        self.render_around(center)
    }

    fn render_around(&mut self, center: ChunkCoord) -> Frame {
        self.chunks.set_visible_window(center, self.config.window_radius);
        let baked = self.chunks.bake_window();
        if baked > 0 {
            trace!("Baked {} chunks for window at ({}, {})", baked, center.x, center.y);
        }

        let chunks = self
            .chunks
            .visible_chunks()
            .into_iter()
            .map(|chunk| ChunkView {
                coord: chunk.coord(),
                origin: chunk.origin(),
                chunk,
            })
            .collect();

        let entities = self
            .arena
            .ids_in_order()
            .into_iter()
            .filter_map(|id| self.arena.get(id).ok())
            .filter(|entity| self.is_loaded(entity))
            .map(|entity| EntityView {
                id: entity.id(),
                sprite: SpriteRef {
                    kind: entity.kind(),
                    facing: entity.facing(),
                },
                position: entity.position(),
                facing: entity.facing(),
                hitbox: entity.hitbox(),
                health: entity.health().current(),
            })
            .collect();

        Frame {
            tick: self.tick,
            chunks,
            entities,
        }
    }
}
