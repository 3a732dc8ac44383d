//! Per-frame output for the presentation layer.

use std::sync::Arc;

use ironclad_common::{ChunkCoord, EntityId, PixelRect, Raster, WorldPos};
use ironclad_world::Chunk;

use crate::entity::{EntityKind, Facing};

/// A visible chunk and where to draw it.
#[derive(Debug, Clone)]
pub struct ChunkView {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// World-space pixel of the top-left corner.
    pub origin: (i64, i64),
    /// Shared baked chunk.
    pub chunk: Arc<Chunk>,
}

impl ChunkView {
    /// Baked raster to draw.
    #[must_use]
    pub fn raster(&self) -> &Raster {
        self.chunk.raster()
    }
}

/// Key the presentation layer resolves to a drawable sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    /// Entity kind.
    pub kind: EntityKind,
    /// Facing, selecting the rotation.
    pub facing: Facing,
}

/// A visible entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    /// Entity id.
    pub id: EntityId,
    /// Sprite to draw.
    pub sprite: SpriteRef,
    /// Sprite top-left in world space.
    pub position: WorldPos,
    /// Facing.
    pub facing: Facing,
    /// World-space hitbox, for debug overlays.
    pub hitbox: PixelRect,
    /// Current health.
    pub health: i32,
}

/// Everything drawn in one frame: chunks first, then entities.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Ticks simulated before this frame was built.
    pub tick: u64,
    /// Visible chunks in row order.
    pub chunks: Vec<ChunkView>,
    /// Visible entities in registration order.
    pub entities: Vec<EntityView>,
}

impl Frame {
    /// View of one entity, if it was drawn.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&EntityView> {
        self.entities.iter().find(|view| view.id == id)
    }
}

/// Consumer of rendered frames.
pub trait Presenter {
    /// Draws one frame.
    fn present(&mut self, frame: &Frame);
}

/// Keeps the most recent frames.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    frames: Vec<Frame>,
    capacity: usize,
    presented: u64,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new(16)
    }
}

impl FrameRecorder {
    /// Recorder keeping at most `capacity` frames (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::new(),
            capacity: capacity.max(1),
            presented: 0,
        }
    }

    /// Retained frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Most recent frame.
    #[must_use]
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Total frames presented, including dropped ones.
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }
}

impl Presenter for FrameRecorder {
    fn present(&mut self, frame: &Frame) {
        if self.frames.len() == self.capacity {
            self.frames.remove(0);
        }
        self.frames.push(frame.clone());
        self.presented += 1;
    }
}
