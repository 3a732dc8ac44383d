//! Collision dispatch and move-and-revert response.

use ironclad_common::EntityId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{EffectSink, Impact};
use crate::entity::{Entity, EntityArena, EntityKind};
use crate::spatial::SpatialIndex;

/// Magnitude reported for a projectile impact.
pub const PROJECTILE_IMPACT_MAGNITUDE: f64 = 25.0;
/// Default landmine blast radius.
pub const LANDMINE_RADIUS: f64 = 50.0;
/// Default landmine damage.
pub const LANDMINE_DAMAGE: i32 = 50;

/// What an entity does when it touches another.
///
/// The policy owns every side effect of a collision; detection only finds
/// the partner and dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// No reaction.
    #[default]
    None,
    /// Hurt the other entity once, then disappear.
    Damage {
        /// Health removed from the other entity.
        amount: i32,
        /// Entity that is never damaged (the shooter).
        exclude_source: Option<EntityId>,
    },
    /// Blow up on contact.
    Explode {
        /// Blast radius, reported as the impact magnitude.
        radius: f64,
        /// Health removed from the other entity.
        damage: i32,
    },
}

impl CollisionPolicy {
    /// Landmine policy with default radius and damage.
    #[must_use]
    pub const fn landmine() -> Self {
        Self::Explode {
            radius: LANDMINE_RADIUS,
            damage: LANDMINE_DAMAGE,
        }
    }

    /// Projectile policy for `kind` fired by `shooter`.
    #[must_use]
    pub fn projectile(kind: EntityKind, shooter: EntityId) -> Self {
        match kind.projectile_damage() {
            Some(amount) => Self::Damage {
                amount,
                exclude_source: Some(shooter),
            },
            None => Self::None,
        }
    }

    /// Applies this policy for `me` touching `other`.
    ///
    /// Returns true if the policy reacted.
    pub fn on_collide(&self, me: &mut Entity, other: &mut Entity, effects: &mut dyn EffectSink) -> bool {
        debug_assert_ne!(me.id(), other.id(), "collision policy dispatched against itself");

        match *self {
            Self::None => false,
            Self::Damage {
                amount,
                exclude_source,
            } => {
                if exclude_source == Some(other.id()) || other.kind().is_projectile() {
                    return false;
                }
                report_impact(me, PROJECTILE_IMPACT_MAGNITUDE, effects);
                other.take_damage(amount);
                me.mark_for_removal();
                debug!(source = %me.id(), target = %other.id(), amount, "projectile hit");
                true
            }
            Self::Explode { radius, damage } => {
                if other.kind() == EntityKind::Landmine || other.kind().is_projectile() {
                    return false;
                }
                report_impact(me, radius, effects);
                other.take_damage(damage);
                me.mark_for_removal();
                debug!(source = %me.id(), target = %other.id(), damage, "landmine detonated");
                true
            }
        }
    }
}

fn report_impact(me: &Entity, magnitude: f64, effects: &mut dyn EffectSink) {
    let (cx, cy) = me.hitbox().center();
    effects.impact(Impact {
        x: cx.floor() as i32,
        y: cy.floor() as i32,
        magnitude,
    });
}

/// Finds the first entity `id` overlaps and runs its policy against it.
///
/// Returns the partner if one was found, whether or not the policy reacted.
pub fn handle_collisions(
    arena: &mut EntityArena,
    index: &SpatialIndex,
    id: EntityId,
    effects: &mut dyn EffectSink,
) -> Option<EntityId> {
    let me = arena.get(id).ok()?;
    let policy = me.policy();
    let hit = index.first_intersecting(me)?;
    if policy == CollisionPolicy::None {
        return Some(hit);
    }
    if let Some((me, other)) = arena.get_pair_mut(id, hit) {
        policy.on_collide(me, other, effects);
    }
    Some(hit)
}

/// Moves `entity` by `(dx, dy)` unless the new hitbox overlaps a blocking body.
///
/// On rejection the position is restored exactly. Returns true if the move
/// was kept. Blockers are read from the index snapshot, not live positions.
pub fn try_move(entity: &mut Entity, index: &SpatialIndex, dx: f64, dy: f64) -> bool {
    let original = entity.position();
    entity.set_position(original.offset(dx, dy));
    if index.is_blocked(entity.id(), entity.hitbox()) {
        entity.set_position(original);
        return false;
    }
    true
}
