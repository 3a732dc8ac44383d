//! Integer pixel rectangles used for hitboxes and camera views.

use serde::{Deserialize, Serialize};

use crate::coords::CellKey;

/// Axis-aligned rectangle in whole pixels.
///
/// `x`/`y` is the top-left corner; the rectangle covers
/// `x..x + width` by `y..y + height`. Edge arithmetic saturates at the `i32`
/// range, so rectangles near the far edge of the world shrink against it
/// instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// X coordinate of the left edge.
    pub x: i32,
    /// Y coordinate of the top edge.
    pub y: i32,
    /// Width of the rectangle.
    pub width: i32,
    /// Height of the rectangle.
    pub height: i32,
}

impl PixelRect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the right edge x coordinate (exclusive).
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Returns the bottom edge y coordinate (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Returns true if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns the center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Returns this rectangle moved by `(dx, dy)`.
    #[must_use]
    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Checks if this rectangle shares at least one pixel with another.
    ///
    /// Touching edges do not count, and empty rectangles intersect nothing.
    #[must_use]
    pub const fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Inclusive range of spatial cells this rectangle overlaps.
    ///
    /// Returns `None` for empty rectangles.
    #[must_use]
    pub const fn cell_span(&self, cell_size: i32) -> Option<(CellKey, CellKey)> {
        if self.is_empty() || self.right() <= self.x || self.bottom() <= self.y {
            return None;
        }
        let min = CellKey::containing(self.x, self.y, cell_size);
        let max = CellKey::containing(self.right() - 1, self.bottom() - 1, cell_size);
        Some((min, max))
    }

    /// Rotates the rectangle about the center of a `canvas_w` x `canvas_h`
    /// canvas by `quarter_turns` clockwise 90 degree steps (screen space, y down).
    #[must_use]
    pub fn rotated_in_canvas(&self, canvas_w: i32, canvas_h: i32, quarter_turns: u8) -> Self {
        let cx = f64::from(canvas_w) / 2.0;
        let cy = f64::from(canvas_h) / 2.0;
        let corners = [
            (f64::from(self.x), f64::from(self.y)),
            (f64::from(self.right()), f64::from(self.y)),
            (f64::from(self.x), f64::from(self.bottom())),
            (f64::from(self.right()), f64::from(self.bottom())),
        ];

        let turn = |(px, py): (f64, f64)| -> (f64, f64) {
            let (dx, dy) = (px - cx, py - cy);
            match quarter_turns % 4 {
                0 => (cx + dx, cy + dy),
                1 => (cx - dy, cy + dx),
                2 => (cx - dx, cy - dy),
                _ => (cx + dy, cy - dx),
            }
        };

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for corner in corners {
            let (x, y) = turn(corner);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let x = min_x.round() as i32;
        let y = min_y.round() as i32;
        Self::new(
            x,
            y,
            (max_x.round() as i32).saturating_sub(x),
            (max_y.round() as i32).saturating_sub(y),
        )
    }
}
