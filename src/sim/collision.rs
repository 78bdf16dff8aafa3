//! Axis-aligned collision detection
//!
//! Every body in the world is a box given by its center and size, shrunk by
//! optional per-edge insets. Overlap is decided per axis; the per-axis result
//! doubles as a directional hint used by the stomp and turn-around rules.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Per-edge hitbox shrink (positive values move the edge inward)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// An axis-aligned body in world space (y grows upward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub center: DVec2,
    pub size: DVec2,
    pub insets: Insets,
}

impl Hitbox {
    pub fn new(center: DVec2, size: DVec2, insets: Insets) -> Self {
        Self {
            center,
            size,
            insets,
        }
    }

    /// Box standing with its bottom edge at `feet`, centered on `x`
    pub fn standing(x: f64, feet: f64, size: DVec2, insets: Insets) -> Self {
        Self::new(DVec2::new(x, feet + size.y / 2.0), size, insets)
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.center.x - self.size.x / 2.0 + self.insets.left
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.center.x + self.size.x / 2.0 - self.insets.right
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.center.y - self.size.y / 2.0 + self.insets.bottom
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.center.y + self.size.y / 2.0 - self.insets.top
    }
}

/// Where the first box sits vertically relative to the second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Above,
    Below,
    Overlap,
}

/// Where the first box sits horizontally relative to the second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
    Overlap,
}

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResult {
    /// Whether the boxes overlap on both axes
    pub hit: bool,
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

/// Compare box `a` against box `b`.
///
/// Touching edges do not count as overlap.
pub fn check_collision(a: &Hitbox, b: &Hitbox) -> CollisionResult {
    let vertical = if a.bottom() >= b.top() {
        Vertical::Above
    } else if a.top() <= b.bottom() {
        Vertical::Below
    } else {
        Vertical::Overlap
    };

    let horizontal = if a.right() <= b.left() {
        Horizontal::Left
    } else if a.left() >= b.right() {
        Horizontal::Right
    } else {
        Horizontal::Overlap
    };

    CollisionResult {
        hit: vertical == Vertical::Overlap && horizontal == Horizontal::Overlap,
        vertical,
        horizontal,
    }
}

#[inline]
pub fn overlaps(a: &Hitbox, b: &Hitbox) -> bool {
    check_collision(a, b).hit
}
