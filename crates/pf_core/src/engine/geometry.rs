//! Screen-space rectangle and angle math.
//!
//! Coordinates are f32 pixels with y growing downward. Trajectory angles
//! are degrees with 0 = right and 90 = straight up, so converting an angle
//! to a velocity negates the y component.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Construct from a center point and size.
    pub fn from_center(center: (f32, f32), size: (f32, f32)) -> Self {
        Self { x: center.0 - size.0 / 2.0, y: center.1 - size.1 / 2.0, w: size.0, h: size.1 }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    #[inline]
    pub fn midtop(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y)
    }

    #[inline]
    pub fn set_left(&mut self, left: f32) {
        self.x = left;
    }

    #[inline]
    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.w;
    }

    #[inline]
    pub fn set_top(&mut self, top: f32) {
        self.y = top;
    }

    #[inline]
    pub fn set_bottom(&mut self, bottom: f32) {
        self.y = bottom - self.h;
    }

    pub fn set_center(&mut self, center: (f32, f32)) {
        self.x = center.0 - self.w / 2.0;
        self.y = center.1 - self.h / 2.0;
    }

    pub fn set_midtop(&mut self, midtop: (f32, f32)) {
        self.x = midtop.0 - self.w / 2.0;
        self.y = midtop.1;
    }

    /// Strict overlap test: rectangles that merely touch along an edge do
    /// not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// True when this rect lies completely beyond `bounds` on at least one
    /// side. A rect straddling an edge is still inside.
    #[inline]
    pub fn fully_outside(&self, bounds: &Rect) -> bool {
        self.right() < bounds.left()
            || self.left() > bounds.right()
            || self.bottom() < bounds.top()
            || self.top() > bounds.bottom()
    }
}

#[inline]
fn round5(value: f32) -> f32 {
    (value * 100_000.0).round() / 100_000.0
}

/// Decompose a (direction, magnitude) pair into x/y velocity components.
///
/// 90 degrees points up on screen, so y is negated. Components are rounded
/// to 5 decimal places to keep replay state bit-stable across runs.
pub fn xy_from_dm(direction_deg: f32, magnitude: f32) -> (f32, f32) {
    let rad = direction_deg.to_radians();
    let x = round5(rad.cos() * magnitude);
    let y = -round5(rad.sin() * magnitude);
    (x, y)
}

/// Degrees from `a` to `b`: 0 when `b` is to the right of `a`, 90 when
/// straight above. May return negative angles (atan2 range).
pub fn direction_between_points(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = a.1 - b.1;
    dy.atan2(dx).to_degrees()
}
