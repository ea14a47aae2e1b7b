#![forbid(unsafe_code)]

//! Float geometry for simulated screens.
//!
//! Coordinates are in host screen units (typically pixels), origin at the
//! top-left, y growing downward.

/// A point in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pos {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Pos {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(&self, other: Pos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation toward `target` by fraction `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, target: Pos, t: f32) -> Pos {
        Pos::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }
}

/// An axis-aligned rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner x.
    pub x: f32,
    /// Top-left corner y.
    pub y: f32,
    /// Width; non-negative for well-formed rects.
    pub w: f32,
    /// Height; non-negative for well-formed rects.
    pub h: f32,
}

impl Rect {
    /// Create a new rectangle from top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// The center point.
    #[must_use]
    pub fn center(&self) -> Pos {
        Pos::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Whether `pos` lies inside (right/bottom edges exclusive).
    #[must_use]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.x && pos.y >= self.y && pos.x < self.x + self.w && pos.y < self.y + self.h
    }

    /// Whether `other` is fully contained within `self`.
    #[must_use]
    pub fn contains_rect(&self, other: Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.w <= self.x + self.w
            && other.y + other.h <= self.y + self.h
    }

    /// Whether the two rectangles overlap at all.
    #[must_use]
    pub fn overlaps(&self, other: Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// Grow (or shrink, with negative `amount`) on every side.
    #[must_use]
    pub fn expand(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            self.w + amount * 2.0,
            self.h + amount * 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_rect() {
        let r = Rect::new(10.0, 20.0, 100.0, 40.0);
        let c = r.center();
        assert_eq!(c, Pos::new(60.0, 40.0));
    }

    #[test]
    fn contains_is_edge_exclusive_on_far_sides() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Pos::new(0.0, 0.0)));
        assert!(r.contains(Pos::new(9.9, 9.9)));
        assert!(!r.contains(Pos::new(10.0, 5.0)));
        assert!(!r.contains(Pos::new(5.0, 10.0)));
    }

    #[test]
    fn contains_rect_requires_full_containment() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(Rect::new(90.0, 90.0, 20.0, 20.0)));
    }

    #[test]
    fn overlap_detects_partial_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.overlaps(Rect::new(20.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn lerp_midpoint() {
        let p = Pos::new(0.0, 0.0).lerp(Pos::new(10.0, 20.0), 0.5);
        assert_eq!(p, Pos::new(5.0, 10.0));
    }
}
