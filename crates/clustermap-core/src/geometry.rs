#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Coordinates are `f64` with the origin at the top-left of the canvas. With
//! integer rounding the layout engine only ever produces whole numbers, so
//! the same type carries both continuous and rounded geometry.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width in canvas units.
    pub width: f64,
    /// Height in canvas units.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin covering `size`.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Area in square units.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Center point `(x, y)`.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether every field is finite and both extents are non-negative.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Whether `other` lies entirely inside this rectangle, allowing `tolerance`
    /// units of slack on every edge.
    pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.right() <= self.right() + tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    /// Compute the intersection with another rectangle, returning `None` if
    /// the overlap has zero area.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Area shared with `other` (zero when disjoint or merely touching).
    #[inline]
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        self.intersection_opt(other).map_or(0.0, |r| r.area())
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Shrink the rectangle by `margin`, clamping extents at zero.
    pub fn inner(&self, margin: Sides) -> Rect {
        Rect {
            x: self.x + margin.left,
            y: self.y + margin.top,
            width: (self.width - margin.horizontal_sum()).max(0.0),
            height: (self.height - margin.vertical_sum()).max(0.0),
        }
    }

    /// Linear interpolation between `self` (t = 0) and `to` (t = 1).
    ///
    /// `t` is not clamped; callers pass eased progress in [0, 1].
    pub fn lerp(&self, to: &Rect, t: f64) -> Rect {
        Rect {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
            width: lerp(self.width, to.width, t),
            height: lerp(self.height, to.height, t),
        }
    }

    /// A zero-size rectangle at this rectangle's center.
    pub fn collapsed_to_center(&self) -> Rect {
        let (cx, cy) = self.center();
        Rect::new(cx, cy, 0.0, 0.0)
    }

    /// Same rectangle with zero width, anchored at the left edge.
    pub fn collapsed_width(&self) -> Rect {
        Rect::new(self.x, self.y, 0.0, self.height)
    }
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    // Exact at both endpoints, unlike `from + (to - from) * t`.
    from * (1.0 - t) + to * t
}

/// Canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Area in square units.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Whether both extents are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }

    /// Round both extents to the nearest whole unit.
    pub fn rounded(&self) -> Size {
        Size::new(self.width.round(), self.height.round())
    }
}

/// Sides for padding/margin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Create new sides with equal values.
    pub const fn all(val: f64) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Trim only the right and bottom edges.
    ///
    /// This is the cell gutter: adjacent cells keep their origin and lose
    /// `val` units on the far edges, leaving a visible seam between them.
    pub const fn trailing(val: f64) -> Self {
        Self {
            top: 0.0,
            right: val,
            bottom: val,
            left: 0.0,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

impl From<f64> for Sides {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

#[cfg(test)]
mod tests {
    use super::{Rect, Sides, Size};

    #[test]
    fn rect_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.area(), 1200.0);
    }

    #[test]
    fn rect_from_size() {
        let r = Rect::from_size(Size::new(1140.0, 600.0));
        assert_eq!(r, Rect::new(0.0, 0.0, 1140.0, 600.0));
    }

    #[test]
    fn rect_is_empty() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_empty());
        assert!(Rect::new(5.0, 5.0, 0.0, 10.0).is_empty());
        assert!(Rect::new(5.0, 5.0, 10.0, 0.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn rect_validity() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, -1.0, 1.0).is_valid());
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(!Size::new(f64::INFINITY, 1.0).is_valid());
    }

    #[test]
    fn rect_intersection_overlaps() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection_opt(&b), Some(Rect::new(2.0, 2.0, 2.0, 2.0)));
        assert_eq!(a.intersection_area(&b), 4.0);
    }

    #[test]
    fn rect_intersection_adjacent_no_overlap() {
        // Shared edge, right edge is exclusive
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(5.0, 0.0, 5.0, 5.0);
        assert_eq!(a.intersection_opt(&b), None);
        assert_eq!(a.intersection_area(&b), 0.0);
    }

    #[test]
    fn rect_union_disjoint() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(10.0, 10.0, 3.0, 3.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 13.0, 13.0));
    }

    #[test]
    fn rect_contains_rect_with_tolerance() {
        let outer = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains_rect(&Rect::new(2.0, 2.0, 8.0, 8.0), 0.0));
        assert!(!outer.contains_rect(&Rect::new(2.0, 2.0, 8.5, 8.0), 0.0));
        assert!(outer.contains_rect(&Rect::new(2.0, 2.0, 8.5, 8.0), 1.0));
    }

    #[test]
    fn rect_inner_trailing_gutter() {
        let r = Rect::new(10.0, 10.0, 50.0, 20.0);
        assert_eq!(r.inner(Sides::trailing(1.0)), Rect::new(10.0, 10.0, 49.0, 19.0));
    }

    #[test]
    fn rect_inner_large_margin_clamps_to_zero() {
        let inner = Rect::new(0.0, 0.0, 10.0, 10.0).inner(Sides::all(20.0));
        assert_eq!(inner.width, 0.0);
        assert_eq!(inner.height, 0.0);
    }

    #[test]
    fn rect_lerp_endpoints_exact() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(37.0, 12.0, 3.0, 7.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Rect::new(18.5, 6.0, 51.5, 28.5));
    }

    #[test]
    fn rect_collapse_helpers() {
        let r = Rect::new(10.0, 20.0, 40.0, 60.0);
        assert_eq!(r.collapsed_to_center(), Rect::new(30.0, 50.0, 0.0, 0.0));
        assert_eq!(r.collapsed_width(), Rect::new(10.0, 20.0, 0.0, 60.0));
    }

    #[test]
    fn size_rounded() {
        assert_eq!(Size::new(99.6, 10.2).rounded(), Size::new(100.0, 10.0));
    }

    #[test]
    fn sides_sums() {
        let s = Sides::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(s.horizontal_sum(), 6.0);
        assert_eq!(s.vertical_sum(), 4.0);
        assert_eq!(Sides::from(2.0), Sides::all(2.0));
    }
}
