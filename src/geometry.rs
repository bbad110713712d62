//! Viewport rectangles and the two predicates the extractor is built on.
//!
//! Coordinates are CSS pixels with `y` growing downwards, matching what a
//! browser reports from `getBoundingClientRect()` / `getClientRects()`.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Rect {
    /// Create from origin and dimensions.
    #[inline]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            right: left + width,
            bottom: top + height,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// `true` unless one rectangle lies strictly beyond an edge of the other.
    ///
    /// Touching edges count as intersecting.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        Point {
            x: (self.left + self.right) / 2.0,
            y: (self.top + self.bottom) / 2.0,
        }
    }

    /// Zero-area test with integer truncation of both dimensions.
    ///
    /// A selection 0.4px wide and 0.7px tall is still "empty".
    pub fn is_degenerate(&self) -> bool {
        self.width().trunc() == 0.0 && self.height().trunc() == 0.0
    }

    /// Positive width or positive height.
    pub fn has_extent(&self) -> bool {
        self.width() > 0.0 || self.height() > 0.0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Union of every rectangle in `rects`, or `None` for an empty input.
    pub fn union_all<'a, I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        rects.into_iter().fold(None, |acc, r| match acc {
            None => Some(*r),
            Some(u) => Some(u.union(r)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects_intersect() {
        let a = Rect::new(0.0, 0.0, 100.0, 20.0);
        let b = Rect::new(50.0, 10.0, 100.0, 20.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn separated_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&Rect::new(11.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(-6.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(0.0, 11.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(0.0, -6.0, 5.0, 5.0)));
    }

    #[test]
    fn midpoint_is_center() {
        let m = Rect::new(10.0, 100.0, 20.0, 30.0).midpoint();
        assert_eq!(m, Point { x: 20.0, y: 115.0 });
    }

    #[test]
    fn degenerate_truncates_fractions() {
        assert!(Rect::default().is_degenerate());
        assert!(Rect::new(5.0, 5.0, 0.4, 0.9).is_degenerate());
        assert!(!Rect::new(5.0, 5.0, 0.0, 1.0).is_degenerate());
        assert!(!Rect::new(5.0, 5.0, 3.0, 0.0).is_degenerate());
    }

    #[test]
    fn has_extent_needs_one_positive_dimension() {
        assert!(!Rect::default().has_extent());
        assert!(Rect::new(0.0, 0.0, 0.0, 4.0).has_extent());
    }

    #[test]
    fn union_all_covers_inputs() {
        let rects = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, 30.0, 5.0, 5.0)];
        let u = Rect::union_all(&rects).unwrap();
        assert_eq!(u, Rect { top: 0.0, left: 0.0, right: 25.0, bottom: 35.0 });
        assert!(Rect::union_all(&[]).is_none());
    }
}
