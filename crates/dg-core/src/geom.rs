//! Integer grid geometry
//!
//! `Rect` uses half-open extents: a rect covers columns `x..x + w` and rows
//! `y..y + h`. Both types are plain values and are never mutated in place.

use serde::{Deserialize, Serialize};

/// A cell coordinate on the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point
    pub fn manhattan(&self, other: Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// An axis-aligned box of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// One past the rightmost column
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// One past the bottom row
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn area(&self) -> i64 {
        i64::from(self.w.max(0)) * i64::from(self.h.max(0))
    }

    /// Center cell, rounded toward the top-left
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if the two rectangles share at least one cell
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Inset every side by `margin`.
    ///
    /// Never shrinks below 1x1: when a side would collapse, the result is the
    /// centered cell (or strip) of the original.
    pub fn shrink(&self, margin: i32) -> Rect {
        let margin = margin.max(0);
        let (x, w) = shrink_axis(self.x, self.w, margin);
        let (y, h) = shrink_axis(self.y, self.h, margin);
        Rect::new(x, y, w, h)
    }

    /// Grow every side by `margin`, saturating at the `i32` range
    pub fn expand(&self, margin: i32) -> Rect {
        let margin = margin.max(0);
        let grow = margin.saturating_mul(2);
        Rect::new(
            self.x.saturating_sub(margin),
            self.y.saturating_sub(margin),
            self.w.saturating_add(grow),
            self.h.saturating_add(grow),
        )
    }

    /// Ratio of the short side to the long side, 1.0 for a square
    pub fn squareness(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let (short, long) = if self.w < self.h {
            (self.w, self.h)
        } else {
            (self.h, self.w)
        };
        f64::from(short) / f64::from(long)
    }

    /// Nearest cell inside the rectangle to `p`
    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.x, self.right() - 1),
            p.y.clamp(self.y, self.bottom() - 1),
        )
    }

    /// Check if `p` is one of the rectangle's edge cells
    pub fn is_on_perimeter(&self, p: Point) -> bool {
        self.contains_point(p)
            && (p.x == self.x
                || p.x == self.right() - 1
                || p.y == self.y
                || p.y == self.bottom() - 1)
    }

    /// Iterate over every cell, row-major
    pub fn cells(&self) -> impl Iterator<Item = Point> + use<> {
        let Rect { x, y, w, h } = *self;
        (y..y + h).flat_map(move |py| (x..x + w).map(move |px| Point::new(px, py)))
    }
}

fn shrink_axis(start: i32, len: i32, margin: i32) -> (i32, i32) {
    let inner = len.saturating_sub(margin.saturating_mul(2));
    if inner >= 1 {
        (start + margin, inner)
    } else {
        (start + (len - 1).max(0) / 2, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(10, 20, 6, 4);
        assert_eq!(r.right(), 16);
        assert_eq!(r.bottom(), 24);
        assert_eq!(r.area(), 24);
        assert_eq!(r.center(), Point::new(13, 22));
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0, 0, 20, 20);
        let inner = Rect::new(5, 5, 5, 5);
        let edge = Rect::new(15, 15, 5, 5);
        let outside = Rect::new(18, 18, 5, 5);

        assert!(outer.contains_rect(&inner));
        assert!(outer.contains_rect(&edge));
        assert!(!inner.contains_rect(&outer));
        assert!(!outer.contains_rect(&outside));
    }

    #[test]
    fn test_rect_intersects_is_strict() {
        let a = Rect::new(0, 0, 10, 10);
        let touching = Rect::new(10, 0, 5, 5);
        let overlapping = Rect::new(9, 9, 5, 5);

        assert!(!a.intersects(&touching));
        assert!(!touching.intersects(&a));
        assert!(a.intersects(&overlapping));
    }

    #[test]
    fn test_shrink_and_expand() {
        let r = Rect::new(0, 0, 10, 8);
        assert_eq!(r.shrink(2), Rect::new(2, 2, 6, 4));
        assert_eq!(r.shrink(2).expand(2), r);
        // Collapses to a single centered cell instead of going negative
        assert_eq!(Rect::new(0, 0, 3, 3).shrink(5), Rect::new(1, 1, 1, 1));
    }

    #[test]
    fn test_huge_margins_saturate() {
        let r = Rect::new(5, 5, 4, 4);
        let grown = r.expand(1 << 30);
        assert!(grown.contains_rect(&r));
        assert!(grown.intersects(&Rect::new(1000, -1000, 1, 1)));
        assert_eq!(r.shrink(1 << 30), Rect::new(6, 6, 1, 1));
        assert_eq!(r.shrink(i32::MAX), Rect::new(6, 6, 1, 1));
    }

    #[test]
    fn test_squareness() {
        assert_eq!(Rect::new(0, 0, 4, 4).squareness(), 1.0);
        assert_eq!(Rect::new(0, 0, 8, 2).squareness(), 0.25);
        assert_eq!(Rect::new(0, 0, 0, 2).squareness(), 0.0);
    }

    #[test]
    fn test_clamp_point_lands_on_perimeter() {
        let r = Rect::new(5, 5, 4, 3);
        let p = r.clamp_point(Point::new(20, 6));
        assert_eq!(p, Point::new(8, 6));
        assert!(r.is_on_perimeter(p));
        assert!(!r.is_on_perimeter(Point::new(6, 6)));
    }

    #[test]
    fn test_cells_row_major() {
        let cells: Vec<Point> = Rect::new(1, 1, 2, 2).cells().collect();
        assert_eq!(
            cells,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(1, 2),
                Point::new(2, 2)
            ]
        );
    }

    #[test]
    fn test_point_distances() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(a.distance(b), 5.0);
    }
}
