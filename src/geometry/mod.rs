//! 2D geometry primitives shared by the detection post-processing stages.
//!
//! `Rect` stores min/max corners so that intersection and union stay cheap;
//! an empty rectangle has inverted corners and reports `is_empty()`.

/// A 2D point with generic coordinate type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2<T> {
    /// Horizontal coordinate.
    pub x: T,
    /// Vertical coordinate.
    pub y: T,
}

impl<T> Point2<T> {
    /// Creates a point from its coordinates.
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned float rectangle in min/max corner form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    xmin: f32,
    ymin: f32,
    xmax: f32,
    ymax: f32,
}

impl Rect {
    /// Creates a rectangle from a minimum corner and dimensions.
    ///
    /// Negative width or height produces an inverted (empty) rectangle; the
    /// caller owns that contract.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            xmin: x,
            ymin: y,
            xmax: x + width,
            ymax: y + height,
        }
    }

    /// Creates an empty rectangle that no point is inside of.
    pub fn empty() -> Self {
        Self {
            xmin: f32::MAX,
            ymin: f32::MAX,
            xmax: -f32::MAX,
            ymax: -f32::MAX,
        }
    }

    /// Returns true if no point is inside the rectangle.
    ///
    /// A degenerate rectangle with coincident corners has zero area but is
    /// not empty.
    pub fn is_empty(&self) -> bool {
        self.xmin > self.xmax || self.ymin > self.ymax
    }

    /// Width, `xmax - xmin`.
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    /// Height, `ymax - ymin`.
    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    /// Area; negative if exactly one of width/height is negative.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Returns true if the rectangles intersect, boundaries included.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.is_empty()
            || other.is_empty()
            || other.xmax < self.xmin
            || self.xmax < other.xmin
            || other.ymax < self.ymin
            || self.ymax < other.ymin)
    }

    /// Intersection of two rectangles, or an empty rectangle if disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let xmin = self.xmin.max(other.xmin);
        let ymin = self.ymin.max(other.ymin);
        let xmax = self.xmax.min(other.xmax);
        let ymax = self.ymax.min(other.ymax);
        if xmin > xmax || ymin > ymax {
            Rect::empty()
        } else {
            Rect {
                xmin,
                ymin,
                xmax,
                ymax,
            }
        }
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union_bounds(&self, other: &Rect) -> Rect {
        Rect {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}
