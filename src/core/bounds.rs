use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in client (pixel) coordinates, used for
/// element bounding rects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Creates bounds from a top-left corner and a size, like a DOMRect
    pub fn from_origin_and_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::from_coords(left, top, left + width, top + height)
    }

    pub fn left(&self) -> f64 {
        self.min.x
    }

    pub fn top(&self) -> f64 {
        self.min.y
    }

    /// Gets the width of the bounds
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the bounds
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Gets the size as a Point
    pub fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Offset of a client point from the top-left corner
    pub fn offset_of(&self, point: &Point) -> Point {
        point.subtract(&self.min)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0))
    }
}
