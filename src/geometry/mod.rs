//! Geometry primitives for the layer-processing core.
//!
//! This module provides the fundamental geometric types:
//! - [`Point`] - 2D point with integer micrometre coordinates
//! - [`Path`] - Ordered sequence of points; closedness is determined by
//!   context (part outlines and holes are closed, infill lines are open)
//! - [`Paths`] - Ordered sequence of paths with a bounding box operation
//!
//! All predicates are exact: squared distances, areas and orientation tests
//! are computed in widened 128-bit integer arithmetic so that no floating
//! point enters the core.

mod path;
mod point;

pub use path::{Path, Paths, SIMPLIFY_TOLERANCE};
pub use point::Point;

/// Calculate the cross product of two 2D vectors (returns a scalar).
/// This is useful for determining the orientation of three points.
#[inline]
pub fn cross2(v1: Point, v2: Point) -> i128 {
    v1.x as i128 * v2.y as i128 - v1.y as i128 * v2.x as i128
}

/// Calculate the dot product of two 2D vectors.
#[inline]
pub fn dot2(v1: Point, v2: Point) -> i128 {
    v1.x as i128 * v2.x as i128 + v1.y as i128 * v2.y as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross2() {
        let v1 = Point::new(1, 0);
        let v2 = Point::new(0, 1);
        assert_eq!(cross2(v1, v2), 1); // Counter-clockwise

        let v3 = Point::new(0, -1);
        assert_eq!(cross2(v1, v3), -1); // Clockwise
    }

    #[test]
    fn test_dot2() {
        let v1 = Point::new(3, 4);
        let v2 = Point::new(2, -1);
        assert_eq!(dot2(v1, v2), 2);
    }

    #[test]
    fn test_cross2_no_overflow_at_build_volume_scale() {
        // Build-volume sized vectors must not overflow the widened product.
        let v1 = Point::new(1_000_000_000, -1_000_000_000);
        let v2 = Point::new(-1_000_000_000, 1_000_000_000);
        assert_eq!(cross2(v1, v2), 0);
        assert_eq!(dot2(v1, v2), -2_000_000_000_000_000_000i128);
    }
}
