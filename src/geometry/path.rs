//! Path and path-set types.
//!
//! A [`Path`] is an ordered sequence of points. Whether it is closed (an
//! implicit edge from the last point back to the first) or open is decided
//! by context: part outlines and holes are always closed, infill scan lines
//! are open two-point segments.

use super::{cross2, Point};
use crate::Micrometer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// Default tolerance for path simplification, in micrometres.
///
/// Vertices closer than this to the segment joining their neighbours are
/// removed from offset output before it is emitted.
pub const SIMPLIFY_TOLERANCE: Micrometer = 5;

/// An ordered sequence of points.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
}

impl Path {
    /// Create a new empty path.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a path from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Create a path with the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Get the points of this path.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consume the path and return its points.
    #[inline]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Get the number of points in the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the path.
    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Reverse the order of points in the path.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Return a reversed copy of the path.
    pub fn reversed(&self) -> Self {
        let mut result = self.clone();
        result.reverse();
        result
    }

    /// Twice the signed area of the path treated as a closed polygon
    /// (shoelace formula, widened to 128 bits).
    ///
    /// Positive for counter-clockwise winding.
    pub fn signed_area_x2(&self) -> i128 {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }

        let mut sum = 0i128;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[j];
            let b = self.points[i];
            sum += a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128;
            j = i;
        }
        sum
    }

    /// Check whether the path, treated as a closed polygon, winds
    /// counter-clockwise.
    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area_x2() > 0
    }

    /// Even-odd containment test for the path treated as a closed polygon.
    ///
    /// Exact integer ray cast with a half-open crossing rule; points exactly
    /// on the boundary are not guaranteed either way.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[j];
            let b = self.points[i];
            if (a.y > p.y) != (b.y > p.y) {
                // Compare p.x against the edge's x at height p.y without
                // division: both sides multiplied by dy, sign-corrected.
                let dy = (b.y - a.y) as i128;
                let edge_x_num = a.x as i128 * dy + (b.x - a.x) as i128 * (p.y - a.y) as i128;
                let point_x = p.x as i128 * dy;
                if (dy > 0 && point_x < edge_x_num) || (dy < 0 && point_x > edge_x_num) {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Remove duplicate and near-collinear vertices of a closed path.
    ///
    /// A vertex is dropped when its distance to the line through its kept
    /// predecessor and its successor is at most `tolerance`. The comparison
    /// is exact: cross² against tolerance² · |segment|² in 128-bit integers.
    /// The first vertex is always kept.
    pub fn simplify(&self, tolerance: Micrometer) -> Path {
        let n = self.points.len();
        if n < 3 {
            return self.clone();
        }

        let tol_sq = tolerance as i128 * tolerance as i128;
        let mut out: Vec<Point> = Vec::with_capacity(n);
        out.push(self.points[0]);

        for i in 1..n {
            let curr = self.points[i];
            let prev = *out.last().expect("first vertex is always kept");
            if curr == prev {
                continue;
            }

            let next = self.points[(i + 1) % n];
            let base = next - prev;
            let offset = curr - prev;
            let len_sq = base.squared_length();
            if len_sq == 0 {
                // prev == next: curr is the tip of a zero-width spike
                continue;
            }
            let cross = cross2(base, offset);
            if cross * cross <= tol_sq * len_sq {
                continue;
            }
            out.push(curr);
        }

        Path::from_points(out)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({} points)", self.points.len())
    }
}

impl Deref for Path {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl DerefMut for Path {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.points
    }
}

impl Index<usize> for Path {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for Path {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl FromIterator<Point> for Path {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Path {
    type Item = Point;
    type IntoIter = std::vec::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl From<Vec<Point>> for Path {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

/// An ordered sequence of paths.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paths {
    paths: Vec<Path>,
}

impl Paths {
    /// Create a new empty path set.
    #[inline]
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Create a path set from a vector of paths.
    #[inline]
    pub fn from_paths(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    /// Get the number of paths.
    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Add a path to the set.
    #[inline]
    pub fn push(&mut self, path: Path) {
        self.paths.push(path);
    }

    /// Consume the set and return its paths.
    #[inline]
    pub fn into_paths(self) -> Vec<Path> {
        self.paths
    }

    /// Axis-aligned bounding box over all contained points, or `None` if
    /// the set contains no points.
    pub fn size(&self) -> Option<(Point, Point)> {
        let mut bounds: Option<(Point, Point)> = None;
        for path in &self.paths {
            for p in path.points() {
                bounds = Some(match bounds {
                    None => (*p, *p),
                    Some((min, max)) => (
                        Point::new(min.x.min(p.x), min.y.min(p.y)),
                        Point::new(max.x.max(p.x), max.y.max(p.y)),
                    ),
                });
            }
        }
        bounds
    }
}

impl fmt::Debug for Paths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Paths({} paths)", self.paths.len())
    }
}

impl Deref for Paths {
    type Target = [Path];

    fn deref(&self) -> &Self::Target {
        &self.paths
    }
}

impl DerefMut for Paths {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.paths
    }
}

impl FromIterator<Path> for Paths {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Paths {
    type Item = Path;
    type IntoIter = std::vec::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a Paths {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl From<Vec<Path>> for Paths {
    fn from(paths: Vec<Path>) -> Self {
        Self::from_paths(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: Micrometer) -> Path {
        Path::from_points(vec![
            Point::new(0, 0),
            Point::new(size, 0),
            Point::new(size, size),
            Point::new(0, size),
        ])
    }

    #[test]
    fn test_signed_area() {
        let ccw = square(10_000);
        assert_eq!(ccw.signed_area_x2(), 2 * 10_000 * 10_000);
        assert!(ccw.is_counter_clockwise());

        let cw = ccw.reversed();
        assert_eq!(cw.signed_area_x2(), -2 * 10_000 * 10_000);
        assert!(!cw.is_counter_clockwise());
    }

    #[test]
    fn test_contains_inside_outside() {
        let sq = square(10_000);
        assert!(sq.contains(Point::new(5_000, 5_000)));
        assert!(sq.contains(Point::new(1, 1)));
        assert!(!sq.contains(Point::new(-1, 5_000)));
        assert!(!sq.contains(Point::new(10_001, 5_000)));
        assert!(!sq.contains(Point::new(5_000, -5)));
    }

    #[test]
    fn test_contains_is_winding_independent() {
        let sq = square(10_000);
        let rev = sq.reversed();
        assert!(rev.contains(Point::new(5_000, 5_000)));
        assert!(!rev.contains(Point::new(20_000, 5_000)));
    }

    #[test]
    fn test_contains_concave() {
        // L-shape: the notch is outside
        let l = Path::from_points(vec![
            Point::new(0, 0),
            Point::new(10_000, 0),
            Point::new(10_000, 5_000),
            Point::new(5_000, 5_000),
            Point::new(5_000, 10_000),
            Point::new(0, 10_000),
        ]);
        assert!(l.contains(Point::new(2_000, 8_000)));
        assert!(l.contains(Point::new(8_000, 2_000)));
        assert!(!l.contains(Point::new(8_000, 8_000)));
    }

    #[test]
    fn test_simplify_removes_collinear_vertex() {
        let path = Path::from_points(vec![
            Point::new(0, 0),
            Point::new(5_000, 2), // 2 µm off the bottom edge
            Point::new(10_000, 0),
            Point::new(10_000, 10_000),
            Point::new(0, 10_000),
        ]);
        let simplified = path.simplify(SIMPLIFY_TOLERANCE);
        assert_eq!(simplified.len(), 4);
        assert_eq!(simplified[1], Point::new(10_000, 0));
    }

    #[test]
    fn test_simplify_keeps_real_corners() {
        let sq = square(10_000);
        let simplified = sq.simplify(SIMPLIFY_TOLERANCE);
        assert_eq!(simplified, sq);
    }

    #[test]
    fn test_simplify_removes_duplicates() {
        let path = Path::from_points(vec![
            Point::new(0, 0),
            Point::new(0, 0),
            Point::new(10_000, 0),
            Point::new(10_000, 10_000),
            Point::new(10_000, 10_000),
            Point::new(0, 10_000),
        ]);
        assert_eq!(path.simplify(SIMPLIFY_TOLERANCE).len(), 4);
    }

    #[test]
    fn test_simplify_vertex_beyond_tolerance_kept() {
        let path = Path::from_points(vec![
            Point::new(0, 0),
            Point::new(5_000, 20), // 20 µm off: a real feature
            Point::new(10_000, 0),
            Point::new(10_000, 10_000),
            Point::new(0, 10_000),
        ]);
        assert_eq!(path.simplify(SIMPLIFY_TOLERANCE).len(), 5);
    }

    #[test]
    fn test_paths_size() {
        let mut paths = Paths::new();
        assert_eq!(paths.size(), None);

        paths.push(square(10_000));
        paths.push(Path::from_points(vec![
            Point::new(-500, 200),
            Point::new(400, 12_000),
        ]));
        let (min, max) = paths.size().unwrap();
        assert_eq!(min, Point::new(-500, 0));
        assert_eq!(max, Point::new(10_000, 12_000));
    }
}
