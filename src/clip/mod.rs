//! Clip engine: polygon partitioning, inset offsetting and infill clipping.
//!
//! This module is the algorithmic heart of the core. It provides the
//! [`ClipEngine`] facade with four operations:
//!
//! - **partition** - turn an unstructured slice (a flat set of closed loops)
//!   into discrete layer parts: outer contours paired with their direct
//!   holes, deeper nesting becoming new top-level parts
//! - **inset** / **inset_layer** - generate successive inward wall loops for
//!   a part (or every part of a layer) by polygon offsetting
//! - **fill** - generate parallel vertical scan lines clipped against a
//!   region, optionally shrunk by an overlap distance
//!
//! Offsetting wraps the Clipper library (square joins, closed-polygon ends)
//! through [`geo_clipper`]; coordinates cross that boundary as
//! micrometre-valued `f64` and are rounded back to whole micrometres, so
//! results stay within 1 µm of the exact answer. Partitioning and scan-line
//! clipping are computed directly in exact integer arithmetic.
//!
//! Engine instances are cheap and must not be shared across worker threads;
//! each worker creates its own.

use crate::geometry::{Path, Paths, Point, SIMPLIFY_TOLERANCE};
use crate::layer::{Layer, LayerPart, PartitionedLayer};
use crate::Micrometer;
use geo::{Coord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};
use log::warn;

/// Inset result for a single part: `[wall][inset]` path sets.
///
/// - `wall` indexes disjoint sub-regions produced at a given inset level.
///   When a part pinches and splits during offsetting, each child is a new
///   wall; wall slots that first appear at a deeper level carry empty path
///   lists for the earlier levels so the inset index stays aligned.
/// - `inset` indexes the successive inward steps.
pub type InsetResult = Vec<Vec<Paths>>;

/// Inset result for a whole layer: `[part][wall][inset]` path sets.
pub type OffsetResult = Vec<InsetResult>;

/// Consecutive vertices strictly closer than this are merged during
/// partition ingest (the first vertex of a loop is always kept). Exactly
/// this distance apart is preserved.
pub const VERTEX_MERGE_DISTANCE: Micrometer = 100;

/// Scale factor handed to the clipping backend. Coordinates are already
/// integer micrometres, so no additional scaling is applied.
const CLIPPER_SCALE: f64 = 1.0;

/// The polygon operations needed to process a layer.
///
/// Implementations are not assumed thread-safe; create one engine per
/// worker thread.
pub trait ClipEngine {
    /// Partition a raw slice into layer parts.
    ///
    /// Loops may be nested arbitrarily deep; islands inside holes become
    /// new top-level parts. Returns `None` when the input is degenerate
    /// (the nesting could not be resolved); callers treat this as a skip
    /// for the layer.
    fn partition(&self, layer: &Layer) -> Option<PartitionedLayer>;

    /// Regroup a flat set of closed paths into layer parts without ingest
    /// filtering. Used to re-nest offset output, which is already clean.
    fn group_parts(&self, paths: &Paths) -> Option<Vec<LayerPart>>;

    /// Inset every part of the layer; see [`ClipEngine::inset`].
    fn inset_layer(
        &self,
        layer: &PartitionedLayer,
        offset: Micrometer,
        inset_count: usize,
    ) -> OffsetResult;

    /// Generate up to `inset_count` successive wall loops for a part.
    ///
    /// Positive `offset` shrinks: wall `k`'s centerline sits at
    /// `offset/2 + k·offset` inside the boundary, holes growing into the
    /// solid by the same amounts. Iteration stops early once an offset
    /// produces no paths. Output paths are simplified with the default
    /// tolerance.
    fn inset(&self, part: &LayerPart, offset: Micrometer, inset_count: usize) -> InsetResult;

    /// Generate a linear infill for a region.
    ///
    /// `paths` is interpreted as a closed polygon set with even-odd fill.
    /// Vertical scan lines spaced `line_width` apart tile the region's
    /// bounding box, alternating direction per line as a zig-zag hint for
    /// downstream planners. The region is first shrunk so the lines overlap
    /// the surrounding wall by `overlap_percentage` percent of a line
    /// width; at 0 % the full `line_width` shrink applies, at 100 % none.
    /// Returns open polylines; on a clipping failure the result is empty
    /// and a warning is logged.
    fn fill(&self, paths: &Paths, line_width: Micrometer, overlap_percentage: i32) -> Paths;
}

/// The default clip engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClipperEngine;

impl ClipperEngine {
    /// Create a new engine instance. Instances are cheap.
    pub fn new() -> Self {
        Self
    }
}

impl ClipEngine for ClipperEngine {
    fn partition(&self, layer: &Layer) -> Option<PartitionedLayer> {
        let mut loops: Vec<Path> = Vec::with_capacity(layer.polygons().len());
        for polygon in layer.polygons() {
            let filtered = merge_close_vertices(polygon);
            // fewer than 3 distinct vertices is not a polygon
            if filtered.len() >= 3 {
                loops.push(filtered);
            }
        }
        drop_coincident_loops(&mut loops);

        let parts = nest_loops(&loops)?;
        Some(PartitionedLayer::new(parts))
    }

    fn group_parts(&self, paths: &Paths) -> Option<Vec<LayerPart>> {
        let loops: Vec<Path> = paths.iter().filter(|p| p.len() >= 3).cloned().collect();
        nest_loops(&loops)
    }

    fn inset_layer(
        &self,
        layer: &PartitionedLayer,
        offset: Micrometer,
        inset_count: usize,
    ) -> OffsetResult {
        layer
            .parts()
            .iter()
            .map(|part| self.inset(part, offset, inset_count))
            .collect()
    }

    fn inset(&self, part: &LayerPart, offset: Micrometer, inset_count: usize) -> InsetResult {
        let mut insets: InsetResult = Vec::new();
        let subject = part_to_geo(part);

        for inset_nr in 0..inset_count {
            // wall k's centerline sits offset/2 + k*offset inside the boundary
            let delta = -((offset * inset_nr as Micrometer) as f64 + (offset / 2) as f64);
            let offsetted = subject.offset(
                delta,
                JoinType::Square,
                EndType::ClosedPolygon,
                CLIPPER_SCALE,
            );
            let walls = multi_to_paths(&offsetted, true);
            if walls.is_empty() {
                break;
            }

            for (wall_nr, wall) in walls.iter().enumerate() {
                if insets.len() <= wall_nr {
                    insets.push(Vec::new());
                }
                // A deeper offset can produce walls the previous levels did
                // not have (a corner-fill polygon, or a pinch-split child).
                // Pad the earlier levels so the inset index stays aligned.
                while insets[wall_nr].len() <= inset_nr {
                    insets[wall_nr].push(Paths::new());
                }
                insets[wall_nr][inset_nr].push(wall.clone());
            }
        }

        insets
    }

    fn fill(&self, paths: &Paths, line_width: Micrometer, overlap_percentage: i32) -> Paths {
        let result = Paths::new();
        if line_width <= 0 {
            warn!("fill: non-positive line width {line_width}");
            return result;
        }
        let Some((min, max)) = paths.size() else {
            return result;
        };

        // overlap distance: float-computed, truncated to whole micrometres
        let overlap =
            (line_width as f32 * (100 - overlap_percentage) as f32 / 100.0) as Micrometer;

        let region = if overlap_percentage != 0 && overlap != 0 {
            let Some(parts) = self.group_parts(paths) else {
                warn!("fill: could not regroup the clip region");
                return result;
            };
            let multi = MultiPolygon::new(parts.iter().map(part_to_geo).collect());
            let shrunk = multi.offset(
                -(overlap as f64),
                JoinType::Square,
                EndType::ClosedPolygon,
                CLIPPER_SCALE,
            );
            multi_to_paths(&shrunk, false)
        } else {
            paths.clone()
        };

        linear_fill(&region, min, max, line_width)
    }
}

/// Clip alternating vertical scan lines against `region` (even-odd).
///
/// Exact integer computation: for every scan line the crossings with the
/// region edges are collected, sorted, and paired per the even-odd rule.
/// An odd crossing count means degenerate geometry; the whole fill is
/// abandoned with a warning.
fn linear_fill(region: &Paths, min: Point, max: Point, line_width: Micrometer) -> Paths {
    let mut result = Paths::new();
    let mut num_line = 0usize;
    let mut x = min.x;

    while x <= max.x {
        let mut crossings: Vec<Micrometer> = Vec::new();
        for ring in region {
            if !collect_crossings(ring, x, &mut crossings) {
                warn!("fill: degenerate region at scan line x={x}");
                return Paths::new();
            }
        }
        if crossings.len() % 2 != 0 {
            warn!("fill: degenerate region at scan line x={x}");
            return Paths::new();
        }
        crossings.sort_unstable();

        // switch line direction based on even / odd
        if num_line % 2 == 0 {
            for pair in crossings.chunks(2) {
                if pair[1] > pair[0] {
                    result.push(Path::from_points(vec![
                        Point::new(x, pair[0]),
                        Point::new(x, pair[1]),
                    ]));
                }
            }
        } else {
            for pair in crossings.chunks(2).rev() {
                if pair[1] > pair[0] {
                    result.push(Path::from_points(vec![
                        Point::new(x, pair[1]),
                        Point::new(x, pair[0]),
                    ]));
                }
            }
        }

        num_line += 1;
        x += line_width;
    }

    result
}

/// Collect the y coordinates where the closed ring crosses the vertical
/// line at `x`. Half-open crossing rule; vertical edges never contribute.
/// Returns false when the ring is too short to be a polygon.
fn collect_crossings(ring: &Path, x: Micrometer, out: &mut Vec<Micrometer>) -> bool {
    let pts = ring.points();
    let n = pts.len();
    if n < 3 {
        return false;
    }

    let mut j = n - 1;
    for i in 0..n {
        let a = pts[j];
        let b = pts[i];
        if (a.x > x) != (b.x > x) {
            let num = (b.y - a.y) as i128 * (x - a.x) as i128;
            let den = (b.x - a.x) as i128;
            out.push(a.y + div_round(num, den));
        }
        j = i;
    }
    true
}

/// Integer division rounded to nearest, halves away from zero.
fn div_round(num: i128, den: i128) -> Micrometer {
    let q = if (num >= 0) == (den >= 0) {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    };
    q as Micrometer
}

/// Drop consecutive vertices strictly closer than [`VERTEX_MERGE_DISTANCE`]
/// to the previously kept vertex. The first vertex is always kept; the
/// contour is never moved, only thinned.
fn merge_close_vertices(path: &Path) -> Path {
    let mut out: Vec<Point> = Vec::with_capacity(path.len());
    for (i, &p) in path.iter().enumerate() {
        if i == 0 {
            out.push(p);
            continue;
        }
        let prev = *out.last().expect("first vertex is always kept");
        if (p - prev).shorter_than(VERTEX_MERGE_DISTANCE) {
            continue;
        }
        out.push(p);
    }
    Path::from_points(out)
}

/// Remove loops that fully coincide with an earlier loop (same vertex
/// cycle in either orientation). The union the partitioner models would
/// merge them; dropping the duplicate gives the same observable result.
fn drop_coincident_loops(loops: &mut Vec<Path>) {
    let mut seen: Vec<Vec<Point>> = Vec::with_capacity(loops.len());
    loops.retain(|l| {
        let canon = canonical_cycle(l);
        if seen.contains(&canon) {
            false
        } else {
            seen.push(canon);
            true
        }
    });
}

/// Canonical form of a closed vertex cycle: rotated to start at the
/// lexicographically smallest vertex, in the lexicographically smaller of
/// the two directions.
fn canonical_cycle(path: &Path) -> Vec<Point> {
    let pts = path.points();
    let n = pts.len();
    let start = (0..n)
        .min_by_key(|&i| pts[i])
        .expect("canonical_cycle requires a non-empty path");

    let forward: Vec<Point> = (0..n).map(|i| pts[(start + i) % n]).collect();
    let backward: Vec<Point> = (0..n).map(|i| pts[(start + n - i) % n]).collect();
    if forward <= backward {
        forward
    } else {
        backward
    }
}

/// Build the even-odd nesting forest over a set of disjoint closed loops.
///
/// The depth of a loop is the number of other loops containing it. Loops at
/// even depth are outlines; each odd-depth loop becomes a hole of the
/// containing loop one level up. Parts are emitted breadth-first over depth
/// pairs, ties broken by input order, so the result is deterministic.
/// Returns `None` when a hole has no resolvable parent (crossing or
/// otherwise degenerate input).
fn nest_loops(loops: &[Path]) -> Option<Vec<LayerPart>> {
    let n = loops.len();
    if n == 0 {
        return Some(Vec::new());
    }

    let mut depth = vec![0usize; n];
    for i in 0..n {
        let probe = loops[i][0];
        for (j, other) in loops.iter().enumerate() {
            if i != j && other.contains(probe) {
                depth[i] += 1;
            }
        }
    }

    let mut holes_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        if depth[i] % 2 == 0 {
            continue;
        }
        let probe = loops[i][0];
        let parent = (0..n)
            .find(|&j| j != i && depth[j] == depth[i] - 1 && loops[j].contains(probe))?;
        holes_of[parent].push(i);
    }

    let mut outlines: Vec<usize> = (0..n).filter(|&i| depth[i] % 2 == 0).collect();
    outlines.sort_by_key(|&i| (depth[i], i));

    Some(
        outlines
            .into_iter()
            .map(|i| {
                let holes = holes_of[i].iter().map(|&h| loops[h].clone()).collect();
                LayerPart::new(loops[i].clone(), holes)
            })
            .collect(),
    )
}

// ============================================================================
// Conversions to and from the clipping backend
// ============================================================================

/// Convert a closed path to a backend ring, closing it explicitly.
fn path_to_ring(path: &Path) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = path
        .iter()
        .map(|p| Coord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect();
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last()) {
        if first != *last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

/// Convert a part (outline + holes) to a backend polygon.
fn part_to_geo(part: &LayerPart) -> GeoPolygon<f64> {
    let holes = part.holes().iter().map(path_to_ring).collect();
    GeoPolygon::new(path_to_ring(part.outline()), holes)
}

/// Convert a backend ring back to a path, rounding to whole micrometres
/// and dropping the duplicated closing point.
fn ring_to_path(ring: &LineString<f64>) -> Path {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(c.x.round() as Micrometer, c.y.round() as Micrometer))
        .collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Path::from_points(points)
}

/// Flatten a backend polygon set to raw paths: each polygon's exterior
/// followed by its interiors. `simplify` applies the default tolerance and
/// drops paths that degenerate below 3 vertices.
fn multi_to_paths(multi: &MultiPolygon<f64>, simplify: bool) -> Paths {
    let mut result = Paths::new();
    for poly in &multi.0 {
        let mut push = |ring: &LineString<f64>| {
            let path = if simplify {
                ring_to_path(ring).simplify(SIMPLIFY_TOLERANCE)
            } else {
                ring_to_path(ring)
            };
            if path.len() >= 3 {
                result.push(path);
            }
        };
        push(poly.exterior());
        for interior in poly.interiors() {
            push(interior);
        }
    }
    result
}
