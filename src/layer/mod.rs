//! Layer model.
//!
//! - [`Layer`] - raw slicer output: a flat, unordered collection of closed
//!   loops with no parent/child structure yet
//! - [`LayerPart`] - one connected island: an outer contour plus the holes
//!   directly inside it
//! - [`PartitionedLayer`] - the ordered parts of one layer together with a
//!   keyed attribute bag carrying per-layer results from the modifier chain
//!
//! Attribute values are a tagged enum ([`LayerAttribute`]) with one variant
//! per known result kind; the key strings under which they are stored are
//! the externally documented contract (see [`crate::modifier::perimeter`]).

use crate::clip::OffsetResult;
use crate::geometry::{Path, Paths, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The raw output of the external mesh slicer for one layer: a flat list of
/// closed polylines in micrometres. Orientation is not trusted; the clip
/// engine re-derives nesting via even-odd containment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    polygons: Paths,
}

impl Layer {
    /// Create a layer from a flat set of closed loops.
    pub fn new(polygons: Paths) -> Self {
        Self { polygons }
    }

    /// The closed loops of this layer.
    pub fn polygons(&self) -> &Paths {
        &self.polygons
    }

    /// Check if the layer contains no loops.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// One connected island within a slice: an outer boundary and the holes
/// directly inside it. Immutable after construction.
///
/// The constructor normalizes winding (outline counter-clockwise, holes
/// clockwise). The convention is internal only; it is re-derived where
/// needed and never part of the external contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerPart {
    outline: Path,
    holes: Paths,
}

impl LayerPart {
    /// Build a part from a closed outline and its holes.
    pub fn new(outline: Path, holes: Paths) -> Self {
        let outline = if outline.is_counter_clockwise() {
            outline
        } else {
            outline.reversed()
        };
        let holes = holes
            .into_iter()
            .map(|h| if h.is_counter_clockwise() { h.reversed() } else { h })
            .collect();
        Self { outline, holes }
    }

    /// The closed outer contour.
    pub fn outline(&self) -> &Path {
        &self.outline
    }

    /// The closed holes, each strictly inside the outline.
    pub fn holes(&self) -> &Paths {
        &self.holes
    }

    /// Flatten the part back to raw closed paths, outline first.
    pub fn to_paths(&self) -> Paths {
        let mut paths = Vec::with_capacity(self.holes.len() + 1);
        paths.push(self.outline.clone());
        paths.extend(self.holes.iter().cloned());
        Paths::from_paths(paths)
    }

    /// Even-odd containment: inside the outline and outside every hole.
    pub fn contains(&self, p: Point) -> bool {
        self.outline.contains(p) && !self.holes.iter().any(|h| h.contains(p))
    }
}

/// A typed per-layer result attached by a modifier.
///
/// One variant per known result kind; the string key a value is stored
/// under is part of the external contract, the variant is the type check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LayerAttribute {
    /// The full inset tree: `[part][wall][inset]` path sets.
    Perimeters(OffsetResult),
    /// The innermost wall of every part inset by the infill overlap
    /// distance: one slot per part.
    OverlapPerimeters(Vec<Vec<LayerPart>>),
}

/// A partitioned layer: ordered parts plus the attribute bag.
///
/// Created once by the orchestrator; each modifier augments the bag in
/// place. Unknown keys written by other modifiers are preserved verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionedLayer {
    parts: Vec<LayerPart>,
    attributes: HashMap<String, LayerAttribute>,
}

impl PartitionedLayer {
    /// Create a partitioned layer from its parts.
    pub fn new(parts: Vec<LayerPart>) -> Self {
        Self {
            parts,
            attributes: HashMap::new(),
        }
    }

    /// The parts of this layer, in partitioner traversal order.
    pub fn parts(&self) -> &[LayerPart] {
        &self.parts
    }

    /// The full attribute bag.
    pub fn attributes(&self) -> &HashMap<String, LayerAttribute> {
        &self.attributes
    }

    /// Look up an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&LayerAttribute> {
        self.attributes.get(key)
    }

    /// Store an attribute under `key`, replacing any previous value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: LayerAttribute) {
        self.attributes.insert(key.into(), value);
    }
}
