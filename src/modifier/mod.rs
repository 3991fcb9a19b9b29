//! Layer modifier chain.
//!
//! A modifier is a named transformer over the whole layer stack. Modifiers
//! are arranged in a fixed order supplied by configuration; each one reads
//! and writes attributes on the layers, and results attached by earlier
//! modifiers are visible to later ones through the attribute bag.
//!
//! The perimeter modifier in [`perimeter`] is the canonical one.

pub mod perimeter;

use crate::geometry::Point;
use crate::layer::{Layer, PartitionedLayer};
use crate::Result;

/// Read-only digest of the model handed to modifiers before the first
/// layer is processed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelSummary {
    /// Lower corner of the bounding box over all layers (µm).
    pub min: Point,
    /// Upper corner of the bounding box over all layers (µm).
    pub max: Point,
    /// Number of layers in the stack.
    pub layer_count: usize,
}

impl ModelSummary {
    /// Compute the summary over a raw layer stack.
    pub fn from_layers(layers: &[Layer]) -> Self {
        let mut bounds: Option<(Point, Point)> = None;
        for layer in layers {
            if let Some((lmin, lmax)) = layer.polygons().size() {
                bounds = Some(match bounds {
                    None => (lmin, lmax),
                    Some((min, max)) => (
                        Point::new(min.x.min(lmin.x), min.y.min(lmin.y)),
                        Point::new(max.x.max(lmax.x), max.y.max(lmax.y)),
                    ),
                });
            }
        }
        let (min, max) = bounds.unwrap_or((Point::zero(), Point::zero()));
        Self {
            min,
            max,
            layer_count: layers.len(),
        }
    }
}

/// A named transformer over the layer stack.
///
/// `modify` must be deterministic, and per-layer work must stay independent:
/// processing layer *i* never reads or writes state belonging to another
/// layer. Modifiers do not retain references across invocations.
pub trait LayerModifier {
    /// Short stable name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Called once before the first layer with a read-only model summary.
    fn init(&mut self, _model: &ModelSummary) {}

    /// Transform the full layer stack in place.
    fn modify(&self, layers: &mut [PartitionedLayer]) -> Result<()>;
}
