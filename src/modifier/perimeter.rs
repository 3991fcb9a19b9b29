//! Perimeter modifier.
//!
//! For every layer and every part this modifier produces:
//! - `"perimeters"`: the full inset tree (`[part][wall][inset]` path sets)
//!   at one extrusion width per wall, the first wall centered half an
//!   extrusion width inside the part boundary;
//! - `"overlapPerimeters"`: for the innermost wall of every sub-region of
//!   the part, one further inset inward by the infill overlap distance.
//!   The downstream infill uses these as its clip region so the infill
//!   fuses with the innermost wall.
//!
//! Both results are stored in the layer attribute bag under the documented
//! keys; the typed accessors below retrieve them.

use crate::clip::{ClipEngine, ClipperEngine, OffsetResult};
use crate::config::SliceConfig;
use crate::geometry::Paths;
use crate::layer::{LayerAttribute, LayerPart, PartitionedLayer};
use crate::modifier::LayerModifier;
use crate::{Error, Micrometer, Result};
use log::warn;

/// Attribute key carrying the full inset tree ([`OffsetResult`]).
pub const PERIMETERS_KEY: &str = "perimeters";

/// Attribute key carrying the overlap clip regions, one slot per part.
pub const OVERLAP_PERIMETERS_KEY: &str = "overlapPerimeters";

/// Extract the `"perimeters"` attribute from a layer.
///
/// Returns `Ok(None)` when the attribute is absent and an error when a
/// value of the wrong type is stored under the key (a bug in a modifier).
pub fn perimeters(layer: &PartitionedLayer) -> Result<Option<&OffsetResult>> {
    match layer.attribute(PERIMETERS_KEY) {
        Some(LayerAttribute::Perimeters(result)) => Ok(Some(result)),
        Some(_) => Err(Error::AttributeType(PERIMETERS_KEY.to_string())),
        None => Ok(None),
    }
}

/// Extract the `"overlapPerimeters"` attribute from a layer.
///
/// Returns `Ok(None)` when the attribute is absent and an error when a
/// value of the wrong type is stored under the key.
pub fn overlap_perimeters(layer: &PartitionedLayer) -> Result<Option<&Vec<Vec<LayerPart>>>> {
    match layer.attribute(OVERLAP_PERIMETERS_KEY) {
        Some(LayerAttribute::OverlapPerimeters(result)) => Ok(Some(result)),
        Some(_) => Err(Error::AttributeType(OVERLAP_PERIMETERS_KEY.to_string())),
        None => Ok(None),
    }
}

/// The modifier computing all perimeter walls and the overlap regions.
#[derive(Clone, Debug)]
pub struct PerimeterModifier {
    config: SliceConfig,
}

impl PerimeterModifier {
    /// Create a perimeter modifier for the given configuration.
    pub fn new(config: SliceConfig) -> Self {
        Self { config }
    }

    /// Inset a regrouped innermost-wall part by the overlap distance.
    ///
    /// `overlap = extrusion_width · (100 − overlap_percent) / 100`, float
    /// computed and truncated to whole micrometres. A zero overlap passes
    /// the part through unchanged.
    fn overlap_perimeter(&self, engine: &ClipperEngine, part: LayerPart) -> Vec<LayerPart> {
        let overlap = (self.config.extrusion_width as f32
            * (100 - self.config.infill_overlap_percent) as f32
            / 100.0) as Micrometer;
        if overlap == 0 {
            return vec![part];
        }

        // a single inset step, centered half the overlap distance inside
        let insets = engine.inset(&part, overlap, 1);
        let mut paths = Paths::new();
        for wall in &insets {
            if let Some(level) = wall.first() {
                for path in level {
                    paths.push(path.clone());
                }
            }
        }
        if paths.is_empty() {
            return Vec::new();
        }

        engine.group_parts(&paths).unwrap_or_else(|| {
            warn!("perimeter: could not regroup the overlap inset, dropping it");
            Vec::new()
        })
    }
}

impl LayerModifier for PerimeterModifier {
    fn name(&self) -> &str {
        "perimeter"
    }

    fn modify(&self, layers: &mut [PartitionedLayer]) -> Result<()> {
        let engine = ClipperEngine::new();

        for layer in layers.iter_mut() {
            let inset_parts =
                engine.inset_layer(layer, self.config.extrusion_width, self.config.inset_count);

            // One overlap slot per part, always.
            let mut overlaps: Vec<Vec<LayerPart>> = Vec::with_capacity(inset_parts.len());
            for part_walls in &inset_parts {
                let mut slot: Vec<LayerPart> = Vec::new();

                // The innermost populated level of every wall bounds the
                // region the infill may reach into.
                let mut innermost = Paths::new();
                for wall in part_walls {
                    if let Some(level) = wall.iter().rev().find(|level| !level.is_empty()) {
                        for path in level {
                            innermost.push(path.clone());
                        }
                    }
                }

                if !innermost.is_empty() {
                    match engine.group_parts(&innermost) {
                        Some(parts) => {
                            for part in parts {
                                slot.extend(self.overlap_perimeter(&engine, part));
                            }
                        }
                        None => {
                            warn!("perimeter: could not regroup innermost walls, part skipped")
                        }
                    }
                }
                overlaps.push(slot);
            }

            layer.set_attribute(PERIMETERS_KEY, LayerAttribute::Perimeters(inset_parts));
            layer.set_attribute(
                OVERLAP_PERIMETERS_KEY,
                LayerAttribute::OverlapPerimeters(overlaps),
            );
        }

        Ok(())
    }
}
