//! # slicecore
//!
//! The polygon layer-processing core of a fused-filament slicer.
//!
//! Given a stack of raw 2D slices (flat sets of closed loops produced by an
//! external mesh slicer), this library:
//! - partitions each slice into discrete layer parts (outer contour + holes),
//! - generates successive inset wall loops for each part,
//! - generates parallel infill lines clipped against the innermost wall with
//!   a configurable overlap,
//! - attaches the results to each layer as typed attributes readable by a
//!   downstream path planner.
//!
//! ## Coordinate System
//!
//! All geometry uses signed 64-bit integer coordinates in micrometres
//! (1 µm = 10⁻⁶ m). No floating point is persisted: exact predicates use
//! widened (128-bit) integer arithmetic, and the polygon offsetting backend
//! converts to `f64` only at its boundary, rounding back to whole
//! micrometres.
//!
//! ## Example
//!
//! ```rust,ignore
//! use slicecore::{Layer, Pipeline, SliceConfig};
//!
//! let layers: Vec<Layer> = load_slices()?;
//! let mut pipeline = Pipeline::new(SliceConfig::default())?;
//! let annotated = pipeline.process(&layers)?;
//! ```

pub mod clip;
pub mod config;
pub mod geometry;
pub mod layer;
pub mod modifier;
pub mod pipeline;

// Re-export commonly used types
pub use clip::{ClipEngine, ClipperEngine, InsetResult, OffsetResult, VERTEX_MERGE_DISTANCE};
pub use config::SliceConfig;
pub use geometry::{Path, Paths, Point, SIMPLIFY_TOLERANCE};
pub use layer::{Layer, LayerAttribute, LayerPart, PartitionedLayer};
pub use modifier::perimeter::{
    overlap_perimeters, perimeters, PerimeterModifier, OVERLAP_PERIMETERS_KEY, PERIMETERS_KEY,
};
pub use modifier::{LayerModifier, ModelSummary};
pub use pipeline::Pipeline;

/// Scalar length in micrometres (1 µm = 10⁻⁶ m).
///
/// All core geometry is expressed in this unit. Inputs are bounded by the
/// printer build volume (≤ 10⁹ µm), so plain 64-bit arithmetic never
/// overflows; exact distance predicates widen to 128 bits.
pub type Micrometer = i64;

/// Result type used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for core operations.
///
/// Geometry failures inside the clip engine are deliberately *not*
/// represented here: they are non-fatal, logged, and localized to the
/// affected layer. Everything below aborts the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration was rejected before any layer was processed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A value stored under a known attribute key has the wrong type.
    /// This is a bug in a modifier, not a user input condition.
    #[error("the attribute {0} has the wrong datatype")]
    AttributeType(String),
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
