//! Configuration surface consumed by the core.

use crate::{Error, Micrometer, Result};
use serde::{Deserialize, Serialize};

/// Flat configuration record for the layer-processing core.
///
/// All lengths are micrometres; percentages are integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceConfig {
    /// Nominal wall line width (µm). Must be positive.
    pub extrusion_width: Micrometer,

    /// Number of perimeter walls. Zero disables the perimeter modifier.
    pub inset_count: usize,

    /// Percentage of a line width by which infill overlaps the innermost
    /// wall. Typically 0-100 but deliberately not clamped.
    pub infill_overlap_percent: i32,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            extrusion_width: 400,
            inset_count: 2,
            infill_overlap_percent: 30,
        }
    }
}

impl SliceConfig {
    /// Validate the configuration. Called by the orchestrator before any
    /// layer is processed.
    pub fn validate(&self) -> Result<()> {
        if self.extrusion_width <= 0 {
            return Err(Error::Config(format!(
                "extrusion width must be positive, got {} µm",
                self.extrusion_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SliceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_extrusion_width() {
        let zero = SliceConfig {
            extrusion_width: 0,
            ..Default::default()
        };
        let err = zero.validate().unwrap_err();
        assert!(err.to_string().contains("extrusion width"));

        let negative = SliceConfig {
            extrusion_width: -400,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_overlap_percent_is_not_clamped() {
        let config = SliceConfig {
            infill_overlap_percent: 150,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
