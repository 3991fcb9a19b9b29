//! Pipeline module - orchestrates layer partitioning and the modifier chain.
//!
//! The pipeline validates the configuration up front, partitions every raw
//! layer into parts, then runs the configured modifiers in order over the
//! whole stack and surfaces the first error.
//!
//! Per-layer work is independent, so partitioning fans out across a rayon
//! worker pool; the clip engine is not assumed thread-safe, so every task
//! creates its own (cheap) instance. The returned layer stack always
//! preserves input index order. A layer whose partitioning fails is logged
//! and replaced by an empty partitioned layer; processing continues.

use crate::clip::{ClipEngine, ClipperEngine};
use crate::config::SliceConfig;
use crate::layer::{Layer, PartitionedLayer};
use crate::modifier::perimeter::PerimeterModifier;
use crate::modifier::{LayerModifier, ModelSummary};
use crate::Result;
use log::{debug, warn};
use rayon::prelude::*;

/// The orchestrator for the layer-processing core.
pub struct Pipeline {
    modifiers: Vec<Box<dyn LayerModifier + Send + Sync>>,
}

impl Pipeline {
    /// Create a pipeline with the default modifier chain for `config`.
    ///
    /// An `inset_count` of zero disables the perimeter modifier. Invalid
    /// configuration is rejected here, before any layer is touched.
    pub fn new(config: SliceConfig) -> Result<Self> {
        config.validate()?;

        let mut modifiers: Vec<Box<dyn LayerModifier + Send + Sync>> = Vec::new();
        if config.inset_count > 0 {
            modifiers.push(Box::new(PerimeterModifier::new(config)));
        }
        Ok(Self { modifiers })
    }

    /// Create a pipeline with an explicit modifier chain, run in order.
    pub fn with_modifiers(
        config: SliceConfig,
        modifiers: Vec<Box<dyn LayerModifier + Send + Sync>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { modifiers })
    }

    /// Number of progress steps reported by
    /// [`Pipeline::process_with_progress`]: partitioning plus one per
    /// modifier.
    pub fn step_count(&self) -> usize {
        1 + self.modifiers.len()
    }

    /// Process a raw layer stack into annotated partitioned layers.
    pub fn process(&mut self, layers: &[Layer]) -> Result<Vec<PartitionedLayer>> {
        self.process_with_progress(layers, |_, _| {})
    }

    /// Process a raw layer stack, reporting `(done, total)` steps to the
    /// callback as each stage completes.
    pub fn process_with_progress<F>(
        &mut self,
        layers: &[Layer],
        mut progress: F,
    ) -> Result<Vec<PartitionedLayer>>
    where
        F: FnMut(usize, usize),
    {
        let total = self.step_count();
        let summary = ModelSummary::from_layers(layers);
        for modifier in &mut self.modifiers {
            modifier.init(&summary);
        }

        // Layer partitioning is independent per layer; each task owns its
        // engine and input order survives the parallel collect.
        let mut partitioned: Vec<PartitionedLayer> = layers
            .par_iter()
            .enumerate()
            .map(|(layer_nr, layer)| {
                let engine = ClipperEngine::new();
                match engine.partition(layer) {
                    Some(parts) => parts,
                    None => {
                        warn!("layer {layer_nr}: partitioning failed, layer skipped");
                        PartitionedLayer::default()
                    }
                }
            })
            .collect();
        progress(1, total);

        for (step, modifier) in self.modifiers.iter().enumerate() {
            debug!("running modifier {}", modifier.name());
            modifier.modify(&mut partitioned)?;
            progress(step + 2, total);
        }

        Ok(partitioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Path, Paths, Point};
    use crate::modifier::perimeter::{overlap_perimeters, perimeters};
    use crate::{Error, Micrometer};

    fn square_at(x: Micrometer, y: Micrometer, size: Micrometer) -> Path {
        Path::from_points(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    fn layer_of(paths: Vec<Path>) -> Layer {
        Layer::new(Paths::from_paths(paths))
    }

    #[test]
    fn test_invalid_config_rejected_before_processing() {
        let config = SliceConfig {
            extrusion_width: 0,
            ..Default::default()
        };
        assert!(matches!(Pipeline::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_process_annotates_layers() {
        let layers = vec![
            layer_of(vec![square_at(0, 0, 10_000)]),
            layer_of(vec![square_at(0, 0, 8_000)]),
        ];
        let mut pipeline = Pipeline::new(SliceConfig::default()).unwrap();
        let annotated = pipeline.process(&layers).unwrap();

        assert_eq!(annotated.len(), 2);
        for layer in &annotated {
            assert_eq!(layer.parts().len(), 1);
            assert!(perimeters(layer).unwrap().is_some());
            assert!(overlap_perimeters(layer).unwrap().is_some());
        }
    }

    #[test]
    fn test_layer_order_preserved() {
        let layers: Vec<Layer> = (0..16)
            .map(|i| layer_of(vec![square_at(i * 1_000, 0, 5_000)]))
            .collect();
        let mut pipeline = Pipeline::new(SliceConfig::default()).unwrap();
        let annotated = pipeline.process(&layers).unwrap();

        assert_eq!(annotated.len(), 16);
        for (i, layer) in annotated.iter().enumerate() {
            assert_eq!(layer.parts()[0].outline()[0].x, i as Micrometer * 1_000);
        }
    }

    #[test]
    fn test_zero_inset_count_disables_perimeter_modifier() {
        let config = SliceConfig {
            inset_count: 0,
            ..Default::default()
        };
        let layers = vec![layer_of(vec![square_at(0, 0, 10_000)])];
        let mut pipeline = Pipeline::new(config).unwrap();
        let annotated = pipeline.process(&layers).unwrap();

        assert_eq!(annotated[0].parts().len(), 1);
        assert!(annotated[0].attributes().is_empty());
    }

    #[test]
    fn test_empty_layer_is_processed() {
        let layers = vec![layer_of(vec![])];
        let mut pipeline = Pipeline::new(SliceConfig::default()).unwrap();
        let annotated = pipeline.process(&layers).unwrap();

        assert_eq!(annotated.len(), 1);
        assert!(annotated[0].parts().is_empty());
    }

    #[test]
    fn test_progress_reports_every_step() {
        let layers = vec![layer_of(vec![square_at(0, 0, 10_000)])];
        let mut pipeline = Pipeline::new(SliceConfig::default()).unwrap();

        let mut steps: Vec<(usize, usize)> = Vec::new();
        pipeline
            .process_with_progress(&layers, |done, total| steps.push((done, total)))
            .unwrap();

        assert_eq!(steps, vec![(1, 2), (2, 2)]);
    }

    struct FailingModifier;

    impl LayerModifier for FailingModifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn modify(&self, _layers: &mut [PartitionedLayer]) -> crate::Result<()> {
            Err(Error::AttributeType("perimeters".to_string()))
        }
    }

    #[test]
    fn test_first_modifier_error_aborts() {
        let layers = vec![layer_of(vec![square_at(0, 0, 10_000)])];
        let mut pipeline =
            Pipeline::with_modifiers(SliceConfig::default(), vec![Box::new(FailingModifier)])
                .unwrap();

        assert!(matches!(
            pipeline.process(&layers),
            Err(Error::AttributeType(_))
        ));
    }

    struct CountingModifier;

    impl LayerModifier for CountingModifier {
        fn name(&self) -> &str {
            "counting"
        }

        fn modify(&self, layers: &mut [PartitionedLayer]) -> crate::Result<()> {
            // earlier modifiers' writes must be visible here
            for layer in layers.iter() {
                assert!(perimeters(layer)?.is_some());
            }
            Ok(())
        }
    }

    #[test]
    fn test_modifiers_run_in_declaration_order() {
        let config = SliceConfig::default();
        let layers = vec![layer_of(vec![square_at(0, 0, 10_000)])];
        let mut pipeline = Pipeline::with_modifiers(
            config,
            vec![
                Box::new(PerimeterModifier::new(config)),
                Box::new(CountingModifier),
            ],
        )
        .unwrap();

        assert!(pipeline.process(&layers).is_ok());
    }
}
