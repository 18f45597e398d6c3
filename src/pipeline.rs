//! Three-stage batch pipeline: raster staging, per-slice vectorization,
//! temporal stacking.
//!
//! Each stage fully materializes its output before the next stage starts;
//! there is no pipelining and no shared mutable state between stages. A
//! re-run overwrites prior outputs.

use crate::core::stack::{StackSummary, TemporalStacker};
use crate::core::vectorize::Vectorizer;
use crate::io::staging::RasterNormalizer;
use crate::types::{PipelineError, PipelineResult};
use std::path::{Path, PathBuf};

/// Default synthetic vertical separation between time layers
pub const DEFAULT_LAYER_SEPARATION: f64 = 0.5;

/// Explicit per-stage paths and parameters.
///
/// Every stage receives its directories from this struct; no stage infers
/// paths from a shared root.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source rasters, user-populated
    pub input_dir: PathBuf,
    /// Normalized rasters, pipeline-created
    pub staged_dir: PathBuf,
    /// Per-slice vector output, pipeline-created
    pub vector_dir: PathBuf,
    /// Final merged dataset
    pub output_file: PathBuf,
    /// Synthetic vertical separation between layers
    pub layer_separation: f64,
}

impl PipelineConfig {
    /// The fixed directory layout under a user-supplied base directory
    pub fn from_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        Self {
            input_dir: base_dir.join("Input"),
            staged_dir: base_dir.join("Tiff Files"),
            vector_dir: base_dir.join("Geojson Files"),
            output_file: base_dir.join("Output").join("stacked.geojson"),
            layer_separation: DEFAULT_LAYER_SEPARATION,
        }
    }
}

/// Totals for one full pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub staged: usize,
    pub vectorized: usize,
    pub stacking: StackSummary,
}

/// Sequential, single-threaded batch pipeline over one configuration
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage 1: stage raw input rasters into canonical single-band copies
    pub fn normalize(&self) -> PipelineResult<usize> {
        log::info!("Step 1: staging rasters from {}", self.config.input_dir.display());
        RasterNormalizer::normalize_directory(&self.config.input_dir, &self.config.staged_dir)
    }

    /// Stage 2: vectorize every staged raster into a region collection
    pub fn vectorize(&self) -> PipelineResult<usize> {
        log::info!(
            "Step 2: vectorizing staged rasters in {}",
            self.config.staged_dir.display()
        );
        Vectorizer::vectorize_directory(&self.config.staged_dir, &self.config.vector_dir)
    }

    /// Stage 3: stack every slice collection into the merged dataset
    pub fn stack(&self) -> PipelineResult<StackSummary> {
        log::info!(
            "Step 3: stacking slice collections in {}",
            self.config.vector_dir.display()
        );
        TemporalStacker::new(self.config.layer_separation)
            .stack_directory(&self.config.vector_dir, &self.config.output_file)
    }

    /// Run all three stages, each completing before the next starts
    pub fn run(&self) -> PipelineResult<RunSummary> {
        if !self.config.input_dir.is_dir() {
            return Err(PipelineError::Config(format!(
                "Input directory does not exist: {}",
                self.config.input_dir.display()
            )));
        }

        let staged = self.normalize()?;
        let vectorized = self.vectorize()?;
        let stacking = self.stack()?;

        log::info!(
            "Pipeline complete: {} staged, {} vectorized, {} record(s) stacked",
            staged,
            vectorized,
            stacking.records
        );
        Ok(RunSummary {
            staged,
            vectorized,
            stacking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_layout_from_base_dir() {
        let config = PipelineConfig::from_base_dir("/data/run1");
        assert_eq!(config.input_dir, PathBuf::from("/data/run1/Input"));
        assert_eq!(config.staged_dir, PathBuf::from("/data/run1/Tiff Files"));
        assert_eq!(config.vector_dir, PathBuf::from("/data/run1/Geojson Files"));
        assert_eq!(
            config.output_file,
            PathBuf::from("/data/run1/Output/stacked.geojson")
        );
        assert_eq!(config.layer_separation, DEFAULT_LAYER_SEPARATION);
    }

    #[test]
    fn test_run_rejects_missing_base_layout() {
        let pipeline = Pipeline::new(PipelineConfig::from_base_dir("/no/such/base"));
        assert!(matches!(
            pipeline.run(),
            Err(PipelineError::Config(_))
        ));
    }
}
