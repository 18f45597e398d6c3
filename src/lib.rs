//! radarstack: time-stacked vector datasets from radar raster sequences
//!
//! This library converts a directory of timestamped radar rasters into a
//! single GeoJSON point dataset where time maps to a synthetic altitude,
//! via a three-stage batch pipeline: raster staging, per-slice
//! raster-to-polygon vectorization, and temporal stacking.

pub mod core;
pub mod io;
pub mod pipeline;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    GeoTransform, PipelineError, PipelineResult, Reflectivity, ReflectivityGrid, SliceIdentity,
};

pub use self::core::{Region, StackSummary, TemporalStacker, Vectorizer};
pub use io::{RasterNormalizer, RasterReader};
pub use pipeline::{Pipeline, PipelineConfig, RunSummary, DEFAULT_LAYER_SEPARATION};
