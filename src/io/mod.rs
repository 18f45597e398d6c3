//! File input/output: raster reading, raster staging, GeoJSON vector I/O

pub mod raster;
pub mod staging;
pub mod vector;

// Re-export main types
pub use raster::RasterReader;
pub use staging::RasterNormalizer;
pub use vector::{Feature, FeatureCollection, Geometry, RegionProperties, StackedProperties};
