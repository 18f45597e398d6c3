use crate::types::{GeoTransform, PipelineError, PipelineResult, ReflectivityGrid};
use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

/// Single-band radar raster reader
pub struct RasterReader;

impl RasterReader {
    /// Read band 1 of a raster into a reflectivity grid plus its affine transform.
    ///
    /// Any additional bands are ignored. All cells are read, background
    /// included; no mask or no-data handling is applied.
    pub fn read_band<P: AsRef<Path>>(path: P) -> PipelineResult<(ReflectivityGrid, GeoTransform)> {
        log::debug!("Reading raster: {}", path.as_ref().display());

        let dataset = Dataset::open(path.as_ref())?;

        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        log::debug!("Raster size: {}x{}", width, height);

        let rasterband = dataset.rasterband(1)?;
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let grid = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| PipelineError::InvalidFormat(format!("Failed to reshape raster data: {}", e)))?;

        Ok((grid, GeoTransform::from_gdal(&geo_transform)))
    }
}
