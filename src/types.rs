use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Real-valued reflectivity data
pub type Reflectivity = f32;

/// 2D reflectivity grid (row x col), band 1 of a radar raster
pub type ReflectivityGrid = Array2<Reflectivity>;

/// Geospatial transformation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from the six GDAL geotransform coefficients
    pub fn from_gdal(coefficients: &[f64; 6]) -> Self {
        Self {
            top_left_x: coefficients[0],
            pixel_width: coefficients[1],
            rotation_x: coefficients[2],
            top_left_y: coefficients[3],
            rotation_y: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// Identity transform: world coordinates equal grid coordinates
    pub fn identity() -> Self {
        Self::from_gdal(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// Map a corner of the cell lattice (col, row) to world (x, y)
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.top_left_x + col * self.pixel_width + row * self.rotation_x,
            self.top_left_y + col * self.rotation_y + row * self.pixel_height,
        )
    }
}

/// Identity of one time slice, parsed from its file stem.
///
/// A slice stem must decompose into exactly three `_`-separated tokens,
/// the first two of which concatenate into a `YYYYMMDDHHMMSS` timestamp,
/// e.g. `20230815_134501_scanA`.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceIdentity {
    pub stem: String,
    pub timestamp: NaiveDateTime,
}

impl SliceIdentity {
    pub const TIMESTAMP_FORMAT: &'static str = "%Y%m%d%H%M%S";

    /// Parse a slice identity from a file stem
    pub fn parse(stem: &str) -> PipelineResult<Self> {
        let tokens: Vec<&str> = stem.split('_').collect();
        if tokens.len() != 3 {
            return Err(PipelineError::SliceParse {
                name: stem.to_string(),
                reason: format!("expected 3 '_'-separated tokens, found {}", tokens.len()),
            });
        }

        let combined = format!("{}{}", tokens[0], tokens[1]);
        let timestamp = NaiveDateTime::parse_from_str(&combined, Self::TIMESTAMP_FORMAT)
            .map_err(|e| PipelineError::SliceParse {
                name: stem.to_string(),
                reason: format!("'{}' is not a YYYYMMDDHHMMSS timestamp: {}", combined, e),
            })?;

        Ok(Self {
            stem: stem.to_string(),
            timestamp,
        })
    }

    /// Parse a slice identity from a file path's stem
    pub fn from_path<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PipelineError::SliceParse {
                name: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        Self::parse(stem)
    }
}

/// Error types for pipeline processing
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Slice name '{name}' violates the <date>_<time>_<suffix> contract: {reason}")]
    SliceParse { name: String, reason: String },

    #[error("No data to stack")]
    NoData,
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_geo_transform_apply() {
        let transform = GeoTransform::from_gdal(&[10.0, 2.0, 0.0, 50.0, 0.0, -2.0]);
        assert_eq!(transform.apply(0.0, 0.0), (10.0, 50.0));
        assert_eq!(transform.apply(3.0, 1.0), (16.0, 48.0));
    }

    #[test]
    fn test_slice_identity_round_trip() {
        let identity = SliceIdentity::parse("20230815_134501_scanA").unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 8, 15)
            .unwrap()
            .and_hms_opt(13, 45, 1)
            .unwrap();
        assert_eq!(identity.timestamp, expected);
        assert_eq!(identity.stem, "20230815_134501_scanA");
    }

    #[test]
    fn test_slice_identity_rejects_wrong_token_count() {
        assert!(matches!(
            SliceIdentity::parse("bad-name"),
            Err(PipelineError::SliceParse { .. })
        ));
        assert!(matches!(
            SliceIdentity::parse("20230101_000000_a_b"),
            Err(PipelineError::SliceParse { .. })
        ));
    }

    #[test]
    fn test_slice_identity_rejects_bad_timestamp() {
        assert!(matches!(
            SliceIdentity::parse("2023_0101_x"),
            Err(PipelineError::SliceParse { .. })
        ));
        assert!(matches!(
            SliceIdentity::parse("20231301_000000_x"),
            Err(PipelineError::SliceParse { .. })
        ));
    }

    #[test]
    fn test_slice_identity_from_path() {
        let identity = SliceIdentity::from_path("/data/20230101_001000_b.geojson").unwrap();
        assert_eq!(identity.timestamp.hour(), 0);
        assert_eq!(identity.timestamp.minute(), 10);
    }
}
