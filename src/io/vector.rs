//! GeoJSON feature-collection model and file I/O.
//!
//! The pipeline reads and writes a small GeoJSON subset: polygon regions
//! with a `reflectivity` attribute per time slice, and the final stacked
//! point dataset. Collections are generic over a typed property schema so
//! each file is validated against its declared record format once, at
//! deserialization.

use crate::types::PipelineResult;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Canonical extension for per-slice and stacked vector files
pub const VECTOR_EXTENSION: &str = "geojson";

/// A single `[x, y]` coordinate pair
pub type Position = [f64; 2];

/// A closed linear ring (first position equals last)
pub type Ring = Vec<Position>;

/// GeoJSON geometry subset used by the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// One GeoJSON feature with a typed property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    #[serde(rename = "type")]
    pub type_: String,
    pub geometry: Geometry,
    pub properties: P,
}

impl<P> Feature<P> {
    pub fn new(geometry: Geometry, properties: P) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry,
            properties,
        }
    }
}

/// An ordered GeoJSON feature collection with a typed property schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(rename = "type")]
    pub type_: String,
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Property schema of per-slice region files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionProperties {
    pub reflectivity: f64,
}

/// Property schema of the final stacked dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedProperties {
    pub timestamp: NaiveDateTime,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: f64,
}

/// Read a feature collection, validating it against the schema `P`
pub fn read_collection<P, Q>(path: Q) -> PipelineResult<FeatureCollection<P>>
where
    P: DeserializeOwned,
    Q: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let collection = serde_json::from_reader(BufReader::new(file))?;
    Ok(collection)
}

/// Write a feature collection as a GeoJSON file, overwriting any prior output
pub fn write_collection<P, Q>(path: Q, collection: &FeatureCollection<P>) -> PipelineResult<()>
where
    P: Serialize,
    Q: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_geometry_serializes_as_geojson() {
        let point = Geometry::Point([4.5, 52.0]);
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Point", "coordinates": [4.5, 52.0]})
        );

        let polygon = Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]);
        let json = serde_json::to_value(&polygon).unwrap();
        assert_eq!(json["type"], "Polygon");
        assert_eq!(json["coordinates"][0][1][0], 1.0);
    }

    #[test]
    fn test_region_collection_parses_from_geojson() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]},
                "properties": {"reflectivity": 42.5}
            }]
        }"#;

        let collection: FeatureCollection<RegionProperties> = serde_json::from_str(raw).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.features[0].properties.reflectivity, 42.5);
    }

    #[test]
    fn test_stacked_timestamp_serializes_iso8601() {
        let properties = StackedProperties {
            timestamp: NaiveDate::from_ymd_opt(2023, 8, 15)
                .unwrap()
                .and_hms_opt(13, 45, 1)
                .unwrap(),
            longitude: 4.5,
            latitude: 52.0,
            altitude: 0.75,
        };

        let json = serde_json::to_value(&properties).unwrap();
        assert_eq!(json["timestamp"], "2023-08-15T13:45:01");
    }

    #[test]
    fn test_mismatched_schema_is_rejected() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {"intensity": 1.0}
            }]
        }"#;

        let result: Result<FeatureCollection<RegionProperties>, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
