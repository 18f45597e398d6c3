use approx::assert_relative_eq;
use chrono::NaiveDate;
use gdal::raster::Buffer;
use gdal::DriverManager;
use radarstack::io::vector::{read_collection, FeatureCollection, Geometry, StackedProperties};
use radarstack::{Pipeline, PipelineConfig, PipelineError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write a small single-band GeoTIFF with an identity-like geotransform
fn write_raster(path: &Path, rows: usize, cols: usize, values: Vec<f32>) {
    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let mut dataset = driver
        .create_with_band_type::<f32, _>(path, cols as isize, rows as isize, 1)
        .expect("Failed to create test raster");
    dataset
        .set_geo_transform(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
        .expect("Failed to set geotransform");

    let mut rasterband = dataset.rasterband(1).expect("Failed to open band 1");
    let buffer = Buffer::new((cols, rows), values);
    rasterband
        .write((0, 0), (cols, rows), &buffer)
        .expect("Failed to write band data");
}

/// Three regions: two cells of 10.0, two of 30.0, two of 20.0
fn three_region_values() -> Vec<f32> {
    vec![10.0, 10.0, 20.0, 30.0, 30.0, 20.0]
}

#[test]
fn test_full_pipeline_end_to_end() {
    let _ = env_logger::try_init();

    if DriverManager::get_driver_by_name("GTiff").is_err() {
        println!("GTiff driver not available, skipping end-to-end pipeline test");
        return;
    }

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let base_dir = temp_dir.path();
    let input_dir = base_dir.join("Input");
    fs::create_dir_all(&input_dir).expect("Failed to create input directory");

    write_raster(&input_dir.join("20230101_000000_a.tif"), 2, 3, three_region_values());
    write_raster(&input_dir.join("20230101_001000_b.tif"), 2, 3, three_region_values());
    // vectorizes fine, but its name violates the slice identity contract
    write_raster(&input_dir.join("bad-name.tif"), 2, 3, three_region_values());

    let config = PipelineConfig::from_base_dir(base_dir);
    let output_file = config.output_file.clone();
    let pipeline = Pipeline::new(config);

    let summary = pipeline.run().expect("Pipeline run failed");
    assert_eq!(summary.staged, 3);
    assert_eq!(summary.vectorized, 3);
    assert_eq!(summary.stacking.slices_stacked, 2);
    assert_eq!(summary.stacking.records, 6);
    assert_eq!(summary.stacking.skipped.len(), 1);
    assert_eq!(summary.stacking.skipped[0].0, "bad-name.geojson");

    let stacked: FeatureCollection<StackedProperties> =
        read_collection(&output_file).expect("Failed to read stacked output");
    assert_eq!(stacked.len(), 6);

    // equal record counts give equal altitude in both slices: altitude is
    // not a stacking-order index
    for feature in &stacked.features {
        assert_relative_eq!(feature.properties.altitude, 0.75);
        assert!(matches!(feature.geometry, Geometry::Point(_)));
    }

    // all of slice 000000 precedes all of slice 001000
    let midnight = NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let ten_past = NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 10, 0)
        .unwrap();
    for feature in &stacked.features[..3] {
        assert_eq!(feature.properties.timestamp, midnight);
    }
    for feature in &stacked.features[3..] {
        assert_eq!(feature.properties.timestamp, ten_past);
    }

    // first record is the centroid of the 10.0 region (cells (0,0)-(0,1))
    assert_relative_eq!(stacked.features[0].properties.longitude, 1.0);
    assert_relative_eq!(stacked.features[0].properties.latitude, 0.5);

    // re-running the whole pipeline on unchanged inputs is byte-identical
    let first_run = fs::read(&output_file).expect("Failed to read output");
    pipeline.run().expect("Second pipeline run failed");
    let second_run = fs::read(&output_file).expect("Failed to re-read output");
    assert_eq!(first_run, second_run);
}

#[test]
fn test_empty_input_directory_reports_no_data() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let base_dir = temp_dir.path();
    fs::create_dir_all(base_dir.join("Input")).expect("Failed to create input directory");

    let pipeline = Pipeline::new(PipelineConfig::from_base_dir(base_dir));
    assert!(matches!(pipeline.run(), Err(PipelineError::NoData)));
}

#[test]
fn test_missing_input_directory_is_config_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    let pipeline = Pipeline::new(PipelineConfig::from_base_dir(temp_dir.path()));
    assert!(matches!(pipeline.run(), Err(PipelineError::Config(_))));
}
