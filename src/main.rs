use anyhow::Result;
use clap::Parser;
use radarstack::pipeline::{Pipeline, PipelineConfig};
use std::path::PathBuf;

/// Convert timestamped radar rasters into one time-stacked GeoJSON dataset
#[derive(Parser)]
#[command(name = "radarstack", version, about)]
struct Args {
    /// Base directory containing the Input/ folder with source rasters
    base_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let pipeline = Pipeline::new(PipelineConfig::from_base_dir(&args.base_dir));
    println!("Processing files in {}...", args.base_dir.display());

    let staged = pipeline.normalize()?;
    println!("Step 1: {} radar file(s) staged as TIFF.", staged);

    let vectorized = pipeline.vectorize()?;
    println!("Step 2: {} TIFF file(s) converted to GeoJSON.", vectorized);

    let summary = pipeline.stack()?;
    println!(
        "Step 3: {} GeoJSON slice(s) stacked into {} record(s).",
        summary.slices_stacked, summary.records
    );
    for (name, reason) in &summary.skipped {
        eprintln!("Skipped {}: {}", name, reason);
    }

    println!("Processing complete!");
    Ok(())
}
