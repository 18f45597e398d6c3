use crate::io::vector::{
    self, Feature, FeatureCollection, Geometry, Position, RegionProperties, Ring,
    StackedProperties, VECTOR_EXTENSION,
};
use crate::types::{PipelineError, PipelineResult, SliceIdentity};
use std::fs;
use std::path::Path;

/// Outcome of a stacking run
#[derive(Debug, Clone, Default)]
pub struct StackSummary {
    /// Slices merged into the output
    pub slices_stacked: usize,
    /// Records in the output dataset
    pub records: usize,
    /// Slices skipped, as (file name, reason)
    pub skipped: Vec<(String, String)>,
}

/// Merges per-slice feature collections into one time-stacked point dataset.
///
/// Slices are processed in lexicographically sorted filename order, which
/// must coincide with chronological order (the filename contract encodes
/// timestamps fixed-width). Each polygon reduces to its centroid, and every
/// record gains the slice timestamp plus a synthetic altitude derived from
/// the slice's record count.
pub struct TemporalStacker {
    layer_separation: f64,
}

impl TemporalStacker {
    pub fn new(layer_separation: f64) -> Self {
        Self { layer_separation }
    }

    /// Stack every slice collection in `vector_dir` into `output_file`.
    ///
    /// A slice whose name violates the identity contract, or whose file
    /// fails to decode, is skipped and recorded in the summary; the run
    /// continues with the remaining slices. Zero stackable slices is an
    /// explicit error, not a crash.
    pub fn stack_directory<P, Q>(&self, vector_dir: P, output_file: Q) -> PipelineResult<StackSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let vector_dir = vector_dir.as_ref();
        let output_file = output_file.as_ref();

        let mut slice_paths: Vec<_> = fs::read_dir(vector_dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(VECTOR_EXTENSION)
            })
            .collect();
        slice_paths.sort();

        let mut stacked: FeatureCollection<StackedProperties> = FeatureCollection::new();
        let mut summary = StackSummary::default();

        for path in &slice_paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let identity = match SliceIdentity::from_path(path) {
                Ok(identity) => identity,
                Err(e) => {
                    log::warn!("Skipping slice {}: {}", name, e);
                    summary.skipped.push((name, e.to_string()));
                    continue;
                }
            };

            let collection: FeatureCollection<RegionProperties> =
                match vector::read_collection(path) {
                    Ok(collection) => collection,
                    Err(e) => {
                        log::warn!("Skipping slice {}: {}", name, e);
                        summary.skipped.push((name, e.to_string()));
                        continue;
                    }
                };

            log::debug!(
                "Stacking slice {} ({} record(s), timestamp {})",
                identity.stem,
                collection.len(),
                identity.timestamp
            );
            stacked
                .features
                .extend(self.stack_slice(&identity, collection));
            summary.slices_stacked += 1;
        }

        if summary.slices_stacked == 0 {
            return Err(PipelineError::NoData);
        }
        summary.records = stacked.len();

        if let Some(parent) = output_file.parent() {
            fs::create_dir_all(parent)?;
        }
        vector::write_collection(output_file, &stacked)?;

        log::info!(
            "Stacked {} slice(s) into {} record(s) at {}",
            summary.slices_stacked,
            summary.records,
            output_file.display()
        );
        if !summary.skipped.is_empty() {
            log::warn!("Skipped {} slice(s)", summary.skipped.len());
        }
        Ok(summary)
    }

    /// Reduce one slice to centroid points carrying the stacked attributes.
    ///
    /// Altitude is a visualization coordinate, not a measurement: it is
    /// constant across the slice and scales with the slice's record count,
    /// so denser slices render taller.
    fn stack_slice(
        &self,
        identity: &SliceIdentity,
        collection: FeatureCollection<RegionProperties>,
    ) -> Vec<Feature<StackedProperties>> {
        let altitude = collection.len() as f64 * self.layer_separation * 0.5;

        collection
            .features
            .into_iter()
            .map(|feature| {
                let [longitude, latitude] = centroid(&feature.geometry);
                Feature::new(
                    Geometry::Point([longitude, latitude]),
                    StackedProperties {
                        timestamp: identity.timestamp,
                        longitude,
                        latitude,
                        altitude,
                    },
                )
            })
            .collect()
    }
}

/// Representative point of a geometry.
///
/// Points pass through unchanged; polygon boundaries reduce to their
/// area-weighted centroid (holes subtract). A degenerate zero-area
/// boundary falls back to the mean of its vertices.
pub fn centroid(geometry: &Geometry) -> Position {
    match geometry {
        Geometry::Point(position) => *position,
        Geometry::Polygon(rings) => rings_centroid(rings.iter()),
        Geometry::MultiPolygon(polygons) => rings_centroid(polygons.iter().flatten()),
    }
}

fn rings_centroid<'a, I>(rings: I) -> Position
where
    I: Iterator<Item = &'a Ring> + Clone,
{
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for ring in rings.clone() {
        for i in 0..ring.len() {
            let [x1, y1] = ring[i];
            let [x2, y2] = ring[(i + 1) % ring.len()];
            let cross = x1 * y2 - x2 * y1;
            area2 += cross;
            cx += (x1 + x2) * cross;
            cy += (y1 + y2) * cross;
        }
    }

    if area2.abs() > f64::EPSILON {
        return [cx / (3.0 * area2), cy / (3.0 * area2)];
    }

    // degenerate boundary: average the vertices
    let vertices: Vec<Position> = rings
        .flat_map(|ring| {
            let open_len = if ring.len() > 1 && ring.first() == ring.last() {
                ring.len() - 1
            } else {
                ring.len()
            };
            ring[..open_len].iter().copied()
        })
        .collect();
    if vertices.is_empty() {
        return [0.0, 0.0];
    }
    let n = vertices.len() as f64;
    [
        vertices.iter().map(|p| p[0]).sum::<f64>() / n,
        vertices.iter().map(|p| p[1]).sum::<f64>() / n,
    ]
}
