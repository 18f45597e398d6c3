use crate::io::raster::RasterReader;
use crate::io::staging::RASTER_EXTENSION;
use crate::io::vector::{self, Feature, FeatureCollection, Geometry, RegionProperties, Ring, VECTOR_EXTENSION};
use crate::types::{GeoTransform, PipelineError, PipelineResult, ReflectivityGrid};
use ndarray::Array2;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A corner on the cell lattice, as (row, col)
type Vertex = (usize, usize);

/// One maximal group of 4-connected equal-valued cells: a polygon boundary
/// in world coordinates (exterior ring first, interior rings after) plus
/// the shared cell value.
#[derive(Debug, Clone)]
pub struct Region {
    pub rings: Vec<Ring>,
    pub reflectivity: f64,
}

/// Converts rasters into polygon feature collections, one polygon per
/// contiguous region of equal cell value.
///
/// Cells compare bit-exact, so NaN cells group deterministically. All
/// cells participate; background and no-data values become regions like
/// any other.
pub struct Vectorizer;

impl Vectorizer {
    /// Extract the equal-valued regions of a grid as world-coordinate polygons.
    ///
    /// Regions are returned in row-major scan order of their first cell,
    /// and together they partition the full grid extent.
    pub fn extract_regions(grid: &ReflectivityGrid, transform: &GeoTransform) -> Vec<Region> {
        let (rows, cols) = grid.dim();
        if rows == 0 || cols == 0 {
            return Vec::new();
        }

        let (labels, values) = label_components(grid);
        log::debug!("Found {} region(s) in {}x{} grid", values.len(), rows, cols);

        // Directed boundary edges per label, walked with the region
        // interior on the right-hand side (lattice row axis points down).
        let mut label_edges: Vec<Vec<(Vertex, Vertex)>> = vec![Vec::new(); values.len()];
        let same = |r: usize, c: usize, nr: isize, nc: isize| -> bool {
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                return false;
            }
            labels[[nr as usize, nc as usize]] == labels[[r, c]]
        };

        for r in 0..rows {
            for c in 0..cols {
                let edges = &mut label_edges[(labels[[r, c]] - 1) as usize];
                if !same(r, c, r as isize - 1, c as isize) {
                    edges.push(((r, c), (r, c + 1)));
                }
                if !same(r, c, r as isize, c as isize + 1) {
                    edges.push(((r, c + 1), (r + 1, c + 1)));
                }
                if !same(r, c, r as isize + 1, c as isize) {
                    edges.push(((r + 1, c + 1), (r + 1, c)));
                }
                if !same(r, c, r as isize, c as isize - 1) {
                    edges.push(((r + 1, c), (r, c)));
                }
            }
        }

        let mut regions = Vec::with_capacity(values.len());
        for (index, edges) in label_edges.into_iter().enumerate() {
            let mut rings = trace_rings(&edges);

            // The exterior ring carries positive lattice area; holes are
            // traversed in the opposite orientation and come out negative.
            if rings.len() > 1 {
                let mut exterior = 0;
                for i in 1..rings.len() {
                    if ring_signed_area2(&rings[i]) > ring_signed_area2(&rings[exterior]) {
                        exterior = i;
                    }
                }
                rings.swap(0, exterior);
            }

            let rings = rings
                .iter()
                .map(|ring| lattice_ring_to_world(ring, transform))
                .collect();

            regions.push(Region {
                rings,
                reflectivity: f64::from(values[index]),
            });
        }

        regions
    }

    /// Vectorize one raster file into a GeoJSON region collection.
    ///
    /// Reads band 1 only. A raster that cannot be opened or read is fatal
    /// and propagates. Returns the number of regions written.
    pub fn vectorize_file<P, Q>(raster_path: P, vector_path: Q) -> PipelineResult<usize>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        log::info!("Vectorizing {}", raster_path.as_ref().display());

        let (grid, transform) = RasterReader::read_band(raster_path.as_ref())?;
        let regions = Self::extract_regions(&grid, &transform);

        let mut collection = FeatureCollection::new();
        for region in regions {
            collection.features.push(Feature::new(
                Geometry::Polygon(region.rings),
                RegionProperties {
                    reflectivity: region.reflectivity,
                },
            ));
        }

        vector::write_collection(vector_path.as_ref(), &collection)?;
        log::info!(
            "Wrote {} region(s) to {}",
            collection.len(),
            vector_path.as_ref().display()
        );
        Ok(collection.len())
    }

    /// Vectorize every staged raster in a directory, one output per input.
    ///
    /// Selects files with the canonical raster extension, non-recursive.
    /// Outputs keep the input's base name with the canonical vector
    /// extension; re-running overwrites prior outputs. Returns the number
    /// of files processed.
    pub fn vectorize_directory<P, Q>(staged_dir: P, vector_dir: Q) -> PipelineResult<usize>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let staged_dir = staged_dir.as_ref();
        let vector_dir = vector_dir.as_ref();

        fs::create_dir_all(vector_dir)?;

        let mut raster_paths: Vec<_> = fs::read_dir(staged_dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(RASTER_EXTENSION)
            })
            .collect();
        raster_paths.sort();

        for raster_path in &raster_paths {
            let stem = raster_path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    PipelineError::Config(format!(
                        "Staged file name is not valid UTF-8: {}",
                        raster_path.display()
                    ))
                })?;
            let vector_path = vector_dir.join(format!("{}.{}", stem, VECTOR_EXTENSION));
            Self::vectorize_file(raster_path, &vector_path)?;
        }

        log::info!(
            "Vectorized {} raster file(s) into {}",
            raster_paths.len(),
            vector_dir.display()
        );
        Ok(raster_paths.len())
    }
}

/// Label 4-connected components of bit-identical cells.
///
/// Returns the label grid (1-based) and the cell value per label, in
/// row-major scan order of each component's first cell.
fn label_components(grid: &ReflectivityGrid) -> (Array2<u32>, Vec<f32>) {
    let (rows, cols) = grid.dim();
    let mut labels = Array2::from_elem((rows, cols), 0u32);
    let mut values = Vec::new();
    let mut stack = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            if labels[[r, c]] != 0 {
                continue;
            }

            let value = grid[[r, c]];
            let bits = value.to_bits();
            let label = values.len() as u32 + 1;
            values.push(value);

            labels[[r, c]] = label;
            stack.push((r, c));
            while let Some((cr, cc)) = stack.pop() {
                for (dr, dc) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
                    let nr = cr as isize + dr;
                    let nc = cc as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if labels[[nr, nc]] != 0 || grid[[nr, nc]].to_bits() != bits {
                        continue;
                    }
                    labels[[nr, nc]] = label;
                    stack.push((nr, nc));
                }
            }
        }
    }

    (labels, values)
}

fn direction(from: Vertex, to: Vertex) -> (i32, i32) {
    (
        to.0 as i32 - from.0 as i32,
        to.1 as i32 - from.1 as i32,
    )
}

/// Chain one label's boundary edges into closed rings.
///
/// At a pinch vertex (the region touching itself diagonally) the walk
/// prefers the sharpest turn toward the interior, keeping every ring
/// simple.
fn trace_rings(edges: &[(Vertex, Vertex)]) -> Vec<Vec<Vertex>> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (index, &(start, _)) in edges.iter().enumerate() {
        outgoing.entry(start).or_default().push(index);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let (start, mut current) = edges[first];
        let mut incoming = direction(start, current);
        let mut ring = vec![start, current];

        while current != start {
            let candidates = outgoing
                .get(&current)
                .map(|indices| indices.as_slice())
                .unwrap_or(&[]);
            let next = match choose_next(candidates, &used, incoming, edges, current) {
                Some(index) => index,
                None => {
                    // cannot happen for a consistently labeled grid
                    log::warn!("Open boundary chain at lattice vertex {:?}", current);
                    break;
                }
            };
            used[next] = true;
            let to = edges[next].1;
            incoming = direction(current, to);
            current = to;
            ring.push(current);
        }

        rings.push(simplify_ring(&ring));
    }

    rings
}

fn choose_next(
    candidates: &[usize],
    used: &[bool],
    incoming: (i32, i32),
    edges: &[(Vertex, Vertex)],
    current: Vertex,
) -> Option<usize> {
    // right turn first: interior sits on the right of the walk
    let preferences = [
        (incoming.1, -incoming.0),
        incoming,
        (-incoming.1, incoming.0),
    ];
    for preference in preferences {
        for &index in candidates {
            if used[index] {
                continue;
            }
            if direction(current, edges[index].1) == preference {
                return Some(index);
            }
        }
    }
    candidates.iter().copied().find(|&index| !used[index])
}

/// Drop collinear vertices from a closed unit-step ring
fn simplify_ring(ring: &[Vertex]) -> Vec<Vertex> {
    let n = ring.len().saturating_sub(1);
    if n < 4 || ring[0] != ring[n] {
        return ring.to_vec();
    }

    let mut out = Vec::new();
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let cur = ring[i];
        let next = ring[(i + 1) % n];
        if direction(prev, cur) != direction(cur, next) {
            out.push(cur);
        }
    }
    out.push(out[0]);
    out
}

/// Twice the signed lattice area of a closed ring (positive for exteriors)
fn ring_signed_area2(ring: &[Vertex]) -> i64 {
    let mut sum = 0i64;
    for i in 0..ring.len().saturating_sub(1) {
        let (r1, c1) = ring[i];
        let (r2, c2) = ring[i + 1];
        sum += c1 as i64 * r2 as i64 - c2 as i64 * r1 as i64;
    }
    sum
}

fn lattice_ring_to_world(ring: &[Vertex], transform: &GeoTransform) -> Ring {
    ring.iter()
        .map(|&(row, col)| {
            let (x, y) = transform.apply(col as f64, row as f64);
            [x, y]
        })
        .collect()
}
