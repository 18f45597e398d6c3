use crate::types::{PipelineError, PipelineResult};
use std::fs;
use std::path::Path;

/// Canonical extension for staged rasters
pub const RASTER_EXTENSION: &str = "tiff";

/// Stages raw input rasters into canonically named single-band copies.
///
/// Despite the name, no pixel transformation happens here: each source file
/// is copied byte-for-byte, base name preserved, extension fixed to the
/// canonical raster extension. One staged file per source file.
pub struct RasterNormalizer;

impl RasterNormalizer {
    /// Stage every file in `input_dir` into `staged_dir`.
    ///
    /// `input_dir` must exist; `staged_dir` is created if absent. An
    /// unreadable source file is fatal for the whole run. Returns the
    /// number of files staged.
    pub fn normalize_directory<P, Q>(input_dir: P, staged_dir: Q) -> PipelineResult<usize>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input_dir = input_dir.as_ref();
        let staged_dir = staged_dir.as_ref();

        if !input_dir.is_dir() {
            return Err(PipelineError::Config(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        fs::create_dir_all(staged_dir)?;

        let mut entries: Vec<_> = fs::read_dir(input_dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut staged = 0;
        for entry in entries {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    PipelineError::Config(format!(
                        "Input file name is not valid UTF-8: {}",
                        path.display()
                    ))
                })?;

            let target = staged_dir.join(format!("{}.{}", stem, RASTER_EXTENSION));
            fs::copy(&path, &target)?;
            log::debug!("Staged {} -> {}", path.display(), target.display());
            staged += 1;
        }

        log::info!("Staged {} raster file(s) into {}", staged, staged_dir.display());
        Ok(staged)
    }
}
