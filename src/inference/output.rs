//! Prediction output resolution.
//!
//! The external tool is expected to write `<input_stem>_pred.tif`, but its
//! output naming is not perfectly predictable across versions and configs.
//! Rather than hard-fail on a cosmetic mismatch, fall back to any raster
//! left in the output directory, with a warning and in lexicographic
//! order so the choice is deterministic across filesystems.

use std::fs;
use std::path::{Path, PathBuf};

use crate::inference::error::PipelineError;
use crate::{log_info, log_warn};

pub fn resolve(output_dir: &Path, input_stem: &str) -> Result<PathBuf, PipelineError> {
    let expected_name = format!("{input_stem}_pred.tif");
    let expected = output_dir.join(&expected_name);
    if expected.is_file() {
        log_info!("Resolved prediction output: {}", expected.display());
        return Ok(expected);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(output_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_raster_name(path))
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(found) => {
            log_warn!(
                "Expected output '{}' not found. Using first found TIF: {}",
                expected_name,
                found.display()
            );
            Ok(found)
        }
        None => Err(PipelineError::OutputNotFound(output_dir.to_path_buf())),
    }
}

fn is_raster_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase().contains(".tif"))
        .unwrap_or(false)
}
