//! Input acquisition.
//!
//! Places exactly one raster file inside a workspace's input directory,
//! either from an uploaded byte source or by downloading from a URL.
//! URL-sourced inputs always land under the canonical `input.tif` so the
//! inference invocation is decoupled from whatever the caller named the
//! file; the caller's name is kept for logging only.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::inference::error::PipelineError;
use crate::log_info;

/// Fixed filename for URL-sourced inputs.
pub const CANONICAL_INPUT_NAME: &str = "input.tif";

/// Streaming copy buffer size.
const CHUNK_SIZE: usize = 65536;

pub fn has_tiff_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".tif") || lower.ends_with(".tiff")
}

/// Check the extension and strip any path components from a client-supplied
/// filename. Fails fast so the front end can reject before a workspace exists.
pub fn validate_upload_filename(filename: &str) -> Result<String, PipelineError> {
    if !has_tiff_extension(filename) {
        return Err(PipelineError::Validation(
            "Invalid file type. Only .tif or .tiff files are accepted.".to_string(),
        ));
    }
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| PipelineError::Validation("Invalid filename.".to_string()))
}

/// Stream an uploaded byte source into the input directory under its
/// (validated) original filename.
pub fn save_upload<R: Read>(
    input_dir: &Path,
    filename: &str,
    source: &mut R,
) -> Result<PathBuf, PipelineError> {
    let filename = validate_upload_filename(filename)?;
    let dest = input_dir.join(&filename);
    let written = write_stream(&dest, source)?;
    log_info!("Input file saved to: {} ({} bytes)", dest.display(), written);
    Ok(dest)
}

/// Download the input raster from a URL into the input directory under the
/// canonical name. `display_name` is the caller-supplied filename, used for
/// logging only.
pub fn download_input(
    input_dir: &Path,
    url: &str,
    display_name: &str,
    timeout: Duration,
) -> Result<PathBuf, PipelineError> {
    log_info!(
        "Downloading input from {} (original name: {})",
        url,
        display_name
    );

    // ureq reports non-2xx statuses and transport failures alike as errors;
    // both are environment failures here, never retried.
    let response = ureq::get(url)
        .timeout(timeout)
        .call()
        .map_err(|e| PipelineError::Download(e.to_string()))?;

    let dest = input_dir.join(CANONICAL_INPUT_NAME);
    let written = write_stream(&dest, &mut response.into_reader())?;
    log_info!(
        "Temporary input file saved to: {} ({} bytes)",
        dest.display(),
        written
    );
    Ok(dest)
}

/// Copy `source` to `dest` in fixed-size chunks. No full-buffer reads:
/// inputs can be large rasters.
fn write_stream<R: Read>(dest: &Path, source: &mut R) -> Result<u64, PipelineError> {
    let mut file = File::create(dest)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        written += n as u64;
    }
    file.flush()?;
    Ok(written)
}
