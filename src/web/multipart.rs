//! Minimal streaming reader for a single-file multipart upload.
//!
//! The predict endpoint accepts exactly one `multipart/form-data` file
//! field. Part headers are read first so the filename can be validated
//! before any workspace exists; the payload is then streamed to disk
//! chunk-by-chunk with only a boundary-sized tail held in memory.
//! Uploads are full-size rasters and must never be buffered whole.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use hyper::body::HttpBody;
use hyper::Body;

use crate::inference::error::PipelineError;

/// Upper bound for the boundary line plus part headers.
const MAX_HEADER_BYTES: usize = 16 * 1024;

#[derive(Debug)]
pub struct UploadField {
    body: Body,
    /// `\r\n--<boundary>`: terminates the file payload.
    delimiter: Vec<u8>,
    /// Bytes received but not yet consumed.
    pending: Vec<u8>,
    pub filename: String,
}

/// Extract the boundary parameter from a `multipart/form-data` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return None;
    }
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("boundary="))
        .map(|b| b.trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

impl UploadField {
    /// Read up to the end of the first part's headers and parse the
    /// client-supplied filename. The payload is not consumed yet.
    pub async fn open(content_type: &str, mut body: Body) -> Result<Self, PipelineError> {
        let boundary = boundary_from_content_type(content_type).ok_or_else(|| {
            PipelineError::Validation(
                "Expected a multipart/form-data body with a boundary.".to_string(),
            )
        })?;
        let delimiter = format!("\r\n--{boundary}").into_bytes();

        let mut pending: Vec<u8> = Vec::new();
        loop {
            if let Some(pos) = find_subsequence(&pending, b"\r\n\r\n") {
                let filename = parse_filename(&pending[..pos]).ok_or_else(|| {
                    PipelineError::Validation(
                        "Multipart field is missing a filename.".to_string(),
                    )
                })?;
                pending.drain(..pos + 4);
                return Ok(Self {
                    body,
                    delimiter,
                    pending,
                    filename,
                });
            }
            if pending.len() > MAX_HEADER_BYTES {
                return Err(PipelineError::Validation(
                    "Multipart headers too large.".to_string(),
                ));
            }
            match body.data().await {
                Some(Ok(chunk)) => pending.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    return Err(PipelineError::Validation(format!(
                        "Failed to read upload body: {e}"
                    )))
                }
                None => {
                    return Err(PipelineError::Validation(
                        "Upload body ended before the file field.".to_string(),
                    ))
                }
            }
        }
    }

    /// Stream the file payload to `dest`, stopping at the closing boundary.
    /// Returns the number of payload bytes written.
    pub async fn save_to(&mut self, dest: &Path) -> Result<u64, PipelineError> {
        let mut file = File::create(dest)?;
        let mut written: u64 = 0;
        loop {
            if let Some(pos) = find_subsequence(&self.pending, &self.delimiter) {
                file.write_all(&self.pending[..pos])?;
                written += pos as u64;
                self.pending.clear();
                file.flush()?;
                return Ok(written);
            }

            // Flush everything that cannot be a prefix of the delimiter,
            // keeping a tail in case the delimiter straddles two chunks.
            if self.pending.len() >= self.delimiter.len() {
                let flush_len = self.pending.len() - (self.delimiter.len() - 1);
                file.write_all(&self.pending[..flush_len])?;
                written += flush_len as u64;
                self.pending.drain(..flush_len);
            }

            match self.body.data().await {
                Some(Ok(chunk)) => self.pending.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    return Err(PipelineError::Validation(format!(
                        "Failed to read upload body: {e}"
                    )))
                }
                None => {
                    return Err(PipelineError::Validation(
                        "Upload body ended before the closing boundary.".to_string(),
                    ))
                }
            }
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Pull `filename="..."` out of the part's Content-Disposition header.
fn parse_filename(headers: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(headers);
    for line in text.lines() {
        if line.to_ascii_lowercase().contains("content-disposition")
            && line.contains("filename=")
        {
            return line
                .split("filename=")
                .nth(1)
                .and_then(|s| s.split(';').next())
                .map(|s| s.trim().trim_matches('"').to_string())
                .filter(|s| !s.is_empty());
        }
    }
    None
}
