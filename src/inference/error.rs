//! Error taxonomy for the inference pipeline.
//!
//! Every failure a request can hit maps to exactly one variant, so the
//! front ends can translate to their transport (HTTP status / "Error:"
//! string) without inspecting message text. Nothing here is retried:
//! a failed request needs a fresh request with a fresh workspace.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad input shape. User-caused, surfaced as a client error.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Input download failed (non-2xx, network, or timeout).
    #[error("download failed: {0}")]
    Download(String),

    /// Local filesystem refused us (out of space, permissions, ...).
    #[error("storage failure: {0}")]
    Storage(#[from] std::io::Error),

    /// The external predict binary is absent from PATH: deployment
    /// misconfiguration, fatal for the request.
    #[error("inference command '{0}' not found; is it installed and in PATH?")]
    ToolNotFound(String),

    /// The predict process could not be started for any other reason.
    #[error("failed to launch inference command: {0}")]
    Execution(String),

    /// The external tool ran and failed. The exit code is kept for
    /// diagnostics; there is no partial result.
    #[error("inference command failed with exit code {exit_code}")]
    InferenceFailed { exit_code: i32 },

    /// The tool exited 0 but left no prediction file behind.
    #[error("no prediction file found in {}", .0.display())]
    OutputNotFound(PathBuf),
}

impl PipelineError {
    /// Whether the front end should blame the caller (4xx) or the server (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_client_error() {
        assert!(PipelineError::Validation("bad".to_string()).is_client_error());
        assert!(!PipelineError::InferenceFailed { exit_code: 1 }.is_client_error());
        assert!(!PipelineError::Download("timeout".to_string()).is_client_error());
    }

    #[test]
    fn test_inference_failed_carries_exit_code() {
        let err = PipelineError::InferenceFailed { exit_code: 137 };
        assert!(err.to_string().contains("137"));
    }
}
