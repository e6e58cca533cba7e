// Flood-map prediction route handler

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};

use crate::inference::workspace::Workspace;
use crate::inference::{acquire, pipeline, DeploymentConfig, PipelineError};
use crate::web::multipart::UploadField;
use crate::web::response_helpers::{json_error, tiff_response};
use crate::{log_error, log_info};

/// POST /api/v1/predict/
///
/// Accepts a multipart TIFF upload, runs flood-detection inference, and
/// returns the resulting flood map as a binary TIFF download.
///
/// The filename is validated before any workspace is created, so a bad
/// extension costs nothing on disk. The pipeline itself runs blocking I/O
/// directly on the handler; workspace teardown is deferred to a blocking
/// task so it cannot delay the response.
pub async fn handle_predict(
    req: Request<Body>,
    config: Arc<DeploymentConfig>,
) -> Result<Response<Body>, Infallible> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut upload = match UploadField::open(&content_type, req.into_body()).await {
        Ok(upload) => upload,
        Err(e) => return Ok(error_response(&e)),
    };

    // Fail fast: reject before a workspace exists
    let filename = match acquire::validate_upload_filename(&upload.filename) {
        Ok(filename) => filename,
        Err(e) => return Ok(error_response(&e)),
    };

    let workspace = match Workspace::create(&config.workspace_root) {
        Ok(workspace) => workspace,
        Err(e) => {
            log_error!("Failed to create workspace: {}", e);
            return Ok(error_response(&e));
        }
    };

    // Any early return below drops `workspace`, which removes the tree.
    let input_path = workspace.input_dir().join(&filename);
    match upload.save_to(&input_path).await {
        Ok(bytes) => log_info!("Input file saved to: {} ({} bytes)", input_path.display(), bytes),
        Err(e) => {
            log_error!("Failed to store upload '{}': {}", filename, e);
            return Ok(error_response(&e));
        }
    }

    match pipeline::run_prediction(&config, &workspace, &filename) {
        Ok(prediction) => {
            let output_name = prediction
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("prediction.tif")
                .to_string();
            let bytes = match std::fs::read(&prediction) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log_error!(
                        "Prediction file {} could not be read: {}",
                        prediction.display(),
                        e
                    );
                    return Ok(error_response(&PipelineError::Storage(e)));
                }
            };
            log_info!("Output file generated at: {}", prediction.display());

            // Tear the workspace down after the response is on its way
            tokio::task::spawn_blocking(move || workspace.destroy());

            Ok(tiff_response(&output_name, bytes))
        }
        Err(e) => {
            log_error!("Inference pipeline failed for '{}': {}", filename, e);
            Ok(error_response(&e))
        }
    }
}

fn error_response(e: &PipelineError) -> Response<Body> {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    json_error(status, &e.to_string())
}
