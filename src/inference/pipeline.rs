//! Orchestration of one inference request.
//!
//! The pipeline is synchronous by design: blocking filesystem, blocking
//! subprocess wait, blocking download. Front ends decide how to schedule
//! it (directly for the HTTP handler, `spawn_blocking` for the tool
//! server). Workspace cleanup is guaranteed on every path because the
//! `Workspace` guard removes its tree on drop.

use std::fs;
use std::path::{Path, PathBuf};

use crate::inference::config::DeploymentConfig;
use crate::inference::error::PipelineError;
use crate::inference::invocation::InferenceInvocation;
use crate::inference::workspace::Workspace;
use crate::inference::{accelerator, acquire, output, runner};
use crate::log_error;

/// Run inference against an input file already placed in the workspace.
/// Returns the path of the resolved prediction artifact inside the
/// workspace's output directory.
pub fn run_prediction(
    config: &DeploymentConfig,
    workspace: &Workspace,
    input_filename: &str,
) -> Result<PathBuf, PipelineError> {
    let accelerator = accelerator::detect();
    let invocation = InferenceInvocation::new(config, workspace, input_filename, accelerator);
    runner::run(&invocation)?;

    let input_stem = Path::new(input_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input_filename);
    output::resolve(workspace.output_dir(), input_stem)
}

/// Full URL-sourced pipeline: workspace, download, inference, resolution.
/// Returns the prediction bytes; the workspace is torn down before this
/// function returns, on success and on every failure path.
pub fn generate_flood_map(
    config: &DeploymentConfig,
    input_file_url: &str,
    display_name: &str,
) -> Result<Vec<u8>, PipelineError> {
    let workspace = Workspace::create(&config.workspace_root)?;
    acquire::download_input(
        workspace.input_dir(),
        input_file_url,
        display_name,
        config.download_timeout(),
    )?;
    let prediction = run_prediction(config, &workspace, acquire::CANONICAL_INPUT_NAME)?;
    let bytes = fs::read(&prediction).map_err(|e| {
        log_error!(
            "Prediction file {} vanished before read: {}",
            prediction.display(),
            e
        );
        PipelineError::Storage(e)
    })?;
    Ok(bytes)
}
