//! Deployment configuration.
//!
//! All fixed paths (model config, checkpoint, project code root) live here
//! and are injected into the pipeline at process start; no module-level
//! path constants. Loaded from `assets/deployment.json` when present,
//! otherwise the container defaults below apply.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::log_warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Terratorch model config (yaml) path inside the deployment.
    pub config_path: PathBuf,
    /// Model checkpoint path inside the deployment.
    pub checkpoint_path: PathBuf,
    /// Directory the predict command runs from. The custom model
    /// registration code lives there and must be resolvable by the tool.
    pub project_code_dir: PathBuf,
    /// Base directory for per-request workspaces.
    pub workspace_root: PathBuf,
    /// Name (or path) of the external predict binary.
    pub predict_bin: String,
    /// Model hub repository the artifacts are fetched from when absent.
    pub artifact_repo: String,
    /// Model hub endpoint base URL.
    pub artifact_endpoint: String,
    /// Checkpoint artifact name on the hub.
    pub checkpoint_artifact: String,
    /// Config artifact name on the hub.
    pub config_artifact: String,
    /// Timeout for input/artifact downloads, in seconds.
    pub download_timeout_secs: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(
                "/app/configs/config_granite_geospatial_uki_flood_detection_v1.yaml",
            ),
            checkpoint_path: PathBuf::from(
                "/app/models/granite_geospatial_uki_flood_detection_v1.ckpt",
            ),
            project_code_dir: PathBuf::from("/app"),
            workspace_root: std::env::temp_dir(),
            predict_bin: "terratorch".to_string(),
            artifact_repo: "ibm-granite/granite-geospatial-uki-flooddetection".to_string(),
            artifact_endpoint: "https://huggingface.co".to_string(),
            checkpoint_artifact: "granite_geospatial_uki_flood_detection_v1.ckpt".to_string(),
            config_artifact: "config.yaml".to_string(),
            download_timeout_secs: 60,
        }
    }
}

impl DeploymentConfig {
    /// Load configuration from the default deployment file, falling back to
    /// the container defaults when the file is missing or malformed.
    pub fn load() -> Self {
        Self::load_from("assets/deployment.json")
    }

    pub fn load_from(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<DeploymentConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    log_warn!("Failed to parse {}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
