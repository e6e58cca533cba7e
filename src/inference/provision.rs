//! Model artifact provisioning.
//!
//! The checkpoint and model config are expected at fixed deployment paths.
//! When a file is absent it is fetched once at startup from the model hub,
//! streamed to a `.part` file and renamed into place so an interrupted
//! download never leaves a truncated artifact behind. Credentials, when
//! required, come from the `HF_TOKEN` environment variable.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::inference::config::DeploymentConfig;
use crate::inference::error::PipelineError;
use crate::log_info;

/// Ensure the checkpoint and config artifacts exist locally, downloading
/// whichever is missing.
pub fn ensure_artifacts(config: &DeploymentConfig) -> Result<(), PipelineError> {
    let wanted = [
        (&config.checkpoint_artifact, &config.checkpoint_path),
        (&config.config_artifact, &config.config_path),
    ];

    if wanted.iter().all(|(_, dest)| dest.is_file()) {
        log_info!("Model artifacts already exist locally.");
        return Ok(());
    }

    for (artifact, dest) in wanted {
        if dest.is_file() {
            continue;
        }
        fetch_artifact(config, artifact, dest)?;
    }
    Ok(())
}

fn fetch_artifact(
    config: &DeploymentConfig,
    artifact: &str,
    dest: &Path,
) -> Result<(), PipelineError> {
    let url = format!(
        "{}/{}/resolve/main/{}",
        config.artifact_endpoint,
        config.artifact_repo,
        urlencoding::encode(artifact),
    );
    log_info!("Downloading artifact {} from {}", artifact, url);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut request = ureq::get(&url).timeout(config.download_timeout());
    if let Ok(token) = std::env::var("HF_TOKEN") {
        request = request.set("Authorization", &format!("Bearer {token}"));
    }

    let response = request
        .call()
        .map_err(|e| PipelineError::Download(e.to_string()))?;

    // Stream to a .part file, rename once complete.
    let part = dest.with_extension(part_extension(dest));
    let mut file = fs::File::create(&part)?;
    let mut reader = response.into_reader();
    let mut buf = [0u8; 65536];
    let mut downloaded: u64 = 0;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        downloaded += n as u64;
    }
    drop(file); // close before rename
    fs::rename(&part, dest)?;

    log_info!(
        "Artifact {} downloaded ({} bytes) to {}",
        artifact,
        downloaded,
        dest.display()
    );
    Ok(())
}

fn part_extension(dest: &Path) -> String {
    match dest.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.part"),
        None => "part".to_string(),
    }
}
