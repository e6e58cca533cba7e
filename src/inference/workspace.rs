//! Per-request workspace lifecycle.
//!
//! Each in-flight request owns a uniquely named directory with `input/`
//! and `output/` subdirectories. Teardown is tied to `Drop`, so every
//! exit path (normal return, validation error, downstream failure)
//! falls through the same release point. Removal failures are logged
//! and swallowed: cleanup must never mask or block the primary result.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::inference::error::PipelineError;
use crate::{log_info, log_warn};

const WORKSPACE_PREFIX: &str = "flood_detect_";

pub struct Workspace {
    root: PathBuf,
    input_dir: PathBuf,
    output_dir: PathBuf,
    cleaned: bool,
}

impl Workspace {
    /// Allocate a fresh workspace under `base`.
    pub fn create(base: &Path) -> Result<Self, PipelineError> {
        let root = base.join(format!("{}{}", WORKSPACE_PREFIX, Uuid::new_v4()));
        let input_dir = root.join("input");
        let output_dir = root.join("output");
        fs::create_dir_all(&input_dir)?;
        fs::create_dir(&output_dir)?;
        log_info!("Created workspace: {}", root.display());
        Ok(Self {
            root,
            input_dir,
            output_dir,
            cleaned: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Tear the workspace down now instead of waiting for `Drop`. Used by
    /// the HTTP front end to schedule removal after the response is sent.
    pub fn destroy(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        if !self.root.exists() {
            return;
        }
        match fs::remove_dir_all(&self.root) {
            Ok(()) => log_info!("Cleaned up workspace: {}", self.root.display()),
            Err(e) => log_warn!(
                "Failed to clean up workspace {}: {}",
                self.root.display(),
                e
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
