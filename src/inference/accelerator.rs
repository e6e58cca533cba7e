//! Compute accelerator detection.
//!
//! Probes for an NVIDIA GPU with `nvidia-smi` once per request. Detection
//! is best-effort: any failure logs and falls back to CPU. A missing GPU
//! must never fail the request.

use std::process::Command;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratorKind {
    Cpu,
    Gpu,
}

impl AcceleratorKind {
    /// The `--trainer.accelerator=` flag value.
    pub fn as_flag(&self) -> &'static str {
        match self {
            AcceleratorKind::Cpu => "cpu",
            AcceleratorKind::Gpu => "gpu",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceleratorChoice {
    pub kind: AcceleratorKind,
    pub devices: u32,
}

impl AcceleratorChoice {
    fn cpu() -> Self {
        Self {
            kind: AcceleratorKind::Cpu,
            devices: 1,
        }
    }

    fn gpu() -> Self {
        // Single device regardless of how many are installed: predictions
        // are one image at a time, one process per request.
        Self {
            kind: AcceleratorKind::Gpu,
            devices: 1,
        }
    }
}

/// Detect the available accelerator. Defaults to CPU on any failure.
pub fn detect() -> AcceleratorChoice {
    detect_with("nvidia-smi")
}

pub fn detect_with(probe: &str) -> AcceleratorChoice {
    let output = Command::new(probe)
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let names = String::from_utf8_lossy(&out.stdout);
            if names.lines().any(|l| !l.trim().is_empty()) {
                log_info!("GPU detected. Using accelerator=gpu.");
                AcceleratorChoice::gpu()
            } else {
                log_info!("No GPU reported by {}. Using accelerator=cpu.", probe);
                AcceleratorChoice::cpu()
            }
        }
        Ok(out) => {
            log_info!(
                "{} exited with {}. Using accelerator=cpu.",
                probe,
                out.status
            );
            AcceleratorChoice::cpu()
        }
        Err(e) => {
            log_warn!("GPU probe '{}' failed: {}. Defaulting to cpu.", probe, e);
            AcceleratorChoice::cpu()
        }
    }
}
