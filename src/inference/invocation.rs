//! Inference invocation record.
//!
//! An immutable snapshot of everything the external predict command needs
//! for one request: fixed deployment paths plus the per-request workspace.
//! Built once, then turned into the exact argv the tool expects.

use std::path::PathBuf;
use std::process::Command;

use crate::inference::accelerator::AcceleratorChoice;
use crate::inference::config::DeploymentConfig;
use crate::inference::workspace::Workspace;

/// Predictions are processed one image at a time: bounded memory and
/// deterministic single-request isolation over throughput.
const BATCH_SIZE: u32 = 1;

#[derive(Debug, Clone)]
pub struct InferenceInvocation {
    pub predict_bin: String,
    pub config_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Match pattern for input files: an exact filename for per-request
    /// workspaces, a glob for a directory of files.
    pub img_grep: String,
    pub accelerator: AcceleratorChoice,
    pub batch_size: u32,
    /// The predict command must run from the project code root so it can
    /// resolve the custom model-registration code colocated there.
    pub working_dir: PathBuf,
}

impl InferenceInvocation {
    pub fn new(
        config: &DeploymentConfig,
        workspace: &Workspace,
        img_grep: &str,
        accelerator: AcceleratorChoice,
    ) -> Self {
        Self {
            predict_bin: config.predict_bin.clone(),
            config_path: config.config_path.clone(),
            checkpoint_path: config.checkpoint_path.clone(),
            input_dir: workspace.input_dir().to_path_buf(),
            output_dir: workspace.output_dir().to_path_buf(),
            img_grep: img_grep.to_string(),
            accelerator,
            batch_size: BATCH_SIZE,
            working_dir: config.project_code_dir.clone(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        vec![
            "predict".to_string(),
            "-c".to_string(),
            self.config_path.to_string_lossy().into_owned(),
            "--ckpt_path".to_string(),
            self.checkpoint_path.to_string_lossy().into_owned(),
            "--predict_output_dir".to_string(),
            self.output_dir.to_string_lossy().into_owned(),
            "--data.init_args.predict_data_root".to_string(),
            self.input_dir.to_string_lossy().into_owned(),
            "--data.init_args.img_grep".to_string(),
            self.img_grep.clone(),
            format!("--trainer.accelerator={}", self.accelerator.kind.as_flag()),
            format!("--trainer.devices={}", self.accelerator.devices),
            format!("--data.init_args.batch_size={}", self.batch_size),
        ]
    }

    /// Build the command: argv from `to_args`, cwd set to the project code
    /// root, environment inherited from the parent process.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.predict_bin);
        cmd.args(self.to_args()).current_dir(&self.working_dir);
        cmd
    }
}
