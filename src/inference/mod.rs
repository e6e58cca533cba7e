//! Flood-detection inference orchestration.
//!
//! One request = one workspace, one accelerator probe, one external
//! predict process, one resolved output artifact, one guaranteed cleanup.

pub mod accelerator;
pub mod acquire;
pub mod config;
pub mod error;
pub mod invocation;
pub mod output;
pub mod pipeline;
pub mod provision;
pub mod runner;
pub mod workspace;

// Re-export commonly used types
pub use accelerator::{AcceleratorChoice, AcceleratorKind};
pub use config::DeploymentConfig;
pub use error::PipelineError;
pub use invocation::InferenceInvocation;
pub use workspace::Workspace;
