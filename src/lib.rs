//! Flood-detection inference service.
//!
//! Exposes one capability, running geospatial flood-detection inference
//! on a single raster image, behind an HTTP upload endpoint and an MCP tool
//! server. Both front ends delegate to the orchestration pipeline in
//! [`inference`], which owns the per-request workspace, accelerator
//! detection, the external predict process, and output resolution.

pub mod inference;
pub mod web;
