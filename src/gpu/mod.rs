//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization and the pipeline helpers the
//! quad pass is built from.

/// Bind-group-layout and pipeline helpers.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
