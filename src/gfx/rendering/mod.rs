//! Core rendering functionality
//!
//! Handles render pipelines, the shadow cube map and frame rendering.

pub mod pipeline_manager;
pub mod render_engine;
pub mod render_pass_ext;
pub mod shadow_map;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use shadow_map::{CubeFace, ShadowMap, ShadowSettings};
