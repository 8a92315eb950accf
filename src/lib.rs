// src/lib.rs
//! Point Light Shadow Demo
//!
//! Forward-shading renderer built on wgpu and winit. A point light patrols a
//! scene loaded from an OBJ file and casts omnidirectional shadows through a
//! depth cube map rendered every frame.

pub mod actors;
pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod performance;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::PointShadowApp;
pub use config::DemoConfig;

/// Creates the demo application with the default configuration
pub fn default() -> anyhow::Result<PointShadowApp> {
    PointShadowApp::new(DemoConfig::default())
}
