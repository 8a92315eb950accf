//! # Graphics Module
//!
//! Everything needed to get the scene on screen.
//!
//! - **Camera** ([`camera`]) - spherical fly camera driven by keyboard and mouse
//! - **Geometry** ([`geometry`]) - procedural primitives for the fallback room and the light marker
//! - **Rendering** ([`rendering`]) - shadow cube pass, lit forward pass and pipeline cache
//! - **Resources** ([`resources`]) - textures, materials and per-frame GPU bindings
//! - **Scene** ([`scene`]) - index-based scene graph, mesh/material registry and OBJ import
//!
//! ```no_run
//! use point_shadow::gfx::{scene::Scene, FlyCamera};
//!
//! let scene = Scene::new();
//! let camera = FlyCamera::default();
//! // The render engine needs a window and is created by PointShadowApp
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::fly_camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
