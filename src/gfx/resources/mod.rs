// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, uniform buffers, and bind groups for rendering.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{DrawUniform, FrameBindings, FrameUniform, PerDrawBindings, ShadowDrawUniform};
pub use material::{Material, MaterialBindings, MaterialId, MaterialUniform, TextureSlot};
pub use texture_resource::{RenderTarget, TextureResource};
