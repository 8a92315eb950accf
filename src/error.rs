//! Error types for scene building and rendering.

use std::path::PathBuf;
use thiserror::Error;

use crate::gfx::scene::scene_graph::NodeId;

/// Errors raised while building or importing a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// A node was added under a parent that does not exist.
    #[error("parent node {parent} does not exist (graph has {len} nodes)")]
    InvalidParent { parent: NodeId, len: usize },

    /// An operation referenced a node that does not exist.
    #[error("node {0} does not exist")]
    InvalidNode(NodeId),

    /// The model file could not be read or parsed.
    #[error("failed to import '{path}': {message}")]
    Import { path: PathBuf, message: String },

    /// A texture file could not be decoded.
    #[error("failed to decode texture: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors raised while setting up or driving the GPU.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface does not support this adapter")]
    UnsupportedSurface,

    /// The GPU ran out of memory while acquiring a frame.
    #[error("out of memory while acquiring the next frame")]
    OutOfMemory,
}

/// Errors raised while compiling shaders or building render pipelines.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("shader '{0}' is not loaded")]
    ShaderNotFound(String),

    #[error("pipeline '{0}' is not registered")]
    NotRegistered(String),

    #[error("failed to compile shader '{name}': {message}")]
    Shader { name: String, message: String },

    #[error("failed to build pipeline '{name}': {message}")]
    Build { name: String, message: String },
}

/// Result type alias for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
