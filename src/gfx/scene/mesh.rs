//! GPU-resident triangle meshes
//!
//! A [`Mesh`] uploads its vertex and index data once on creation and owns the
//! resulting buffers. It draws with exactly one material.

use wgpu::util::DeviceExt;

use super::vertex::Vertex3D;
use crate::gfx::{geometry::GeometryData, resources::material::MaterialId};

/// Index of a mesh in the resource registry
pub type MeshId = usize;

/// Not `Clone`: the GPU buffers are owned exclusively.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_count: u32,
    material: MaterialId,
}

impl Mesh {
    pub fn new(
        device: &wgpu::Device,
        vertices: &[Vertex3D],
        indices: &[u32],
        material: MaterialId,
        label: &str,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            vertex_count: vertices.len() as u32,
            index_count: indices.len() as u32,
            material,
        }
    }

    /// Uploads procedurally generated geometry
    pub fn from_geometry(
        device: &wgpu::Device,
        geometry: &GeometryData,
        material: MaterialId,
        label: &str,
    ) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self::new(device, &vertices, &indices, material, label)
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }
}
