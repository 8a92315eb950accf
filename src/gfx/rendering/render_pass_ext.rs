//! Render pass extensions for drawing scene meshes

use wgpu::*;

use crate::gfx::scene::mesh::Mesh;

/// Extension trait for RenderPass to draw indexed meshes
pub trait DrawMesh {
    /// Binds the mesh's vertex and index buffers and issues one indexed draw
    fn draw_mesh(&mut self, mesh: &Mesh);
}

impl DrawMesh for RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
        self.set_index_buffer(mesh.index_buffer().slice(..), IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count(), 0, 0..1);
    }
}
