//! # Vertex Data Structures
//!
//! GPU vertex format shared by every mesh: imported scenes and procedural
//! primitives both end up as [`Vertex3D`].

/// A vertex with position, normal, texture coordinates and color.
///
/// # Memory Layout
///
/// `#[repr(C)]` keeps the field order so [`Vertex3D::desc`] can describe the
/// buffer with fixed offsets:
///
/// - location 0: `position` (Float32x3)
/// - location 1: `normal` (Float32x3)
/// - location 2: `tex_coords` (Float32x2)
/// - location 3: `color` (Float32x4)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4
    ];

    /// Creates a white vertex.
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            color: [1.0; 4],
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Bit-exact key over every attribute.
    ///
    /// Two vertices share a key only if all of their attributes are identical,
    /// which is what index deduplication needs. Floats are compared by bit
    /// pattern, so `0.0` and `-0.0` are distinct.
    pub fn key(&self) -> VertexKey {
        let mut bits = [0u32; 12];
        let floats = self
            .position
            .iter()
            .chain(self.normal.iter())
            .chain(self.tex_coords.iter())
            .chain(self.color.iter());
        for (slot, value) in bits.iter_mut().zip(floats) {
            *slot = value.to_bits();
        }
        VertexKey(bits)
    }
}

impl Default for Vertex3D {
    fn default() -> Self {
        Self::new([0.0; 3], [1.0, 0.0, 0.0], [0.0; 2])
    }
}

/// Hashable identity of a [`Vertex3D`]; see [`Vertex3D::key`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexKey([u32; 12]);
