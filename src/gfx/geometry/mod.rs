//! # Procedural Geometry Generation
//!
//! Generates the primitive shapes used by the demo scene and the light marker,
//! so simple scenes need no model files.
//!
//! ## Supported Primitives
//!
//! - **Plane**: flat quad in the XZ plane facing +Y
//! - **Cube**: axis-aligned cube centered at the origin
//! - **Sphere**: UV sphere with separate pole vertices per segment
//! - **Torus**: ring-shaped tube around the Y axis
//! - **Ring**: flat annulus in the XZ plane
//! - **Cone**: cone with its tip at the origin, opening towards +Y
//!
//! ## Usage
//!
//! ```rust
//! use point_shadow::gfx::geometry::{generate_cube, generate_sphere};
//!
//! let cube = generate_cube(1.0);
//! let sphere = generate_sphere(0.5, 40, 40);
//! assert_eq!(cube.triangle_count(), 12);
//! assert!(sphere.vertex_count() > 0);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one vertex with all of its attributes.
    pub fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) {
        self.vertices.push(position);
        self.normals.push(normal);
        self.tex_coords.push(tex_coords);
    }

    /// Appends one triangle.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts to the interleaved vertex format used by meshes.
    ///
    /// Generated geometry carries no vertex colors, so every vertex is white.
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                Vertex3D::new(
                    position,
                    self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
