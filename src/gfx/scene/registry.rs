//! Central ownership of meshes and materials
//!
//! Everything else holds [`MeshId`]/[`MaterialId`] indices into the registry.
//! Nothing is ever removed, so an id stays valid for as long as the registry
//! lives.

use super::mesh::{Mesh, MeshId};
use crate::gfx::resources::material::{Material, MaterialId};

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Takes ownership of several materials; ids are consecutive from the returned one.
    pub fn add_materials(&mut self, materials: impl IntoIterator<Item = Material>) -> MaterialId {
        let first = self.materials.len();
        self.materials.extend(materials);
        first
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn materials_mut(&mut self) -> &mut [Material] {
        &mut self.materials
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
