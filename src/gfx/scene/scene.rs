use std::path::Path;

use cgmath::{Deg, Matrix4, Vector3};

use super::{
    import::import_obj,
    mesh::{Mesh, MeshId},
    registry::ResourceRegistry,
    scene_graph::{NodeId, SceneGraph, ROOT},
};
use crate::{
    error::SceneResult,
    gfx::{
        geometry::{generate_cube, generate_plane, generate_sphere, generate_torus},
        resources::material::Material,
    },
};

/// The transform hierarchy plus the meshes and materials it refers to
#[derive(Debug, Default)]
pub struct Scene {
    pub graph: SceneGraph,
    pub resources: ResourceRegistry,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports an OBJ file and attaches all of its meshes to the root.
    pub fn add_obj(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        directory: &Path,
        filename: &str,
    ) -> SceneResult<Vec<MeshId>> {
        let meshes = import_obj(device, queue, &mut self.resources, directory, filename)?;
        self.graph.add_node_meshes(ROOT, &meshes)?;
        Ok(meshes)
    }

    /// Adds a node below `parent` drawing `mesh`.
    pub fn add_mesh_node(
        &mut self,
        parent: NodeId,
        casts_shadow: bool,
        local: Matrix4<f32>,
        mesh: MeshId,
    ) -> SceneResult<NodeId> {
        let node = self.graph.add_node(parent, casts_shadow, local)?;
        self.graph.attach_drawable(node, mesh)?;
        Ok(node)
    }

    /// Builds a walled room with a sphere, a torus and two rows of pillars.
    ///
    /// Used when no model file is available.
    pub fn add_procedural_room(&mut self, device: &wgpu::Device) -> SceneResult<()> {
        let (width, depth, height) = (20.0f32, 10.0f32, 5.0f32);
        let wall_thickness = 1.0;

        let default_material = self.resources.add_material(Material::default());

        // Floor
        let floor = self.resources.add_mesh(Mesh::from_geometry(
            device,
            &generate_plane(width, depth),
            default_material,
            "Floor",
        ));
        self.graph.attach_drawable(ROOT, floor)?;

        // Walls
        let wall = self.resources.add_mesh(Mesh::from_geometry(
            device,
            &generate_cube(1.0),
            default_material,
            "Wall",
        ));
        let side_scale = Matrix4::from_nonuniform_scale(wall_thickness, height, depth);
        let front_scale = Matrix4::from_nonuniform_scale(width, height, wall_thickness);
        let x = (width + wall_thickness) / 2.0;
        let z = (depth + wall_thickness) / 2.0;
        let walls = [
            (Vector3::new(-x, height / 2.0, 0.0), side_scale),
            (Vector3::new(x, height / 2.0, 0.0), side_scale),
            (Vector3::new(0.0, height / 2.0, -z), front_scale),
            (Vector3::new(0.0, height / 2.0, z), front_scale),
        ];
        for (position, scale) in walls {
            self.add_mesh_node(ROOT, true, Matrix4::from_translation(position) * scale, wall)?;
        }

        // Sphere
        let blue = self.resources.add_material(Material::from_color(
            "Blue", [0.2, 0.2, 1.0], 0.5, 0.3, 0.7, 100.0,
        ));
        let sphere = self.resources.add_mesh(Mesh::from_geometry(
            device,
            &generate_sphere(0.5, 40, 40),
            blue,
            "Sphere",
        ));
        self.add_mesh_node(
            ROOT,
            true,
            Matrix4::from_translation(Vector3::new(1.0, 0.5, 1.0)),
            sphere,
        )?;

        // Torus
        let green = self.resources.add_material(Material::from_color(
            "Green", [0.2, 1.0, 0.2], 0.5, 0.7, 0.3, 10.0,
        ));
        let torus = self.resources.add_mesh(Mesh::from_geometry(
            device,
            &generate_torus(depth / 20.0, depth / 100.0, 0.0, 40, 40),
            green,
            "Torus",
        ));
        self.add_mesh_node(
            ROOT,
            true,
            Matrix4::from_translation(Vector3::new(0.0, 1.5, -0.28)) * Matrix4::from_angle_z(Deg(90.0)),
            torus,
        )?;

        // Pillars
        let red = self.resources.add_material(Material::from_color(
            "Red", [1.0, 0.2, 0.2], 0.5, 0.8, 0.2, 1.0,
        ));
        let pillar = self.resources.add_mesh(Mesh::from_geometry(
            device,
            &generate_cube(1.0),
            red,
            "Pillar",
        ));
        for (position, scale) in pillar_placements(width, depth) {
            self.add_mesh_node(ROOT, true, Matrix4::from_translation(position) * scale, pillar)?;
        }

        log::info!(
            "Built procedural room with {} nodes, {} meshes and {} materials",
            self.graph.len(),
            self.resources.mesh_count(),
            self.resources.material_count()
        );
        Ok(())
    }
}

/// Two rows of six pillars, a quarter of the depth in from the long walls
fn pillar_placements(width: f32, depth: f32) -> Vec<(Vector3<f32>, Matrix4<f32>)> {
    const PER_ROW: usize = 6;
    let size = Vector3::new(width / 50.0, 5.0, width / 50.0);
    let spacing = width / (PER_ROW + 1) as f32;
    let row_z = -depth / 2.0 + depth / 4.0;
    let scale = Matrix4::from_nonuniform_scale(size.x, size.y, size.z);

    (1..=PER_ROW)
        .flat_map(|i| {
            let x = -width / 2.0 + i as f32 * spacing;
            [row_z, -row_z].map(|z| (Vector3::new(x, size.y / 2.0, z), scale))
        })
        .collect()
}
