//! Wavefront OBJ scene import
//!
//! Parsing is done by `tobj`. Turning its output into meshes happens in two
//! steps: [`mesh_data_from_model`] and [`material_from_mtl`] are pure and
//! produce CPU-side data, [`import_obj`] uploads the result and stores it in
//! the [`ResourceRegistry`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{
    mesh::{Mesh, MeshId},
    registry::ResourceRegistry,
    vertex::{Vertex3D, VertexKey},
};
use crate::{
    error::{SceneError, SceneResult},
    gfx::resources::{
        material::{Material, MaterialId, TextureSlot},
        texture_resource::TextureResource,
    },
};

const DEFAULT_NORMAL: [f32; 3] = [1.0, 0.0, 0.0];
const DEFAULT_TEX_COORDS: [f32; 2] = [0.0, 0.0];

/// Load options used for every import
pub fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ..Default::default()
    }
}

/// Deduplicated vertex and index data of one OBJ model
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex3D>,
    pub indices: Vec<u32>,
    /// Index into the OBJ's material list
    pub material: Option<usize>,
}

fn read3(values: &[f32], index: usize) -> Option<[f32; 3]> {
    values.get(3 * index..3 * index + 3).map(|v| [v[0], v[1], v[2]])
}

fn read2(values: &[f32], index: usize) -> Option<[f32; 2]> {
    values.get(2 * index..2 * index + 2).map(|v| [v[0], v[1]])
}

/// Builds indexed vertex data, merging corners whose attributes are all equal.
///
/// Texture coordinates are flipped vertically so v = 0 is the top row of the
/// image. Missing normals, texture coordinates and colors fall back to
/// (1, 0, 0), (0, 0) and opaque white.
pub fn mesh_data_from_model(model: &tobj::Model) -> MeshData {
    let mesh = &model.mesh;
    let mut vertices = Vec::new();
    let mut indices = Vec::with_capacity(mesh.indices.len());
    let mut unique: HashMap<VertexKey, u32> = HashMap::new();

    for (corner, &position_index) in mesh.indices.iter().enumerate() {
        let position_index = position_index as usize;
        let normal_index = mesh.normal_indices.get(corner).map_or(position_index, |&i| i as usize);
        let texcoord_index = mesh.texcoord_indices.get(corner).map_or(position_index, |&i| i as usize);

        let position = read3(&mesh.positions, position_index).unwrap_or([0.0; 3]);
        let normal = read3(&mesh.normals, normal_index).unwrap_or(DEFAULT_NORMAL);
        let tex_coords = read2(&mesh.texcoords, texcoord_index)
            .map(|[u, v]| [u, 1.0 - v])
            .unwrap_or(DEFAULT_TEX_COORDS);
        let color = read3(&mesh.vertex_color, position_index)
            .map(|[r, g, b]| [r, g, b, 1.0])
            .unwrap_or([1.0; 4]);

        let vertex = Vertex3D {
            position,
            normal,
            tex_coords,
            color,
        };
        let index = *unique.entry(vertex.key()).or_insert_with(|| {
            vertices.push(vertex);
            (vertices.len() - 1) as u32
        });
        indices.push(index);
    }

    MeshData {
        name: model.name.clone(),
        vertices,
        indices,
        material: mesh.material_id,
    }
}

fn rgba(rgb: Option<[f32; 3]>, default: f32) -> [f32; 4] {
    // The fourth component repeats the blue channel.
    rgb.map(|[r, g, b]| [r, g, b, b]).unwrap_or([default; 4])
}

/// Converts an MTL entry to a material without textures.
pub fn material_from_mtl(mtl: &tobj::Material) -> Material {
    let defaults = Material::default();
    let name = if mtl.name.is_empty() { "Unnamed" } else { mtl.name.as_str() };

    Material::new(
        name,
        rgba(mtl.ambient, defaults.ka[0]),
        rgba(mtl.diffuse, defaults.kd[0]),
        rgba(mtl.specular, defaults.ks[0]),
        mtl.shininess.unwrap_or(1.0),
        mtl.dissolve.unwrap_or(1.0),
    )
}

/// Resolves the texture files referenced by an MTL entry against `directory`.
pub fn texture_paths(mtl: &tobj::Material, directory: &Path) -> [(TextureSlot, Option<PathBuf>); 3] {
    let resolve = |name: &Option<String>| {
        name.as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| directory.join(name.replace('\\', "/")))
    };

    [
        (TextureSlot::Ambient, resolve(&mtl.ambient_texture)),
        (TextureSlot::Diffuse, resolve(&mtl.diffuse_texture)),
        (TextureSlot::Specular, resolve(&mtl.specular_texture)),
    ]
}

/// Loads `directory/filename` and adds its meshes and materials to `registry`.
///
/// Textures that cannot be decoded are logged and left out. A missing or
/// malformed OBJ file is an error.
pub fn import_obj(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    registry: &mut ResourceRegistry,
    directory: &Path,
    filename: &str,
) -> SceneResult<Vec<MeshId>> {
    let path = directory.join(filename);
    log::info!("Reading scene from file \"{}\"...", path.display());

    let (models, materials) =
        tobj::load_obj(&path, &load_options()).map_err(|err| SceneError::Import {
            path: path.clone(),
            message: err.to_string(),
        })?;
    let mtls = materials.unwrap_or_else(|err| {
        log::warn!("Failed to load materials for \"{}\": {}", path.display(), err);
        Vec::new()
    });

    let mut texture_cache: HashMap<PathBuf, TextureResource> = HashMap::new();
    let mut loaded = Vec::with_capacity(mtls.len());
    for mtl in &mtls {
        let mut material = material_from_mtl(mtl);
        for (slot, texture_path) in texture_paths(mtl, directory) {
            let Some(texture_path) = texture_path else {
                continue;
            };
            if let Some(texture) = texture_cache.get(&texture_path) {
                material.set_texture(slot, texture.clone());
                continue;
            }
            match TextureResource::load(device, queue, &texture_path) {
                Ok(texture) => {
                    texture_cache.insert(texture_path, texture.clone());
                    material.set_texture(slot, texture);
                }
                Err(err) => {
                    log::error!("Cannot open texture file \"{}\": {}", texture_path.display(), err)
                }
            }
        }
        loaded.push(material);
    }
    let first_material = registry.add_materials(loaded);
    log::debug!("Loaded {} materials, {} textures", mtls.len(), texture_cache.len());

    let mut default_material: Option<MaterialId> = None;
    let mut mesh_ids = Vec::with_capacity(models.len());
    for model in &models {
        let data = mesh_data_from_model(model);
        if data.indices.is_empty() {
            log::warn!("Skipping empty mesh \"{}\"", data.name);
            continue;
        }

        let material = match data.material {
            Some(index) if index < mtls.len() => first_material + index,
            _ => *default_material
                .get_or_insert_with(|| registry.add_material(Material::default())),
        };
        let mesh = Mesh::new(device, &data.vertices, &data.indices, material, &data.name);
        mesh_ids.push(registry.add_mesh(mesh));
    }

    log::info!(
        "Imported {} meshes from \"{}\"",
        mesh_ids.len(),
        path.display()
    );
    Ok(mesh_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn parse(obj: &str) -> Vec<tobj::Model> {
        let mut reader = BufReader::new(Cursor::new(obj));
        let (models, _) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
            Ok(Default::default())
        })
        .unwrap();
        models
    }

    const QUAD: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn test_shared_corners_are_merged() {
        let models = parse(QUAD);
        assert_eq!(models.len(), 1);

        let data = mesh_data_from_model(&models[0]);
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(data.vertices[0].tex_coords, [0.0, 1.0]);
        assert_eq!(data.vertices[2].tex_coords, [1.0, 0.0]);
        assert_eq!(data.vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(data.vertices[3].color, [1.0; 4]);
        assert_eq!(data.material, None);
    }

    #[test]
    fn test_same_position_different_uv_stays_separate() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 0.5 0.5
f 1/1 2/1 3/1
f 1/2 3/2 2/2
";
        let data = mesh_data_from_model(&parse(obj)[0]);
        assert_eq!(data.indices.len(), 6);
        assert_eq!(data.vertices.len(), 6);
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let data = mesh_data_from_model(&parse(obj)[0]);
        // The quad is triangulated.
        assert_eq!(data.indices.len(), 6);
        assert_eq!(data.vertices.len(), 4);
        for vertex in &data.vertices {
            assert_eq!(vertex.normal, DEFAULT_NORMAL);
            assert_eq!(vertex.tex_coords, DEFAULT_TEX_COORDS);
            assert_eq!(vertex.color, [1.0; 4]);
        }
    }

    #[test]
    fn test_material_from_mtl() {
        let mtl = "\
newmtl stone
Ka 0.1 0.2 0.3
Kd 0.4 0.5 0.6
Ks 0.7 0.8 0.9
Ns 25
d 0.5
map_Kd textures\\stone.png
";
        let mut reader = BufReader::new(Cursor::new(mtl));
        let (mtls, _) = tobj::load_mtl_buf(&mut reader).unwrap();
        let material = material_from_mtl(&mtls[0]);

        assert_eq!(material.name, "stone");
        assert_eq!(material.ka, [0.1, 0.2, 0.3, 0.3]);
        assert_eq!(material.kd, [0.4, 0.5, 0.6, 0.6]);
        assert_eq!(material.ks, [0.7, 0.8, 0.9, 0.9]);
        assert_eq!(material.ns, 25.0);
        assert_eq!(material.d, 0.5);

        let paths = texture_paths(&mtls[0], Path::new("assets/scene"));
        assert_eq!(paths[0], (TextureSlot::Ambient, None));
        assert_eq!(
            paths[1],
            (TextureSlot::Diffuse, Some(PathBuf::from("assets/scene/textures/stone.png")))
        );
        assert_eq!(paths[2].1, None);
    }

    #[test]
    fn test_missing_mtl_values_fall_back() {
        let mut reader = BufReader::new(Cursor::new("newmtl empty\n"));
        let (mtls, _) = tobj::load_mtl_buf(&mut reader).unwrap();
        let material = material_from_mtl(&mtls[0]);
        assert_eq!(material.ka, [0.2; 4]);
        assert_eq!(material.ns, 1.0);
        assert_eq!(material.d, 1.0);
    }
}
