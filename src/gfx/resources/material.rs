//! Phong materials
//!
//! Materials hold the ambient/diffuse/specular coefficients read by the lit
//! shader plus up to three texture maps. They live in the resource registry
//! and meshes refer to them by [`MaterialId`]. GPU resources are created once
//! through [`Material::upload`] before the first frame that draws them.

use wgpu::Device;

use super::texture_resource::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Index of a material in the resource registry
pub type MaterialId = usize;

/// Texture maps a material may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    Ambient = 0,
    Diffuse = 1,
    Specular = 2,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 3] = [TextureSlot::Ambient, TextureSlot::Diffuse, TextureSlot::Specular];
}

/// GPU uniform data for materials
///
/// MUST match `MaterialUniform` in `lit.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ka: [f32; 4],
    pub kd: [f32; 4],
    pub ks: [f32; 4],
    /// x: shininess, y: dissolve
    pub params: [f32; 4],
    /// 1.0 where the ambient/diffuse/specular map is present
    pub has_texture: [f32; 4],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Bind group layout shared by all materials
///
/// Binding order: uniform, ambient map, diffuse map, specular map, sampler.
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group Layout");

        MaterialBindings { bind_group_layout }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    fn create_bind_group(
        &self,
        device: &Device,
        ubo: &MaterialUBO,
        maps: [&TextureResource; 3],
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(&maps[0].view)
            .texture(&maps[1].view)
            .texture(&maps[2].view)
            .sampler(&maps[1].sampler)
            .create(device, label)
    }
}

struct MaterialGpu {
    _ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
}

/// Phong material with optional texture maps
///
/// Not `Clone`: the texture maps and GPU resources are owned exclusively.
pub struct Material {
    pub name: String,
    /// Ambient color
    pub ka: [f32; 4],
    /// Diffuse color
    pub kd: [f32; 4],
    /// Specular color
    pub ks: [f32; 4],
    /// Specular exponent
    pub ns: f32,
    /// Dissolve; 1.0 is fully opaque. Stored but not used for blending.
    pub d: f32,
    textures: [Option<TextureResource>; 3],
    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", [0.2; 4], [0.7; 4], [0.1; 4], 1.0, 1.0)
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("ka", &self.ka)
            .field("kd", &self.kd)
            .field("ks", &self.ks)
            .field("ns", &self.ns)
            .field("d", &self.d)
            .field("uploaded", &self.gpu.is_some())
            .finish()
    }
}

impl Material {
    pub fn new(name: &str, ka: [f32; 4], kd: [f32; 4], ks: [f32; 4], ns: f32, d: f32) -> Self {
        Self {
            name: name.to_string(),
            ka,
            kd,
            ks,
            ns,
            d,
            textures: [None, None, None],
            gpu: None,
        }
    }

    /// Opaque material whose coefficients are `color` scaled by the given factors
    pub fn from_color(name: &str, color: [f32; 3], ambient: f32, diffuse: f32, specular: f32, ns: f32) -> Self {
        let scaled = |factor: f32| [color[0] * factor, color[1] * factor, color[2] * factor, 1.0];
        Self::new(name, scaled(ambient), scaled(diffuse), scaled(specular), ns, 1.0)
    }

    pub fn set_texture(&mut self, slot: TextureSlot, texture: TextureResource) {
        self.textures[slot as usize] = Some(texture);
        self.gpu = None;
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureResource> {
        self.textures[slot as usize].as_ref()
    }

    pub fn has_texture(&self, slot: TextureSlot) -> bool {
        self.textures[slot as usize].is_some()
    }

    pub fn uniform(&self) -> MaterialUniform {
        let flag = |slot| if self.has_texture(slot) { 1.0 } else { 0.0 };
        MaterialUniform {
            ka: self.ka,
            kd: self.kd,
            ks: self.ks,
            params: [self.ns, self.d, 0.0, 0.0],
            has_texture: [
                flag(TextureSlot::Ambient),
                flag(TextureSlot::Diffuse),
                flag(TextureSlot::Specular),
                0.0,
            ],
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Creates the uniform buffer and bind group
    ///
    /// Missing maps are bound to `fallback`; the shader ignores them because
    /// the matching `has_texture` flag is zero.
    pub fn upload(&mut self, device: &Device, bindings: &MaterialBindings, fallback: &TextureResource) {
        let ubo = MaterialUBO::new_with_data(device, &self.uniform());
        let maps = TextureSlot::ALL.map(|slot| self.texture(slot).unwrap_or(fallback));
        let bind_group = bindings.create_bind_group(device, &ubo, maps, &format!("Material: {}", self.name));

        self.gpu = Some(MaterialGpu { _ubo: ubo, bind_group });
    }

    /// The bind group, once [`upload`](Self::upload) has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        let material = Material::default();
        assert_eq!(material.ka, [0.2; 4]);
        assert_eq!(material.kd, [0.7; 4]);
        assert_eq!(material.ks, [0.1; 4]);
        assert_eq!(material.ns, 1.0);
        assert_eq!(material.d, 1.0);
        assert!(!material.is_uploaded());
        assert!(TextureSlot::ALL.iter().all(|&slot| !material.has_texture(slot)));
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 80);

        let material = Material::from_color("Blue", [0.2, 0.2, 1.0], 0.5, 0.3, 0.7, 100.0);
        let uniform = material.uniform();
        assert_eq!(uniform.ka, [0.1, 0.1, 0.5, 1.0]);
        assert_eq!(uniform.params[0], 100.0);
        assert_eq!(uniform.params[1], 1.0);
        assert_eq!(uniform.has_texture, [0.0; 4]);
    }
}
