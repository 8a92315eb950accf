//! Per-frame and per-draw uniform bindings
//!
//! Group 0 of the lit pipeline holds [`FrameUniform`]: camera matrices,
//! the light and the shadow projection. Per-draw transforms live in a
//! dynamic-offset buffer wrapped by [`PerDrawBindings`]; the lit pass uses it
//! with [`DrawUniform`] and the shadow pass with [`ShadowDrawUniform`].

use cgmath::{Matrix, Matrix4, SquareMatrix};

use crate::{
    gfx::camera::camera_utils::convert_matrix4_to_array,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::{DynamicUniformBuffer, UniformBuffer},
    },
};

/// Per-frame uniform content of the lit pass
///
/// MUST match `FrameUniform` in `lit.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Projection of the shadow cube faces, used to turn distances into depth
    pub shadow_projection: [[f32; 4]; 4],
    pub light_position_view: [f32; 4],
    pub light_position_world: [f32; 4],
    pub ia: [f32; 4],
    pub id: [f32; 4],
    pub is: [f32; 4],
}
// Total: 3 * 64 + 5 * 16 = 272 bytes

/// Per-draw transforms of the lit pass
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of model-view, for view-space normals
    pub normal: [[f32; 4]; 4],
}

impl DrawUniform {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>) -> Self {
        let model_view = view * model;
        let normal = model_view
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);

        Self {
            model: convert_matrix4_to_array(model),
            normal: convert_matrix4_to_array(normal),
        }
    }
}

/// Per-draw transform of the shadow pass
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowDrawUniform {
    pub mvp: [[f32; 4]; 4],
}

/// Group 0 of the lit pipeline
pub struct FrameBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
    ubo: UniformBuffer<FrameUniform>,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Frame Bind Group Layout");
        let ubo = UniformBuffer::new(device);
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Frame Bind Group");

        FrameBindings {
            bind_group_layout,
            bind_group,
            ubo,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, content: FrameUniform) {
        self.ubo.update_content(queue, content);
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// A dynamic-offset uniform buffer and the bind group exposing it
pub struct PerDrawBindings<Content> {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
    buffer: DynamicUniformBuffer<Content>,
    label: &'static str,
}

impl<Content: bytemuck::Pod> PerDrawBindings<Content> {
    pub fn new(device: &wgpu::Device, visibility: wgpu::ShaderStages, label: &'static str) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding(
                visibility,
                binding_types::uniform_dynamic(DynamicUniformBuffer::<Content>::element_size()),
            )
            .create(device, label);
        let buffer = DynamicUniformBuffer::new(device, 256);
        let bind_group = Self::create_bind_group(device, &bind_group_layout, &buffer, label);

        PerDrawBindings {
            bind_group_layout,
            bind_group,
            buffer,
            label,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        buffer: &DynamicUniformBuffer<Content>,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .resource(buffer.binding_resource())
            .create(device, label)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Queues one draw's content and returns its dynamic offset
    pub fn push(&mut self, content: &Content) -> u32 {
        self.buffer.push(content)
    }

    /// Writes the queued content, recreating the bind group if the buffer grew
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.buffer.upload(device, queue) {
            self.bind_group =
                Self::create_bind_group(device, &self.bind_group_layout, &self.buffer, self.label);
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Vector4};

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 272);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 128);
        assert_eq!(std::mem::size_of::<ShadowDrawUniform>(), 64);
    }

    #[test]
    fn test_normal_matrix_under_non_uniform_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let uniform = DrawUniform::new(model, Matrix4::identity());
        let normal = Matrix4::from(uniform.normal);

        // Surface x + y = const stretched along x: its normal must stay
        // perpendicular to the transformed tangent (1, -1, 0) -> (2, -1, 0).
        let n = normal * Vector4::new(1.0, 1.0, 0.0, 0.0);
        let tangent = model * Vector4::new(1.0, -1.0, 0.0, 0.0);
        assert!(n.truncate().dot(tangent.truncate()).abs() < 1e-6);
    }

    #[test]
    fn test_normal_matrix_translation_has_no_effect() {
        let model = Matrix4::from_translation(Vector3::new(5.0, -3.0, 2.0));
        let uniform = DrawUniform::new(model, Matrix4::identity());
        let n = Matrix4::from(uniform.normal) * Vector4::new(0.0, 1.0, 0.0, 0.0);
        assert!((n.truncate() - Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-6);
    }
}
