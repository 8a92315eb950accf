//! Omnidirectional shadow map
//!
//! The depth of the scene as seen from the point light is rendered into the six
//! layers of a `Depth32Float` texture, one layer per cube face. The lighting
//! pass samples the same texture through a cube view with a comparison sampler.
//!
//! ## Face orientation
//!
//! Each face is rendered with `look_at_rh(light, light + direction, -up)` and a
//! 90° projection whose y axis is flipped, so that the rendered texels land
//! where cube-map addressing expects them:
//!
//! | Face | Direction | Up |
//! |------|-----------|----|
//! | +X | (1,0,0) | (0,1,0) |
//! | −X | (−1,0,0) | (0,1,0) |
//! | +Y | (0,1,0) | (0,0,−1) |
//! | −Y | (0,−1,0) | (0,0,1) |
//! | +Z | (0,0,1) | (0,1,0) |
//! | −Z | (0,0,−1) | (0,1,0) |
//!
//! The y flip mirrors the image, so the shadow pipeline treats clockwise
//! triangles as front facing.

use cgmath::{Deg, Matrix4, Point3, Vector3};

use crate::{
    gfx::camera::camera_utils::wgpu_perspective,
    input::{InputState, KeyCode},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

pub const SHADOW_MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const SHADOW_MAP_MIN_SIZE: u32 = 256;
pub const SHADOW_MAP_MAX_SIZE: u32 = 4096;
pub const SHADOW_MAP_DEFAULT_SIZE: u32 = 2048;

const UNITS_STEP: f32 = 100.0;
const FACTOR_STEP: f32 = 1.0;

/// Runtime-tunable shadow parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Master switch; without it the lighting pass shades without shadows
    pub use_shadow_map: bool,
    /// Cull front faces instead of back faces while rendering the shadow map
    pub cull_front: bool,
    pub polygon_offset: bool,
    /// Constant depth bias
    pub units: f32,
    /// Slope-scaled depth bias
    pub factor: f32,
    /// Edge length of each cube face in texels
    pub size: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            use_shadow_map: true,
            cull_front: false,
            polygon_offset: true,
            units: 500.0,
            factor: 1.0,
            size: SHADOW_MAP_DEFAULT_SIZE,
        }
    }
}

/// What a call to [`ShadowSettings::handle_input`] changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsChange {
    /// Culling or depth bias changed, so the shadow pipeline must be rebuilt
    pub pipeline: bool,
    /// The shadow map must be reallocated
    pub size: bool,
}

impl SettingsChange {
    pub fn any(&self) -> bool {
        self.pipeline || self.size
    }
}

impl ShadowSettings {
    /// Applies the shadow debug keys pushed this frame.
    pub fn handle_input(&mut self, input: &InputState) -> SettingsChange {
        let before = *self;

        if input.is_pushed(KeyCode::Digit0) {
            *self = Self::default();
            log::debug!("Shadow settings reset");
        }
        if input.is_pushed(KeyCode::KeyV) {
            self.use_shadow_map = !self.use_shadow_map;
            log::debug!("Use shadow map: {}", self.use_shadow_map);
        }
        if input.is_pushed(KeyCode::KeyB) {
            self.cull_front = !self.cull_front;
            log::debug!("Shadow pass culls {:?} faces", self.cull_face());
        }
        if input.is_pushed(KeyCode::KeyN) {
            self.polygon_offset = !self.polygon_offset;
            log::debug!("Polygon offset: {}", self.polygon_offset);
        }
        if input.is_pushed(KeyCode::Digit1) {
            self.units -= UNITS_STEP;
            log::debug!("Polygon offset units: {}", self.units);
        }
        if input.is_pushed(KeyCode::Digit2) {
            self.units += UNITS_STEP;
            log::debug!("Polygon offset units: {}", self.units);
        }
        if input.is_pushed(KeyCode::Digit3) {
            self.factor -= FACTOR_STEP;
            log::debug!("Polygon offset factor: {}", self.factor);
        }
        if input.is_pushed(KeyCode::Digit4) {
            self.factor += FACTOR_STEP;
            log::debug!("Polygon offset factor: {}", self.factor);
        }
        if input.is_pushed(KeyCode::Digit5) && self.size > SHADOW_MAP_MIN_SIZE {
            self.size /= 2;
            log::debug!("Shadow map size: {}", self.size);
        }
        if input.is_pushed(KeyCode::Digit6) && self.size < SHADOW_MAP_MAX_SIZE {
            self.size *= 2;
            log::debug!("Shadow map size: {}", self.size);
        }

        SettingsChange {
            pipeline: before.cull_front != self.cull_front
                || before.polygon_offset != self.polygon_offset
                || (self.polygon_offset && (before.units != self.units || before.factor != self.factor)),
            size: before.size != self.size,
        }
    }

    pub fn cull_face(&self) -> wgpu::Face {
        if self.cull_front {
            wgpu::Face::Front
        } else {
            wgpu::Face::Back
        }
    }

    /// Depth bias for the shadow pipeline; zero while polygon offset is off.
    ///
    /// `units` maps to `constant` unchanged: on a float depth target both are
    /// multiples of 2^(e - 23), with e the exponent of the primitive's largest depth.
    pub fn depth_bias(&self) -> wgpu::DepthBiasState {
        if self.polygon_offset {
            wgpu::DepthBiasState {
                constant: self.units as i32,
                slope_scale: self.factor,
                clamp: 0.0,
            }
        } else {
            wgpu::DepthBiasState::default()
        }
    }
}

/// One face of the shadow cube, in texture layer order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of the cube texture holding this face
    pub fn layer(self) -> u32 {
        self as u32
    }

    pub fn direction(self) -> Vector3<f32> {
        match self {
            CubeFace::PositiveX => Vector3::unit_x(),
            CubeFace::NegativeX => -Vector3::unit_x(),
            CubeFace::PositiveY => Vector3::unit_y(),
            CubeFace::NegativeY => -Vector3::unit_y(),
            CubeFace::PositiveZ => Vector3::unit_z(),
            CubeFace::NegativeZ => -Vector3::unit_z(),
        }
    }

    pub fn up(self) -> Vector3<f32> {
        match self {
            CubeFace::PositiveY => -Vector3::unit_z(),
            CubeFace::NegativeY => Vector3::unit_z(),
            _ => Vector3::unit_y(),
        }
    }

    pub fn view_matrix(self, light: Point3<f32>) -> Matrix4<f32> {
        Matrix4::look_at_rh(light, light + self.direction(), -self.up())
    }
}

/// Projection shared by all six faces.
///
/// The lighting pass uses the same matrix to turn a fragment's distance along
/// the major axis into the depth stored in the map.
pub fn face_projection(near: f32, far: f32) -> Matrix4<f32> {
    Matrix4::from_nonuniform_scale(1.0, -1.0, 1.0) * wgpu_perspective(Deg(90.0), 1.0, near, far)
}

/// Combined view-projection of one face
pub fn face_view_projection(face: CubeFace, light: Point3<f32>, near: f32, far: f32) -> Matrix4<f32> {
    face_projection(near, far) * face.view_matrix(light)
}

/// Whether the GPU resources have to be reallocated for `requested`.
pub fn needs_recreate(current: u32, requested: u32) -> bool {
    current != requested
}

/// Size-dependent GPU objects of the shadow map
struct ShadowMapTextures {
    texture: wgpu::Texture,
    face_views: Vec<wgpu::TextureView>,
    cube_view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// The cube depth texture, its views and the bind group of the lighting pass
pub struct ShadowMap {
    size: u32,
    sampler: wgpu::Sampler,
    bind_group_layout: BindGroupLayoutWithDesc,
    textures: ShadowMapTextures,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_depth_cube())
            .next_binding_fragment(binding_types::sampler_comparison())
            .create(device, "Shadow Map Bind Group Layout");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Map Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let textures = Self::create_textures(device, size, &bind_group_layout, &sampler);
        log::debug!("Created {0}x{0} shadow cube map", size);

        Self {
            size,
            sampler,
            bind_group_layout,
            textures,
        }
    }

    fn create_textures(
        device: &wgpu::Device,
        size: u32,
        layout: &BindGroupLayoutWithDesc,
        sampler: &wgpu::Sampler,
    ) -> ShadowMapTextures {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Cube Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: CubeFace::ALL.len() as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_MAP_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = CubeFace::ALL
            .iter()
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Shadow Cube Face"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face.layer(),
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(CubeFace::ALL.len() as u32),
            ..Default::default()
        });

        let bind_group = BindGroupBuilder::new(layout)
            .texture(&cube_view)
            .sampler(sampler)
            .create(device, "Shadow Map Bind Group");

        ShadowMapTextures {
            texture,
            face_views,
            cube_view,
            bind_group,
        }
    }

    /// Reallocates the map at `size`; does nothing if the size is unchanged.
    ///
    /// Returns whether the GPU objects were replaced.
    pub fn recreate(&mut self, device: &wgpu::Device, size: u32) -> bool {
        if !needs_recreate(self.size, size) {
            return false;
        }

        self.textures = Self::create_textures(device, size, &self.bind_group_layout, &self.sampler);
        log::debug!("Recreated shadow cube map: {} -> {}", self.size, size);
        self.size = size;
        true
    }

    /// Render attachment for `face`
    pub fn face_view(&self, face: CubeFace) -> &wgpu::TextureView {
        &self.textures.face_views[face.layer() as usize]
    }

    pub fn cube_view(&self) -> &wgpu::TextureView {
        &self.textures.cube_view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.textures.texture
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.textures.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};

    const EPSILON: f32 = 1e-4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    /// Face-local (sc, tc, ma) of a direction per the cube-map addressing rules
    fn cube_addressing(face: CubeFace, r: Vector3<f32>) -> (f32, f32, f32) {
        match face {
            CubeFace::PositiveX => (-r.z, -r.y, r.x.abs()),
            CubeFace::NegativeX => (r.z, -r.y, r.x.abs()),
            CubeFace::PositiveY => (r.x, r.z, r.y.abs()),
            CubeFace::NegativeY => (r.x, -r.z, r.y.abs()),
            CubeFace::PositiveZ => (r.x, -r.y, r.z.abs()),
            CubeFace::NegativeZ => (-r.x, -r.y, r.z.abs()),
        }
    }

    #[test]
    fn test_recreate_keeps_handles_at_same_size() {
        let Some((device, _queue)) = crate::wgpu_utils::headless_device() else {
            return;
        };
        let mut shadow_map = ShadowMap::new(&device, SHADOW_MAP_MIN_SIZE);
        let texture = shadow_map.texture().clone();
        let cube_view = shadow_map.cube_view().clone();
        let face_view = shadow_map.face_view(CubeFace::NegativeZ).clone();

        assert!(!shadow_map.recreate(&device, SHADOW_MAP_MIN_SIZE));
        assert_eq!(shadow_map.size(), SHADOW_MAP_MIN_SIZE);
        assert!(shadow_map.texture() == &texture);
        assert!(shadow_map.cube_view() == &cube_view);
        assert!(shadow_map.face_view(CubeFace::NegativeZ) == &face_view);

        let larger = SHADOW_MAP_MIN_SIZE * 2;
        assert!(shadow_map.recreate(&device, larger));
        assert_eq!(shadow_map.size(), larger);
        assert!(shadow_map.texture() != &texture);
        assert!(shadow_map.cube_view() != &cube_view);
        assert!(shadow_map.face_view(CubeFace::NegativeZ) != &face_view);

        let size = shadow_map.texture().size();
        assert_eq!((size.width, size.height, size.depth_or_array_layers), (larger, larger, 6));
        for face in CubeFace::ALL {
            let _ = shadow_map.face_view(face);
        }
        let _ = shadow_map.cube_view();
    }

    #[test]
    fn test_faces_match_cube_addressing() {
        let light = Point3::new(1.0, 2.0, -3.0);
        let offsets = [
            Vector3::new(0.3, -0.2, 0.1),
            Vector3::new(-0.4, 0.35, -0.25),
            Vector3::new(0.0, 0.0, 0.0),
        ];

        for face in CubeFace::ALL {
            let matrix = face_view_projection(face, light, 0.1, 25.0);
            for offset in offsets {
                // Keep the offset perpendicular to the face direction so it stays on this face.
                let lateral = offset - face.direction() * offset.dot(face.direction());
                let r = face.direction() * 2.0 + lateral;
                let clip = matrix * (light + r).to_homogeneous();
                let (x, y) = (clip.x / clip.w, clip.y / clip.w);

                let (sc, tc, ma) = cube_addressing(face, r);
                // Texel rows grow downwards, NDC y grows upwards.
                assert!(approx(x, sc / ma), "{:?} x: {} vs {}", face, x, sc / ma);
                assert!(approx(y, -tc / ma), "{:?} y: {} vs {}", face, y, -tc / ma);

                let z = clip.z / clip.w;
                assert!(z > 0.0 && z < 1.0);
            }
        }
    }

    #[test]
    fn test_face_views_are_rotations() {
        let light = Point3::new(0.0, 1.5, -0.28);
        for face in CubeFace::ALL {
            let view = face.view_matrix(light);
            assert!(approx(view.determinant(), 1.0), "{:?}", face);
            assert!(face.direction().cross(face.up()).magnitude() > 0.5);

            // The light sits at the origin of every face's view space.
            let origin = view * light.to_homogeneous();
            assert!(origin.truncate().magnitude() < EPSILON);
        }
    }

    #[test]
    fn test_face_projection_depth_for_major_axis_distance() {
        let projection = face_projection(0.1, 25.0);
        let depth = |distance: f32| {
            let clip = projection * Vector4::new(0.0, 0.0, -distance, 1.0);
            clip.z / clip.w
        };
        assert!(approx(depth(0.1), 0.0));
        assert!(approx(depth(25.0), 1.0));
        assert!(depth(2.0) < depth(3.0));
    }

    #[test]
    fn test_layers_follow_face_order() {
        let layers: Vec<u32> = CubeFace::ALL.iter().map(|face| face.layer()).collect();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_needs_recreate() {
        assert!(!needs_recreate(2048, 2048));
        assert!(needs_recreate(2048, 1024));
    }

    fn push(settings: &mut ShadowSettings, key: KeyCode) -> SettingsChange {
        let mut input = InputState::new();
        input.set_button(key, true);
        settings.handle_input(&input)
    }

    #[test]
    fn test_settings_toggles() {
        let mut settings = ShadowSettings::default();

        let change = push(&mut settings, KeyCode::KeyV);
        assert!(!settings.use_shadow_map);
        assert!(!change.any());

        let change = push(&mut settings, KeyCode::KeyB);
        assert_eq!(settings.cull_face(), wgpu::Face::Front);
        assert!(change.pipeline);

        let change = push(&mut settings, KeyCode::KeyN);
        assert_eq!(settings.depth_bias(), wgpu::DepthBiasState::default());
        assert!(change.pipeline);

        // Bias changes while polygon offset is off keep the pipeline.
        let change = push(&mut settings, KeyCode::Digit2);
        assert_eq!(settings.units, 600.0);
        assert!(!change.pipeline);
    }

    #[test]
    fn test_settings_bias_steps() {
        let mut settings = ShadowSettings::default();
        push(&mut settings, KeyCode::Digit1);
        push(&mut settings, KeyCode::Digit1);
        let change = push(&mut settings, KeyCode::Digit4);
        assert!(change.pipeline);

        assert_eq!(settings.units, 300.0);
        assert_eq!(settings.factor, 2.0);
        let bias = settings.depth_bias();
        assert_eq!(bias.constant, 300);
        assert_eq!(bias.slope_scale, 2.0);

        let change = push(&mut settings, KeyCode::Digit0);
        assert_eq!(settings, ShadowSettings::default());
        assert!(change.pipeline);
        assert!(!change.size);
    }

    #[test]
    fn test_settings_size_bounds() {
        let mut settings = ShadowSettings::default();
        let mut halvings = 0;
        while push(&mut settings, KeyCode::Digit5).size {
            halvings += 1;
        }
        assert_eq!(halvings, 3);
        assert_eq!(settings.size, SHADOW_MAP_MIN_SIZE);

        let mut doublings = 0;
        while push(&mut settings, KeyCode::Digit6).size {
            doublings += 1;
        }
        assert_eq!(doublings, 4);
        assert_eq!(settings.size, SHADOW_MAP_MAX_SIZE);

        let change = push(&mut settings, KeyCode::Digit0);
        assert!(change.size);
        assert_eq!(settings.size, SHADOW_MAP_DEFAULT_SIZE);
    }
}
