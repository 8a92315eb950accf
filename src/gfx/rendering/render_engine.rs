//! WGPU-based forward renderer with omnidirectional shadows
//!
//! Every frame runs two stages:
//!
//! 1. **Shadow pass**: six depth-only passes, one per face of the shadow cube,
//!    drawing every shadow-casting node as seen from the light. Skipped while
//!    shadows are disabled.
//! 2. **Lighting pass**: one multisampled forward pass drawing every node with
//!    Phong shading, sampling the shadow cube when shadows are enabled.

use std::sync::Arc;

use cgmath::{Deg, Matrix4};
use wgpu::TextureFormat;

use crate::{
    config::{ViewConfig, WindowConfig},
    error::RenderError,
    gfx::{
        camera::{camera_utils::convert_matrix4_to_array, FlyCamera},
        resources::{
            global_bindings::{DrawUniform, FrameBindings, FrameUniform, PerDrawBindings, ShadowDrawUniform},
            material::MaterialBindings,
            texture_resource::{RenderTarget, TextureResource},
        },
        scene::{LightSource, MeshId, ResourceRegistry, Scene, SceneGraph},
    },
    input::InputState,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::render_pass_ext::DrawMesh;
use super::shadow_map::{face_projection, face_view_projection, CubeFace, ShadowMap, ShadowSettings, SHADOW_MAP_FORMAT};

const SHADOW_PIPELINE: &str = "ShadowMap";
const LIT_PIPELINE: &str = "Lit";
const LIT_NO_SHADOW_PIPELINE: &str = "LitNoShadow";

/// Picks the present mode for the vsync setting from what the surface supports.
///
/// Fifo is always available; without vsync the first of Immediate and Mailbox
/// that is supported wins.
pub fn select_present_mode(vsync: bool, supported: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
        .into_iter()
        .find(|mode| supported.contains(mode))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

/// World transform and mesh of every drawable, in node creation order.
pub fn collect_draws(graph: &SceneGraph, shadow_casters_only: bool) -> Vec<(Matrix4<f32>, MeshId)> {
    graph
        .nodes()
        .iter()
        .filter(|node| !shadow_casters_only || node.casts_shadow())
        .flat_map(|node| {
            let world = node.world_transform();
            node.drawables().iter().map(move |&mesh| (world, mesh))
        })
        .collect()
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    present_modes: Vec<wgpu::PresentMode>,
    sample_count: u32,
    msaa_target: Option<RenderTarget>,
    depth_target: RenderTarget,
    pub pipeline_manager: PipelineManager,

    frame_bindings: FrameBindings,
    draw_bindings: PerDrawBindings<DrawUniform>,
    shadow_draw_bindings: PerDrawBindings<ShadowDrawUniform>,
    material_bindings: MaterialBindings,
    fallback_texture: TextureResource,

    shadow_map: ShadowMap,
    shadow_settings: ShadowSettings,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Sets up the device, the surface, the render targets, the shadow cube
    /// and the three pipelines.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        window_config: &WindowConfig,
        shadow_settings: ShadowSettings,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| match &error {
            wgpu::Error::Validation { description, .. } => {
                log::error!("GPU validation error: {}", description)
            }
            wgpu::Error::OutOfMemory { .. } => log::error!("GPU out of memory: {}", error),
            other => log::warn!("GPU error: {}", other),
        }));

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .ok_or(RenderError::UnsupportedSurface)?;
        let present_modes = surface_capabilities.present_modes.clone();

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: select_present_mode(window_config.vsync, &present_modes),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let format_features = adapter.get_texture_format_features(format);
        let sample_count = if format_features
            .flags
            .sample_count_supported(window_config.msaa_samples)
        {
            window_config.msaa_samples
        } else {
            log::warn!(
                "{}x multisampling is not supported for {:?}, rendering without it",
                window_config.msaa_samples,
                format
            );
            1
        };

        let msaa_target = (sample_count > 1)
            .then(|| RenderTarget::create_msaa_color(&device, &config, sample_count, "MSAA Color Target"));
        let depth_target = RenderTarget::create_depth(&device, &config, sample_count, "Depth Target");

        let frame_bindings = FrameBindings::new(&device);
        let draw_bindings = PerDrawBindings::new(
            &device,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            "Draw Bind Group",
        );
        let shadow_draw_bindings =
            PerDrawBindings::new(&device, wgpu::ShaderStages::VERTEX, "Shadow Draw Bind Group");
        let material_bindings = MaterialBindings::new(&device);
        let fallback_texture = TextureResource::white(&device, &queue);
        let shadow_map = ShadowMap::new(&device, shadow_settings.size);

        // Wrap device and queue in Arc for pipeline manager
        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        for (name, source) in [
            ("shadow_map", include_str!("shadow_map.wgsl")),
            ("lit", include_str!("lit.wgsl")),
        ] {
            if let Err(e) = pipeline_manager.load_shader(name, source) {
                log::error!("{}", e);
            }
        }

        let mut engine = RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            present_modes,
            sample_count,
            msaa_target,
            depth_target,
            pipeline_manager,
            frame_bindings,
            draw_bindings,
            shadow_draw_bindings,
            material_bindings,
            fallback_texture,
            shadow_map,
            shadow_settings,
        };

        let shadow_config = engine.shadow_pipeline_config();
        engine.pipeline_manager.register_pipeline(SHADOW_PIPELINE, shadow_config);
        let lit_config = engine.lit_pipeline_config();
        let no_shadow_config = lit_config
            .clone()
            .with_label("Lit No Shadow")
            .with_fragment_entry("fs_main_no_shadow");
        engine
            .pipeline_manager
            .register_pipeline(LIT_NO_SHADOW_PIPELINE, no_shadow_config);
        engine.pipeline_manager.register_pipeline(LIT_PIPELINE, lit_config);

        if let Err(errors) = engine.pipeline_manager.create_all_pipelines() {
            for e in errors {
                log::error!("{}", e);
            }
        }

        Ok(engine)
    }

    fn shadow_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default_with_shader("shadow_map")
            .with_label("Shadow Map")
            .with_vertex_only()
            .with_depth_stencil(SHADOW_MAP_FORMAT)
            .with_depth_bias(self.shadow_settings.depth_bias())
            .with_cull_mode(Some(self.shadow_settings.cull_face()))
            // The face projection flips y, which mirrors the winding.
            .with_front_face(wgpu::FrontFace::Cw)
            .with_bind_group_layouts(vec![self.shadow_draw_bindings.bind_group_layout().clone()])
    }

    fn lit_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default_with_shader("lit")
            .with_label("Lit")
            .with_depth_stencil(TextureResource::DEPTH_FORMAT)
            .with_sample_count(self.sample_count)
            .with_color_targets(vec![Some(wgpu::ColorTargetState {
                format: self.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })])
            .with_bind_group_layouts(vec![
                self.frame_bindings.bind_group_layout().clone(),
                self.draw_bindings.bind_group_layout().clone(),
                self.material_bindings.bind_group_layout().clone(),
                self.shadow_map.bind_group_layout().clone(),
            ])
    }

    /// Creates the GPU resources of every material that has none yet.
    pub fn upload_materials(&self, resources: &mut ResourceRegistry) {
        let mut uploaded = 0;
        for material in resources.materials_mut() {
            if !material.is_uploaded() {
                material.upload(&self.device, &self.material_bindings, &self.fallback_texture);
                uploaded += 1;
            }
        }
        if uploaded > 0 {
            log::debug!("Uploaded {} materials", uploaded);
        }
    }

    /// Applies the shadow debug keys, rebuilding the shadow map or its
    /// pipeline when needed.
    pub fn handle_input(&mut self, input: &InputState) {
        let change = self.shadow_settings.handle_input(input);
        if change.size {
            self.shadow_map.recreate(&self.device, self.shadow_settings.size);
        }
        if change.pipeline {
            let config = self.shadow_pipeline_config();
            self.pipeline_manager.replace_pipeline(SHADOW_PIPELINE, config);
        }
    }

    /// Renders one frame: the shadow cube (if enabled), then the lit scene.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped. Only
    /// running out of memory is returned as an error.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &FlyCamera,
        light: &LightSource,
        view_config: &ViewConfig,
    ) -> Result<(), RenderError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                return Ok(());
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view = camera.view_matrix();
        let aspect = self.config.width as f32 / self.config.height as f32;
        let projection = camera.projection_matrix(
            Deg(view_config.vfov_degrees),
            aspect,
            view_config.near,
            view_config.far,
        );
        self.frame_bindings.update(
            &self.queue,
            FrameUniform {
                projection: convert_matrix4_to_array(projection),
                view: convert_matrix4_to_array(view),
                shadow_projection: convert_matrix4_to_array(face_projection(
                    view_config.near,
                    view_config.far,
                )),
                light_position_view: (view * light.position.to_homogeneous()).into(),
                light_position_world: light.position.to_homogeneous().into(),
                ia: light.ia.into(),
                id: light.id.into(),
                is: light.is.into(),
            },
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if self.shadow_settings.use_shadow_map {
            self.shadow_pass(&mut encoder, scene, light, view_config);
        }
        self.lighting_pass(&mut encoder, &surface_texture_view, scene, view);

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn shadow_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        light: &LightSource,
        view_config: &ViewConfig,
    ) {
        let Some(pipeline) = self.pipeline_manager.get_pipeline(SHADOW_PIPELINE).cloned() else {
            return;
        };

        let casters = collect_draws(&scene.graph, true);
        self.shadow_draw_bindings.clear();
        let faces: Vec<Vec<(u32, MeshId)>> = CubeFace::ALL
            .iter()
            .map(|&face| {
                let view_projection =
                    face_view_projection(face, light.position, view_config.near, view_config.far);
                casters
                    .iter()
                    .map(|&(world, mesh)| {
                        let offset = self.shadow_draw_bindings.push(&ShadowDrawUniform {
                            mvp: convert_matrix4_to_array(view_projection * world),
                        });
                        (offset, mesh)
                    })
                    .collect()
            })
            .collect();
        self.shadow_draw_bindings.upload(&self.device, &self.queue);

        for (face, draws) in CubeFace::ALL.iter().zip(&faces) {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Cube Face Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.shadow_map.face_view(*face),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_pipeline(&pipeline);
            for (offset, mesh_id) in draws {
                let Some(mesh) = scene.resources.mesh(*mesh_id) else {
                    continue;
                };
                shadow_pass.set_bind_group(0, self.shadow_draw_bindings.bind_group(), &[*offset]);
                shadow_pass.draw_mesh(mesh);
            }
        }
    }

    fn lighting_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        scene: &Scene,
        view: Matrix4<f32>,
    ) {
        let pipeline_name = if self.shadow_settings.use_shadow_map {
            LIT_PIPELINE
        } else {
            LIT_NO_SHADOW_PIPELINE
        };
        let pipeline = self.pipeline_manager.get_pipeline(pipeline_name).cloned();

        self.draw_bindings.clear();
        let draws: Vec<(u32, MeshId)> = collect_draws(&scene.graph, false)
            .into_iter()
            .map(|(world, mesh)| (self.draw_bindings.push(&DrawUniform::new(world, view)), mesh))
            .collect();
        self.draw_bindings.upload(&self.device, &self.queue);

        let (color_view, resolve_target) = match &self.msaa_target {
            Some(msaa) => (&msaa.view, Some(surface_view)),
            None => (surface_view, None),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Lighting Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_target.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        // Clear only when the pipeline is unavailable.
        let Some(pipeline) = pipeline else {
            return;
        };
        render_pass.set_pipeline(&pipeline);
        render_pass.set_bind_group(0, self.frame_bindings.bind_group(), &[]);
        render_pass.set_bind_group(3, self.shadow_map.bind_group(), &[]);

        for (offset, mesh_id) in draws {
            let Some(mesh) = scene.resources.mesh(mesh_id) else {
                continue;
            };
            let Some(material_bind_group) = scene
                .resources
                .material(mesh.material())
                .and_then(|material| material.bind_group())
            else {
                log::trace!("Skipping mesh {} - material has no GPU resources", mesh_id);
                continue;
            };

            render_pass.set_bind_group(1, self.draw_bindings.bind_group(), &[offset]);
            render_pass.set_bind_group(2, material_bind_group, &[]);
            render_pass.draw_mesh(mesh);
        }
    }

    /// Resizes the surface and recreates the multisampled color and depth targets
    ///
    /// A zero-sized (minimized) window keeps the old configuration.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        if self.sample_count > 1 {
            self.msaa_target = Some(RenderTarget::create_msaa_color(
                &self.device,
                &self.config,
                self.sample_count,
                "MSAA Color Target",
            ));
        }
        self.depth_target =
            RenderTarget::create_depth(&self.device, &self.config, self.sample_count, "Depth Target");
    }

    /// Set VSync (vertical synchronization) state
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = select_present_mode(enable, &self.present_modes);
        self.surface.configure(&self.device, &self.config);
        log::debug!("Present mode: {:?}", self.config.present_mode);
    }

    pub fn is_vsync(&self) -> bool {
        self.config.present_mode == wgpu::PresentMode::Fifo
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::ROOT;
    use cgmath::{SquareMatrix, Vector3};

    #[test]
    fn test_select_present_mode() {
        use wgpu::PresentMode::*;

        assert_eq!(select_present_mode(true, &[Fifo, Immediate]), Fifo);
        assert_eq!(select_present_mode(false, &[Fifo, Immediate, Mailbox]), Immediate);
        assert_eq!(select_present_mode(false, &[Fifo, Mailbox]), Mailbox);
        assert_eq!(select_present_mode(false, &[Fifo]), Fifo);
    }

    #[test]
    fn test_collect_draws() {
        let mut graph = SceneGraph::new();
        graph.attach_drawable(ROOT, 0).unwrap();
        let offset = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let caster = graph.add_node(ROOT, true, offset).unwrap();
        graph.add_node_meshes(caster, &[1, 2]).unwrap();
        let marker = graph.add_node(caster, false, Matrix4::identity()).unwrap();
        graph.attach_drawable(marker, 3).unwrap();
        graph.propagate();

        let all = collect_draws(&graph, false);
        let meshes: Vec<MeshId> = all.iter().map(|(_, mesh)| *mesh).collect();
        assert_eq!(meshes, vec![0, 1, 2, 3]);
        assert_eq!(all[3].0, offset);

        let casters: Vec<MeshId> = collect_draws(&graph, true).iter().map(|(_, mesh)| *mesh).collect();
        assert_eq!(casters, vec![0, 1, 2]);
    }
}
