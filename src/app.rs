//! Window, event loop and per-frame orchestration
//!
//! [`PointShadowApp`] owns the winit event loop. Window events are written into
//! an [`InputState`]; on every redraw the frame runs in a fixed order:
//! light actor, camera, application keys, renderer keys, transform propagation,
//! shadow pass and lighting pass. The input snapshot for edge detection is
//! taken at the end of the frame, before the next frame's events arrive.

use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::{
    actors::LightActor,
    config::DemoConfig,
    error::RenderError,
    gfx::{
        camera::FlyCamera,
        rendering::RenderEngine,
        scene::{Scene, ROOT},
    },
    input::{InputState, KeyCode},
    performance::{fps_title, FpsCounter, FrameClock},
};

const CONTROLS: &[&str] = &[
    "Controls:",
    "  W/A/S/D          move camera",
    "  Space            move camera up",
    "  X/Shift/Ctrl     move camera down",
    "  Left mouse       look around",
    "  Comma/Period     invert horizontal/vertical look",
    "  P                toggle light patrol/manual",
    "  Arrows or IJKL   move light (manual)",
    "  U/O              move light down/up (manual)",
    "  F/F11            toggle fullscreen, Escape leaves it",
    "  T                toggle vsync",
    "  H                show these controls",
];

const SHADOW_CONTROLS: &[&str] = &[
    "Shadow debug controls:",
    "  V                toggle shadows",
    "  B                toggle front/back face culling",
    "  N                toggle polygon offset",
    "  1/2              polygon offset units -/+100",
    "  3/4              polygon offset factor -/+1",
    "  5/6              halve/double shadow map size",
    "  0                reset shadow settings",
];

fn print_controls() {
    for line in CONTROLS {
        log::info!("{}", line);
    }
    for line in SHADOW_CONTROLS {
        log::debug!("{}", line);
    }
}

/// The demo application
pub struct PointShadowApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    camera: FlyCamera,
    light: Option<LightActor>,
    input: InputState,
    clock: FrameClock,
    fps: FpsCounter,
    minimized: bool,
    error: Option<anyhow::Error>,
}

impl PointShadowApp {
    pub fn new(config: DemoConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;

        let mut camera = FlyCamera::new(config.camera);
        camera.look_at(config.camera_eye, config.camera_target);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene: Scene::new(),
                camera,
                light: None,
                input: InputState::new(),
                clock: FrameClock::new(),
                fps: FpsCounter::new(),
                minimized: false,
                error: None,
            },
        })
    }

    /// Runs the event loop until the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_config = &self.config.window;
        let window = Arc::new(
            event_loop
                .create_window(
                    WindowAttributes::default()
                        .with_title(window_config.title.clone())
                        .with_inner_size(LogicalSize::new(window_config.width, window_config.height)),
                )
                .context("Failed to create window")?,
        );
        self.window = Some(window.clone());

        let (width, height) = window.inner_size().into();
        let renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            window_config,
            self.config.shadow,
        ))
        .context("Failed to initialize renderer")?;

        self.build_scene(&renderer)?;
        renderer.upload_materials(&mut self.scene.resources);

        self.render_engine = Some(renderer);
        self.clock = FrameClock::new();
        print_controls();
        Ok(())
    }

    fn build_scene(&mut self, renderer: &RenderEngine) -> anyhow::Result<()> {
        let scene_config = &self.config.scene;
        let path = scene_config.path();

        let imported = if path.is_file() {
            match self.scene.add_obj(
                renderer.device(),
                renderer.queue(),
                &scene_config.directory,
                &scene_config.filename,
            ) {
                Ok(meshes) => !meshes.is_empty(),
                Err(e) => {
                    log::error!("{}", e);
                    false
                }
            }
        } else {
            log::warn!("Scene file \"{}\" not found", path.display());
            false
        };

        if !imported {
            log::info!("Using the procedural room");
            self.scene.add_procedural_room(renderer.device())?;
        }

        let light = LightActor::new(
            &mut self.scene,
            renderer.device(),
            ROOT,
            self.config.light_start,
            self.config.patrol,
        )?;
        self.light = Some(light);
        Ok(())
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(render_engine)) = (self.window.as_ref(), self.render_engine.as_mut())
        else {
            return;
        };

        let delta = self.clock.tick();
        let delta_time = delta.as_secs_f32();
        if let Some(fps) = self.fps.tick(delta) {
            window.set_title(&fps_title(&self.config.window.title, fps));
        }

        let mut light_source = None;
        if let Some(light) = self.light.as_mut() {
            if let Err(e) = light.update(&self.input, &self.camera, &mut self.scene.graph, delta_time) {
                log::error!("Light update failed: {}", e);
            }
            light_source = Some(*light.light());
        }
        self.camera.update(&self.input, delta_time);
        handle_app_keys(&self.input, window, render_engine);
        render_engine.handle_input(&self.input);
        self.scene.graph.propagate();

        if !self.minimized {
            render_engine.upload_materials(&mut self.scene.resources);
            let light_source = light_source.unwrap_or_default();
            match render_engine.render(&self.scene, &self.camera, &light_source, &self.config.view) {
                Ok(()) => {}
                Err(RenderError::OutOfMemory) => {
                    log::error!("Out of memory, exiting");
                    event_loop.exit();
                }
                Err(e) => log::error!("{}", e),
            }
        }

        self.input.end_frame();
    }
}

fn handle_app_keys(input: &InputState, window: &Window, render_engine: &mut RenderEngine) {
    if input.is_pushed(KeyCode::KeyF) || input.is_pushed(KeyCode::F11) {
        if window.fullscreen().is_some() {
            window.set_fullscreen(None);
        } else {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }
    if input.is_pushed(KeyCode::Escape) && window.fullscreen().is_some() {
        window.set_fullscreen(None);
    }
    if input.is_pushed(KeyCode::KeyT) {
        let vsync = !render_engine.is_vsync();
        render_engine.set_vsync(vsync);
        log::info!("VSync: {}", if vsync { "on" } else { "off" });
    }
    if input.is_pushed(KeyCode::KeyH) {
        print_controls();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.initialize(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                self.input.set_button(key_code, state == ElementState::Pressed);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.set_button(button, state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.set_cursor_position(position.x, position.y);
            }
            WindowEvent::Focused(false) => {
                self.input.release_all();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.minimized = width == 0 || height == 0;
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
