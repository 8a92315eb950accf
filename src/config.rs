//! Tunable settings for the demo.
//!
//! The demo takes no command line arguments; every knob lives here as a plain
//! struct with a `Default` impl.

use std::path::PathBuf;

use cgmath::Point3;

pub use crate::actors::PatrolConfig;
pub use crate::gfx::camera::CameraConfig;
pub use crate::gfx::rendering::ShadowSettings;

/// Window and presentation settings.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub msaa_samples: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Point Light Shadow Demo".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            msaa_samples: 4,
        }
    }
}

/// Projection settings shared by the lighting pass and the shadow pass.
#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    pub near: f32,
    pub far: f32,
    /// Vertical field of view in degrees.
    pub vfov_degrees: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 25.0,
            vfov_degrees: 30.0,
        }
    }
}

/// Where the demo scene comes from.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Directory holding the OBJ, its MTL and textures.
    pub directory: PathBuf,
    pub filename: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets/scenes/CrytekSponza"),
            filename: "sponzaNoCurtain.obj".to_string(),
        }
    }
}

/// Top-level configuration handed to the application.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub view: ViewConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub shadow: ShadowSettings,
    pub patrol: PatrolConfig,
    pub camera_eye: Point3<f32>,
    pub camera_target: Point3<f32>,
    /// Light position before the first update
    pub light_start: Point3<f32>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            view: ViewConfig::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            shadow: ShadowSettings::default(),
            patrol: PatrolConfig::default(),
            camera_eye: Point3::new(-10.0, 0.7, 0.0),
            camera_target: Point3::new(10.0, 2.0, 0.0),
            light_start: Point3::new(0.0, 1.5, -0.28),
        }
    }
}

impl SceneConfig {
    /// Full path of the model file
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}
