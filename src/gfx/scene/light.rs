use cgmath::{Point3, Vector4};

/// A point light with Phong intensities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: Point3<f32>,
    /// Ambient intensity
    pub ia: Vector4<f32>,
    /// Diffuse intensity
    pub id: Vector4<f32>,
    /// Specular intensity
    pub is: Vector4<f32>,
}

impl LightSource {
    pub fn new(position: Point3<f32>, ia: Vector4<f32>, id: Vector4<f32>, is: Vector4<f32>) -> Self {
        Self { position, ia, id, is }
    }
}

impl Default for LightSource {
    fn default() -> Self {
        Self::new(
            Point3::new(10.0, 10.0, 0.0),
            Vector4::new(0.5, 0.5, 0.5, 0.5),
            Vector4::new(0.8, 0.8, 0.8, 0.8),
            Vector4::new(0.6, 0.6, 0.6, 0.6),
        )
    }
}
