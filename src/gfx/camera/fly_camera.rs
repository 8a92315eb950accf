//! First-person fly camera
//!
//! Orientation is stored as two spherical angles: the polar angle `theta`
//! measured from world +Y and the azimuth `phi` measured in the XZ plane from
//! +X towards +Z. The view, right and up vectors are derived from the angles
//! every update, so the angles are the only orientation state that persists.

use std::f32::consts::{PI, TAU};

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

use super::camera_utils::wgpu_perspective;
use crate::input::{Button, InputState, KeyCode, MouseButton};

/// Keeps the view vector from becoming parallel to the up vector.
const THETA_EPSILON: f32 = 0.001;

/// Movement and rotation tuning
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub units_per_second: f32,
    pub radians_per_pixel: f32,
    pub rotate_button: MouseButton,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            units_per_second: 3.0,
            radians_per_pixel: 0.001,
            rotate_button: MouseButton::Left,
        }
    }
}

/// Wraps an angle into [0, 2π).
fn wrap_azimuth(phi: f32) -> f32 {
    let wrapped = phi.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

fn clamp_polar(theta: f32) -> f32 {
    theta.clamp(THETA_EPSILON, PI - THETA_EPSILON)
}

#[derive(Debug, Clone)]
pub struct FlyCamera {
    config: CameraConfig,
    position: Point3<f32>,
    theta: f32,
    phi: f32,
    view: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    invert_horizontally: bool,
    invert_vertically: bool,
}

impl FlyCamera {
    /// Creates a camera at (0, 0, 5) looking at the origin.
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            config,
            position: Point3::new(0.0, 0.0, 0.0),
            theta: PI / 2.0,
            phi: 0.0,
            view: Vector3::unit_x(),
            up: Vector3::unit_y(),
            right: Vector3::unit_z(),
            invert_horizontally: false,
            invert_vertically: false,
        };
        camera.look_at(Point3::new(0.0, 0.0, 5.0), Point3::new(0.0, 0.0, 0.0));
        camera
    }

    /// Places the camera at `eye` facing `center`.
    pub fn look_at(&mut self, eye: Point3<f32>, center: Point3<f32>) {
        self.position = eye;

        let view = (center - eye).normalize();
        self.theta = clamp_polar(view.y.clamp(-1.0, 1.0).acos());
        // The horizontal part of the view vector points along up x right.
        self.phi = wrap_azimuth(view.z.atan2(view.x));
        self.update_basis();
    }

    fn update_basis(&mut self) {
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        let (sin_phi, cos_phi) = self.phi.sin_cos();

        self.up = Vector3::unit_y();
        self.view = Vector3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
        self.right = self.view.cross(self.up).normalize();
    }

    /// Applies one frame of mouse look and keyboard movement.
    pub fn update(&mut self, input: &InputState, delta_time: f32) {
        let rotate = self.config.rotate_button;
        // The press frame is skipped so the cursor jump onto the window is ignored.
        if input.is_down(rotate) && input.is_held(rotate) {
            let delta = input.cursor_position_previous_frame() - input.cursor_position();
            let sign = |inverted: bool| if inverted { -1.0 } else { 1.0 };

            self.theta -= delta.y as f32 * self.config.radians_per_pixel * sign(self.invert_vertically);
            self.phi -= delta.x as f32 * self.config.radians_per_pixel * sign(self.invert_horizontally);

            self.theta = clamp_polar(self.theta);
            self.phi = wrap_azimuth(self.phi);
        }

        self.update_basis();

        let forward = self.horizontal_forward();
        let distance = self.config.units_per_second * delta_time;
        let moves = [
            (KeyCode::KeyW, forward),
            (KeyCode::KeyS, -forward),
            (KeyCode::KeyA, -self.right),
            (KeyCode::KeyD, self.right),
            (KeyCode::Space, self.up),
        ];
        for (key, direction) in moves {
            if input.is_down(key) {
                self.position += direction * distance;
            }
        }
        let down_keys: [Button; 3] = [
            KeyCode::KeyX.into(),
            KeyCode::ShiftLeft.into(),
            KeyCode::ControlLeft.into(),
        ];
        if input.any_down(&down_keys) {
            self.position -= self.up * distance;
        }

        if input.is_pushed(KeyCode::Comma) {
            self.invert_horizontally = !self.invert_horizontally;
            log::debug!("Invert horizontal look: {}", self.invert_horizontally);
        }
        if input.is_pushed(KeyCode::Period) {
            self.invert_vertically = !self.invert_vertically;
            log::debug!("Invert vertical look: {}", self.invert_vertically);
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.view, self.up)
    }

    pub fn projection_matrix(&self, vfov: Deg<f32>, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
        wgpu_perspective(vfov, aspect, near, far)
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn view_direction(&self) -> Vector3<f32> {
        self.view
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Forward direction with the vertical tilt removed
    pub fn horizontal_forward(&self) -> Vector3<f32> {
        self.up.cross(self.right)
    }

    /// Polar angle from +Y, in radians
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Azimuth from +X towards +Z, in radians
    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn inverted(&self) -> (bool, bool) {
        (self.invert_horizontally, self.invert_vertically)
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        for c in 0..4 {
            for r in 0..4 {
                assert!(
                    (a[c][r] - b[c][r]).abs() < 1e-5,
                    "mismatch at [{}][{}]: {:?} vs {:?}",
                    c,
                    r,
                    a,
                    b
                );
            }
        }
    }

    /// Mouse held for one frame already, moving from `from` to `to`.
    fn dragging(from: (f64, f64), to: (f64, f64)) -> InputState {
        let mut input = InputState::new();
        input.set_button(MouseButton::Left, true);
        input.set_cursor_position(from.0, from.1);
        input.end_frame();
        input.set_cursor_position(to.0, to.1);
        input
    }

    #[test]
    fn test_look_at_matches_direct_view_matrix() {
        let cases = [
            (Point3::new(0.0, 0.0, 5.0), Point3::new(0.0, 0.0, 0.0)),
            (Point3::new(-10.0, 0.7, 0.0), Point3::new(10.0, 2.0, 0.0)),
            (Point3::new(1.0, 2.0, 3.0), Point3::new(-4.0, 0.5, 2.0)),
        ];
        for (eye, center) in cases {
            let mut camera = FlyCamera::default();
            camera.look_at(eye, center);
            assert_matrix_eq(
                camera.view_matrix(),
                Matrix4::look_at_rh(eye, center, Vector3::unit_y()),
            );
        }
    }

    #[test]
    fn test_look_at_angles() {
        let camera = FlyCamera::default();
        let view = camera.view_direction();
        assert!((view - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
        assert!((camera.theta() - PI / 2.0).abs() < 1e-6);
        assert!((camera.phi() - 1.5 * PI).abs() < 1e-6);
    }

    #[test]
    fn test_theta_stays_inside_open_interval() {
        let mut camera = FlyCamera::default();

        camera.update(&dragging((0.0, 0.0), (0.0, 1.0e9)), 0.016);
        assert!(camera.theta() > 0.0 && camera.theta() < PI);

        camera.update(&dragging((0.0, 1.0e9), (0.0, -1.0e9)), 0.016);
        assert!(camera.theta() > 0.0 && camera.theta() < PI);
        assert!(camera.view_direction().y.abs() < 1.0);
    }

    #[test]
    fn test_phi_wraps_into_range() {
        let mut camera = FlyCamera::default();
        for step in 0..50 {
            let x = if step % 2 == 0 { 12_345.0 } else { -98_765.0 };
            camera.update(&dragging((0.0, 0.0), (x, 0.0)), 0.016);
            assert!(camera.phi() >= 0.0 && camera.phi() < TAU);
        }
    }

    #[test]
    fn test_rotation_skips_press_frame() {
        let mut camera = FlyCamera::default();
        let (theta, phi) = (camera.theta(), camera.phi());

        let mut input = InputState::new();
        input.end_frame();
        input.set_button(MouseButton::Left, true);
        input.set_cursor_position(500.0, 500.0);
        camera.update(&input, 0.016);

        assert_eq!(camera.theta(), theta);
        assert_eq!(camera.phi(), phi);
    }

    #[test]
    fn test_rotation_direction() {
        let mut camera = FlyCamera::default();
        let theta = camera.theta();
        // Cursor moves down by 100 px: theta grows, the camera looks down.
        camera.update(&dragging((0.0, 0.0), (0.0, 100.0)), 0.016);
        assert!((camera.theta() - (theta + 0.1)).abs() < 1e-5);
    }

    #[test]
    fn test_movement_follows_horizontal_basis() {
        let mut camera = FlyCamera::default();
        camera.look_at(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));

        let mut input = InputState::new();
        input.set_button(KeyCode::KeyW, true);
        camera.update(&input, 1.0);
        // Looking up at 45 degrees still moves horizontally at full speed.
        assert!((camera.position() - Point3::new(3.0, 0.0, 0.0)).magnitude() < 1e-5);

        let mut input = InputState::new();
        input.set_button(KeyCode::KeyD, true);
        input.set_button(KeyCode::Space, true);
        camera.update(&input, 1.0);
        assert!((camera.position() - Point3::new(3.0, 3.0, 3.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_movement_uses_current_frame_keys() {
        let mut camera = FlyCamera::default();
        let start = camera.position();
        let mut input = InputState::new();

        // Moves on the press frame already.
        input.set_button(KeyCode::KeyW, true);
        camera.update(&input, 1.0);
        let pressed = camera.position();
        assert!((pressed - start).magnitude() > 1.0);

        // Stops on the release frame although W was down the frame before.
        input.end_frame();
        input.set_button(KeyCode::KeyW, false);
        camera.update(&input, 1.0);
        assert_eq!(camera.position(), pressed);
    }

    #[test]
    fn test_down_keys_are_alternatives() {
        let mut camera = FlyCamera::default();
        let start = camera.position();

        let mut input = InputState::new();
        input.set_button(KeyCode::ShiftLeft, true);
        input.set_button(KeyCode::KeyX, true);
        camera.update(&input, 0.5);
        assert!((camera.position().y - (start.y - 1.5)).abs() < 1e-5);
    }

    #[test]
    fn test_inversion_toggles_are_edge_triggered() {
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();

        input.set_button(KeyCode::Comma, true);
        camera.update(&input, 0.016);
        assert_eq!(camera.inverted(), (true, false));

        input.end_frame();
        camera.update(&input, 0.016);
        assert_eq!(camera.inverted(), (true, false));

        input.set_button(KeyCode::Comma, false);
        input.end_frame();
        input.set_button(KeyCode::Comma, true);
        input.set_button(KeyCode::Period, true);
        camera.update(&input, 0.016);
        assert_eq!(camera.inverted(), (false, true));
    }

    #[test]
    fn test_wrap_azimuth() {
        assert_eq!(wrap_azimuth(0.0), 0.0);
        assert!((wrap_azimuth(-PI / 2.0) - 1.5 * PI).abs() < 1e-6);
        assert!((wrap_azimuth(TAU + 1.0) - 1.0).abs() < 1e-5);
        assert!(wrap_azimuth(-1.0e-9) < TAU);
    }
}
