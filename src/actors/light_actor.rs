//! The animated point light
//!
//! The light either patrols a closed loop of waypoints at constant speed or is
//! steered by the keyboard relative to the camera. Every update writes the
//! resulting position into the marker node of the scene graph and into the
//! [`LightSource`] read by the renderer.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    error::SceneResult,
    gfx::{
        camera::FlyCamera,
        geometry::generate_sphere,
        resources::material::Material,
        scene::{LightSource, Mesh, MeshId, NodeId, Scene, SceneGraph},
    },
    input::{InputState, KeyCode},
};

const KEYFRAME_COUNT: usize = 8;

/// Waypoints and speed of the patrol loop
#[derive(Debug, Clone, Copy)]
pub struct PatrolConfig {
    /// Travel speed in units per second, also used in manual mode
    pub speed: f32,
    /// Initial animation parameter; its integer part is the current segment
    pub start_animation: f32,
    pub y: f32,
    pub x_min: f32,
    pub x_max: f32,
    pub z_min: f32,
    pub z_mid: f32,
    pub z_max: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            start_animation: 2.0,
            y: 1.5,
            x_min: -9.18,
            x_max: 8.64,
            z_min: -3.45,
            z_mid: -0.28,
            z_max: 3.17,
        }
    }
}

impl PatrolConfig {
    pub fn keyframes(&self) -> [Point3<f32>; KEYFRAME_COUNT] {
        let at = |x: f32, z: f32| Point3::new(x, self.y, z);
        [
            at(self.x_max, self.z_min),
            at(self.x_min, self.z_min),
            at(self.x_min, self.z_mid),
            at(self.x_max, self.z_mid),
            at(self.x_max, self.z_max),
            at(self.x_min, self.z_max),
            at(self.x_min, self.z_mid),
            at(self.x_max, self.z_mid),
        ]
    }

    /// Animation parameter advance per second for each segment.
    ///
    /// Dividing by the segment's extent makes every segment take as long as
    /// its length requires at `speed`.
    pub fn segment_speeds(&self) -> [f32; KEYFRAME_COUNT] {
        let x = self.speed / (self.x_max - self.x_min);
        let z_upper = self.speed / (self.z_max - self.z_mid);
        let z_lower = self.speed / (self.z_mid - self.z_min);
        [x, z_lower, x, z_upper, x, z_lower, x, z_upper]
    }
}

/// Piecewise-linear loop through the keyframes
#[derive(Debug, Clone)]
pub struct Patrol {
    keyframes: [Point3<f32>; KEYFRAME_COUNT],
    speeds: [f32; KEYFRAME_COUNT],
    animation: f32,
}

impl Patrol {
    pub fn new(config: &PatrolConfig) -> Self {
        let mut patrol = Self {
            keyframes: config.keyframes(),
            speeds: config.segment_speeds(),
            animation: 0.0,
        };
        patrol.set_animation(config.start_animation);
        patrol
    }

    pub fn animation(&self) -> f32 {
        self.animation
    }

    /// Sets the animation parameter, wrapped into [0, 8).
    pub fn set_animation(&mut self, animation: f32) {
        let wrapped = animation.rem_euclid(KEYFRAME_COUNT as f32);
        self.animation = if wrapped >= KEYFRAME_COUNT as f32 { 0.0 } else { wrapped };
    }

    fn segment(&self) -> usize {
        (self.animation as usize).min(KEYFRAME_COUNT - 1)
    }

    /// Position for the current animation parameter
    pub fn position(&self) -> Point3<f32> {
        let k = self.segment();
        let t = self.animation - k as f32;
        let from = self.keyframes[k];
        let to = self.keyframes[(k + 1) % KEYFRAME_COUNT];
        Point3::from_vec(from.to_vec() * (1.0 - t) + to.to_vec() * t)
    }

    /// Moves along the loop at the current segment's rate.
    pub fn advance(&mut self, delta_time: f32) {
        let speed = self.speeds[self.segment()];
        self.set_animation(self.animation + delta_time * speed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    Patrol,
    Manual,
}

/// The light together with its visible marker node
#[derive(Debug, Clone)]
pub struct LightActor {
    node: NodeId,
    position: Point3<f32>,
    speed: f32,
    mode: LightMode,
    patrol: Patrol,
    light: LightSource,
}

impl LightActor {
    /// Creates the marker sphere below `parent` and the actor driving it.
    pub fn new(
        scene: &mut Scene,
        device: &wgpu::Device,
        parent: NodeId,
        start: Point3<f32>,
        config: PatrolConfig,
    ) -> SceneResult<Self> {
        let material = scene
            .resources
            .add_material(Material::new("Light Marker", [1000.0; 4], [0.0; 4], [0.0; 4], 1.0, 1.0));
        let mesh = scene.resources.add_mesh(Mesh::from_geometry(
            device,
            &generate_sphere(0.05, 40, 40),
            material,
            "Light Marker",
        ));

        Self::attach(&mut scene.graph, parent, start, config, &[mesh])
    }

    /// Adds a non-shadow-casting marker node drawing `marker` below `parent`.
    pub fn attach(
        graph: &mut SceneGraph,
        parent: NodeId,
        start: Point3<f32>,
        config: PatrolConfig,
        marker: &[MeshId],
    ) -> SceneResult<Self> {
        let node = graph.add_node(parent, false, Matrix4::from_translation(start.to_vec()))?;
        graph.add_node_meshes(node, marker)?;

        Ok(Self {
            node,
            position: start,
            speed: config.speed,
            mode: LightMode::Patrol,
            patrol: Patrol::new(&config),
            light: LightSource::default(),
        })
    }

    pub fn update(
        &mut self,
        input: &InputState,
        camera: &FlyCamera,
        graph: &mut SceneGraph,
        delta_time: f32,
    ) -> SceneResult<()> {
        if input.is_pushed(KeyCode::KeyP) {
            self.mode = match self.mode {
                LightMode::Patrol => LightMode::Manual,
                LightMode::Manual => LightMode::Patrol,
            };
            log::info!("Light mode: {:?}", self.mode);
        }

        match self.mode {
            LightMode::Patrol => {
                self.position = self.patrol.position();
                self.patrol.advance(delta_time);
            }
            LightMode::Manual => self.steer(input, camera.view_matrix(), delta_time),
        }

        graph.set_local_transform(self.node, Matrix4::from_translation(self.position.to_vec()))?;
        self.light.position = self.position;
        Ok(())
    }

    fn steer(&mut self, input: &InputState, view: Matrix4<f32>, delta_time: f32) {
        // First row of the view matrix is the camera's right vector in world space.
        let right = Vector3::new(view.x.x, view.y.x, view.z.x).normalize();
        let up = Vector3::unit_y();
        let forward = up.cross(right);
        let distance = self.speed * delta_time;

        let moves = [
            (KeyCode::ArrowUp, KeyCode::KeyI, forward),
            (KeyCode::ArrowDown, KeyCode::KeyK, -forward),
            (KeyCode::ArrowLeft, KeyCode::KeyJ, -right),
            (KeyCode::ArrowRight, KeyCode::KeyL, right),
        ];
        for (key, alternative, direction) in moves {
            if input.is_down(key) || input.is_down(alternative) {
                self.position += direction * distance;
            }
        }
        if input.is_down(KeyCode::KeyU) {
            self.position.y -= distance;
        }
        if input.is_down(KeyCode::KeyO) {
            self.position.y += distance;
        }
    }

    pub fn light(&self) -> &LightSource {
        &self.light
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn mode(&self) -> LightMode {
        self.mode
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::ROOT;

    fn actor(graph: &mut SceneGraph) -> LightActor {
        LightActor::attach(
            graph,
            ROOT,
            Point3::new(0.0, 1.5, -0.28),
            PatrolConfig::default(),
            &[0],
        )
        .unwrap()
    }

    #[test]
    fn test_keyframes_hit_exactly_at_integer_parameters() {
        let config = PatrolConfig::default();
        let keyframes = config.keyframes();
        let mut patrol = Patrol::new(&config);
        for (k, keyframe) in keyframes.iter().enumerate() {
            patrol.set_animation(k as f32);
            assert_eq!(patrol.position(), *keyframe);
        }
    }

    #[test]
    fn test_patrol_moves_at_constant_world_speed() {
        let config = PatrolConfig::default();
        let mut patrol = Patrol::new(&config);
        for start in [0.25, 1.25, 3.5, 6.1, 7.3] {
            patrol.set_animation(start);
            let before = patrol.position();
            patrol.advance(0.1);
            let travelled = (patrol.position() - before).magnitude();
            assert!((travelled - 0.2).abs() < 1e-3, "segment at {}: {}", start, travelled);
        }
    }

    #[test]
    fn test_patrol_wraps() {
        let mut patrol = Patrol::new(&PatrolConfig::default());
        patrol.set_animation(7.99);
        patrol.advance(10.0);
        assert!(patrol.animation() >= 0.0 && patrol.animation() < 8.0);

        patrol.set_animation(-0.5);
        assert!((patrol.animation() - 7.5).abs() < 1e-6);
    }

    #[test]
    fn test_advance_reaches_each_segment_end() {
        let config = PatrolConfig::default();
        let keyframes = config.keyframes();
        let speeds = config.segment_speeds();
        let mut patrol = Patrol::new(&config);

        patrol.set_animation(0.0);
        for k in 0..KEYFRAME_COUNT {
            // Re-anchor on the integer so rounding does not carry into the next segment.
            patrol.set_animation(k as f32);
            patrol.advance(1.0 / speeds[k]);

            let next = (k + 1) % KEYFRAME_COUNT;
            let expected = keyframes[next];
            assert!(
                (patrol.position() - expected).magnitude() < 1e-4,
                "segment {}: {:?} != {:?}",
                k,
                patrol.position(),
                expected
            );
            assert!(patrol.segment() < KEYFRAME_COUNT);
        }
    }

    #[test]
    fn test_advance_wraps_back_to_first_keyframe() {
        let config = PatrolConfig::default();
        let keyframes = config.keyframes();
        let speeds = config.segment_speeds();
        let mut patrol = Patrol::new(&config);

        patrol.set_animation(7.5);
        patrol.advance(0.5 / speeds[7]);
        let animation = patrol.animation();
        assert!(animation < 1e-4 || animation > 8.0 - 1e-4, "animation {}", animation);
        assert!((patrol.position() - keyframes[0]).magnitude() < 1e-4);

        patrol.set_animation(7.9);
        patrol.advance(0.2 / speeds[7]);
        assert!(patrol.animation() < 1.0);
        assert_eq!(patrol.segment(), 0);
    }

    #[test]
    fn test_long_run_stays_in_range() {
        let mut patrol = Patrol::new(&PatrolConfig::default());
        for _ in 0..20_000 {
            patrol.advance(0.016);
            assert!(patrol.animation() >= 0.0 && patrol.animation() < 8.0);
            assert!(patrol.segment() <= KEYFRAME_COUNT - 1);
        }
    }

    #[test]
    fn test_update_writes_marker_and_light() {
        let mut graph = SceneGraph::new();
        let mut light = actor(&mut graph);
        let camera = FlyCamera::default();
        let input = InputState::new();

        // Starts at animation 2: the third waypoint.
        light.update(&input, &camera, &mut graph, 0.016).unwrap();
        let expected = PatrolConfig::default().keyframes()[2];
        assert_eq!(light.position(), expected);
        assert_eq!(light.light().position, expected);

        graph.propagate();
        let node = graph.node(light.node()).unwrap();
        assert_eq!(node.world_transform(), Matrix4::from_translation(expected.to_vec()));
        assert!(!node.casts_shadow());
        assert_eq!(node.drawables(), &[0]);
    }

    #[test]
    fn test_toggle_and_manual_steering() {
        let mut graph = SceneGraph::new();
        let mut light = actor(&mut graph);
        let mut camera = FlyCamera::default();
        camera.look_at(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        let mut input = InputState::new();

        input.set_button(KeyCode::KeyP, true);
        light.update(&input, &camera, &mut graph, 0.0).unwrap();
        assert_eq!(light.mode(), LightMode::Manual);
        let start = light.position();

        // Holding P does not toggle back.
        input.end_frame();
        input.set_button(KeyCode::KeyI, true);
        input.set_button(KeyCode::KeyO, true);
        light.update(&input, &camera, &mut graph, 0.5).unwrap();
        assert_eq!(light.mode(), LightMode::Manual);

        // Camera faces +X, so forward is +X; O raises the light.
        let moved = light.position() - start;
        assert!((moved - Vector3::new(1.0, 1.0, 0.0)).magnitude() < 1e-5);
        assert_eq!(light.light().position, light.position());
    }
}
