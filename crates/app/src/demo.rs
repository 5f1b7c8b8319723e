//! Demo scene: spinning cubes and a fly camera.

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, warn};

use vkengine_core::{CameraConfig, EngineConfig, Random};
use vkengine_platform::{InputState, KeyCode, MouseButton};
use vkengine_scene::{Camera, RenderObject};

const CAMERA_HOME: Vec3 = Vec3::new(0.0, 1.0, 5.0);
const CAMERA_TARGET: Vec3 = Vec3::ZERO;

/// One pixel of right-mouse drag turns as far as holding an arrow key this long.
const DRAG_SECONDS_PER_PIXEL: f32 = 0.005;

pub struct DemoScene {
    pub camera: Camera,
    pub objects: Vec<RenderObject>,
    fast_speed_multiplier: f32,
    rotation_speed_degrees: f32,
}

impl DemoScene {
    /// Spawns `scene.spawn_count` objects at random positions, each with a
    /// random phase, and places the camera at its home pose.
    pub fn new(config: &EngineConfig, aspect: f32, random: &mut Random) -> Self {
        let objects = (0..config.scene.spawn_count)
            .map(|_| spawn_object(random, config.scene.spawn_size))
            .collect::<Vec<_>>();
        debug!("Spawned {} objects", objects.len());

        Self {
            camera: home_camera(&config.camera, aspect),
            objects,
            fast_speed_multiplier: config.camera.fast_speed_multiplier,
            rotation_speed_degrees: config.scene.rotation_speed_degrees,
        }
    }

    /// Back to `(0, 1, 5)` looking at the origin.
    pub fn reset_camera(&mut self) {
        self.camera.reset();
        place_at_home(&mut self.camera);
    }

    /// Applies one tick of input and animation.
    pub fn update(&mut self, input: &InputState, delta_secs: f32) {
        if input.is_key_just_pressed(KeyCode::KeyR) {
            self.reset_camera();
        } else {
            self.update_camera(input, delta_secs);
        }
        self.animate(delta_secs);
    }

    fn update_camera(&mut self, input: &InputState, delta_secs: f32) {
        let transform = &self.camera.transform;
        let direction = transform.right() * input.axis(KeyCode::KeyA, KeyCode::KeyD)
            + transform.up() * input.axis(KeyCode::KeyQ, KeyCode::KeyE)
            + transform.forward() * input.axis(KeyCode::KeyS, KeyCode::KeyW);
        let direction = direction.normalize_or_zero();
        if direction != Vec3::ZERO {
            let fast = input.is_key_pressed(KeyCode::ShiftLeft)
                || input.is_key_pressed(KeyCode::ShiftRight);
            let multiplier = if fast { self.fast_speed_multiplier } else { 1.0 };
            self.camera.move_camera(direction, multiplier, delta_secs);
        }

        // Left yaws toward -X, up pitches toward +Y.
        let turn = Vec2::new(
            input.axis(KeyCode::ArrowRight, KeyCode::ArrowLeft),
            input.axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
        );
        if turn != Vec2::ZERO {
            self.camera.rotate_camera(turn, delta_secs);
        }

        if input.is_mouse_pressed(MouseButton::Right) {
            let drag = input.cursor_delta();
            if drag != Vec2::ZERO {
                self.camera.rotate_camera(-drag, DRAG_SECONDS_PER_PIXEL);
            }
        }
    }

    fn animate(&mut self, delta_secs: f32) {
        let angle = self.rotation_speed_degrees.to_radians() * delta_secs;
        for object in &mut self.objects {
            object.transform.rotate_axis_angle(angle, Vec3::Y);
        }
    }
}

fn spawn_object(random: &mut Random, spawn_size: f32) -> RenderObject {
    let offset = random.angle_radians();
    let mut object = RenderObject::at(random.in_cube(spawn_size)).with_animation_offset(offset);
    object
        .transform
        .set_rotation_quat(Quat::from_rotation_y(offset));
    object
}

fn home_camera(config: &CameraConfig, aspect: f32) -> Camera {
    let mut camera = Camera::new(config.fov_degrees, aspect, config.near, config.far)
        .with_speeds(config.move_speed, config.turn_speed_degrees);
    place_at_home(&mut camera);
    camera
}

fn place_at_home(camera: &mut Camera) {
    if let Err(e) = camera
        .transform
        .look_at_from(CAMERA_HOME, CAMERA_TARGET, Vec3::Y)
    {
        warn!("Camera home pose rejected: {}", e);
        camera.transform.set_position(CAMERA_HOME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn scene() -> DemoScene {
        let mut random = Random::from_seed(1);
        DemoScene::new(&EngineConfig::default(), 4.0 / 3.0, &mut random)
    }

    #[test]
    fn test_spawns_configured_objects() {
        let mut config = EngineConfig::default();
        config.scene.spawn_count = 5;
        config.scene.spawn_size = 2.0;
        let scene = DemoScene::new(&config, 1.0, &mut Random::from_seed(3));

        assert_eq!(scene.objects.len(), 5);
        for object in &scene.objects {
            let p = object.transform.position();
            assert!(p.abs().max_element() <= 2.0, "Expected within 2.0, got {:?}", p);
        }
    }

    #[test]
    fn test_camera_starts_looking_at_origin() {
        let scene = scene();
        let camera = &scene.camera;
        assert!((camera.transform.position() - CAMERA_HOME).length() < EPSILON);
        let to_origin = (CAMERA_TARGET - CAMERA_HOME).normalize();
        assert!(
            camera.transform.forward().dot(to_origin) > 1.0 - EPSILON,
            "Expected forward towards origin, got {:?}",
            camera.transform.forward()
        );
        assert_eq!(camera.fov_degrees, 75.0);
    }

    #[test]
    fn test_objects_spin_about_y() {
        let mut scene = scene();
        let before = scene.objects[0].transform.rotation();
        scene.update(&InputState::new(), 1.0);
        let after = scene.objects[0].transform.rotation();

        let delta = after * before.inverse();
        let (axis, angle) = delta.to_axis_angle();
        assert!((angle - 20f32.to_radians()).abs() < EPSILON, "Expected 20°, got {:?}", angle);
        assert!(axis.dot(Vec3::Y).abs() > 1.0 - EPSILON);
    }

    #[test]
    fn test_w_moves_forward_and_shift_is_faster() {
        let mut scene = scene();
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);
        let start = scene.camera.transform.position();
        scene.update(&input, 0.5);
        let walked = (scene.camera.transform.position() - start).length();
        assert!((walked - 2.0).abs() < EPSILON, "Expected 2.0, got {:?}", walked);

        input.on_key_pressed(KeyCode::ShiftLeft);
        let start = scene.camera.transform.position();
        scene.update(&input, 0.5);
        let ran = (scene.camera.transform.position() - start).length();
        assert!((ran - 4.0).abs() < EPSILON, "Expected 4.0, got {:?}", ran);
    }

    #[test]
    fn test_reset_returns_home() {
        let mut scene = scene();
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyD);
        input.on_key_pressed(KeyCode::ArrowLeft);
        scene.update(&input, 1.0);
        assert!((scene.camera.transform.position() - CAMERA_HOME).length() > 1.0);

        input.end_frame();
        input.on_key_released(KeyCode::KeyD);
        input.on_key_pressed(KeyCode::KeyR);
        scene.update(&input, 1.0);
        assert!((scene.camera.transform.position() - CAMERA_HOME).length() < EPSILON);
    }

    #[test]
    fn test_right_drag_turns_camera() {
        let mut scene = scene();
        let mut input = InputState::new();
        input.on_cursor_moved(Vec2::new(100.0, 100.0));
        input.on_cursor_moved(Vec2::new(150.0, 100.0));

        let forward = scene.camera.transform.forward();
        scene.update(&input, 0.016);
        assert_eq!(scene.camera.transform.forward(), forward);

        input.on_mouse_pressed(MouseButton::Right);
        scene.update(&input, 0.016);
        // Dragging right turns right, toward +X.
        assert!(scene.camera.transform.forward().x > forward.x + EPSILON);
    }
}
