//! Perspective camera built on a [`Transform`].

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::transform::Transform;
use crate::ubo::CameraUbo;

/// Default vertical field of view in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 75.0;
/// Default movement speed in units per second.
pub const DEFAULT_MOVE_SPEED: f32 = 4.0;
/// Default turn speed in degrees per second.
pub const DEFAULT_TURN_SPEED_DEGREES: f32 = 70.0;

/// A perspective camera.
///
/// The view is derived from the transform's position and basis, so moving or
/// rotating `transform` moves the camera.
#[derive(Clone, Debug)]
pub struct Camera {
    pub transform: Transform,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second used by [`move_camera`](Self::move_camera).
    pub move_speed: f32,
    /// Degrees per second used by [`rotate_camera`](Self::rotate_camera).
    pub turn_speed_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_FOV_DEGREES, 16.0 / 9.0, 0.1, 200.0)
    }
}

impl Camera {
    /// Create a camera at the origin facing `-Z`.
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            transform: Transform::new(),
            fov_degrees,
            aspect,
            near,
            far,
            move_speed: DEFAULT_MOVE_SPEED,
            turn_speed_degrees: DEFAULT_TURN_SPEED_DEGREES,
        }
    }

    /// Set the movement and turn speeds.
    pub fn with_speeds(mut self, move_speed: f32, turn_speed_degrees: f32) -> Self {
        self.move_speed = move_speed;
        self.turn_speed_degrees = turn_speed_degrees;
        self
    }

    /// Update the aspect ratio, typically after a swapchain resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let position = self.transform.position();
        Mat4::look_at_rh(
            position,
            position + self.transform.forward(),
            self.transform.up(),
        )
    }

    /// Get the projection matrix.
    ///
    /// With `invert_y` the Y axis is flipped for Vulkan's clip space, where +Y
    /// points down.
    pub fn projection_matrix(&self, invert_y: bool) -> Mat4 {
        let mut proj =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far);
        if invert_y {
            proj.y_axis.y *= -1.0;
        }
        proj
    }

    /// Packed view and Vulkan projection for the camera uniform buffer.
    pub fn uniform_buffer_object(&self) -> CameraUbo {
        CameraUbo::new(self.view_matrix(), self.projection_matrix(true))
    }

    /// Moves along `direction` at `move_speed * speed_multiplier` units per second.
    pub fn move_camera(&mut self, direction: Vec3, speed_multiplier: f32, delta_secs: f32) {
        let delta = direction * self.move_speed * speed_multiplier * delta_secs;
        self.transform.translate(delta);
    }

    /// Turns the camera by `turn_speed_degrees * delta_secs` scaled by `direction`.
    ///
    /// `direction.x` yaws around world up, `direction.y` pitches around the
    /// camera's own right axis.
    pub fn rotate_camera(&mut self, direction: Vec2, delta_secs: f32) {
        let turn = self.turn_speed_degrees.to_radians() * delta_secs;
        if direction.x != 0.0 {
            self.transform.rotate_axis_angle(turn * direction.x, Vec3::Y);
        }
        if direction.y != 0.0 {
            let right = self.transform.right();
            self.transform.rotate_axis_angle(turn * direction.y, right);
        }
    }

    /// Back to the origin with identity rotation and unit scale.
    pub fn reset(&mut self) {
        self.transform.set_scale(Vec3::ONE);
        self.transform.set_position(Vec3::ZERO);
        self.transform.set_rotation_euler(Vec3::ZERO);
    }

    /// Unprojects a pixel onto the near plane in view space.
    ///
    /// `(x, y)` are window coordinates with the origin at the top-left. Depth
    /// is in Vulkan's `[0, 1]` range, so the near plane sits at NDC z = 0.
    pub fn screen_space_view_pos(&self, x: f32, y: f32, width: f32, height: f32) -> Vec4 {
        let ndc = Vec4::new(2.0 * x / width - 1.0, 1.0 - 2.0 * y / height, 0.0, 1.0);
        let view = self.projection_matrix(false).inverse() * ndc;
        view / view.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq_vec3(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_default_view_is_identity() {
        let camera = Camera::default();
        assert!(camera.view_matrix().abs_diff_eq(Mat4::IDENTITY, EPSILON));
    }

    #[test]
    fn test_view_tracks_transform() {
        let mut camera = Camera::default();
        camera.transform.set_position(Vec3::new(0.0, 0.0, 5.0));
        let p = camera.view_matrix().transform_point3(Vec3::new(0.0, 0.0, 5.0));
        assert!(approx_eq_vec3(p, Vec3::ZERO), "Expected origin, got {:?}", p);

        camera.transform.set_position(Vec3::new(1.0, 0.0, 0.0));
        let p = camera.view_matrix().transform_point3(Vec3::new(1.0, 0.0, -2.0));
        assert!(approx_eq_vec3(p, Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn test_projection_invert_y() {
        let camera = Camera::default();
        let normal = camera.projection_matrix(false);
        let flipped = camera.projection_matrix(true);
        assert_eq!(flipped.y_axis.y, -normal.y_axis.y);
        assert_eq!(flipped.x_axis, normal.x_axis);
        assert_eq!(flipped.z_axis, normal.z_axis);
    }

    #[test]
    fn test_projection_uses_degrees() {
        let camera = Camera::new(90.0, 1.0, 0.1, 100.0);
        // cot(45°) = 1
        assert!((camera.projection_matrix(false).y_axis.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_uniform_buffer_object() {
        let mut camera = Camera::default();
        camera.transform.set_position(Vec3::new(2.0, 3.0, 4.0));
        let ubo = camera.uniform_buffer_object();
        assert_eq!(ubo.view, camera.view_matrix());
        assert_eq!(ubo.proj, camera.projection_matrix(true));
    }

    #[test]
    fn test_move_camera() {
        let mut camera = Camera::default();
        camera.move_camera(Vec3::NEG_Z, 2.0, 0.5);
        // 4 units/s * 2 * 0.5s
        assert!(approx_eq_vec3(camera.transform.position(), Vec3::new(0.0, 0.0, -4.0)));
    }

    #[test]
    fn test_rotate_camera_yaw() {
        let mut camera = Camera::default().with_speeds(4.0, 90.0);
        camera.rotate_camera(Vec2::new(1.0, 0.0), 1.0);
        assert!(
            approx_eq_vec3(camera.transform.forward(), Vec3::NEG_X),
            "Expected (-1, 0, 0), got {:?}",
            camera.transform.forward()
        );
    }

    #[test]
    fn test_rotate_camera_pitch_keeps_right() {
        let mut camera = Camera::default().with_speeds(4.0, 45.0);
        camera.rotate_camera(Vec2::new(0.0, 1.0), 1.0);
        assert!(approx_eq_vec3(camera.transform.right(), Vec3::X));
        assert!(camera.transform.forward().y > 0.0);
    }

    #[test]
    fn test_reset() {
        let mut camera = Camera::default();
        camera.transform.set_position(Vec3::splat(3.0));
        camera.rotate_camera(Vec2::ONE, 1.0);
        camera.reset();
        assert_eq!(camera.transform.position(), Vec3::ZERO);
        assert!(approx_eq_vec3(camera.transform.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn test_screen_center_unprojects_to_near_plane() {
        let camera = Camera::new(60.0, 4.0 / 3.0, 0.5, 50.0);
        let p = camera.screen_space_view_pos(400.0, 300.0, 800.0, 600.0);
        assert!(p.x.abs() < EPSILON && p.y.abs() < EPSILON);
        assert!((p.z + 0.5).abs() < 1e-4, "Expected z = -near, got {}", p.z);
    }

    #[test]
    fn test_set_aspect_rejects_invalid() {
        let mut camera = Camera::default();
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect, 16.0 / 9.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect, 2.0);
    }
}
