//! Transform component for scene objects.
//!
//! This module provides the [`Transform`] struct holding the position,
//! rotation and scale of one object. The quaternion is the only stored
//! rotation; the rotation matrix, basis vectors and both world matrices are
//! derived from it lazily and cached until the next mutation.
//!
//! # Conventions
//!
//! - Right-handed, Y up, objects face `-Z` in local space.
//! - `local_to_world = T * R * S` (scale first, then rotate, then translate).
//! - [`Transform::rotate`] composes in world space: `new = delta * current`.
//! - Euler angles are `Vec3(pitch, yaw, roll)` in radians, applied as yaw (Y),
//!   then pitch (X), then roll (Z).
//!
//! # Example
//!
//! ```
//! use vkengine_scene::Transform;
//! use glam::Vec3;
//!
//! let mut transform = Transform::new().with_position(Vec3::new(0.0, 0.0, 5.0));
//! transform.look_at(Vec3::ZERO, Vec3::Y).unwrap();
//!
//! let forward = transform.forward();
//! assert!((forward - Vec3::NEG_Z).length() < 1e-5);
//! ```

use std::cell::Cell;

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use thiserror::Error;

/// Squared-length threshold below which look-at input is treated as degenerate.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Rejected look-at input. The transform is left unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookAtError {
    /// Eye and target are the same point, so there is no view direction.
    #[error("look-at target coincides with the eye position")]
    CoincidentPoints,

    /// The up vector is zero or parallel to the view direction.
    #[error("look-at up vector is parallel to the view direction")]
    ParallelUp,
}

/// Values derived from position, rotation and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Derived {
    local_to_world: Mat4,
    world_to_local: Mat4,
    rotation: Mat3,
}

/// A transform representing position, rotation, and scale.
///
/// Fields are private so every mutation goes through a setter that
/// invalidates the cache.
#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    derived: Cell<Option<Derived>>,
    #[cfg(test)]
    recomputes: Cell<u32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            derived: Cell::new(None),
            #[cfg(test)]
            recomputes: Cell::new(0),
        }
    }
}

impl Transform {
    /// Create a new transform at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with the given position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Create a transform with the given rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.set_rotation_quat(rotation);
        self
    }

    /// Create a transform with the given scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_scale(scale);
        self
    }

    fn invalidate(&mut self) {
        self.derived.set(None);
    }

    fn derived(&self) -> Derived {
        if let Some(derived) = self.derived.get() {
            return derived;
        }

        let local_to_world =
            Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
        let derived = Derived {
            local_to_world,
            world_to_local: local_to_world.inverse(),
            rotation: Mat3::from_quat(self.rotation),
        };
        self.derived.set(Some(derived));
        #[cfg(test)]
        self.recomputes.set(self.recomputes.get() + 1);
        derived
    }

    // =========================================================================
    // Position
    // =========================================================================

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Replaces the position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.invalidate();
    }

    /// Moves the position by `delta` in world space.
    pub fn translate(&mut self, delta: Vec3) {
        self.set_position(self.position + delta);
    }

    // =========================================================================
    // Rotation
    // =========================================================================

    /// The canonical rotation.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Sets the rotation from a quaternion. The input is normalized.
    pub fn set_rotation_quat(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.invalidate();
    }

    /// Sets the rotation from `Vec3(pitch, yaw, roll)` in radians.
    pub fn set_rotation_euler(&mut self, euler: Vec3) {
        self.set_rotation_quat(euler_to_quat(euler));
    }

    /// Sets the rotation from the upper 3x3 of a pure rotation matrix.
    pub fn set_rotation_matrix(&mut self, matrix: Mat4) {
        self.set_rotation_quat(Quat::from_mat4(&matrix));
    }

    /// Rotation as `Vec3(pitch, yaw, roll)` in radians.
    pub fn euler_angles(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.rotation.to_euler(EulerRot::YXZ);
        Vec3::new(pitch, yaw, roll)
    }

    /// Rotation as a 4x4 matrix.
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_mat3(self.derived().rotation)
    }

    /// Composes `delta` onto the current rotation in world space.
    pub fn rotate(&mut self, delta: Quat) {
        self.set_rotation_quat(delta * self.rotation);
    }

    /// Rotates by `angle` radians around a world-space `axis`.
    ///
    /// A zero axis is ignored.
    pub fn rotate_axis_angle(&mut self, angle: f32, axis: Vec3) {
        if let Some(axis) = axis.try_normalize() {
            self.rotate(Quat::from_axis_angle(axis, angle));
        }
    }

    /// Rotates by a `Vec3(pitch, yaw, roll)` delta in radians.
    pub fn rotate_euler(&mut self, delta: Vec3) {
        self.rotate(euler_to_quat(delta));
    }

    /// Orbits the position around `point` and rotates the orientation by the same amount.
    pub fn rotate_around(&mut self, point: Vec3, angle: f32, axis: Vec3) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        let delta = Quat::from_axis_angle(axis, angle);
        self.position = point + delta * (self.position - point);
        self.set_rotation_quat(delta * self.rotation);
    }

    // =========================================================================
    // Scale
    // =========================================================================

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Replaces the scale.
    ///
    /// A zero component makes [`world_to_local_matrix`](Self::world_to_local_matrix)
    /// meaningless; guarding against it is the caller's job.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.invalidate();
    }

    // =========================================================================
    // Derived matrices and basis
    // =========================================================================

    /// Object-to-world matrix, `T * R * S`.
    pub fn local_to_world_matrix(&self) -> Mat4 {
        self.derived().local_to_world
    }

    /// Inverse of [`local_to_world_matrix`](Self::local_to_world_matrix).
    pub fn world_to_local_matrix(&self) -> Mat4 {
        self.derived().world_to_local
    }

    /// Replaces position, rotation and scale by decomposing `matrix`.
    ///
    /// Best effort: shear and perspective terms are discarded. A matrix
    /// whose rotation cannot be recovered keeps identity rotation.
    pub fn set_local_to_world_matrix(&mut self, matrix: Mat4) {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        self.position = translation;
        self.scale = scale;
        self.rotation = if rotation.is_finite() {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        self.invalidate();
    }

    /// Inverse-transpose of the upper 3x3, for transforming normals.
    ///
    /// Falls back to identity when the matrix is singular.
    pub fn normal_matrix(&self) -> Mat3 {
        let m = Mat3::from_mat4(self.local_to_world_matrix());
        if m.determinant().abs() < 1e-6 {
            return Mat3::IDENTITY;
        }
        m.inverse().transpose()
    }

    /// Local +X in world space.
    pub fn right(&self) -> Vec3 {
        self.derived().rotation.x_axis
    }

    /// Local +Y in world space.
    pub fn up(&self) -> Vec3 {
        self.derived().rotation.y_axis
    }

    /// Local -Z in world space, the facing direction.
    pub fn forward(&self) -> Vec3 {
        -self.derived().rotation.z_axis
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.local_to_world_matrix().transform_point3(point)
    }

    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.world_to_local_matrix().transform_point3(point)
    }

    // =========================================================================
    // Look-at
    // =========================================================================

    /// Rotates so that [`forward`](Self::forward) points at `target`.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) -> Result<(), LookAtError> {
        self.rotation = look_rotation(target - self.position, up)?;
        self.invalidate();
        Ok(())
    }

    /// Moves to `eye` and rotates so that [`forward`](Self::forward) points at `target`.
    ///
    /// On error neither position nor rotation change.
    pub fn look_at_from(&mut self, eye: Vec3, target: Vec3, up: Vec3) -> Result<(), LookAtError> {
        self.rotation = look_rotation(target - eye, up)?;
        self.position = eye;
        self.invalidate();
        Ok(())
    }
}

fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z)
}

/// Rotation mapping local -Z onto `direction` with local +Y as close to `up` as possible.
fn look_rotation(direction: Vec3, up: Vec3) -> Result<Quat, LookAtError> {
    if direction.length_squared() < DEGENERATE_EPSILON {
        return Err(LookAtError::CoincidentPoints);
    }
    let forward = direction.normalize();
    let right = forward.cross(up);
    if right.length_squared() < DEGENERATE_EPSILON * up.length_squared().max(1.0) {
        return Err(LookAtError::ParallelUp);
    }
    let right = right.normalize();
    let up = right.cross(forward);

    Ok(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPSILON: f32 = 1e-5;

    fn approx_eq_vec3(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    fn approx_eq_mat4(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, EPSILON)
    }

    #[test]
    fn test_default_transform() {
        let t = Transform::new();
        assert_eq!(t.position(), Vec3::ZERO);
        assert_eq!(t.rotation(), Quat::IDENTITY);
        assert_eq!(t.scale(), Vec3::ONE);
        assert_eq!(t.local_to_world_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_trs_order() {
        let t = Transform::new()
            .with_position(Vec3::new(10.0, 0.0, 0.0))
            .with_rotation(Quat::from_rotation_z(FRAC_PI_2))
            .with_scale(Vec3::splat(2.0));

        // Scale to (2,0,0), rotate to (0,2,0), translate to (10,2,0).
        let p = t.transform_point(Vec3::X);
        assert!(
            approx_eq_vec3(p, Vec3::new(10.0, 2.0, 0.0)),
            "Expected (10, 2, 0), got {:?}",
            p
        );
    }

    #[test]
    fn test_world_to_local_is_inverse() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(1.0, -2.0, 3.0));
        t.set_rotation_euler(Vec3::new(0.3, 1.1, -0.4));
        t.set_scale(Vec3::new(1.0, 2.0, 0.5));

        let product = t.local_to_world_matrix() * t.world_to_local_matrix();
        assert!(approx_eq_mat4(product, Mat4::IDENTITY), "Expected identity, got {:?}", product);
    }

    #[test]
    fn test_rotation_matrix_matches_quat() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.7);
        let mut t = Transform::new();
        t.set_rotation_quat(q);
        assert!(approx_eq_mat4(t.rotation_matrix(), Mat4::from_quat(q)));
    }

    #[test]
    fn test_set_rotation_matrix() {
        let m = Mat4::from_rotation_y(0.9);
        let mut t = Transform::new();
        t.set_rotation_matrix(m);
        assert!(approx_eq_mat4(t.rotation_matrix(), m));
    }

    #[test]
    fn test_euler_round_trip() {
        let euler = Vec3::new(0.2, -0.8, 0.5);
        let mut t = Transform::new();
        t.set_rotation_euler(euler);
        assert!(
            approx_eq_vec3(t.euler_angles(), euler),
            "Expected {:?}, got {:?}",
            euler,
            t.euler_angles()
        );
    }

    #[test]
    fn test_yaw_turns_forward() {
        let mut t = Transform::new();
        t.set_rotation_euler(Vec3::new(0.0, FRAC_PI_2, 0.0));
        // +90° yaw turns -Z toward -X.
        assert!(
            approx_eq_vec3(t.forward(), Vec3::NEG_X),
            "Expected (-1, 0, 0), got {:?}",
            t.forward()
        );
    }

    #[test]
    fn test_rotate_composes_in_world_space() {
        let a = Quat::from_rotation_x(0.4);
        let b = Quat::from_rotation_y(1.2);
        let mut t = Transform::new().with_rotation(a);
        t.rotate(b);
        assert!(t.rotation().abs_diff_eq(b * a, EPSILON));
    }

    #[test]
    fn test_rotate_axis_angle_zero_axis_ignored() {
        let mut t = Transform::new();
        t.rotate_axis_angle(1.0, Vec3::ZERO);
        assert_eq!(t.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn test_rotate_euler() {
        let mut t = Transform::new();
        t.rotate_euler(Vec3::new(0.0, PI, 0.0));
        assert!(approx_eq_vec3(t.forward(), Vec3::Z));
    }

    #[test]
    fn test_rotate_around() {
        let mut t = Transform::new().with_position(Vec3::new(1.0, 0.0, 0.0));
        t.rotate_around(Vec3::ZERO, FRAC_PI_2, Vec3::Y);
        assert!(
            approx_eq_vec3(t.position(), Vec3::new(0.0, 0.0, -1.0)),
            "Expected (0, 0, -1), got {:?}",
            t.position()
        );
        assert!(approx_eq_vec3(t.forward(), Vec3::NEG_X));
    }

    #[test]
    fn test_basis_identity() {
        let t = Transform::new();
        assert_eq!(t.right(), Vec3::X);
        assert_eq!(t.up(), Vec3::Y);
        assert_eq!(t.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn test_lazy_recompute_once_per_change() {
        let mut t = Transform::new();
        t.set_position(Vec3::ONE);
        t.set_scale(Vec3::splat(3.0));
        assert_eq!(t.recomputes.get(), 0);

        let first = t.local_to_world_matrix();
        let _ = t.world_to_local_matrix();
        let _ = t.forward();
        let second = t.local_to_world_matrix();
        assert_eq!(t.recomputes.get(), 1);
        assert_eq!(first.to_cols_array(), second.to_cols_array());

        t.translate(Vec3::X);
        let _ = t.up();
        assert_eq!(t.recomputes.get(), 2);
    }

    #[test]
    fn test_set_position_updates_matrix() {
        let mut t = Transform::new();
        let _ = t.local_to_world_matrix();
        t.set_position(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(t.local_to_world_matrix().w_axis.truncate(), Vec3::new(4.0, 5.0, 6.0));
        assert!(approx_eq_vec3(
            t.inverse_transform_point(Vec3::new(4.0, 5.0, 6.0)),
            Vec3::ZERO
        ));
    }

    #[test]
    fn test_decompose_round_trip() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 0.5, 1.5),
            Quat::from_euler(EulerRot::XYZ, 0.3, -0.6, 1.0),
            Vec3::new(-3.0, 4.0, 9.0),
        );
        let mut t = Transform::new();
        t.set_local_to_world_matrix(m);
        assert!(approx_eq_mat4(t.local_to_world_matrix(), m));
    }

    #[test]
    fn test_decompose_zero_scale_keeps_finite_rotation() {
        let mut t = Transform::new();
        t.set_local_to_world_matrix(Mat4::from_scale(Vec3::ZERO));
        assert!(t.rotation().is_finite());
    }

    #[test]
    fn test_look_at_forward() {
        let mut t = Transform::new().with_position(Vec3::new(0.0, 0.0, 5.0));
        t.look_at(Vec3::new(0.0, 0.0, -1.0), Vec3::Y).unwrap();
        assert!(
            approx_eq_vec3(t.forward(), Vec3::NEG_Z),
            "Expected (0, 0, -1), got {:?}",
            t.forward()
        );
        assert!(approx_eq_vec3(t.up(), Vec3::Y));
    }

    #[test]
    fn test_look_at_from_moves_eye() {
        let mut t = Transform::new();
        t.look_at_from(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y)
            .unwrap();
        assert_eq!(t.position(), Vec3::new(3.0, 0.0, 0.0));
        assert!(approx_eq_vec3(t.forward(), Vec3::NEG_X));
    }

    #[test]
    fn test_look_at_coincident_is_rejected() {
        let rotation = Quat::from_rotation_y(0.5);
        let mut t = Transform::new()
            .with_position(Vec3::ONE)
            .with_rotation(rotation);
        let result = t.look_at(Vec3::ONE, Vec3::Y);
        assert_eq!(result, Err(LookAtError::CoincidentPoints));
        assert_eq!(t.rotation(), rotation);
    }

    #[test]
    fn test_look_at_parallel_up_is_rejected() {
        let mut t = Transform::new();
        let result = t.look_at_from(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(result, Err(LookAtError::ParallelUp));
        assert_eq!(t.position(), Vec3::ZERO);
        assert!(t.local_to_world_matrix().is_finite());
    }

    #[test]
    fn test_normal_matrix_singular_fallback() {
        let t = Transform::new().with_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(t.normal_matrix(), Mat3::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_uniform_scale() {
        let t = Transform::new().with_scale(Vec3::splat(2.0));
        let n = t.normal_matrix();
        assert!(n.abs_diff_eq(Mat3::from_diagonal(Vec3::splat(0.5)), EPSILON));
    }

    #[test]
    fn test_transform_direction_ignores_translation_and_scale() {
        let t = Transform::new()
            .with_position(Vec3::new(10.0, 0.0, 0.0))
            .with_rotation(Quat::from_rotation_y(FRAC_PI_2))
            .with_scale(Vec3::splat(3.0));
        let d = t.transform_direction(Vec3::NEG_Z);
        assert!(
            d.abs_diff_eq(Vec3::NEG_X, EPSILON),
            "Expected -X, got {:?}",
            d
        );
    }
}
