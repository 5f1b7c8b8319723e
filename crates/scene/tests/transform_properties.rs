//! Property checks over sampled rotations, scales and positions.

use approx::assert_abs_diff_eq;
use glam::{EulerRot, Mat4, Quat, Vec3};
use vkengine_scene::{Camera, Transform};

const EPSILON: f32 = 1e-5;

fn sample_rotations() -> Vec<Quat> {
    let mut rotations = vec![Quat::IDENTITY];
    for i in 0..8 {
        for j in 0..6 {
            let yaw = i as f32 * 0.83;
            let pitch = -1.4 + j as f32 * 0.55;
            let roll = (i * j) as f32 * 0.21;
            rotations.push(Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll));
        }
    }
    rotations
}

#[test]
fn test_rotation_matrix_matches_quaternion() {
    for q in sample_rotations() {
        let mut t = Transform::new();
        t.set_rotation_quat(q);
        let expected = Mat4::from_quat(q);
        assert!(
            t.rotation_matrix().abs_diff_eq(expected, EPSILON),
            "Expected {:?}, got {:?}",
            expected,
            t.rotation_matrix()
        );
    }
}

#[test]
fn test_basis_is_orthonormal() {
    for q in sample_rotations() {
        let t = Transform::new().with_rotation(q);
        let (f, r, u) = (t.forward(), t.right(), t.up());

        assert_abs_diff_eq!(f.length(), 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(r.length(), 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(u.length(), 1.0, epsilon = EPSILON);
        assert_abs_diff_eq!(f.dot(r), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(f.dot(u), 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(r.dot(u), 0.0, epsilon = EPSILON);
        // Right-handed: right x up = back.
        assert!(r.cross(u).abs_diff_eq(-f, EPSILON));
    }
}

#[test]
fn test_decompose_reconstructs_matrix() {
    let scales = [Vec3::ONE, Vec3::new(2.0, 0.5, 3.0), Vec3::splat(0.25)];
    let positions = [Vec3::ZERO, Vec3::new(-4.0, 1.0, 7.5)];

    for q in sample_rotations() {
        for scale in scales {
            for position in positions {
                let m = Mat4::from_scale_rotation_translation(scale, q, position);
                let mut t = Transform::new();
                t.set_local_to_world_matrix(m);
                assert!(
                    t.local_to_world_matrix().abs_diff_eq(m, 1e-4),
                    "Expected {:?}, got {:?}",
                    m,
                    t.local_to_world_matrix()
                );
            }
        }
    }
}

#[test]
fn test_lazy_matrix_is_idempotent() {
    let mut t = Transform::new();
    t.set_position(Vec3::new(0.1, 0.2, 0.3));
    t.set_rotation_euler(Vec3::new(0.7, 0.1, -0.2));
    t.set_scale(Vec3::new(1.5, 1.0, 0.75));

    let a = t.local_to_world_matrix().to_cols_array();
    let b = t.local_to_world_matrix().to_cols_array();
    assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));

    let c = t.world_to_local_matrix().to_cols_array();
    let d = t.world_to_local_matrix().to_cols_array();
    assert_eq!(c.map(f32::to_bits), d.map(f32::to_bits));
}

#[test]
fn test_camera_look_at_scenario() {
    let mut camera = Camera::default();
    camera
        .transform
        .look_at_from(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
        .unwrap();

    let forward = camera.transform.forward();
    assert!(
        forward.abs_diff_eq(Vec3::NEG_Z, EPSILON),
        "Expected (0, 0, -1), got {:?}",
        forward
    );

    let view = camera.view_matrix();
    let eye_in_view = view.transform_point3(Vec3::new(0.0, 0.0, 5.0));
    assert!(eye_in_view.abs_diff_eq(Vec3::ZERO, EPSILON));

    let eye_in_world = view.inverse().transform_point3(Vec3::ZERO);
    assert!(
        eye_in_world.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), EPSILON),
        "Expected (0, 0, 5), got {:?}",
        eye_in_world
    );
}

#[test]
fn test_view_is_inverse_of_rigid_transform() {
    for q in sample_rotations() {
        let mut camera = Camera::default();
        camera.transform.set_rotation_quat(q);
        camera.transform.set_position(Vec3::new(3.0, -1.0, 2.0));

        let view = camera.view_matrix();
        let expected = camera.transform.world_to_local_matrix();
        assert!(
            view.abs_diff_eq(expected, 1e-4),
            "Expected {:?}, got {:?}",
            expected,
            view
        );
    }
}
