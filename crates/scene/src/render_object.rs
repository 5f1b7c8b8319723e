//! Drawable object: a [`Transform`] plus per-object animation state.

use glam::Vec3;

use crate::transform::Transform;
use crate::ubo::ObjectUbo;

/// One drawable instance of the scene mesh.
#[derive(Clone, Debug, Default)]
pub struct RenderObject {
    pub transform: Transform,
    /// Application-defined phase offset, in radians, for per-object animation.
    pub animation_offset: f32,
}

impl RenderObject {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            animation_offset: 0.0,
        }
    }

    /// Create a render object at `position` with unit scale.
    pub fn at(position: Vec3) -> Self {
        Self::new(Transform::new().with_position(position))
    }

    pub fn with_animation_offset(mut self, offset: f32) -> Self {
        self.animation_offset = offset;
        self
    }

    /// Model matrix payload for the dynamic object uniform buffer.
    pub fn uniform_buffer_object(&self) -> ObjectUbo {
        ObjectUbo::new(self.transform.local_to_world_matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Quat};

    #[test]
    fn test_ubo_matches_transform() {
        let mut object = RenderObject::at(Vec3::new(1.0, 2.0, 3.0));
        object.transform.set_rotation_quat(Quat::from_rotation_y(0.5));
        object.transform.set_scale(Vec3::splat(0.5));

        let ubo = object.uniform_buffer_object();
        assert_eq!(ubo.model, object.transform.local_to_world_matrix());
    }

    #[test]
    fn test_ubo_reflects_latest_mutation() {
        let mut object = RenderObject::default();
        assert_eq!(object.uniform_buffer_object().model, Mat4::IDENTITY);

        object.transform.set_position(Vec3::X);
        assert_eq!(
            object.uniform_buffer_object().model,
            Mat4::from_translation(Vec3::X)
        );
    }

    #[test]
    fn test_animation_offset() {
        let object = RenderObject::default().with_animation_offset(1.5);
        assert_eq!(object.animation_offset, 1.5);
    }
}
