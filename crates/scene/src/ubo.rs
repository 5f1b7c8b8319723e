//! Uniform buffer payloads shared with the GLSL shaders.
//!
//! All structures use `#[repr(C)]` for predictable memory layout and implement
//! `Pod` and `Zeroable` for safe byte casting. Every matrix is a `mat4` column
//! array, so each row of the std140 layout is 16-byte aligned.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Camera uniform buffer data, `binding = 0`.
///
/// # Memory Layout
///
/// - Offset 0: view matrix (64 bytes)
/// - Offset 64: projection matrix (64 bytes)
/// - Total size: 128 bytes
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUbo {
    /// World to view space.
    pub view: Mat4,
    /// View to clip space.
    pub proj: Mat4,
}

impl CameraUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(view: Mat4, proj: Mat4) -> Self {
        Self { view, proj }
    }
}

impl Default for CameraUbo {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Per-object uniform buffer data, `binding = 2` (dynamic).
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Total size: 64 bytes
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUbo {
    /// Object to world space.
    pub model: Mat4,
}

impl ObjectUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(model: Mat4) -> Self {
        Self { model }
    }
}

impl Default for ObjectUbo {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_ubo_size() {
        assert_eq!(CameraUbo::SIZE, 128);
        assert_eq!(std::mem::align_of::<CameraUbo>(), 16);
    }

    #[test]
    fn test_object_ubo_size() {
        assert_eq!(ObjectUbo::SIZE, 64);
        assert_eq!(std::mem::align_of::<ObjectUbo>(), 16);
    }

    #[test]
    fn test_ubo_bytes() {
        let camera = CameraUbo::default();
        let bytes: &[u8] = bytemuck::bytes_of(&camera);
        assert_eq!(bytes.len(), CameraUbo::SIZE);

        let object = ObjectUbo::new(Mat4::from_translation(glam::Vec3::X));
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&object));
        // Translation lives in the fourth column.
        assert_eq!(floats[12], 1.0);
    }
}
