//! Scene components.
//!
//! This crate provides the objects the renderer draws:
//! - [`Transform`] with lazily cached matrices and basis vectors
//! - [`Camera`] with view and projection derivation
//! - [`RenderObject`] producing a per-instance model matrix
//! - GPU uniform payloads ([`CameraUbo`], [`ObjectUbo`])

pub mod camera;
pub mod render_object;
pub mod transform;
pub mod ubo;

pub use camera::Camera;
pub use render_object::RenderObject;
pub use transform::{LookAtError, Transform};
pub use ubo::{CameraUbo, ObjectUbo};
