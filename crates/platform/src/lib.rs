//! Platform layer for the vkengine renderer.
//!
//! - Window management via winit
//! - Vulkan surface creation
//! - Keyboard and mouse input state

mod input;
mod window;

pub use input::{InputState, KeyCode, MouseButton};
pub use window::{Surface, Window};

