//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Safe RAII wrappers over Vulkan using the `ash` crate:
//! - Instance, physical device selection and logical device
//! - Swapchain creation, acquire and present
//! - Command pools and buffers
//! - Buffers, images, samplers and descriptors
//! - Render pass, framebuffers and graphics pipelines
//! - Semaphores and fences

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod sampler;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
