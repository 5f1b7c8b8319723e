//! Rendering on top of the RHI.
//!
//! - Frame-in-flight ring and per-frame resources
//! - Swapchain lifecycle controller
//! - The per-frame draw loop and its GPU backend
//! - Dynamic uniform layout, depth buffer, mesh and texture uploads

pub mod depth_buffer;
pub mod draw_loop;
pub mod frame_manager;
pub mod mesh;
pub mod renderer;
pub mod swapchain_controller;
pub mod texture;
pub mod uniform;

pub use draw_loop::{DrawLoop, FrameBackend, FrameOutcome, FrameScene};
pub use frame_manager::{FrameFence, FrameRing, InFlight};
pub use renderer::Renderer;
pub use swapchain_controller::{
    RecreateOutcome, SurfaceExtentSource, SwapchainController, SwapchainState, SwapchainTarget,
};
pub use uniform::DynamicUniformLayout;

/// Default number of frames the CPU may record ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Default capacity of the per-frame object uniform buffer.
pub const MAX_INSTANCE_COUNT: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;
    use vkengine_core::RendererConfig;

    #[test]
    fn test_defaults_match_config() {
        let config = RendererConfig::default();
        assert_eq!(config.max_frames_in_flight, MAX_FRAMES_IN_FLIGHT);
        assert_eq!(config.max_instance_count, MAX_INSTANCE_COUNT);
    }
}
