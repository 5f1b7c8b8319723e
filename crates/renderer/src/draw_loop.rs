//! Per-frame draw algorithm.
//!
//! [`DrawLoop::draw_frame`] drives a [`FrameBackend`] through one frame:
//!
//! 1. wait on the current slot's fence
//! 2. acquire a swapchain image; out of date abandons the frame
//! 3. write camera and object uniforms into the slot's mapped buffers
//! 4. reset the fence, then reset and record the command buffer
//! 5. submit
//! 6. present; stale, suboptimal or resized recreates the swapchain
//! 7. advance the ring
//!
//! The fence is reset only once the frame is certain to be submitted, so an
//! abandoned frame leaves the slot signaled for the next attempt.

use tracing::{debug, trace};

use vkengine_rhi::swapchain::AcquireResult;
use vkengine_scene::{Camera, RenderObject};

use crate::swapchain_controller::{
    RecreateOutcome, SurfaceExtentSource, SwapchainController, SwapchainTarget,
};

/// What one frame draws.
#[derive(Clone, Copy)]
pub struct FrameScene<'a> {
    pub camera: &'a Camera,
    pub objects: &'a [RenderObject],
}

/// GPU side of the draw loop. Every method acts on the ring's current slot.
pub trait FrameBackend: SwapchainTarget {
    fn wait_for_frame(&mut self) -> Result<(), Self::Error>;

    fn acquire_next_image(&mut self) -> Result<AcquireResult, Self::Error>;

    fn update_uniforms(&mut self, scene: &FrameScene<'_>) -> Result<(), Self::Error>;

    /// Resets the slot's fence and command buffer.
    fn reset_frame(&mut self) -> Result<(), Self::Error>;

    fn record_commands(
        &mut self,
        image_index: u32,
        scene: &FrameScene<'_>,
    ) -> Result<(), Self::Error>;

    fn submit(&mut self) -> Result<(), Self::Error>;

    /// Returns `true` if the swapchain should be recreated.
    fn present(&mut self, image_index: u32) -> Result<bool, Self::Error>;

    fn advance_frame(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// The frame was presented and the swapchain was recreated during it,
    /// either before drawing or after presenting.
    PresentedAndRecreated,
    /// Acquire reported out of date; the swapchain was recreated instead.
    SwapchainRecreated,
    /// Nothing was drawn because the surface has no area.
    Skipped,
}

/// Draw-loop state owned by the renderer.
#[derive(Debug, Default)]
pub struct DrawLoop {
    framebuffer_resized: bool,
    swapchain: SwapchainController,
}

impl DrawLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set by the windowing layer; consumed after the next present.
    pub fn set_framebuffer_resized(&mut self, resized: bool) {
        self.framebuffer_resized = resized;
    }

    #[inline]
    pub fn framebuffer_resized(&self) -> bool {
        self.framebuffer_resized
    }

    #[inline]
    pub fn swapchain(&self) -> &SwapchainController {
        &self.swapchain
    }

    /// Draws one frame.
    ///
    /// # Errors
    ///
    /// Any backend error is unrecoverable. Out-of-date and suboptimal
    /// swapchains are handled here and never reported as errors.
    pub fn draw_frame<B, S>(
        &mut self,
        backend: &mut B,
        source: &S,
        scene: &FrameScene<'_>,
    ) -> Result<FrameOutcome, B::Error>
    where
        B: FrameBackend + ?Sized,
        S: SurfaceExtentSource + ?Sized,
    {
        // A deferred recreation that completes here still changes the extent.
        let mut recreated = false;
        if !self.swapchain.is_valid() {
            match self.swapchain.recreate(source, backend)? {
                RecreateOutcome::Recreated(_) => recreated = true,
                RecreateOutcome::Deferred => return Ok(FrameOutcome::Skipped),
            }
        }

        backend.wait_for_frame()?;

        let (image_index, suboptimal) = match backend.acquire_next_image()? {
            AcquireResult::Acquired {
                image_index,
                suboptimal,
            } => (image_index, suboptimal),
            AcquireResult::OutOfDate => {
                self.swapchain.invalidate("out of date on acquire");
                return Ok(match self.swapchain.recreate(source, backend)? {
                    RecreateOutcome::Recreated(_) => FrameOutcome::SwapchainRecreated,
                    RecreateOutcome::Deferred => FrameOutcome::Skipped,
                });
            }
        };
        trace!("Acquired swapchain image {}", image_index);

        backend.update_uniforms(scene)?;
        backend.reset_frame()?;
        backend.record_commands(image_index, scene)?;
        backend.submit()?;
        let stale = backend.present(image_index)?;
        backend.advance_frame();

        if stale || suboptimal || self.framebuffer_resized {
            debug!(
                "Recreating after present (stale={}, suboptimal={}, resized={})",
                stale, suboptimal, self.framebuffer_resized
            );
            self.framebuffer_resized = false;
            self.swapchain.invalidate("stale after present");
            if let RecreateOutcome::Recreated(_) = self.swapchain.recreate(source, backend)? {
                recreated = true;
            }
        }

        Ok(if recreated {
            FrameOutcome::PresentedAndRecreated
        } else {
            FrameOutcome::Presented
        })
    }
}
