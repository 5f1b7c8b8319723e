//! Swapchain lifecycle.
//!
//! ```text
//! Valid --(resize | out of date | suboptimal)--> Invalid --> Recreating --> Valid
//! ```
//!
//! Recreation waits for the device to go idle, destroys every resource that
//! depends on the swapchain, and builds them again for the surface's current
//! extent. A zero extent (minimized window) is never passed on: the
//! controller polls the [`SurfaceExtentSource`] until the window has a size
//! again, or leaves the swapchain invalid when the source cannot block.

use ash::vk;
use tracing::{debug, info, warn};

/// Where the surface's current framebuffer size comes from.
pub trait SurfaceExtentSource {
    fn current_extent(&self) -> vk::Extent2D;

    /// Blocks until new window events arrive.
    ///
    /// Returns `false` when the source cannot block (for example inside an
    /// event loop callback); recreation is then retried on the next frame.
    fn wait_for_events(&self) -> bool;
}

/// Resources that live and die with the swapchain.
pub trait SwapchainTarget {
    type Error;

    /// Waits until no submitted work references the old resources.
    fn wait_idle(&mut self) -> Result<(), Self::Error>;

    /// Destroys framebuffers, depth image, image views and the swapchain.
    fn destroy_resources(&mut self);

    /// Rebuilds swapchain, image views, depth image and framebuffers, in that
    /// order, for a non-zero `extent`.
    fn create_resources(&mut self, extent: vk::Extent2D) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapchainState {
    Valid,
    Invalid,
    Recreating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecreateOutcome {
    Recreated(vk::Extent2D),
    /// The surface still has a zero extent; the swapchain stays invalid.
    Deferred,
}

#[derive(Debug)]
pub struct SwapchainController {
    state: SwapchainState,
    recreations: u64,
}

impl Default for SwapchainController {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapchainController {
    /// Starts `Valid`: the initial swapchain is built with the renderer.
    pub fn new() -> Self {
        Self {
            state: SwapchainState::Valid,
            recreations: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> SwapchainState {
        self.state
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state == SwapchainState::Valid
    }

    /// Number of completed recreations.
    #[inline]
    pub fn recreations(&self) -> u64 {
        self.recreations
    }

    /// Marks the swapchain stale.
    pub fn invalidate(&mut self, reason: &str) {
        if self.state == SwapchainState::Valid {
            debug!("Swapchain invalidated: {}", reason);
        }
        self.state = SwapchainState::Invalid;
    }

    /// Recreates the target's swapchain resources.
    ///
    /// # Errors
    ///
    /// Returns the target's error; the swapchain is then left `Invalid` and
    /// the error is fatal to the caller.
    pub fn recreate<S, T>(
        &mut self,
        source: &S,
        target: &mut T,
    ) -> Result<RecreateOutcome, T::Error>
    where
        S: SurfaceExtentSource + ?Sized,
        T: SwapchainTarget + ?Sized,
    {
        self.state = SwapchainState::Invalid;

        let extent = loop {
            let extent = source.current_extent();
            if extent.width > 0 && extent.height > 0 {
                break extent;
            }
            if !source.wait_for_events() {
                debug!("Surface extent is zero, deferring swapchain recreation");
                return Ok(RecreateOutcome::Deferred);
            }
        };

        self.state = SwapchainState::Recreating;
        target.wait_idle()?;
        target.destroy_resources();
        if let Err(e) = target.create_resources(extent) {
            warn!("Swapchain recreation failed");
            self.state = SwapchainState::Invalid;
            return Err(e);
        }

        self.state = SwapchainState::Valid;
        self.recreations += 1;
        info!(
            "Swapchain recreated at {}x{}",
            extent.width, extent.height
        );
        Ok(RecreateOutcome::Recreated(extent))
    }
}
