//! Frame-in-flight ring.
//!
//! The renderer keeps [`crate::MAX_FRAMES_IN_FLIGHT`] sets of per-frame
//! resources and cycles through them. While the GPU executes frame N the CPU
//! records frame N+1 into the next slot; the slot's fence is the only point
//! where the CPU waits for the GPU.
//!
//! # Synchronization Flow
//!
//! ```text
//! 1. Wait on in_flight_fence (previous use of this slot has finished)
//! 2. Acquire swapchain image (signals present_semaphore)
//! 3. Write uniforms, reset fence, record command_buffer
//! 4. Submit:
//!    - wait on present_semaphore
//!    - signal render_semaphore and in_flight_fence
//! 5. Present (waits on render_semaphore)
//! 6. Advance to the next slot
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use vkengine_rhi::RhiResult;
use vkengine_rhi::buffer::{Buffer, BufferUsage};
use vkengine_rhi::command::{CommandBuffer, CommandPool};
use vkengine_rhi::device::Device;
use vkengine_rhi::sync::{Fence, Semaphore, WAIT_FOREVER};
use vkengine_scene::CameraUbo;

use crate::uniform::DynamicUniformLayout;

/// CPU-side view of a slot's completion fence.
pub trait FrameFence {
    type Error;

    /// Blocks until the GPU has finished the slot's last submission.
    fn wait(&self) -> Result<(), Self::Error>;

    /// Unsignals the fence. Only valid after a successful wait.
    fn reset(&self) -> Result<(), Self::Error>;
}

impl FrameFence for Fence {
    type Error = vkengine_rhi::RhiError;

    fn wait(&self) -> RhiResult<()> {
        Fence::wait(self, WAIT_FOREVER)
    }

    fn reset(&self) -> RhiResult<()> {
        Fence::reset(self)
    }
}

/// A slot that is fenced per submission.
pub trait InFlight {
    type Fence: FrameFence;

    fn in_flight_fence(&self) -> &Self::Fence;
}

/// Fixed ring of per-frame slots with a cursor.
#[derive(Debug)]
pub struct FrameRing<T> {
    slots: Vec<T>,
    current: usize,
}

impl<T> FrameRing<T> {
    /// # Panics
    ///
    /// Panics if `slots` is empty.
    pub fn new(slots: Vec<T>) -> Self {
        assert!(!slots.is_empty(), "A frame ring needs at least one slot");
        Self { slots, current: 0 }
    }

    /// Builds `count` slots with `make`, stopping at the first error.
    pub fn try_from_fn<E>(
        count: usize,
        mut make: impl FnMut(usize) -> Result<T, E>,
    ) -> Result<Self, E> {
        let slots = (0..count).map(&mut make).collect::<Result<Vec<_>, E>>()?;
        Ok(Self::new(slots))
    }

    #[inline]
    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Moves the cursor to the next slot, wrapping around.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

impl<T: InFlight> FrameRing<T> {
    /// Blocks until the current slot is free to reuse.
    pub fn wait_current(&self) -> Result<(), <T::Fence as FrameFence>::Error> {
        self.current().in_flight_fence().wait()
    }

    pub fn reset_current(&self) -> Result<(), <T::Fence as FrameFence>::Error> {
        self.current().in_flight_fence().reset()
    }
}

/// Per-frame GPU resources of one ring slot.
pub struct FrameData {
    command_buffer: CommandBuffer,
    /// Signaled when the acquired swapchain image may be written.
    present_semaphore: Semaphore,
    /// Signaled when rendering has finished and the image may be presented.
    render_semaphore: Semaphore,
    /// Created signaled so the first wait returns immediately.
    in_flight_fence: Fence,
    camera_buffer: Buffer,
    /// One aligned [`ObjectUbo`](vkengine_scene::ObjectUbo) per drawn object.
    object_buffer: Buffer,
    descriptor_set: vk::DescriptorSet,
}

impl FrameData {
    pub fn new(
        device: Arc<Device>,
        command_pool: &CommandPool,
        descriptor_set: vk::DescriptorSet,
        object_layout: &DynamicUniformLayout,
    ) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), command_pool)?;
        let present_semaphore = Semaphore::new(device.clone())?;
        let render_semaphore = Semaphore::new(device.clone())?;
        let in_flight_fence = Fence::new(device.clone(), true)?;
        let camera_buffer = Buffer::new(
            device.clone(),
            BufferUsage::Uniform,
            CameraUbo::SIZE as vk::DeviceSize,
        )?;
        let object_buffer = Buffer::new(device, BufferUsage::Uniform, object_layout.buffer_size())?;

        debug!(
            "Created frame data ({} byte object buffer)",
            object_layout.buffer_size()
        );

        Ok(Self {
            command_buffer,
            present_semaphore,
            render_semaphore,
            in_flight_fence,
            camera_buffer,
            object_buffer,
            descriptor_set,
        })
    }

    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    #[inline]
    pub fn present_semaphore(&self) -> &Semaphore {
        &self.present_semaphore
    }

    #[inline]
    pub fn render_semaphore(&self) -> &Semaphore {
        &self.render_semaphore
    }

    #[inline]
    pub fn camera_buffer(&self) -> &Buffer {
        &self.camera_buffer
    }

    #[inline]
    pub fn object_buffer(&self) -> &Buffer {
        &self.object_buffer
    }

    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }
}

impl InFlight for FrameData {
    type Fence = Fence;

    fn in_flight_fence(&self) -> &Fence {
        &self.in_flight_fence
    }
}
