//! GPU buffer management.
//!
//! Vertex, index, uniform, and staging buffers backed by gpu-allocator.
//! Vertex and index data live in device-local memory and are filled through a
//! staging copy; uniform buffers stay persistently mapped so they can be
//! rewritten every frame.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkengine_rhi::buffer::{Buffer, BufferUsage};
//! use vkengine_rhi::command::CommandPool;
//! use vkengine_rhi::device::Device;
//!
//! # fn example(device: Arc<Device>, transfer_pool: &CommandPool) -> Result<(), vkengine_rhi::RhiError> {
//! let indices: [u32; 3] = [0, 1, 2];
//! let index_buffer = Buffer::new_device_local(
//!     device,
//!     transfer_pool,
//!     BufferUsage::Index,
//!     bytemuck::cast_slice(&indices),
//! )?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use bytemuck::Pod;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Rounds `size` up to the next multiple of `min_alignment`.
///
/// `min_alignment` must be zero or a power of two, which Vulkan guarantees
/// for `minUniformBufferOffsetAlignment`. Zero means no requirement.
#[inline]
pub const fn aligned_size(size: vk::DeviceSize, min_alignment: vk::DeviceSize) -> vk::DeviceSize {
    if min_alignment == 0 {
        return size;
    }
    (size + min_alignment - 1) & !(min_alignment - 1)
}

/// Buffer usage type.
///
/// Selects the Vulkan usage flags and the memory location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Device-local vertex data, filled by a transfer.
    Vertex,
    /// Device-local index data, filled by a transfer.
    Index,
    /// Host-visible uniform data, rewritten by the CPU.
    Uniform,
    /// Host-visible transfer source.
    Staging,
}

impl BufferUsage {
    /// Converts to Vulkan buffer usage flags.
    pub fn to_vk_usage(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Vertex => {
                vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
            }
            BufferUsage::Index => {
                vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
            }
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Staging => vk::BufferUsageFlags::TRANSFER_SRC,
        }
    }

    /// Returns the preferred memory location for this buffer type.
    pub fn memory_location(self) -> MemoryLocation {
        match self {
            BufferUsage::Vertex | BufferUsage::Index => MemoryLocation::GpuOnly,
            BufferUsage::Uniform | BufferUsage::Staging => MemoryLocation::CpuToGpu,
        }
    }

    /// Buffers written by the transfer queue and read by the graphics queue.
    #[inline]
    pub fn is_transfer_destination(self) -> bool {
        matches!(self, BufferUsage::Vertex | BufferUsage::Index)
    }

    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::Vertex => "vertex",
            BufferUsage::Index => "index",
            BufferUsage::Uniform => "uniform",
            BufferUsage::Staging => "staging",
        }
    }
}

/// GPU buffer wrapper with managed memory.
///
/// # Thread Safety
///
/// Writes through the mapping are not synchronized. The caller guarantees
/// that the GPU is not reading the written range.
pub struct Buffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    /// Taken in Drop.
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    usage: BufferUsage,
}

impl Buffer {
    /// Creates a new buffer with the specified size.
    ///
    /// When the device has a separate transfer family, transfer destinations
    /// are shared concurrently between it and the graphics family.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero size or if buffer or memory allocation fails.
    pub fn new(device: Arc<Device>, usage: BufferUsage, size: vk::DeviceSize) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::ResourceError(format!(
                "Cannot create an empty {} buffer",
                usage.name()
            )));
        }

        let concurrent = usage
            .is_transfer_destination()
            .then(|| device.concurrent_families())
            .flatten();
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage.to_vk_usage());
        let buffer_info = match &concurrent {
            Some(families) => buffer_info
                .sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(families),
            None => buffer_info.sharing_mode(vk::SharingMode::EXCLUSIVE),
        };

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: usage.name(),
                requirements,
                location: usage.memory_location(),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
        };
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.handle().destroy_buffer(buffer, None) };
                return Err(e.into());
            }
        };

        // Constructed before binding so Drop releases both on failure.
        let this = Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            usage,
        };
        if let Some(allocation) = &this.allocation {
            unsafe {
                this.device.handle().bind_buffer_memory(
                    buffer,
                    allocation.memory(),
                    allocation.offset(),
                )?;
            }
        }

        debug!(
            "Created {} buffer: {} bytes{}",
            usage.name(),
            size,
            if concurrent.is_some() { " (concurrent)" } else { "" }
        );
        Ok(this)
    }

    /// Creates a host-visible buffer and copies `data` into it.
    pub fn new_with_data(device: Arc<Device>, usage: BufferUsage, data: &[u8]) -> RhiResult<Self> {
        let buffer = Self::new(device, usage, data.len() as vk::DeviceSize)?;
        buffer.write_data(0, data)?;
        Ok(buffer)
    }

    /// Creates a device-local buffer and fills it through a temporary staging
    /// buffer, blocking until the copy has finished.
    ///
    /// `transfer_pool` must belong to the transfer queue's family.
    pub fn new_device_local(
        device: Arc<Device>,
        transfer_pool: &CommandPool,
        usage: BufferUsage,
        data: &[u8],
    ) -> RhiResult<Self> {
        let staging = Self::new_with_data(device.clone(), BufferUsage::Staging, data)?;
        let buffer = Self::new(device.clone(), usage, data.len() as vk::DeviceSize)?;

        transfer_pool.submit_one_time(device.transfer_queue(), |cmd| {
            let region = vk::BufferCopy::default().size(staging.size());
            cmd.copy_buffer(staging.handle(), buffer.handle(), &[region]);
            Ok(())
        })?;

        debug!(
            "Uploaded {} bytes to {} buffer via staging",
            data.len(),
            usage.name()
        );
        Ok(buffer)
    }

    /// Copies `data` into the mapped memory at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is not host-visible or the write would
    /// run past the end of the buffer.
    pub fn write_data(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::ResourceError(format!(
                "Write exceeds {} buffer size: offset {} + data {} > buffer {}",
                self.usage.name(),
                offset,
                data.len(),
                self.size
            )));
        }

        let mapped_ptr = self
            .allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .ok_or_else(|| {
                RhiError::ResourceError(format!("{} buffer is not mapped", self.usage.name()))
            })?;

        unsafe {
            let dst = mapped_ptr.as_ptr().cast::<u8>().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }

        Ok(())
    }

    /// Writes one plain-old-data value at byte `offset`.
    #[inline]
    pub fn write<T: Pod>(&self, offset: vk::DeviceSize, value: &T) -> RhiResult<()> {
        self.write_data(offset, bytemuck::bytes_of(value))
    }

    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                error!("Failed to free buffer allocation: {:?}", e);
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed {} buffer", self.usage.name());
    }
}
