//! Descriptor set layouts, pools, and update helpers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use vkengine_rhi::descriptor::{self, DescriptorPool, DescriptorSetLayout};
//! use vkengine_rhi::device::Device;
//!
//! # fn example(device: Arc<Device>) -> Result<(), vkengine_rhi::RhiError> {
//! let bindings = [
//!     descriptor::uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX),
//!     descriptor::uniform_buffer_dynamic_binding(1, vk::ShaderStageFlags::VERTEX),
//! ];
//! let layout = DescriptorSetLayout::new(device.clone(), &bindings)?;
//!
//! // One set per frame in flight.
//! let pool = DescriptorPool::for_layout(device.clone(), &bindings, 2)?;
//! let sets = pool.allocate(&[layout.handle(); 2])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Descriptor set layout wrapper. Immutable after creation.
pub struct DescriptorSetLayout {
    device: Arc<Device>,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool. Sets allocated from it are released with the pool.
///
/// # Thread Safety
///
/// Allocation is not synchronized; the render thread owns the pool.
pub struct DescriptorPool {
    device: Arc<Device>,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Creates a pool large enough for `set_count` sets of the layout
    /// described by `bindings`.
    pub fn for_layout(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
        set_count: u32,
    ) -> RhiResult<Self> {
        let pool_sizes = pool_sizes_for(bindings, set_count);
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(set_count)
            .pool_sizes(&pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool for {} set(s) over {} descriptor type(s)",
            set_count,
            pool_sizes.len()
        );

        Ok(Self { device, pool })
    }

    /// Allocates one set per entry in `layouts`.
    ///
    /// # Errors
    ///
    /// Returns `ERROR_OUT_OF_POOL_MEMORY` when the pool is exhausted.
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Pool sizes covering `set_count` copies of `bindings`, one entry per
/// descriptor type in first-seen order.
pub fn pool_sizes_for(
    bindings: &[vk::DescriptorSetLayoutBinding],
    set_count: u32,
) -> Vec<vk::DescriptorPoolSize> {
    let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
    for binding in bindings {
        let count = binding.descriptor_count * set_count;
        match sizes.iter_mut().find(|s| s.ty == binding.descriptor_type) {
            Some(size) => size.descriptor_count += count,
            None => sizes.push(
                vk::DescriptorPoolSize::default()
                    .ty(binding.descriptor_type)
                    .descriptor_count(count),
            ),
        }
    }
    sizes
}

/// Applies descriptor writes. No-op for an empty slice.
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    if writes.is_empty() {
        return;
    }

    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }

    debug!("Applied {} descriptor write(s)", writes.len());
}

#[inline]
pub fn buffer_info(
    buffer: vk::Buffer,
    offset: vk::DeviceSize,
    range: vk::DeviceSize,
) -> vk::DescriptorBufferInfo {
    vk::DescriptorBufferInfo::default()
        .buffer(buffer)
        .offset(offset)
        .range(range)
}

#[inline]
pub fn image_info(
    sampler: vk::Sampler,
    image_view: vk::ImageView,
    image_layout: vk::ImageLayout,
) -> vk::DescriptorImageInfo {
    vk::DescriptorImageInfo::default()
        .sampler(sampler)
        .image_view(image_view)
        .image_layout(image_layout)
}

fn single_binding(
    binding: u32,
    descriptor_type: vk::DescriptorType,
    stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    vk::DescriptorSetLayoutBinding::default()
        .binding(binding)
        .descriptor_type(descriptor_type)
        .descriptor_count(1)
        .stage_flags(stage_flags)
}

#[inline]
pub fn uniform_buffer_binding(
    binding: u32,
    stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    single_binding(binding, vk::DescriptorType::UNIFORM_BUFFER, stage_flags)
}

#[inline]
pub fn combined_image_sampler_binding(
    binding: u32,
    stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    single_binding(
        binding,
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        stage_flags,
    )
}

/// A uniform buffer whose offset is supplied at bind time.
#[inline]
pub fn uniform_buffer_dynamic_binding(
    binding: u32,
    stage_flags: vk::ShaderStageFlags,
) -> vk::DescriptorSetLayoutBinding<'static> {
    single_binding(
        binding,
        vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC,
        stage_flags,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_helpers() {
        let binding = uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);

        let binding = combined_image_sampler_binding(1, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);

        let binding = uniform_buffer_dynamic_binding(2, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 2);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
        );
    }

    #[test]
    fn test_pool_sizes_one_per_type() {
        let bindings = [
            uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX),
            combined_image_sampler_binding(1, vk::ShaderStageFlags::FRAGMENT),
            uniform_buffer_dynamic_binding(2, vk::ShaderStageFlags::VERTEX),
        ];
        let sizes = pool_sizes_for(&bindings, 2);
        assert_eq!(sizes.len(), 3);
        assert!(sizes.iter().all(|s| s.descriptor_count == 2));
        assert_eq!(sizes[2].ty, vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC);
    }

    #[test]
    fn test_pool_sizes_merge_repeated_types() {
        let bindings = [
            uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX),
            uniform_buffer_binding(1, vk::ShaderStageFlags::FRAGMENT),
        ];
        let sizes = pool_sizes_for(&bindings, 3);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].descriptor_count, 6);
    }

    #[test]
    fn test_buffer_info_helper() {
        let info = buffer_info(vk::Buffer::null(), 64, 128);
        assert_eq!(info.buffer, vk::Buffer::null());
        assert_eq!(info.offset, 64);
        assert_eq!(info.range, 128);
    }

    #[test]
    fn test_image_info_helper() {
        let info = image_info(
            vk::Sampler::null(),
            vk::ImageView::null(),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
        assert_eq!(info.image_view, vk::ImageView::null());
        assert_eq!(info.image_layout, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    }
}
