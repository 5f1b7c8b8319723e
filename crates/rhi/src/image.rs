//! GPU images with allocator-managed memory and a single 2D view.
//!
//! Used for depth attachments and sampled textures. Swapchain images are
//! owned by the swapchain and never wrapped here.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::command::CommandBuffer;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Creation parameters for an [`Image`].
#[derive(Clone, Copy, Debug)]
pub struct ImageDesc {
    pub extent: vk::Extent2D,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    /// Aspect of the view and of layout transitions.
    pub aspect: vk::ImageAspectFlags,
    /// Allocation name, shown in allocator reports.
    pub name: &'static str,
}

impl ImageDesc {
    /// A depth attachment of `extent` in `format`.
    pub fn depth_attachment(extent: vk::Extent2D, format: vk::Format) -> Self {
        Self {
            extent,
            format,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            aspect: vk::ImageAspectFlags::DEPTH,
            name: "depth",
        }
    }

    /// A sampled RGBA8 sRGB texture filled by a transfer.
    pub fn sampled_texture(extent: vk::Extent2D) -> Self {
        Self {
            extent,
            format: vk::Format::R8G8B8A8_SRGB,
            usage: vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            aspect: vk::ImageAspectFlags::COLOR,
            name: "texture",
        }
    }
}

/// Access masks and pipeline stages for one supported layout transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutTransition {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

/// Barrier parameters for the transitions used by texture uploads.
///
/// Returns `None` for any other pair of layouts.
pub fn layout_transition(
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> Option<LayoutTransition> {
    match (old_layout, new_layout) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => {
            Some(LayoutTransition {
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::TRANSFER_WRITE,
                src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
                dst_stage: vk::PipelineStageFlags::TRANSFER,
            })
        }
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Some(LayoutTransition {
                src_access: vk::AccessFlags::TRANSFER_WRITE,
                dst_access: vk::AccessFlags::SHADER_READ,
                src_stage: vk::PipelineStageFlags::TRANSFER,
                dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
            })
        }
        _ => None,
    }
}

/// 2D image, its memory, and a view over the whole image.
pub struct Image {
    device: Arc<Device>,
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
    desc: ImageDesc,
}

impl Image {
    /// Creates a device-local image in `UNDEFINED` layout and its view.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero extent, or if image creation, allocation,
    /// binding, or view creation fails.
    pub fn new(device: Arc<Device>, desc: &ImageDesc) -> RhiResult<Self> {
        let vk::Extent2D { width, height } = desc.extent;
        if width == 0 || height == 0 {
            return Err(RhiError::ResourceError(format!(
                "Cannot create a {}x{} {} image",
                width, height, desc.name
            )));
        }

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(desc.format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(desc.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: desc.name,
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
        };
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.handle().destroy_image(image, None) };
                return Err(e.into());
            }
        };

        // From here on, Drop releases what exists.
        let mut this = Self {
            device,
            image,
            view: vk::ImageView::null(),
            allocation: Some(allocation),
            desc: *desc,
        };
        if let Some(allocation) = &this.allocation {
            unsafe {
                this.device.handle().bind_image_memory(
                    image,
                    allocation.memory(),
                    allocation.offset(),
                )?;
            }
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(desc.format)
            .subresource_range(this.subresource_range());
        this.view = unsafe { this.device.handle().create_image_view(&view_info, None)? };

        debug!(
            "Created {} image: {}x{} ({:?})",
            desc.name, width, height, desc.format
        );
        Ok(this)
    }

    /// Records a barrier moving the whole image from `old_layout` to
    /// `new_layout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is not one of the supported pairs.
    pub fn record_transition(
        &self,
        cmd: &CommandBuffer,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) -> RhiResult<()> {
        let transition = layout_transition(old_layout, new_layout).ok_or_else(|| {
            RhiError::ResourceError(format!(
                "Unsupported layout transition {:?} -> {:?}",
                old_layout, new_layout
            ))
        })?;

        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(self.subresource_range())
            .src_access_mask(transition.src_access)
            .dst_access_mask(transition.dst_access);

        cmd.pipeline_barrier(transition.src_stage, transition.dst_stage, &[barrier]);
        Ok(())
    }

    fn subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange::default()
            .aspect_mask(self.desc.aspect)
            .level_count(1)
            .layer_count(1)
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.desc.format
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.desc.extent
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.device.handle().destroy_image_view(self.view, None);
            }
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                error!("Failed to free {} image allocation: {:?}", self.desc.name, e);
            }
        }

        debug!(
            "Destroyed {} image: {}x{}",
            self.desc.name, self.desc.extent.width, self.desc.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_transitions() {
        let to_transfer = layout_transition(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )
        .unwrap();
        assert_eq!(to_transfer.src_access, vk::AccessFlags::empty());
        assert_eq!(to_transfer.dst_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(to_transfer.dst_stage, vk::PipelineStageFlags::TRANSFER);

        let to_shader = layout_transition(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
        .unwrap();
        assert_eq!(to_shader.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(to_shader.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
        assert_eq!(to_shader.dst_access, vk::AccessFlags::SHADER_READ);
    }

    #[test]
    fn test_unsupported_transition() {
        assert!(
            layout_transition(
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            )
            .is_none()
        );
    }

    #[test]
    fn test_image_descs() {
        let extent = vk::Extent2D {
            width: 4,
            height: 4,
        };
        let depth = ImageDesc::depth_attachment(extent, vk::Format::D32_SFLOAT);
        assert_eq!(depth.aspect, vk::ImageAspectFlags::DEPTH);
        assert!(depth.usage.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT));

        let texture = ImageDesc::sampled_texture(extent);
        assert_eq!(texture.format, vk::Format::R8G8B8A8_SRGB);
        assert!(
            texture
                .usage
                .contains(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
        );
    }

    #[test]
    fn test_image_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Image>();
    }
}
