//! Depth buffer management.
//!
//! - [`DepthBuffer`] is a GPU-only depth image with its view, recreated
//!   with the swapchain.
//! - [`find_depth_format`] picks the first supported format from
//!   [`DEPTH_FORMAT_CANDIDATES`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use vkengine_rhi::device::Device;
//! use vkengine_rhi::instance::Instance;
//! use vkengine_renderer::depth_buffer::{DepthBuffer, find_depth_format};
//!
//! # fn example(instance: &Instance, device: Arc<Device>) -> Result<(), vkengine_rhi::RhiError> {
//! let format = find_depth_format(instance, &device)?;
//! let extent = vk::Extent2D { width: 1920, height: 1080 };
//! let depth_buffer = DepthBuffer::new(device, extent, format)?;
//! let view = depth_buffer.view();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use vkengine_rhi::device::Device;
use vkengine_rhi::image::{Image, ImageDesc};
use vkengine_rhi::instance::Instance;
use vkengine_rhi::{RhiError, RhiResult};

/// Depth formats in order of preference.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First candidate whose optimal-tiling features allow depth attachments.
pub fn select_depth_format(
    optimal_tiling_features: impl Fn(vk::Format) -> vk::FormatFeatureFlags,
) -> Option<vk::Format> {
    DEPTH_FORMAT_CANDIDATES.into_iter().find(|&format| {
        optimal_tiling_features(format).contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    })
}

/// Queries the device for a usable depth format.
///
/// # Errors
///
/// Returns [`RhiError::ResourceError`] if none of the candidates is
/// supported.
pub fn find_depth_format(instance: &Instance, device: &Device) -> RhiResult<vk::Format> {
    let format = select_depth_format(|format| unsafe {
        instance
            .handle()
            .get_physical_device_format_properties(device.physical_device(), format)
            .optimal_tiling_features
    })
    .ok_or_else(|| RhiError::ResourceError("No supported depth format".to_string()))?;

    info!("Selected depth format {:?}", format);
    Ok(format)
}

/// Depth attachment matching the swapchain extent.
pub struct DepthBuffer {
    image: Image,
}

impl DepthBuffer {
    /// # Errors
    ///
    /// Returns an error for a zero extent or if allocation fails.
    pub fn new(device: Arc<Device>, extent: vk::Extent2D, format: vk::Format) -> RhiResult<Self> {
        let image = Image::new(device, &ImageDesc::depth_attachment(extent, format))?;
        debug!(
            "Created depth buffer: {}x{} {:?}",
            extent.width, extent.height, format
        );
        Ok(Self { image })
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}
