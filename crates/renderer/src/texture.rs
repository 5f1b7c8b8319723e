//! RGBA8 textures.
//!
//! Pixels are copied to a staging buffer, then into a sampled image with
//! layout transitions `UNDEFINED -> TRANSFER_DST -> SHADER_READ_ONLY`. The
//! upload runs on the graphics queue because the final barrier targets the
//! fragment shader stage.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use vkengine_rhi::buffer::{Buffer, BufferUsage};
use vkengine_rhi::command::CommandPool;
use vkengine_rhi::device::Device;
use vkengine_rhi::image::{Image, ImageDesc};
use vkengine_rhi::sampler::Sampler;
use vkengine_rhi::{RhiError, RhiResult};

const BYTES_PER_PIXEL: usize = 4;

/// Tightly packed RGBA8 pixels, row-major from the top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureData {
    /// # Errors
    ///
    /// Returns [`RhiError::ResourceError`] if a dimension is zero or the
    /// pixel buffer is not `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> RhiResult<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(RhiError::ResourceError(format!(
                "Texture {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// `size` x `size` checkerboard of `cell`-pixel squares, starting with
    /// `even` in the top-left corner.
    pub fn checkerboard(size: u32, cell: u32, even: [u8; 4], odd: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let pixels = (0..size)
            .flat_map(|y| (0..size).map(move |x| (x, y)))
            .flat_map(|(x, y)| {
                if (x / cell + y / cell) % 2 == 0 {
                    even
                } else {
                    odd
                }
            })
            .collect();
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.pixels
            .get(start..start + BYTES_PER_PIXEL)
            .and_then(|p| p.try_into().ok())
    }
}

/// Sampled texture plus the sampler it is read with.
pub struct Texture {
    image: Image,
    sampler: Sampler,
}

impl Texture {
    /// Uploads `data`, blocking until the copy has finished.
    ///
    /// `graphics_pool` must belong to the graphics queue family.
    pub fn upload(
        device: Arc<Device>,
        graphics_pool: &CommandPool,
        data: &TextureData,
    ) -> RhiResult<Self> {
        let extent = data.extent();
        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, data.pixels())?;
        let image = Image::new(device.clone(), &ImageDesc::sampled_texture(extent))?;

        graphics_pool.submit_one_time(device.graphics_queue(), |cmd| {
            image.record_transition(
                cmd,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            )?;

            let region = vk::BufferImageCopy::default()
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .layer_count(1),
                )
                .image_extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                });
            cmd.copy_buffer_to_image(
                staging.handle(),
                image.handle(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            image.record_transition(
                cmd,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            )
        })?;

        let sampler = Sampler::new_linear_repeat(device)?;

        debug!("Uploaded {}x{} texture", extent.width, extent.height);

        Ok(Self { image, sampler })
    }

    /// Descriptor info for a combined image sampler binding.
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vkengine_rhi::descriptor::image_info(
            self.sampler.handle(),
            self.image.view(),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
    }
}
