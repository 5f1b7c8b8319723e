//! Physical device (GPU) selection.
//!
//! A device is usable when it has a graphics queue, can present to the
//! window surface, supports `VK_KHR_swapchain`, and reports at least one
//! surface format and present mode. Among usable devices, discrete GPUs win.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::DEVICE_EXTENSIONS;
use crate::error::RhiError;
use crate::swapchain::SwapchainSupportDetails;

/// Queue family indices used by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Family that supports graphics operations.
    pub graphics_family: Option<u32>,
    /// Family that can present to the surface.
    pub present_family: Option<u32>,
    /// Family used for uploads; a transfer-only family when one exists.
    pub transfer_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Graphics and present families are both required.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Returns the distinct family indices, graphics first.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(3);
        for family in [self.graphics_family, self.present_family, self.transfer_family]
            .into_iter()
            .flatten()
        {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families
    }

    /// Picks queue families from their properties.
    ///
    /// `present_support(i)` reports whether family `i` can present to the
    /// surface. A family with both graphics and present is preferred so that
    /// swapchain images need no ownership transfer.
    pub fn from_properties(
        families: &[vk::QueueFamilyProperties],
        present_support: impl Fn(u32) -> bool,
    ) -> Self {
        let mut indices = Self::default();
        let mut dedicated_transfer = None;

        for (i, family) in families.iter().enumerate() {
            let i = i as u32;
            if family.queue_count == 0 {
                continue;
            }

            let has_graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
            let has_compute = family.queue_flags.contains(vk::QueueFlags::COMPUTE);
            let has_transfer = family.queue_flags.contains(vk::QueueFlags::TRANSFER);
            let can_present = present_support(i);

            if has_graphics && can_present && !indices.shares_graphics_and_present() {
                indices.graphics_family = Some(i);
                indices.present_family = Some(i);
            }
            if has_graphics && indices.graphics_family.is_none() {
                indices.graphics_family = Some(i);
            }
            if can_present && indices.present_family.is_none() {
                indices.present_family = Some(i);
            }
            if has_transfer && !has_graphics && !has_compute && dedicated_transfer.is_none() {
                dedicated_transfer = Some(i);
            }
        }

        // Graphics queues implicitly support transfer.
        indices.transfer_family = dedicated_transfer.or(indices.graphics_family);
        indices
    }

    fn shares_graphics_and_present(&self) -> bool {
        self.graphics_family.is_some() && self.graphics_family == self.present_family
    }
}

/// Information about the selected GPU.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    pub device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub queue_families: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        self.properties
            .device_name_as_c_str()
            .ok()
            .and_then(|name| name.to_str().ok())
            .unwrap_or("Unknown Device")
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        device_type_name(self.properties.device_type)
    }

    /// Minimum byte alignment for dynamic uniform buffer offsets.
    pub fn min_uniform_buffer_offset_alignment(&self) -> vk::DeviceSize {
        self.properties.limits.min_uniform_buffer_offset_alignment
    }

    /// Whether anisotropic filtering can be enabled on samplers.
    pub fn supports_sampler_anisotropy(&self) -> bool {
        self.features.sampler_anisotropy == vk::TRUE
    }

    /// Returns the total device local memory in bytes.
    pub fn device_local_memory(&self) -> u64 {
        self.memory_properties
            .memory_heaps
            .iter()
            .take(self.memory_properties.memory_heap_count as usize)
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size)
            .sum()
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = self.properties.api_version;
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field(
                "api_version",
                &format!(
                    "{}.{}.{}",
                    vk::api_version_major(version),
                    vk::api_version_minor(version),
                    vk::api_version_patch(version)
                ),
            )
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

fn device_type_name(device_type: vk::PhysicalDeviceType) -> &'static str {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
        vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
        vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
        vk::PhysicalDeviceType::CPU => "CPU",
        _ => "Other",
    }
}

/// Selects the most suitable physical device for rendering to `surface`.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no device meets the requirements.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<PhysicalDeviceInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };
    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }
    info!("Found {} GPU(s)", devices.len());

    let mut best: Option<(PhysicalDeviceInfo, u64)> = None;
    for device in devices {
        let Some(info) = check_device_suitability(instance, device, surface, surface_loader)?
        else {
            continue;
        };
        let score = rate_device(
            info.properties.device_type,
            info.properties.limits.max_image_dimension2_d,
            info.device_local_memory(),
        );
        debug!(
            "GPU '{}' ({}) - Score: {}",
            info.device_name(),
            info.device_type_name(),
            score
        );
        if best.as_ref().is_none_or(|(_, best_score)| score > *best_score) {
            best = Some((info, score));
        }
    }

    let Some((selected, score)) = best else {
        warn!("No suitable GPU found with required capabilities");
        return Err(RhiError::NoSuitableGpu);
    };

    info!(
        "Selected GPU: '{}' ({}) - Score: {}, min UBO offset alignment: {}",
        selected.device_name(),
        selected.device_type_name(),
        score,
        selected.min_uniform_buffer_offset_alignment()
    );
    Ok(selected)
}

fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<Option<PhysicalDeviceInfo>, RhiError> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let device_name = properties
        .device_name_as_c_str()
        .ok()
        .and_then(|name| name.to_str().ok())
        .unwrap_or("Unknown")
        .to_owned();

    let family_properties =
        unsafe { instance.get_physical_device_queue_family_properties(device) };
    let queue_families = QueueFamilyIndices::from_properties(&family_properties, |i| unsafe {
        surface_loader
            .get_physical_device_surface_support(device, i, surface)
            .unwrap_or(false)
    });
    if !queue_families.is_complete() {
        debug!("GPU '{}' skipped: missing graphics or present queue", device_name);
        return Ok(None);
    }

    let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };
    let missing = missing_extensions(&extensions, DEVICE_EXTENSIONS);
    if !missing.is_empty() {
        debug!("GPU '{}' skipped: missing extensions {:?}", device_name, missing);
        return Ok(None);
    }

    let support = SwapchainSupportDetails::query(device, surface, surface_loader)?;
    if !support.is_adequate() {
        debug!("GPU '{}' skipped: no surface formats or present modes", device_name);
        return Ok(None);
    }

    Ok(Some(PhysicalDeviceInfo {
        device,
        properties,
        features: unsafe { instance.get_physical_device_features(device) },
        memory_properties: unsafe { instance.get_physical_device_memory_properties(device) },
        queue_families,
    }))
}

/// Names from `required` that are absent from `available`.
fn missing_extensions<'a>(
    available: &[vk::ExtensionProperties],
    required: &[&'a CStr],
) -> Vec<&'a CStr> {
    required
        .iter()
        .copied()
        .filter(|name| {
            !available
                .iter()
                .any(|ext| ext.extension_name_as_c_str().is_ok_and(|n| n == *name))
        })
        .collect()
}

/// Higher scores indicate more desirable devices.
fn rate_device(
    device_type: vk::PhysicalDeviceType,
    max_image_dimension: u32,
    device_local_memory: u64,
) -> u64 {
    let type_score = match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 100_000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 10_000,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 1_000,
        vk::PhysicalDeviceType::CPU => 100,
        _ => 1,
    };
    let vram_mb = (device_local_memory / (1024 * 1024)).min(16_000);
    type_score + u64::from(max_image_dimension) + vram_mb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn extension(name: &CStr) -> vk::ExtensionProperties {
        let mut ext = vk::ExtensionProperties::default();
        for (dst, src) in ext.extension_name.iter_mut().zip(name.to_bytes()) {
            *dst = *src as std::ffi::c_char;
        }
        ext
    }

    #[test]
    fn test_queue_family_indices_default() {
        let indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());
        assert!(indices.unique_families().is_empty());
    }

    #[test]
    fn test_single_universal_family() {
        let families = [family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        )];
        let indices = QueueFamilyIndices::from_properties(&families, |_| true);
        assert!(indices.is_complete());
        assert_eq!(indices.transfer_family, Some(0));
        assert_eq!(indices.unique_families(), vec![0]);
    }

    #[test]
    fn test_prefers_shared_graphics_present() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
        ];
        // Family 0 cannot present, family 1 can but has no graphics, family 2 does both.
        let indices = QueueFamilyIndices::from_properties(&families, |i| i != 0);
        assert_eq!(indices.graphics_family, Some(2));
        assert_eq!(indices.present_family, Some(2));
    }

    #[test]
    fn test_separate_present_family() {
        let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::COMPUTE)];
        let indices = QueueFamilyIndices::from_properties(&families, |i| i == 1);
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, Some(1));
        assert_eq!(indices.unique_families(), vec![0, 1]);
    }

    #[test]
    fn test_dedicated_transfer_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::TRANSFER),
        ];
        let indices = QueueFamilyIndices::from_properties(&families, |i| i == 0);
        assert_eq!(indices.transfer_family, Some(1));
    }

    #[test]
    fn test_empty_family_skipped() {
        let mut empty = family(vk::QueueFlags::GRAPHICS);
        empty.queue_count = 0;
        let indices = QueueFamilyIndices::from_properties(&[empty], |_| true);
        assert!(!indices.is_complete());
    }

    #[test]
    fn test_missing_extensions() {
        let available = [extension(ash::khr::swapchain::NAME)];
        assert!(missing_extensions(&available, DEVICE_EXTENSIONS).is_empty());
        assert_eq!(
            missing_extensions(&[], DEVICE_EXTENSIONS),
            vec![ash::khr::swapchain::NAME]
        );
    }

    #[test]
    fn test_discrete_gpu_preferred() {
        let discrete = rate_device(vk::PhysicalDeviceType::DISCRETE_GPU, 8192, 0);
        let integrated = rate_device(vk::PhysicalDeviceType::INTEGRATED_GPU, 16384, 64 << 30);
        assert!(discrete > integrated, "Expected {} > {}", discrete, integrated);
    }
}
