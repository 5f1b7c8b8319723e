//! Layout of the per-object dynamic uniform buffer.
//!
//! Every object's [`ObjectUbo`](vkengine_scene::ObjectUbo) lives in one
//! buffer per frame slot, at a stride rounded up to the device's
//! `minUniformBufferOffsetAlignment`. The draw loop binds the same descriptor
//! set for each object and passes [`DynamicUniformLayout::offset`] as the
//! dynamic offset.

use ash::vk;

use vkengine_rhi::buffer::aligned_size;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DynamicUniformLayout {
    payload_size: vk::DeviceSize,
    stride: vk::DeviceSize,
    capacity: usize,
}

impl DynamicUniformLayout {
    /// Layout for `capacity` payloads of `payload_size` bytes.
    ///
    /// `min_alignment` is the device limit; Vulkan guarantees it is a power
    /// of two.
    pub fn new(payload_size: usize, min_alignment: vk::DeviceSize, capacity: usize) -> Self {
        let payload_size = payload_size as vk::DeviceSize;
        Self {
            payload_size,
            stride: aligned_size(payload_size, min_alignment),
            capacity,
        }
    }

    /// Bytes between consecutive payloads.
    #[inline]
    pub fn stride(&self) -> vk::DeviceSize {
        self.stride
    }

    /// Descriptor range: one payload.
    #[inline]
    pub fn payload_size(&self) -> vk::DeviceSize {
        self.payload_size
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of the backing buffer.
    pub fn buffer_size(&self) -> vk::DeviceSize {
        self.stride * self.capacity as vk::DeviceSize
    }

    /// Dynamic offset of payload `index`, or `None` past the capacity.
    pub fn offset(&self, index: usize) -> Option<u32> {
        if index >= self.capacity {
            return None;
        }
        u32::try_from(self.stride * index as vk::DeviceSize).ok()
    }

    /// Calls `draw` with the dynamic offset of each of the first `count`
    /// objects, stopping at the capacity. Returns how many were drawn.
    pub fn draw_objects<E>(
        &self,
        count: usize,
        mut draw: impl FnMut(u32) -> Result<(), E>,
    ) -> Result<usize, E> {
        let mut drawn = 0;
        for index in 0..count {
            let Some(offset) = self.offset(index) else {
                break;
            };
            draw(offset)?;
            drawn += 1;
        }
        Ok(drawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vkengine_scene::ObjectUbo;

    #[test]
    fn test_object_offsets_with_256_alignment() {
        let layout = DynamicUniformLayout::new(ObjectUbo::SIZE, 256, 3);
        assert_eq!(layout.stride(), 256);
        let offsets: Vec<u32> = (0..3).filter_map(|i| layout.offset(i)).collect();
        assert_eq!(offsets, vec![0, 256, 512]);
    }

    #[test]
    fn test_small_alignment_keeps_payload_size() {
        let layout = DynamicUniformLayout::new(ObjectUbo::SIZE, 16, 4);
        assert_eq!(layout.stride(), 64);
        assert_eq!(layout.payload_size(), 64);
        assert_eq!(layout.offset(3), Some(192));
    }

    #[test]
    fn test_offset_past_capacity() {
        let layout = DynamicUniformLayout::new(64, 256, 2);
        assert_eq!(layout.offset(1), Some(256));
        assert_eq!(layout.offset(2), None);
    }

    #[test]
    fn test_draw_objects_stops_at_capacity() {
        let layout = DynamicUniformLayout::new(ObjectUbo::SIZE, 256, 2);
        let mut offsets = Vec::new();
        let drawn = layout
            .draw_objects(5, |offset| {
                offsets.push(offset);
                Ok::<_, ()>(())
            })
            .unwrap();
        assert_eq!(drawn, 2);
        assert_eq!(offsets, vec![0, 256]);
    }

    #[test]
    fn test_draw_objects_propagates_errors() {
        let layout = DynamicUniformLayout::new(ObjectUbo::SIZE, 256, 4);
        let mut calls = 0;
        let result = layout.draw_objects(4, |offset| {
            calls += 1;
            if offset == 256 { Err("bind failed") } else { Ok(()) }
        });
        assert_eq!(result, Err("bind failed"));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_buffer_size() {
        let layout = DynamicUniformLayout::new(ObjectUbo::SIZE, 256, 100);
        assert_eq!(layout.buffer_size(), 25_600);
    }

    #[test]
    fn test_offsets_are_aligned() {
        for shift in 0..9 {
            let alignment = 1u64 << shift;
            let layout = DynamicUniformLayout::new(72, alignment, 8);
            for i in 0..8 {
                let offset = layout.offset(i).unwrap() as u64;
                assert_eq!(
                    offset % alignment,
                    0,
                    "Expected offset aligned to {}, got {:?}",
                    alignment,
                    offset
                );
            }
        }
    }
}
