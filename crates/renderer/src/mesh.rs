//! CPU mesh data and its device-local GPU copy.

use std::sync::Arc;

use ash::vk;
use glam::{Vec2, Vec3};
use tracing::debug;

use vkengine_rhi::buffer::{Buffer, BufferUsage};
use vkengine_rhi::command::{CommandBuffer, CommandPool};
use vkengine_rhi::device::Device;
use vkengine_rhi::vertex::Vertex;
use vkengine_rhi::{RhiError, RhiResult};

/// Indexed triangle list, counter-clockwise when seen from the front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit cube centred on the origin, four vertices per face so each face
    /// has its own UVs and colour.
    pub fn cube() -> Self {
        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            let color = normal.abs() * 0.5 + Vec3::splat(0.5);
            for (su, sv) in corners {
                vertices.push(Vertex::new(
                    (normal + u * su + v * sv) * 0.5,
                    color,
                    Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5),
                ));
            }
            indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
        }

        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Vertex and index buffers in device-local memory.
pub struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl GpuMesh {
    /// Uploads `mesh` through staging buffers on the transfer queue.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::ResourceError`] for an empty mesh.
    pub fn upload(
        device: Arc<Device>,
        transfer_pool: &CommandPool,
        mesh: &MeshData,
    ) -> RhiResult<Self> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(RhiError::ResourceError(
                "Cannot upload an empty mesh".to_string(),
            ));
        }

        let vertex_buffer = Buffer::new_device_local(
            device.clone(),
            transfer_pool,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&mesh.vertices),
        )?;
        let index_buffer = Buffer::new_device_local(
            device,
            transfer_pool,
            BufferUsage::Index,
            bytemuck::cast_slice(&mesh.indices),
        )?;

        debug!(
            "Uploaded mesh: {} vertices, {} triangles",
            mesh.vertices.len(),
            mesh.triangle_count()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    /// Binds the vertex buffer to binding 0 and the u32 index buffer.
    pub fn bind(&self, cmd: &CommandBuffer) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_cube_counts() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn test_cube_is_unit_sized() {
        let cube = MeshData::cube();
        for vertex in &cube.vertices {
            let p = vertex.position;
            assert!(
                (p.abs() - Vec3::splat(0.5)).abs().max_element() < EPSILON,
                "Expected a corner of the unit cube, got {:?}",
                p
            );
        }
    }

    #[test]
    fn test_cube_winding_faces_outward() {
        let cube = MeshData::cube();
        for triangle in cube.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| cube.vertices[triangle[i] as usize].position);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "Expected counter-clockwise outward triangle, got {:?}",
                [a, b, c]
            );
        }
    }

    #[test]
    fn test_cube_uvs_cover_each_face() {
        let cube = MeshData::cube();
        for face in cube.vertices.chunks_exact(4) {
            let min = face.iter().map(|v| v.tex_coord).fold(Vec2::ONE, Vec2::min);
            let max = face.iter().map(|v| v.tex_coord).fold(Vec2::ZERO, Vec2::max);
            assert_eq!(min, Vec2::ZERO);
            assert_eq!(max, Vec2::ONE);
        }
    }
}
