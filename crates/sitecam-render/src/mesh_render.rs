//! GPU resources for one drawable mesh.

use glam::{Mat4, Vec3, Vec4};
use sitecam_core::Mesh;

use crate::buffer::{create_index_buffer, create_uniform_buffer, create_vertex_buffer, uniform_entry};

/// Interleaved vertex layout shared by every mesh pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout for pipelines.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-object uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: 1.0 when lit.
    pub params: [f32; 4],
}

impl MeshUniforms {
    /// Uniforms for a lit or unlit mesh placed by `model`.
    pub fn new(model: Mat4, color: Vec3, alpha: f32, lit: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: Vec4::new(color.x, color.y, color.z, alpha).to_array(),
            params: [if lit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// Layout of the per-object bind group (group 1).
pub fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("object bind group layout"),
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
    })
}

/// Uploaded mesh plus its uniforms.
pub struct MeshRenderData {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    _uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    index_count: u32,
}

impl MeshRenderData {
    /// Uploads `mesh`. Returns `None` for meshes without triangles.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: &Mesh,
        uniforms: &MeshUniforms,
    ) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }
        let vertices: Vec<MeshVertex> = mesh
            .positions()
            .iter()
            .zip(mesh.normals())
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();

        let vertex_buffer = create_vertex_buffer(device, &vertices, Some("mesh vertices"));
        let index_buffer = create_index_buffer(device, mesh.indices(), Some("mesh indices"));
        let uniform_buffer = create_uniform_buffer(device, uniforms, Some("mesh uniforms"));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Some(Self {
            vertex_buffer,
            index_buffer,
            _uniform_buffer: uniform_buffer,
            bind_group,
            index_count: mesh.indices().len() as u32,
        })
    }

    /// Records the draw. Group 0 must already be bound.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<MeshUniforms>(), 160);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }

    #[test]
    fn test_unlit_flag() {
        let u = MeshUniforms::new(Mat4::IDENTITY, Vec3::ONE, 0.15, false);
        assert_eq!(u.params[0], 0.0);
        assert!((u.color[3] - 0.15).abs() < 1e-6);
    }
}
