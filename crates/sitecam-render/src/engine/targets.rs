use sitecam_core::BufferSize;

use super::{RenderEngine, CAPTURE_FORMAT};
use crate::error::{RenderError, RenderResult};

/// An off-screen color and depth buffer plus the bind group that samples it
/// into the overlay.
pub struct CaptureTarget {
    id: u64,
    size: BufferSize,
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) overlay_bind_group: wgpu::BindGroup,
}

impl CaptureTarget {
    /// Engine-unique identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Pixel size.
    pub fn size(&self) -> BufferSize {
        self.size
    }

    /// Frees the GPU memory now rather than when the last reference drops.
    pub(crate) fn destroy(self) {
        self.texture.destroy();
        self.depth_texture.destroy();
    }
}

impl std::fmt::Debug for CaptureTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureTarget")
            .field("id", &self.id)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl RenderEngine {
    /// Allocates a capture target of `size`.
    pub(crate) fn allocate_capture_target(&mut self, size: BufferSize) -> RenderResult<CaptureTarget> {
        let max = self.device.limits().max_texture_dimension_2d;
        if size.width == 0 || size.height == 0 || size.width > max || size.height > max {
            return Err(RenderError::TargetAllocationFailed(format!(
                "{size} outside 1..={max}"
            )));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture texture"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAPTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let (depth_texture, depth_view) =
            Self::create_depth_texture(&self.device, size.width, size.height);
        let overlay_bind_group = self.overlay_pass.create_bind_group(&self.device, &view);

        let id = self.next_target_id;
        self.next_target_id += 1;
        Ok(CaptureTarget {
            id,
            size,
            texture,
            view,
            depth_texture,
            depth_view,
            overlay_bind_group,
        })
    }
}
