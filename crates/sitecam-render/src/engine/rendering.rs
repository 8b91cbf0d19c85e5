use sitecam_core::{BufferSize, SceneGraph};

use super::{CaptureTarget, Frame, RenderEngine};
use crate::backend::RenderBackend;
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::overlay::OverlayPlacement;

impl RenderBackend for RenderEngine {
    type Target = CaptureTarget;

    fn begin_frame(&mut self) -> RenderResult<()> {
        let surface = self.surface.as_ref().ok_or(RenderError::SurfaceReleased)?;

        let surface_texture = match surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                surface.configure(&self.device, &self.surface_config);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.frame = Some(Frame {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn render_main(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()> {
        if self.frame.is_none() {
            return Err(RenderError::NoFrame);
        }
        self.sync_scene(scene);
        self.main_camera.update(&self.queue, camera);
        let clear = self.clear_color();

        let frame = self.frame.as_mut().ok_or(RenderError::NoFrame)?;
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        pass.set_bind_group(0, &self.main_camera.bind_group, &[]);
        pass.set_pipeline(&self.mesh_pipeline);
        for object in &self.scene_cache.objects {
            object.draw(&mut pass);
        }
        pass.set_pipeline(&self.fov_pipeline);
        for cone in &self.scene_cache.cones {
            cone.draw(&mut pass);
        }
        Ok(())
    }

    fn create_capture_target(&mut self, size: BufferSize) -> RenderResult<CaptureTarget> {
        self.allocate_capture_target(size)
    }

    fn destroy_capture_target(&mut self, target: CaptureTarget) {
        log::trace!("destroying capture target {}", target.id());
        target.destroy();
    }

    fn render_capture(
        &mut self,
        target: &CaptureTarget,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> RenderResult<()> {
        if self.frame.is_none() {
            return Err(RenderError::NoFrame);
        }
        self.sync_scene(scene);
        self.capture_camera.update(&self.queue, camera);
        let clear = self.clear_color();

        let frame = self.frame.as_mut().ok_or(RenderError::NoFrame)?;
        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("capture pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        // Logical cameras are invisible, so only scene meshes show up.
        pass.set_bind_group(0, &self.capture_camera.bind_group, &[]);
        pass.set_pipeline(&self.capture_pipeline);
        for object in &self.scene_cache.objects {
            object.draw(&mut pass);
        }
        Ok(())
    }

    fn draw_overlay(
        &mut self,
        target: &CaptureTarget,
        placement: &OverlayPlacement,
    ) -> RenderResult<()> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoFrame)?;
        self.overlay_pass
            .update_uniforms(&self.queue, placement.clip_from_quad());
        self.overlay_pass.render(
            &mut frame.encoder,
            &frame.view,
            &self.depth_view,
            &target.overlay_bind_group,
        );
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let frame = self.frame.take().ok_or(RenderError::NoFrame)?;
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.resize(width, height);
    }

    fn release_surface(&mut self) {
        // An unpresented surface texture must go before its surface.
        self.frame = None;
        if self.surface.take().is_some() {
            log::debug!("released window surface");
        }
    }
}
