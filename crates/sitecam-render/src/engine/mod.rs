//! The wgpu rendering engine.

mod rendering;
mod targets;

pub use targets::CaptureTarget;

use std::sync::Arc;

use glam::Vec3;
use sitecam_core::{Light, SceneConfig, SceneGraph};

use crate::buffer::{create_uniform_buffer, uniform_entry, update_uniform};
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::mesh_render::{object_bind_group_layout, MeshRenderData, MeshUniforms, MeshVertex};
use crate::overlay_pass::OverlayPass;

/// Depth format of the main surface and capture targets.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color format of capture targets.
pub(crate) const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Camera uniforms for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniforms {
    /// Uniforms for `camera`.
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            position: camera.position.extend(1.0).to_array(),
        }
    }
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self::from_camera(&Camera::default())
    }
}

/// Lighting uniforms for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    /// xyz: unit vector towards the light, w: intensity.
    pub direction: [f32; 4],
    pub color: [f32; 4],
    pub ambient: [f32; 4],
}

impl LightUniforms {
    /// Collapses the scene lights into one directional light plus ambient.
    ///
    /// Directional lights after the first are ignored; ambient lights add up.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let mut direction = [0.0, 1.0, 0.0, 0.0];
        let mut color = [0.0; 4];
        let mut ambient = Vec3::ZERO;
        let mut have_directional = false;

        for (_, light) in scene.lights() {
            match *light {
                Light::Directional {
                    position,
                    color: c,
                    intensity,
                } if !have_directional => {
                    have_directional = true;
                    let dir = position.try_normalize().unwrap_or(Vec3::Y);
                    direction = dir.extend(intensity).to_array();
                    color = c.extend(1.0).to_array();
                }
                Light::Directional { .. } => {}
                Light::Ambient { color: c } => ambient += c,
            }
        }

        Self {
            direction,
            color,
            ambient: ambient.extend(1.0).to_array(),
        }
    }
}

impl Default for LightUniforms {
    fn default() -> Self {
        Self::from_scene(&SceneGraph::new())
    }
}

/// A camera uniform buffer bound together with the light buffer.
struct CameraBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        light_buffer: &wgpu::Buffer,
        label: &str,
    ) -> Self {
        let buffer = create_uniform_buffer(device, &CameraUniforms::default(), Some(label));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });
        Self { buffer, bind_group }
    }

    fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        update_uniform(queue, &self.buffer, &CameraUniforms::from_camera(camera));
    }
}

/// The acquired surface texture and the encoder recording into it.
struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// GPU copies of the scene, rebuilt whenever the scene revision changes.
#[derive(Default)]
struct SceneCache {
    revision: Option<u64>,
    objects: Vec<MeshRenderData>,
    cones: Vec<MeshRenderData>,
}

/// The rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The window surface; `None` once released.
    surface: Option<wgpu::Surface<'static>>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    /// Current surface width.
    pub width: u32,
    /// Current surface height.
    pub height: u32,
    scene_config: SceneConfig,
    light_buffer: wgpu::Buffer,
    object_layout: wgpu::BindGroupLayout,
    main_camera: CameraBinding,
    capture_camera: CameraBinding,
    /// Opaque meshes into the surface.
    mesh_pipeline: wgpu::RenderPipeline,
    /// Opaque meshes into capture targets.
    capture_pipeline: wgpu::RenderPipeline,
    /// Translucent FOV cones, main view only.
    fov_pipeline: wgpu::RenderPipeline,
    overlay_pass: OverlayPass,
    scene_cache: SceneCache,
    frame: Option<Frame>,
    next_target_id: u64,
}

impl RenderEngine {
    /// Creates an engine drawing into `window`.
    pub async fn new_windowed(
        window: Arc<winit::window::Window>,
        scene_config: SceneConfig,
    ) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sitecam device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceConfigurationFailed)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (depth_texture, depth_view) = Self::create_depth_texture(&device, width, height);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame bind group layout"),
            entries: &[
                // Camera uniforms
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                // Light uniforms
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let object_layout = object_bind_group_layout(&device);

        let light_buffer =
            create_uniform_buffer(&device, &LightUniforms::default(), Some("light uniforms"));
        let main_camera =
            CameraBinding::new(&device, &frame_layout, &light_buffer, "main camera uniforms");
        let capture_camera =
            CameraBinding::new(&device, &frame_layout, &light_buffer, "capture camera uniforms");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/mesh.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&frame_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = MeshPipeline {
            label: "mesh pipeline",
            format: surface_format,
            translucent: false,
        }
        .build(&device, &pipeline_layout, &shader);
        let capture_pipeline = MeshPipeline {
            label: "capture mesh pipeline",
            format: CAPTURE_FORMAT,
            translucent: false,
        }
        .build(&device, &pipeline_layout, &shader);
        let fov_pipeline = MeshPipeline {
            label: "fov cone pipeline",
            format: surface_format,
            translucent: true,
        }
        .build(&device, &pipeline_layout, &shader);

        let overlay_pass = OverlayPass::new(&device, surface_format, DEPTH_FORMAT);

        log::info!(
            "render engine ready: {} ({:?}), surface {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            width,
            height,
            surface_format
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface: Some(surface),
            surface_config,
            depth_texture,
            depth_view,
            width,
            height,
            scene_config,
            light_buffer,
            object_layout,
            main_camera,
            capture_camera,
            mesh_pipeline,
            capture_pipeline,
            fov_pipeline,
            overlay_pass,
            scene_cache: SceneCache::default(),
            frame: None,
            next_target_id: 0,
        })
    }

    /// Format of the window surface.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Returns true while the window surface is alive.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Reconfigures the surface and depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;

        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.surface_config);
        }

        self.depth_texture.destroy();
        let (depth_texture, depth_view) = Self::create_depth_texture(&self.device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    /// Uploads the scene if it changed since the last upload.
    fn sync_scene(&mut self, scene: &SceneGraph) {
        if self.scene_cache.revision == Some(scene.revision()) {
            return;
        }

        let objects: Vec<_> = scene
            .objects()
            .filter_map(|(_, object)| {
                let uniforms =
                    MeshUniforms::new(object.transform.matrix(), object.mesh.color(), 1.0, true);
                MeshRenderData::new(&self.device, &self.object_layout, &object.mesh, &uniforms)
            })
            .collect();

        let cones: Vec<_> = scene
            .cameras()
            .filter_map(|(_, camera)| {
                let uniforms = MeshUniforms::new(
                    camera.fov_transform(),
                    self.scene_config.fov_color,
                    self.scene_config.fov_opacity,
                    false,
                );
                MeshRenderData::new(
                    &self.device,
                    &self.object_layout,
                    camera.fov_volume().mesh(),
                    &uniforms,
                )
            })
            .collect();

        update_uniform(&self.queue, &self.light_buffer, &LightUniforms::from_scene(scene));

        log::debug!(
            "uploaded scene revision {}: {} meshes, {} fov cones",
            scene.revision(),
            objects.len(),
            cones.len()
        );
        self.scene_cache = SceneCache {
            revision: Some(scene.revision()),
            objects,
            cones,
        };
    }

    fn clear_color(&self) -> wgpu::Color {
        let bg = self.scene_config.background_color;
        wgpu::Color {
            r: f64::from(bg.x),
            g: f64::from(bg.y),
            b: f64::from(bg.z),
            a: 1.0,
        }
    }

    pub(crate) fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

/// Parameters that differ between the mesh pipelines.
struct MeshPipeline {
    label: &'static str,
    format: wgpu::TextureFormat,
    translucent: bool,
}

impl MeshPipeline {
    fn build(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        let (blend, cull_mode) = if self.translucent {
            (Some(wgpu::BlendState::ALPHA_BLENDING), None)
        } else {
            (Some(wgpu::BlendState::REPLACE), Some(wgpu::Face::Back))
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(self.label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                // Translucent cones are depth tested but never occlude.
                depth_write_enabled: !self.translucent,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 48);
    }

    #[test]
    fn test_lights_from_scene() {
        let mut scene = SceneGraph::new();
        scene.add_light(Light::Ambient {
            color: Vec3::splat(0.4),
        });
        scene.add_light(Light::Directional {
            position: Vec3::new(0.0, 10.0, 0.0),
            color: Vec3::ONE,
            intensity: 0.8,
        });

        let lights = LightUniforms::from_scene(&scene);
        assert_eq!(lights.direction, [0.0, 1.0, 0.0, 0.8]);
        assert_eq!(lights.color, [1.0, 1.0, 1.0, 1.0]);
        assert!((lights.ambient[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_no_lights_is_dark() {
        let lights = LightUniforms::default();
        assert_eq!(lights.color, [0.0; 4]);
        assert_eq!(lights.ambient, [0.0, 0.0, 0.0, 1.0]);
    }
}
