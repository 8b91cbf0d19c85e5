//! Simulated camera captures.
//!
//! For the selected camera the scene is rendered into a small off-screen
//! buffer whose size follows the camera's nominal resolution. The buffer is
//! kept across frames and only reallocated when the derived size changes.

use sitecam_core::{BufferSize, CameraSnapshot, CaptureConfig, SceneGraph};

use crate::backend::RenderBackend;
use crate::camera::Camera;
use crate::error::RenderResult;

struct CaptureBuffer<T> {
    size: BufferSize,
    target: T,
}

/// Owns the capture buffer and the transient view camera.
///
/// At most one buffer exists at any time.
pub struct CaptureSimulator<T> {
    config: CaptureConfig,
    buffer: Option<CaptureBuffer<T>>,
    camera: Camera,
    allocations: u64,
    releases: u64,
}

impl<T> CaptureSimulator<T> {
    /// Creates a simulator with no buffer.
    pub fn new(config: CaptureConfig) -> Self {
        let camera = Camera::perspective(
            config.default_lens_fov,
            config.aspect.ratio(),
            config.near,
            config.far,
        );
        Self {
            config,
            buffer: None,
            camera,
            allocations: 0,
            releases: 0,
        }
    }

    /// Sizing policy.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Buffer size the policy derives for `snapshot`.
    pub fn derive_size(&self, snapshot: &CameraSnapshot) -> BufferSize {
        self.config.buffer_size(snapshot.resolution)
    }

    /// Makes sure a buffer of exactly `size` exists, replacing any buffer of
    /// a different size. The old buffer is released before the new one is
    /// allocated.
    pub fn reconcile<B>(&mut self, backend: &mut B, size: BufferSize) -> RenderResult<&T>
    where
        B: RenderBackend<Target = T>,
    {
        if self.buffer.as_ref().is_some_and(|b| b.size != size) {
            if let Some(old) = self.buffer.take() {
                log::debug!("capture buffer {} -> {}", old.size, size);
                backend.destroy_capture_target(old.target);
                self.releases += 1;
            }
        }

        let buffer = match self.buffer.take() {
            Some(buffer) => buffer,
            None => {
                let target = backend.create_capture_target(size)?;
                self.allocations += 1;
                log::debug!("allocated capture buffer {size}");
                CaptureBuffer { size, target }
            }
        };
        Ok(&self.buffer.insert(buffer).target)
    }

    /// Points the transient view camera at the selection.
    pub fn position_camera(&mut self, snapshot: &CameraSnapshot) {
        self.camera
            .set_fov_degrees(snapshot.lens_fov_or_default(&self.config));
        self.camera.aspect_ratio = self.config.aspect.ratio();
        self.camera.near = self.config.near;
        self.camera.far = self.config.far;
        self.camera
            .look_at(snapshot.position, snapshot.resolved_target());
    }

    /// Runs one capture: size the buffer, aim the camera, render the scene.
    pub fn capture<B>(
        &mut self,
        backend: &mut B,
        scene: &SceneGraph,
        snapshot: &CameraSnapshot,
    ) -> RenderResult<BufferSize>
    where
        B: RenderBackend<Target = T>,
    {
        let size = self.derive_size(snapshot);
        self.reconcile(backend, size)?;
        self.position_camera(snapshot);
        if let Some(buffer) = &self.buffer {
            backend.render_capture(&buffer.target, scene, &self.camera)?;
        }
        Ok(size)
    }

    /// Releases the buffer if there is one. Safe to call repeatedly.
    pub fn release<B>(&mut self, backend: &mut B)
    where
        B: RenderBackend<Target = T>,
    {
        if let Some(old) = self.buffer.take() {
            log::debug!("released capture buffer {}", old.size);
            backend.destroy_capture_target(old.target);
            self.releases += 1;
        }
    }

    /// Size of the live buffer.
    pub fn buffer_size(&self) -> Option<BufferSize> {
        self.buffer.as_ref().map(|b| b.size)
    }

    /// The live buffer.
    pub fn target(&self) -> Option<&T> {
        self.buffer.as_ref().map(|b| &b.target)
    }

    /// Returns true if a buffer is allocated.
    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// The transient view camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Number of buffers allocated so far.
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    /// Number of buffers released so far.
    pub fn release_count(&self) -> u64 {
        self.releases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{BackendEvent, RecordingBackend};
    use glam::Vec3;

    fn snapshot(resolution: f32) -> CameraSnapshot {
        CameraSnapshot::new(Vec3::new(-10.0, 4.0, 10.0), Vec3::Y, 90.0, resolution)
    }

    #[test]
    fn test_first_capture_allocates() {
        let mut backend = RecordingBackend::new(1280, 800);
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();

        let size = sim.capture(&mut backend, &scene, &snapshot(1080.0)).unwrap();
        assert_eq!(size, BufferSize::new(194, 109));
        assert_eq!(sim.buffer_size(), Some(size));
        assert_eq!(sim.allocation_count(), 1);
        assert_eq!(backend.live_targets(), 1);
    }

    #[test]
    fn test_same_size_reuses_buffer() {
        let mut backend = RecordingBackend::new(1280, 800);
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();
        for _ in 0..5 {
            sim.capture(&mut backend, &scene, &snapshot(1080.0)).unwrap();
        }
        assert_eq!(sim.allocation_count(), 1);
        assert_eq!(sim.release_count(), 0);
    }

    #[test]
    fn test_switch_releases_before_allocating() {
        let mut backend = RecordingBackend::new(1280, 800);
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();

        sim.capture(&mut backend, &scene, &snapshot(1080.0)).unwrap();
        backend.clear_events();
        sim.capture(&mut backend, &scene, &snapshot(2688.0)).unwrap();

        let events = backend.events();
        let destroy = events
            .iter()
            .position(|e| matches!(e, BackendEvent::DestroyTarget { .. }))
            .unwrap();
        let create = events
            .iter()
            .position(|e| matches!(e, BackendEvent::CreateTarget { .. }))
            .unwrap();
        assert!(destroy < create);
        assert_eq!(sim.buffer_size(), Some(BufferSize::new(346, 195)));
        assert_eq!(backend.live_targets(), 1);
    }

    #[test]
    fn test_equivalent_sizes_do_not_reallocate() {
        let mut backend = RecordingBackend::new(1280, 800);
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();
        sim.capture(&mut backend, &scene, &snapshot(1920.0)).unwrap();
        sim.capture(&mut backend, &scene, &snapshot(2688.0)).unwrap();
        assert_eq!(sim.allocation_count(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut backend = RecordingBackend::new(1280, 800);
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();
        sim.capture(&mut backend, &scene, &snapshot(1080.0)).unwrap();

        sim.release(&mut backend);
        sim.release(&mut backend);
        assert!(!sim.has_buffer());
        assert_eq!(sim.release_count(), 1);
        assert_eq!(backend.live_targets(), 0);
    }

    #[test]
    fn test_camera_follows_selection() {
        let mut backend = RecordingBackend::new(1280, 800);
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();
        let mut snap = CameraSnapshot::at(Vec3::new(12.0, 4.0, 8.0));
        snap.lens_fov = Some(45.0);
        sim.capture(&mut backend, &scene, &snap).unwrap();

        let camera = sim.camera();
        assert_eq!(camera.position, Vec3::new(12.0, 4.0, 8.0));
        assert_eq!(camera.target, Vec3::new(0.0, 1.0, 0.0));
        assert!((camera.fov_degrees() - 45.0).abs() < 1e-3);
        assert_eq!(camera.far, 200.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_failed_allocation_leaves_no_buffer() {
        let mut backend = RecordingBackend::new(1280, 800);
        backend.fail_next_allocation();
        let mut sim = CaptureSimulator::new(CaptureConfig::default());
        let scene = SceneGraph::new();
        assert!(sim.capture(&mut backend, &scene, &snapshot(1080.0)).is_err());
        assert!(!sim.has_buffer());

        sim.capture(&mut backend, &scene, &snapshot(1080.0)).unwrap();
        assert!(sim.has_buffer());
    }
}
