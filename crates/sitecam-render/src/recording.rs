//! A [`RenderBackend`] that records calls instead of drawing.
//!
//! Lets the frame orchestration, capture reallocation and teardown paths be
//! exercised without a GPU.

use std::collections::HashSet;

use glam::Vec2;
use sitecam_core::{BufferSize, SceneGraph};

use crate::backend::RenderBackend;
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::overlay::OverlayPlacement;

/// A capture target handed out by [`RecordingBackend`].
#[derive(Debug, PartialEq, Eq)]
pub struct RecordedTarget {
    pub id: u64,
    pub size: BufferSize,
}

/// One backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    BeginFrame,
    RenderMain {
        objects: usize,
        aspect_ratio: f32,
    },
    CreateTarget {
        id: u64,
        size: BufferSize,
    },
    DestroyTarget {
        id: u64,
    },
    RenderCapture {
        id: u64,
        size: BufferSize,
    },
    DrawOverlay {
        id: u64,
        center: Vec2,
        size: Vec2,
    },
    EndFrame,
    ResizeSurface {
        width: u32,
        height: u32,
    },
    ReleaseSurface,
}

/// Records every call; optionally injects failures.
#[derive(Debug)]
pub struct RecordingBackend {
    events: Vec<BackendEvent>,
    live: HashSet<u64>,
    next_id: u64,
    surface_size: Option<(u32, u32)>,
    in_frame: bool,
    fail_next_frame: Option<RenderError>,
    fail_next_allocation: bool,
    surface_releases: u32,
}

impl RecordingBackend {
    /// Creates a backend with a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            events: Vec::new(),
            live: HashSet::new(),
            next_id: 0,
            surface_size: Some((width, height)),
            in_frame: false,
            fail_next_frame: None,
            fail_next_allocation: false,
            surface_releases: 0,
        }
    }

    /// Every call so far, in order.
    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    /// Forgets recorded calls.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Number of capture targets currently allocated.
    pub fn live_targets(&self) -> usize {
        self.live.len()
    }

    /// Current surface size, or `None` once released.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    /// How many times the surface has actually been released.
    pub fn surface_releases(&self) -> u32 {
        self.surface_releases
    }

    /// Makes the next `begin_frame` fail with `error`.
    pub fn fail_next_frame(&mut self, error: RenderError) {
        self.fail_next_frame = Some(error);
    }

    /// Makes the next capture target allocation fail.
    pub fn fail_next_allocation(&mut self) {
        self.fail_next_allocation = true;
    }

    /// Number of recorded events matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl RenderBackend for RecordingBackend {
    type Target = RecordedTarget;

    fn begin_frame(&mut self) -> RenderResult<()> {
        if self.surface_size.is_none() {
            return Err(RenderError::SurfaceReleased);
        }
        if let Some(error) = self.fail_next_frame.take() {
            return Err(error);
        }
        self.in_frame = true;
        self.events.push(BackendEvent::BeginFrame);
        Ok(())
    }

    fn render_main(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()> {
        if !self.in_frame {
            return Err(RenderError::NoFrame);
        }
        self.events.push(BackendEvent::RenderMain {
            objects: scene.object_count(),
            aspect_ratio: camera.aspect_ratio,
        });
        Ok(())
    }

    fn create_capture_target(&mut self, size: BufferSize) -> RenderResult<RecordedTarget> {
        if std::mem::take(&mut self.fail_next_allocation) {
            return Err(RenderError::TargetAllocationFailed(format!(
                "injected failure for {size}"
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        self.events.push(BackendEvent::CreateTarget { id, size });
        Ok(RecordedTarget { id, size })
    }

    fn destroy_capture_target(&mut self, target: RecordedTarget) {
        assert!(
            self.live.remove(&target.id),
            "capture target {} released twice",
            target.id
        );
        self.events.push(BackendEvent::DestroyTarget { id: target.id });
    }

    fn render_capture(
        &mut self,
        target: &RecordedTarget,
        _scene: &SceneGraph,
        _camera: &Camera,
    ) -> RenderResult<()> {
        if !self.in_frame {
            return Err(RenderError::NoFrame);
        }
        self.events.push(BackendEvent::RenderCapture {
            id: target.id,
            size: target.size,
        });
        Ok(())
    }

    fn draw_overlay(
        &mut self,
        target: &RecordedTarget,
        placement: &OverlayPlacement,
    ) -> RenderResult<()> {
        if !self.in_frame {
            return Err(RenderError::NoFrame);
        }
        self.events.push(BackendEvent::DrawOverlay {
            id: target.id,
            center: placement.center,
            size: placement.size,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        if !std::mem::take(&mut self.in_frame) {
            return Err(RenderError::NoFrame);
        }
        self.events.push(BackendEvent::EndFrame);
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        if self.surface_size.is_some() {
            self.surface_size = Some((width, height));
            self.events.push(BackendEvent::ResizeSurface { width, height });
        }
    }

    fn release_surface(&mut self) {
        if self.surface_size.take().is_some() {
            self.surface_releases += 1;
            self.in_frame = false;
            self.events.push(BackendEvent::ReleaseSurface);
        }
    }
}
