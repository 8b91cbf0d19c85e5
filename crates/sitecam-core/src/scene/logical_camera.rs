//! Camera rigs placed in the site.

use glam::{Mat4, Vec3};

use crate::fov::{FovParams, FovVolume};
use crate::selection::CameraSnapshot;

/// A physical camera placed in the scene.
///
/// Distinct from the navigation camera. Parameters are set with the builder
/// methods before the rig is added to a [`SceneGraph`](super::SceneGraph);
/// the graph only hands out shared references afterwards.
#[derive(Debug, Clone)]
pub struct LogicalCamera {
    name: String,
    position: Vec3,
    target: Vec3,
    lens_fov: f32,
    resolution: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    volume: FovVolume,
    volume_builds: u32,
}

impl LogicalCamera {
    /// Default lens field of view, in degrees.
    pub const DEFAULT_LENS_FOV: f32 = 60.0;
    /// Default nominal resolution.
    pub const DEFAULT_RESOLUTION: f32 = 1080.0;
    /// Default image aspect.
    pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;
    /// Default near clip.
    pub const DEFAULT_NEAR: f32 = 0.1;
    /// Default far clip.
    pub const DEFAULT_FAR: f32 = 100.0;

    /// Creates a rig at `position` looking at `target` with default optics.
    pub fn new(name: impl Into<String>, position: Vec3, target: Vec3) -> Self {
        let params = FovParams::new(
            Self::DEFAULT_LENS_FOV,
            Self::DEFAULT_ASPECT,
            Self::DEFAULT_NEAR,
            Self::DEFAULT_FAR,
        );
        Self {
            name: name.into(),
            position,
            target,
            lens_fov: params.fov_degrees,
            resolution: Self::DEFAULT_RESOLUTION,
            aspect_ratio: params.aspect_ratio,
            near: params.near,
            far: params.far,
            volume: FovVolume::build(params),
            volume_builds: 1,
        }
    }

    /// Sets the lens field of view in degrees.
    #[must_use]
    pub fn with_lens_fov(mut self, degrees: f32) -> Self {
        self.lens_fov = degrees;
        self.refresh_volume();
        self
    }

    /// Sets the nominal resolution. Does not affect the FOV volume.
    #[must_use]
    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the near and far clip distances.
    #[must_use]
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self.refresh_volume();
        self
    }

    /// Sets the image aspect.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.refresh_volume();
        self
    }

    fn refresh_volume(&mut self) {
        let params = self.fov_params();
        if params != self.volume.params() {
            self.volume = FovVolume::build(params);
            self.volume_builds += 1;
        }
    }

    /// Rig name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Look-at target.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Lens field of view in degrees.
    pub fn lens_fov(&self) -> f32 {
        self.lens_fov
    }

    /// Nominal resolution.
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Image aspect.
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Near clip.
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip.
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Unit view direction, or -Z if position and target coincide.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// Parameters the FOV volume is derived from.
    pub fn fov_params(&self) -> FovParams {
        FovParams::new(self.lens_fov, self.aspect_ratio, self.near, self.far)
    }

    /// Cached FOV volume.
    pub fn fov_volume(&self) -> &FovVolume {
        &self.volume
    }

    /// World matrix for the FOV volume.
    pub fn fov_transform(&self) -> Mat4 {
        FovVolume::placement(self.position, self.forward())
    }

    /// How many times the FOV volume has been built.
    pub fn volume_builds(&self) -> u32 {
        self.volume_builds
    }

    /// The selection snapshot for previewing this rig.
    pub fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot::new(self.position, self.target, self.lens_fov, self.resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cam = LogicalCamera::new("Cam", Vec3::new(0.0, 4.0, 10.0), Vec3::Y);
        assert_eq!(cam.lens_fov(), 60.0);
        assert_eq!(cam.resolution(), 1080.0);
        assert_eq!(cam.near(), 0.1);
        assert_eq!(cam.far(), 100.0);
        assert_eq!(cam.volume_builds(), 1);
    }

    #[test]
    fn test_volume_rebuilt_only_on_fov_change() {
        let cam = LogicalCamera::new("Cam", Vec3::ZERO, Vec3::X)
            .with_resolution(2688.0)
            .with_lens_fov(60.0);
        assert_eq!(cam.volume_builds(), 1);

        let cam = cam.with_lens_fov(45.0);
        assert_eq!(cam.volume_builds(), 2);
        assert_eq!(cam.fov_volume().params().fov_degrees, 45.0);

        let cam = cam.with_clip(0.1, 100.0);
        assert_eq!(cam.volume_builds(), 2);
        let cam = cam.with_clip(0.5, 50.0);
        assert_eq!(cam.volume_builds(), 3);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let cam = LogicalCamera::new("Cam 2", Vec3::new(12.0, 4.0, 8.0), Vec3::Y)
            .with_lens_fov(45.0)
            .with_resolution(2688.0);
        let snap = cam.snapshot();
        assert_eq!(snap.position, cam.position());
        assert_eq!(snap.resolved_target(), Vec3::Y);
        assert_eq!(snap.lens_fov, Some(45.0));
        assert_eq!(snap.resolution, Some(2688.0));
    }

    #[test]
    fn test_fov_transform_points_at_target() {
        let cam = LogicalCamera::new("Cam", Vec3::new(-10.0, 4.0, 10.0), Vec3::Y);
        let m = cam.fov_transform();
        let dir = m.transform_vector3(Vec3::Y).normalize();
        assert!((dir - cam.forward()).length() < 1e-5);
    }
}
