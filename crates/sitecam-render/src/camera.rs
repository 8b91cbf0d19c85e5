//! Camera and view management.

use glam::{Mat4, Vec3};
use sitecam_core::MainCameraConfig;

/// Screen-aligned box for orthographic projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    /// Bounds of `width` x `height` centered on the origin.
    #[must_use]
    pub fn centered(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            left: -width * 0.5,
            right: width * 0.5,
            bottom: -height * 0.5,
            top: height * 0.5,
            near,
            far,
        }
    }

    /// Horizontal extent.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProjectionMode {
    /// Perspective projection from `fov` and `aspect_ratio`.
    #[default]
    Perspective,
    /// Orthographic projection with explicit bounds.
    Orthographic(OrthoBounds),
}

/// A 3D camera for viewing the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_3,
            aspect_ratio,
            near: 0.1,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
        }
    }

    /// A perspective camera; `fov_degrees` is the vertical field of view.
    #[must_use]
    pub fn perspective(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let mut camera = Self::new(aspect_ratio);
        camera.set_fov_degrees(fov_degrees);
        camera.near = near;
        camera.far = far;
        camera
    }

    /// An orthographic camera looking down -Z from the origin.
    #[must_use]
    pub fn orthographic(bounds: OrthoBounds) -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            near: bounds.near,
            far: bounds.far,
            aspect_ratio: bounds.width() / bounds.height().max(f32::EPSILON),
            projection_mode: ProjectionMode::Orthographic(bounds),
            ..Self::new(1.0)
        }
    }

    /// The navigation camera described by `config`.
    #[must_use]
    pub fn from_config(config: &MainCameraConfig, aspect_ratio: f32) -> Self {
        let mut camera = Self::perspective(config.fov_degrees, aspect_ratio, config.near, config.far);
        camera.look_at(config.position, config.target);
        camera
    }

    /// Sets the aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Replaces the orthographic bounds; no-op for perspective cameras.
    pub fn set_ortho_bounds(&mut self, bounds: OrthoBounds) {
        if let ProjectionMode::Orthographic(current) = &mut self.projection_mode {
            *current = bounds;
            self.aspect_ratio = bounds.width() / bounds.height().max(f32::EPSILON);
        }
    }

    /// Moves the camera to `position` and aims it at `target`.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    /// Up vector actually used for the view matrix. Falls back to +Z when
    /// the view direction is parallel to `up`.
    fn effective_up(&self) -> Vec3 {
        let forward = self.forward();
        if forward.cross(self.up).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            self.up
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        let target = if self.position.distance_squared(self.target) < 1e-12 {
            self.position + Vec3::NEG_Z
        } else {
            self.target
        };
        Mat4::look_at_rh(self.position, target, self.effective_up())
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
            }
            ProjectionMode::Orthographic(b) => {
                Mat4::orthographic_rh(b.left, b.right, b.bottom, b.top, b.near, b.far)
            }
        }
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// Returns the camera's right direction.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward()
            .cross(self.effective_up())
            .try_normalize()
            .unwrap_or(Vec3::X)
    }

    /// Orbits the camera around the target.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let radius = (self.position - self.target).length();
        if radius < f32::EPSILON {
            return;
        }
        let mut theta = (self.position.x - self.target.x).atan2(self.position.z - self.target.z);
        let mut phi = ((self.position.y - self.target.y) / radius)
            .clamp(-1.0, 1.0)
            .acos();

        theta -= delta_x;
        phi = (phi - delta_y).clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }

    /// Pans the camera.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let right = self.right();
        let up = self.up;
        let offset = right * delta_x + up * delta_y;
        self.position += offset;
        self.target += offset;
    }

    /// Moves toward (positive `delta`) or away from the target.
    pub fn zoom(&mut self, delta: f32) {
        let direction = self.forward();
        let distance = (self.position - self.target).length();
        let new_distance = (distance - delta).max(0.5);
        self.position = self.target - direction * new_distance;
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }

    /// Returns FOV in degrees.
    #[must_use]
    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    /// Sets FOV from degrees.
    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.set_fov(degrees.to_radians());
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_mode_perspective() {
        let camera = Camera::new(1.0);
        let proj = camera.projection_matrix();
        // Perspective matrix has non-zero w division
        assert!(proj.w_axis.z != 0.0);
    }

    #[test]
    fn test_projection_mode_orthographic() {
        let camera = Camera::orthographic(OrthoBounds::centered(1280.0, 800.0, 0.0, 10.0));
        let proj = camera.projection_matrix();
        assert!((proj.w_axis.w - 1.0).abs() < 0.001);

        // Right edge of the bounds maps to NDC x = 1
        let edge = proj.project_point3(Vec3::new(640.0, 0.0, -1.0));
        assert!((edge.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_set_ortho_bounds() {
        let mut camera = Camera::orthographic(OrthoBounds::centered(1280.0, 800.0, 0.0, 10.0));
        camera.set_ortho_bounds(OrthoBounds::centered(1920.0, 1080.0, 0.0, 10.0));
        match camera.projection_mode {
            ProjectionMode::Orthographic(b) => assert_eq!(b.right, 960.0),
            ProjectionMode::Perspective => panic!("expected orthographic"),
        }
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_set_fov_clamping() {
        let mut camera = Camera::new(1.0);
        camera.set_fov(0.0); // Too small
        assert!(camera.fov >= 0.1);

        camera.set_fov(std::f32::consts::PI); // Too large
        assert!(camera.fov < std::f32::consts::PI);
    }

    #[test]
    fn test_fov_degrees_conversion() {
        let mut camera = Camera::new(1.0);
        camera.set_fov_degrees(90.0);
        assert!((camera.fov_degrees() - 90.0).abs() < 0.1);
    }

    #[test]
    fn test_from_config() {
        let camera = Camera::from_config(&MainCameraConfig::default(), 1280.0 / 800.0);
        assert_eq!(camera.position, Vec3::new(0.0, 15.0, 30.0));
        assert!((camera.fov_degrees() - 60.0).abs() < 0.01);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_view_matrix_straight_down_is_finite() {
        let mut camera = Camera::new(1.0);
        camera.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert!(camera.view_matrix().is_finite());
        camera.look_at(Vec3::ONE, Vec3::ONE);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::new(1.0);
        camera.look_at(Vec3::new(0.0, 15.0, 30.0), Vec3::ZERO);
        let before = camera.position.length();
        camera.orbit(0.3, -0.2);
        assert!((camera.position.length() - before).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_perspective() {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.target = Vec3::ZERO;

        let initial_distance = camera.position.distance(camera.target);
        camera.zoom(1.0); // Zoom in
        let new_distance = camera.position.distance(camera.target);

        assert!(
            new_distance < initial_distance,
            "Perspective zoom in should decrease distance"
        );
        camera.zoom(100.0);
        assert!(camera.position.distance(camera.target) >= 0.5);
    }

    #[test]
    fn test_pan_moves_target() {
        let mut camera = Camera::new(1.0);
        camera.pan(1.0, 0.0);
        assert!((camera.target - Vec3::X).length() < 1e-5);
    }
}
