//! Field-of-view coverage volumes for camera rigs.

use glam::{Mat4, Quat, Vec3};

use crate::mesh::{Mesh, MeshSource};

/// Number of radial segments in a FOV cone.
const CONE_SEGMENTS: u32 = 32;

/// Parameters a FOV volume is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovParams {
    /// Full lens field of view, in degrees.
    pub fov_degrees: f32,
    /// Width / height of the camera image. Carried for frustum symmetry;
    /// the cone itself is circular.
    pub aspect_ratio: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl FovParams {
    /// Creates a new parameter set.
    pub fn new(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect_ratio,
            near,
            far,
        }
    }
}

/// A cone mesh visualizing what a rig can see.
///
/// The apex sits at the camera origin and the base circle at distance `far`
/// along the primitive's +Y axis. [`FovVolume::placement`] rotates that axis
/// onto the camera's forward direction.
#[derive(Debug, Clone)]
pub struct FovVolume {
    params: FovParams,
    radius: f32,
    mesh: Mesh,
}

impl FovVolume {
    /// Builds the cone for a set of parameters.
    pub fn build(params: FovParams) -> Self {
        let half_angle = (params.fov_degrees * 0.5).to_radians();
        let radius = (half_angle.tan() * params.far).max(0.0);
        let mesh = Mesh::open_cone(radius, params.far.max(0.0), CONE_SEGMENTS);
        Self {
            params,
            radius,
            mesh,
        }
    }

    /// Builds the cone and tags it with a color.
    pub fn build_colored(params: FovParams, color: Vec3) -> Self {
        let mut volume = Self::build(params);
        volume.mesh.set_color(color);
        volume.mesh.set_source(MeshSource::Builtin("fov"));
        volume
    }

    /// The parameters this volume was built from.
    pub fn params(&self) -> FovParams {
        self.params
    }

    /// Radius of the base circle.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Distance from apex to base. The cone spans the camera origin to
    /// `far`; see [`clip_depth`](Self::clip_depth) for the `far - near` range.
    pub fn height(&self) -> f32 {
        self.params.far
    }

    /// Length of the clipped viewing range, `far - near`.
    pub fn clip_depth(&self) -> f32 {
        self.params.far - self.params.near
    }

    /// The cone geometry in local space.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// World matrix placing the apex at `position` with the cone opening
    /// along `forward`.
    pub fn placement(position: Vec3, forward: Vec3) -> Mat4 {
        let dir = forward.try_normalize().unwrap_or(Vec3::NEG_Z);
        Mat4::from_rotation_translation(Quat::from_rotation_arc(Vec3::Y, dir), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_radius_from_fov() {
        let volume = FovVolume::build(FovParams::new(90.0, 16.0 / 9.0, 0.1, 10.0));
        assert!(approx(volume.radius(), 10.0));

        let narrow = FovVolume::build(FovParams::new(45.0, 16.0 / 9.0, 0.1, 10.0));
        assert!(approx(narrow.radius(), (22.5_f32).to_radians().tan() * 10.0));
    }

    #[test]
    fn test_clip_depth() {
        let volume = FovVolume::build(FovParams::new(60.0, 16.0 / 9.0, 0.1, 100.0));
        assert!(approx(volume.clip_depth(), 99.9));
        assert!(approx(volume.height(), 100.0));
    }

    #[test]
    fn test_cone_spans_apex_to_far() {
        let volume = FovVolume::build(FovParams::new(60.0, 1.0, 0.1, 20.0));
        let (min, max) = volume.mesh().bounding_box().unwrap();
        assert!(approx(min.y, 0.0));
        assert!(approx(max.y, 20.0));
    }

    #[test]
    fn test_placement_aligns_axis_with_forward() {
        let forward = Vec3::new(1.0, -1.0, 0.0).normalize();
        let m = FovVolume::placement(Vec3::new(3.0, 4.0, 5.0), forward);
        let apex = m.transform_point3(Vec3::ZERO);
        let tip = m.transform_point3(Vec3::Y * 10.0);
        assert!((apex - Vec3::new(3.0, 4.0, 5.0)).length() < 1e-5);
        assert!(((tip - apex).normalize() - forward).length() < 1e-5);
    }

    #[test]
    fn test_placement_zero_forward() {
        let m = FovVolume::placement(Vec3::ZERO, Vec3::ZERO);
        let dir = m.transform_vector3(Vec3::Y);
        assert!((dir - Vec3::NEG_Z).length() < 1e-5);
    }
}
