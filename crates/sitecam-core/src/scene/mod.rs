//! Scene graph: placed objects, lights and camera rigs.

mod arena;
mod logical_camera;

pub use arena::{Arena, Handle};
pub use logical_camera::LogicalCamera;

use glam::{Mat4, Quat, Vec3};

use crate::mesh::Mesh;
use crate::options::SceneConfig;

/// Handle to a [`SceneObject`].
pub type ObjectId = Handle<SceneObject>;
/// Handle to a [`LogicalCamera`].
pub type CameraId = Handle<LogicalCamera>;
/// Handle to a [`Light`].
pub type LightId = Handle<Light>;

/// Position, rotation and scale of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// A pure translation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Sets the rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// The object-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// What role an object plays in the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Ground,
    Model,
}

/// A mesh placed in the world.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub mesh: Mesh,
    pub transform: Transform,
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Creates a model object.
    pub fn model(name: impl Into<String>, mesh: Mesh, transform: Transform) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform,
            kind: ObjectKind::Model,
        }
    }

    /// Creates a square ground plane lying in XZ.
    pub fn ground(size: f32, color: Vec3) -> Self {
        Self {
            name: "ground".into(),
            mesh: Mesh::plane(size, size).with_color(color),
            transform: Transform::default()
                .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            kind: ObjectKind::Ground,
        }
    }
}

/// Scene lighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Parallel light shining from `position` towards the origin.
    Directional {
        position: Vec3,
        color: Vec3,
        intensity: f32,
    },
    /// Uniform fill light.
    Ambient { color: Vec3 },
}

/// One entry yielded by [`SceneGraph::all`].
#[derive(Debug, Clone, Copy)]
pub enum SceneNode<'a> {
    Object(ObjectId, &'a SceneObject),
    Camera(CameraId, &'a LogicalCamera),
    Light(LightId, &'a Light),
}

/// Owns every object, light and camera rig in the site.
///
/// Every mutation bumps [`SceneGraph::revision`], which renderers use to
/// decide when GPU buffers need re-uploading.
#[derive(Default)]
pub struct SceneGraph {
    objects: Arena<SceneObject>,
    cameras: Arena<LogicalCamera>,
    lights: Arena<Light>,
    revision: u64,
}

impl SceneGraph {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Adds an object.
    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        self.touch();
        self.objects.insert(object)
    }

    /// Adds a camera rig.
    pub fn add_camera(&mut self, camera: LogicalCamera) -> CameraId {
        self.touch();
        self.cameras.insert(camera)
    }

    /// Adds a light.
    pub fn add_light(&mut self, light: Light) -> LightId {
        self.touch();
        self.lights.insert(light)
    }

    /// Removes an object.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let removed = self.objects.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Removes a camera rig.
    pub fn remove_camera(&mut self, id: CameraId) -> Option<LogicalCamera> {
        let removed = self.cameras.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Removes a light.
    pub fn remove_light(&mut self, id: LightId) -> Option<Light> {
        let removed = self.lights.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Returns an object.
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    /// Returns an object mutably. Counts as a modification.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        if self.objects.contains(id) {
            self.touch();
        }
        self.objects.get_mut(id)
    }

    /// Returns a camera rig.
    pub fn camera(&self, id: CameraId) -> Option<&LogicalCamera> {
        self.cameras.get(id)
    }

    /// Finds a camera rig by name.
    pub fn camera_by_name(&self, name: &str) -> Option<(CameraId, &LogicalCamera)> {
        self.cameras.iter().find(|(_, c)| c.name() == name)
    }

    /// Returns a light.
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id)
    }

    /// Iterates placed objects.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> + '_ {
        self.objects.iter()
    }

    /// Iterates camera rigs.
    pub fn cameras(&self) -> impl Iterator<Item = (CameraId, &LogicalCamera)> + '_ {
        self.cameras.iter()
    }

    /// Iterates lights.
    pub fn lights(&self) -> impl Iterator<Item = (LightId, &Light)> + '_ {
        self.lights.iter()
    }

    /// Iterates everything in the scene: objects, then cameras, then lights.
    pub fn all(&self) -> impl Iterator<Item = SceneNode<'_>> + '_ {
        self.objects
            .iter()
            .map(|(id, o)| SceneNode::Object(id, o))
            .chain(self.cameras.iter().map(|(id, c)| SceneNode::Camera(id, c)))
            .chain(self.lights.iter().map(|(id, l)| SceneNode::Light(id, l)))
    }

    /// Number of placed objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of camera rigs.
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.objects.len() + self.cameras.len() + self.lights.len()
    }

    /// Returns true if the scene holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.cameras.clear();
        self.lights.clear();
        self.touch();
    }

    /// Monotonic modification counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Position of the `index`-th model in the sample layout: spread along X
    /// around the origin, alternating sides in Z.
    pub fn sample_layout(index: usize, config: &SceneConfig) -> Vec3 {
        let x = (index as f32 - 2.0) * config.layout_spacing;
        let z = if index % 2 == 0 {
            -config.layout_offset
        } else {
            config.layout_offset
        };
        Vec3::new(x, config.layout_height, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_layout() {
        let config = SceneConfig::default();
        let expected = [
            Vec3::new(-12.0, 0.75, -4.0),
            Vec3::new(-6.0, 0.75, 4.0),
            Vec3::new(0.0, 0.75, -4.0),
            Vec3::new(6.0, 0.75, 4.0),
            Vec3::new(12.0, 0.75, -4.0),
        ];
        for (i, pos) in expected.iter().enumerate() {
            assert_eq!(SceneGraph::sample_layout(i, &config), *pos);
        }
    }

    #[test]
    fn test_add_remove_and_all() {
        let mut scene = SceneGraph::new();
        let obj = scene.add_object(SceneObject::model(
            "box",
            Mesh::cuboid(Vec3::ONE),
            Transform::default(),
        ));
        let cam = scene.add_camera(LogicalCamera::new("Cam 1", Vec3::ONE, Vec3::Y));
        scene.add_light(Light::Ambient { color: Vec3::ONE });
        assert_eq!(scene.all().count(), 3);

        let r0 = scene.revision();
        assert!(scene.remove_object(obj).is_some());
        assert!(scene.revision() > r0);
        assert!(scene.object(obj).is_none());
        assert!(scene.remove_object(obj).is_none());

        assert_eq!(scene.camera(cam).unwrap().name(), "Cam 1");
        assert_eq!(scene.camera_by_name("Cam 1").unwrap().0, cam);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_all_yields_each_kind() {
        let mut scene = SceneGraph::new();
        scene.add_object(SceneObject::ground(100.0, Vec3::ONE));
        scene.add_camera(LogicalCamera::new("a", Vec3::ONE, Vec3::ZERO));
        let kinds: Vec<_> = scene
            .all()
            .map(|node| match node {
                SceneNode::Object(..) => "object",
                SceneNode::Camera(..) => "camera",
                SceneNode::Light(..) => "light",
            })
            .collect();
        assert_eq!(kinds, vec!["object", "camera"]);
    }

    #[test]
    fn test_ground_lies_in_xz() {
        let ground = SceneObject::ground(100.0, Vec3::ONE);
        let m = ground.transform.matrix();
        let normal = m.transform_vector3(Vec3::Z);
        assert!((normal - Vec3::Y).length() < 1e-5);
        assert_eq!(ground.kind, ObjectKind::Ground);
    }

    #[test]
    fn test_clear_bumps_revision() {
        let mut scene = SceneGraph::new();
        scene.add_light(Light::Ambient { color: Vec3::ONE });
        let r = scene.revision();
        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.revision() > r);
    }
}
