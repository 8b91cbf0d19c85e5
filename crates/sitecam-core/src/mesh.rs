//! CPU-side triangle meshes.

use glam::{Mat4, Vec3};

/// Where a mesh came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshSource {
    /// Loaded from the asset with this identifier.
    Asset(String),
    /// Stand-in for an asset that failed to load.
    Placeholder { requested: String },
    /// Generated procedurally (ground, FOV cone, ...).
    Builtin(&'static str),
}

/// An indexed triangle mesh with per-vertex normals and a flat color.
#[derive(Debug, Clone)]
pub struct Mesh {
    source: MeshSource,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    color: Vec3,
}

impl Mesh {
    /// Edge length of the placeholder cube.
    pub const PLACEHOLDER_SIZE: f32 = 1.5;
    /// Color of the placeholder cube (`#999999`).
    pub const PLACEHOLDER_COLOR: Vec3 = Vec3::new(0.6, 0.6, 0.6);
    /// Color used for loaded assets without material information.
    pub const DEFAULT_COLOR: Vec3 = Vec3::new(0.55, 0.6, 0.7);

    /// Creates a mesh from raw buffers. Missing normals are recomputed.
    pub fn new(
        source: MeshSource,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        let mut mesh = Self {
            source,
            positions,
            normals,
            indices,
            color: Self::DEFAULT_COLOR,
        };
        if mesh.normals.len() != mesh.positions.len() {
            mesh.recompute_normals();
        }
        mesh
    }

    /// The deterministic stand-in used when an asset cannot be loaded.
    pub fn placeholder(requested: impl Into<String>) -> Self {
        let mut mesh = Self::cuboid(Vec3::splat(Self::PLACEHOLDER_SIZE));
        mesh.source = MeshSource::Placeholder {
            requested: requested.into(),
        };
        mesh.color = Self::PLACEHOLDER_COLOR;
        mesh
    }

    /// An axis-aligned box centered at the origin, with flat-shaded faces.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        // (normal, u axis, v axis) for each face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            let center = normal * h;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push(center + u * h * su + v * h * sv);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            source: MeshSource::Builtin("cuboid"),
            positions,
            normals,
            indices,
            color: Self::DEFAULT_COLOR,
        }
    }

    /// A `width` x `height` rectangle in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self {
            source: MeshSource::Builtin("plane"),
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            color: Self::DEFAULT_COLOR,
        }
    }

    /// An open cone with its apex at the origin and its base circle at
    /// `+Y * height`.
    pub fn open_cone(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut positions = Vec::with_capacity(segments as usize * 2);
        let mut normals = Vec::with_capacity(segments as usize * 2);
        let mut indices = Vec::with_capacity(segments as usize * 3);

        // Slope of the side surface, used for outward normals.
        let slant = Vec3::new(height, -radius, 0.0).normalize_or_zero();

        for i in 0..segments {
            let a0 = i as f32 / segments as f32 * std::f32::consts::TAU;
            let a1 = (i + 1) as f32 / segments as f32 * std::f32::consts::TAU;
            let mid = 0.5 * (a0 + a1);

            let base = positions.len() as u32;
            // Apex gets its own vertex per segment so the normal follows the face.
            positions.push(Vec3::ZERO);
            normals.push(Vec3::new(slant.x * mid.cos(), slant.y, slant.x * mid.sin()));
            for a in [a0, a1] {
                positions.push(Vec3::new(radius * a.cos(), height, radius * a.sin()));
                normals.push(Vec3::new(slant.x * a.cos(), slant.y, slant.x * a.sin()));
            }
            indices.extend_from_slice(&[base, base + 2, base + 1]);
        }

        Self {
            source: MeshSource::Builtin("cone"),
            positions,
            normals,
            indices,
            color: Self::DEFAULT_COLOR,
        }
    }

    /// Sets the flat color.
    #[must_use]
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    /// Bakes a transform into the vertex data.
    pub fn transform(&mut self, matrix: Mat4) {
        let normal_matrix = matrix.inverse().transpose();
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
        for n in &mut self.normals {
            *n = normal_matrix.transform_vector3(*n).normalize_or_zero();
        }
    }

    /// Appends another mesh's triangles.
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Recomputes smooth, area-weighted vertex normals.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if a >= normals.len() || b >= normals.len() || c >= normals.len() {
                continue;
            }
            let n = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        for n in &mut normals {
            *n = n.try_normalize().unwrap_or(Vec3::Y);
        }
        self.normals = normals;
    }

    /// Returns the source tag.
    pub fn source(&self) -> &MeshSource {
        &self.source
    }

    /// Replaces the source tag.
    pub fn set_source(&mut self, source: MeshSource) {
        self.source = source;
    }

    /// Returns true if this mesh stands in for a failed load.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, MeshSource::Placeholder { .. })
    }

    /// Vertex positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Vertex normals, one per position.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangle indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Flat color.
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Sets the flat color.
    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_fixed_cube() {
        let mesh = Mesh::placeholder("car.glb");
        assert!(mesh.is_placeholder());
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.color(), Mesh::PLACEHOLDER_COLOR);
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Vec3::splat(-0.75));
        assert_eq!(max, Vec3::splat(0.75));
        assert_eq!(
            mesh.source(),
            &MeshSource::Placeholder {
                requested: "car.glb".into()
            }
        );
    }

    #[test]
    fn test_cuboid_normals_point_outward() {
        let mesh = Mesh::cuboid(Vec3::ONE);
        for (p, n) in mesh.positions().iter().zip(mesh.normals()) {
            assert!(p.dot(*n) > 0.0);
        }
    }

    #[test]
    fn test_cuboid_winding_matches_normals() {
        let mesh = Mesh::cuboid(Vec3::ONE);
        for tri in mesh.indices().chunks_exact(3) {
            let p = |i: u32| mesh.positions()[i as usize];
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(face.dot(mesh.normals()[tri[0] as usize]) > 0.0);
        }
    }

    #[test]
    fn test_open_cone_extents() {
        let mesh = Mesh::open_cone(2.0, 10.0, 32);
        assert_eq!(mesh.triangle_count(), 32);
        let (min, max) = mesh.bounding_box().unwrap();
        assert!((max.y - 10.0).abs() < 1e-5);
        assert!(min.y.abs() < 1e-5);
        assert!((max.x - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_new_recomputes_missing_normals() {
        let mesh = Mesh::new(
            MeshSource::Asset("tri".into()),
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            Vec::new(),
            vec![0, 1, 2],
        );
        assert_eq!(mesh.normals().len(), 3);
        assert!((mesh.normals()[0] - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_transform_and_append() {
        let mut a = Mesh::plane(2.0, 2.0);
        let mut b = Mesh::plane(2.0, 2.0);
        b.transform(Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        a.append(&b);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(a.indices()[6], 4);
        let (_, max) = a.bounding_box().unwrap();
        assert_eq!(max.z, 5.0);
    }

    #[test]
    fn test_empty_bounding_box() {
        let mesh = Mesh::new(MeshSource::Builtin("empty"), vec![], vec![], vec![]);
        assert!(mesh.is_empty());
        assert!(mesh.bounding_box().is_none());
    }
}
