//! Asynchronous model loading.
//!
//! Loads never fail from the caller's point of view: a missing file, a parse
//! error or a timeout all resolve to [`Mesh::placeholder`]. The whole model
//! list is loaded concurrently and delivered at once through
//! [`PendingAssets`], which the render loop polls without blocking.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use futures_util::future::join_all;
use glam::{Mat4, Vec3};

use crate::error::{Result, SitecamError};
use crate::mesh::{Mesh, MeshSource};

/// How a load settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The placeholder was substituted; carries the reason.
    Fallback(String),
}

/// A settled load.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub identifier: String,
    pub mesh: Mesh,
    pub outcome: LoadOutcome,
}

impl LoadedAsset {
    fn loaded(identifier: &str, mesh: Mesh) -> Self {
        Self {
            identifier: identifier.to_string(),
            mesh,
            outcome: LoadOutcome::Loaded,
        }
    }

    /// A placeholder standing in for `identifier`.
    pub fn fallback(identifier: &str, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.to_string(),
            mesh: Mesh::placeholder(identifier),
            outcome: LoadOutcome::Fallback(reason.into()),
        }
    }

    /// Returns true if the placeholder was substituted.
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Fallback(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFormat {
    Gltf,
    Obj,
}

impl ModelFormat {
    fn from_identifier(identifier: &str) -> Result<Self> {
        let ext = Path::new(identifier)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("glb" | "gltf") => Ok(ModelFormat::Gltf),
            Some("obj") => Ok(ModelFormat::Obj),
            _ => Err(SitecamError::UnsupportedFormat(identifier.to_string())),
        }
    }
}

/// Resolves model identifiers to meshes under an asset directory.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    timeout: Duration,
}

impl AssetLoader {
    /// Default per-asset timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a loader resolving identifiers against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-asset timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asset directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path an identifier resolves to.
    pub fn resolve(&self, identifier: &str) -> PathBuf {
        self.root.join(identifier)
    }

    /// Loads one model. Always resolves; failures yield the placeholder.
    pub async fn load(&self, identifier: &str) -> LoadedAsset {
        let result = tokio::time::timeout(self.timeout, self.try_load(identifier))
            .await
            .unwrap_or_else(|_| Err(SitecamError::AssetTimeout(identifier.to_string())));

        match result {
            Ok(mesh) => {
                log::debug!(
                    "loaded asset '{identifier}' ({} triangles)",
                    mesh.triangle_count()
                );
                LoadedAsset::loaded(identifier, mesh)
            }
            Err(e) => {
                log::warn!("asset '{identifier}' replaced by placeholder: {e}");
                LoadedAsset::fallback(identifier, e.to_string())
            }
        }
    }

    async fn try_load(&self, identifier: &str) -> Result<Mesh> {
        let format = ModelFormat::from_identifier(identifier)?;
        let path = self.resolve(identifier);
        let bytes = tokio::fs::read(&path).await?;

        let id = identifier.to_string();
        let base = path.parent().map(Path::to_path_buf);
        tokio::task::spawn_blocking(move || match format {
            ModelFormat::Gltf => parse_gltf(&id, &bytes, base.as_deref()),
            ModelFormat::Obj => parse_obj(&id, &bytes),
        })
        .await
        .map_err(|e| SitecamError::AssetParse {
            identifier: identifier.to_string(),
            message: e.to_string(),
        })?
    }

    /// Loads every identifier concurrently, in input order.
    pub async fn load_all(&self, identifiers: &[String]) -> Vec<LoadedAsset> {
        join_all(identifiers.iter().map(|id| self.load(id))).await
    }

    /// Starts loading every identifier on `runtime` and returns the gate the
    /// render loop polls.
    pub fn spawn_all(
        &self,
        runtime: &tokio::runtime::Handle,
        identifiers: Vec<String>,
    ) -> PendingAssets {
        let (sender, receiver) = mpsc::channel();
        let loader = self.clone();
        let ids = identifiers.clone();
        log::info!("loading {} assets from {}", ids.len(), self.root.display());
        runtime.spawn(async move {
            let assets = loader.load_all(&ids).await;
            let _ = sender.send(assets);
        });
        PendingAssets {
            state: PendingState::Waiting {
                receiver,
                identifiers,
            },
        }
    }
}

enum PendingState {
    Waiting {
        receiver: Receiver<Vec<LoadedAsset>>,
        identifiers: Vec<String>,
    },
    Ready(Vec<LoadedAsset>),
    Taken,
}

/// The "all loaded" gate.
///
/// [`PendingAssets::try_take`] yields the settled assets exactly once. If the
/// loading task dies without reporting, every identifier resolves to the
/// placeholder.
pub struct PendingAssets {
    state: PendingState,
}

impl PendingAssets {
    /// A gate that is already open.
    pub fn ready(assets: Vec<LoadedAsset>) -> Self {
        Self {
            state: PendingState::Ready(assets),
        }
    }

    /// Returns the assets once every load has settled; `None` before that
    /// and after they have been taken.
    pub fn try_take(&mut self) -> Option<Vec<LoadedAsset>> {
        let assets = match &self.state {
            PendingState::Taken => return None,
            PendingState::Ready(_) => None,
            PendingState::Waiting {
                receiver,
                identifiers,
            } => match receiver.try_recv() {
                Ok(assets) => Some(assets),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("asset loading task ended without results");
                    Some(
                        identifiers
                            .iter()
                            .map(|id| LoadedAsset::fallback(id, "loading task ended"))
                            .collect(),
                    )
                }
            },
        };

        match std::mem::replace(&mut self.state, PendingState::Taken) {
            PendingState::Ready(ready) => Some(ready),
            _ => assets,
        }
    }

    /// Returns true once the assets have been handed out.
    pub fn is_taken(&self) -> bool {
        matches!(self.state, PendingState::Taken)
    }
}

fn parse_error(identifier: &str, message: impl ToString) -> SitecamError {
    SitecamError::AssetParse {
        identifier: identifier.to_string(),
        message: message.to_string(),
    }
}

/// Flattens every triangle primitive of the default scene into one mesh.
fn parse_gltf(identifier: &str, bytes: &[u8], base: Option<&Path>) -> Result<Mesh> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).map_err(|e| parse_error(identifier, e))?;
    let buffers =
        gltf::import_buffers(&document, base, blob).map_err(|e| parse_error(identifier, e))?;

    let mut out = Mesh::new(
        MeshSource::Asset(identifier.to_string()),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );
    let mut color = None;

    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(identifier, &node, Mat4::IDENTITY, &buffers, &mut out, &mut color)?;
            }
        }
        None => {
            for mesh in document.meshes() {
                collect_mesh(identifier, &mesh, Mat4::IDENTITY, &buffers, &mut out, &mut color)?;
            }
        }
    }

    if out.is_empty() {
        return Err(SitecamError::EmptyMesh(identifier.to_string()));
    }
    if let Some(color) = color {
        out.set_color(color);
    }
    Ok(out)
}

fn collect_node(
    identifier: &str,
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Mesh,
    color: &mut Option<Vec3>,
) -> Result<()> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        collect_mesh(identifier, &mesh, world, buffers, out, color)?;
    }
    for child in node.children() {
        collect_node(identifier, &child, world, buffers, out, color)?;
    }
    Ok(())
}

fn collect_mesh(
    identifier: &str,
    mesh: &gltf::Mesh<'_>,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Mesh,
    color: &mut Option<Vec3>,
) -> Result<()> {
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from).collect();
        let normals: Vec<Vec3> = reader
            .read_normals()
            .map(|n| n.map(Vec3::from).collect())
            .unwrap_or_default();
        let indices: Vec<u32> = reader
            .read_indices()
            .map_or_else(|| (0..positions.len() as u32).collect(), |i| i.into_u32().collect());
        check_triangles(identifier, positions.len(), &indices)?;

        let mut part = Mesh::new(out.source().clone(), positions, normals, indices);
        part.transform(world);
        out.append(&part);

        if color.is_none() {
            let [r, g, b, _] = primitive.material().pbr_metallic_roughness().base_color_factor();
            *color = Some(Vec3::new(r, g, b));
        }
    }
    Ok(())
}

/// Rejects index lists that are not whole triangles over `vertex_count`
/// vertices.
fn check_triangles(identifier: &str, vertex_count: usize, indices: &[u32]) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(parse_error(
            identifier,
            format!("{} indices do not form whole triangles", indices.len()),
        ));
    }
    if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(parse_error(
            identifier,
            format!("index {index} out of range for {vertex_count} vertices"),
        ));
    }
    Ok(())
}

fn parse_obj(identifier: &str, bytes: &[u8]) -> Result<Mesh> {
    let mut reader = Cursor::new(bytes);
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|e| parse_error(identifier, e))?;

    let mut out = Mesh::new(
        MeshSource::Asset(identifier.to_string()),
        Vec::new(),
        Vec::new(),
        Vec::new(),
    );
    for model in models {
        let mesh = model.mesh;
        let positions: Vec<Vec3> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        let normals: Vec<Vec3> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]))
            .collect();
        check_triangles(identifier, positions.len(), &mesh.indices)?;
        out.append(&Mesh::new(
            out.source().clone(),
            positions,
            normals,
            mesh.indices,
        ));
    }

    if out.is_empty() {
        return Err(SitecamError::EmptyMesh(identifier.to_string()));
    }
    Ok(out)
}
