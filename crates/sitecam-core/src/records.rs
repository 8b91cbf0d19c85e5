//! Camera records from the equipment store.
//!
//! Records are fetched once at startup and turned into [`LogicalCamera`] rigs.
//! The store is read-only from this crate's point of view.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;

use crate::capture::CaptureConfig;
use crate::error::{Result, SitecamError};
use crate::scene::LogicalCamera;
use crate::selection::TargetAxes;

/// One camera entry as stored in the equipment database.
///
/// Accepts either flat columns (`pos_x`, `pos_y`, `pos_z`, `target_x`, ...)
/// or nested `position` / `target` objects. `resolution` may be a number or a
/// string such as `"2688x1520"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct CameraRecord {
    pub name: String,
    pub position: Vec3,
    pub target: TargetAxes,
    pub lens_fov: Option<f32>,
    pub resolution: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
}

impl CameraRecord {
    /// Creates a record with only a name and position.
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            target: TargetAxes::default(),
            lens_fov: None,
            resolution: None,
            near: None,
            far: None,
        }
    }

    /// Builds the rig this record describes, applying capture defaults for
    /// missing optics.
    pub fn to_logical_camera(&self, capture: &CaptureConfig) -> LogicalCamera {
        let near = self.near.unwrap_or(LogicalCamera::DEFAULT_NEAR);
        let far = self.far.unwrap_or(LogicalCamera::DEFAULT_FAR);
        LogicalCamera::new(&self.name, self.position, self.target.resolve())
            .with_lens_fov(capture.effective_lens_fov(self.lens_fov))
            .with_resolution(capture.effective_resolution(self.resolution))
            .with_clip(near, far)
    }
}

#[derive(Deserialize)]
struct Xyz {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResolutionField {
    Number(f32),
    Text(String),
}

impl ResolutionField {
    /// Numeric value, taking the leading integer of strings like `"2688x1520"`.
    fn value(&self) -> Option<f32> {
        match self {
            ResolutionField::Number(n) => Some(*n),
            ResolutionField::Text(s) => {
                let digits: String = s
                    .trim()
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(default, alias = "label")]
    name: Option<String>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    position: Option<Xyz>,
    #[serde(default)]
    target: Option<TargetAxes>,
    #[serde(default)]
    pos_x: Option<f32>,
    #[serde(default)]
    pos_y: Option<f32>,
    #[serde(default)]
    pos_z: Option<f32>,
    #[serde(default)]
    target_x: Option<f32>,
    #[serde(default)]
    target_y: Option<f32>,
    #[serde(default)]
    target_z: Option<f32>,
    #[serde(default, alias = "lensFov", alias = "lens_fov")]
    fov: Option<f32>,
    #[serde(default)]
    resolution: Option<ResolutionField>,
    #[serde(default)]
    near: Option<f32>,
    #[serde(default)]
    far: Option<f32>,
}

impl TryFrom<RawRecord> for CameraRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, Self::Error> {
        let name = raw
            .name
            .or_else(|| {
                raw.id.as_ref().map(|id| match id {
                    serde_json::Value::String(s) => s.clone(),
                    other => format!("Cam {other}"),
                })
            })
            .unwrap_or_else(|| "camera".to_string());

        let position = match (raw.position, raw.pos_x, raw.pos_y, raw.pos_z) {
            (Some(p), ..) => Vec3::new(p.x, p.y, p.z),
            (None, None, None, None) => {
                return Err(format!("camera record '{name}' has no position"));
            }
            (None, x, y, z) => Vec3::new(
                x.unwrap_or_default(),
                y.unwrap_or_default(),
                z.unwrap_or_default(),
            ),
        };

        let target = raw.target.unwrap_or(TargetAxes {
            x: raw.target_x,
            y: raw.target_y,
            z: raw.target_z,
        });

        Ok(Self {
            name,
            position,
            target,
            lens_fov: raw.fov,
            resolution: raw.resolution.as_ref().and_then(ResolutionField::value),
            near: raw.near,
            far: raw.far,
        })
    }
}

/// A read-only list of camera records.
pub trait CameraRecordSource {
    /// Fetches every camera record.
    fn fetch_cameras(&self) -> Result<Vec<CameraRecord>>;
}

impl CameraRecordSource for Vec<CameraRecord> {
    fn fetch_cameras(&self) -> Result<Vec<CameraRecord>> {
        Ok(self.clone())
    }
}

impl CameraRecordSource for [CameraRecord] {
    fn fetch_cameras(&self) -> Result<Vec<CameraRecord>> {
        Ok(self.to_vec())
    }
}

/// Records stored in a JSON file, either as a bare array or as
/// `{ "cameras": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonRecordFile {
    path: PathBuf,
}

impl JsonRecordFile {
    /// Creates a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the records are read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses records from JSON text. Malformed entries are skipped.
    pub fn parse(text: &str) -> Result<Vec<CameraRecord>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Document {
            List(Vec<serde_json::Value>),
            Wrapped { cameras: Vec<serde_json::Value> },
        }

        let document: Document = serde_json::from_str(text)?;
        let entries = match document {
            Document::List(entries) | Document::Wrapped { cameras: entries } => entries,
        };

        let mut records = Vec::with_capacity(entries.len());
        for (i, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<CameraRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("skipping camera record {i}: {e}"),
            }
        }
        Ok(records)
    }
}

impl CameraRecordSource for JsonRecordFile {
    fn fetch_cameras(&self) -> Result<Vec<CameraRecord>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            SitecamError::RecordSource(format!("{}: {e}", self.path.display()))
        })?;
        Self::parse(&text)
    }
}

/// The two rigs used when no records are available.
pub fn fixture_cameras() -> Vec<LogicalCamera> {
    let target = TargetAxes::DEFAULT_TARGET;
    vec![
        LogicalCamera::new("Cam 1", Vec3::new(-10.0, 4.0, 10.0), target)
            .with_lens_fov(90.0)
            .with_resolution(1080.0),
        LogicalCamera::new("Cam 2", Vec3::new(12.0, 4.0, 8.0), target)
            .with_lens_fov(45.0)
            .with_resolution(2688.0),
    ]
}

/// Builds rigs from a record source, falling back to [`fixture_cameras`]
/// when the source fails or yields nothing.
pub fn logical_cameras_from(
    source: &dyn CameraRecordSource,
    capture: &CaptureConfig,
) -> Vec<LogicalCamera> {
    match source.fetch_cameras() {
        Ok(records) if !records.is_empty() => {
            log::info!("loaded {} camera records", records.len());
            records
                .iter()
                .map(|r| r.to_logical_camera(capture))
                .collect()
        }
        Ok(_) => {
            log::info!("no camera records, using fixture cameras");
            fixture_cameras()
        }
        Err(e) => {
            log::warn!("failed to fetch camera records ({e}), using fixture cameras");
            fixture_cameras()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl CameraRecordSource for Failing {
        fn fetch_cameras(&self) -> Result<Vec<CameraRecord>> {
            Err(SitecamError::RecordSource("offline".into()))
        }
    }

    #[test]
    fn test_flat_columns() {
        let record: CameraRecord = serde_json::from_str(
            r#"{ "name": "Gate", "pos_x": 1, "pos_y": 2, "pos_z": 3, "target_y": 0, "fov": 75, "resolution": 1440 }"#,
        )
        .unwrap();
        assert_eq!(record.name, "Gate");
        assert_eq!(record.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(record.target.resolve(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(record.lens_fov, Some(75.0));
        assert_eq!(record.resolution, Some(1440.0));
    }

    #[test]
    fn test_nested_position_and_string_resolution() {
        let record: CameraRecord = serde_json::from_str(
            r#"{ "id": 7, "position": { "x": -10, "y": 4, "z": 10 }, "lensFov": 90, "resolution": "2688x1520" }"#,
        )
        .unwrap();
        assert_eq!(record.name, "Cam 7");
        assert_eq!(record.position, Vec3::new(-10.0, 4.0, 10.0));
        assert_eq!(record.resolution, Some(2688.0));
        assert_eq!(record.target.resolve(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_record_without_position_is_rejected() {
        assert!(serde_json::from_str::<CameraRecord>(r#"{ "name": "x" }"#).is_err());
    }

    #[test]
    fn test_unparseable_resolution_falls_back() {
        let record: CameraRecord = serde_json::from_str(
            r#"{ "name": "x", "pos_x": 0, "resolution": "unknown" }"#,
        )
        .unwrap();
        assert_eq!(record.resolution, None);
        let cam = record.to_logical_camera(&CaptureConfig::default());
        assert_eq!(cam.resolution(), 1080.0);
        assert_eq!(cam.lens_fov(), 60.0);
    }

    #[test]
    fn test_parse_skips_bad_entries() {
        let text = r#"{ "cameras": [
            { "name": "a", "pos_x": 1 },
            { "name": "broken" },
            { "name": "b", "position": { "x": 0, "y": 0, "z": 0 } }
        ] }"#;
        let records = JsonRecordFile::parse(text).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_records_drive_population() {
        let records = vec![CameraRecord::new("Dock", Vec3::new(5.0, 3.0, 0.0))];
        let cams = logical_cameras_from(&records, &CaptureConfig::default());
        assert_eq!(cams.len(), 1);
        assert_eq!(cams[0].name(), "Dock");
    }

    #[test]
    fn test_fixture_fallback() {
        let empty: Vec<CameraRecord> = Vec::new();
        let cams = logical_cameras_from(&empty, &CaptureConfig::default());
        assert_eq!(cams.len(), 2);

        let cams = logical_cameras_from(&Failing, &CaptureConfig::default());
        assert_eq!(cams[0].name(), "Cam 1");
        assert_eq!(cams[0].lens_fov(), 90.0);
        assert_eq!(cams[1].resolution(), 2688.0);
        assert_eq!(cams[1].position(), Vec3::new(12.0, 4.0, 8.0));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = JsonRecordFile::new("/nonexistent/sitecam/cameras.json");
        assert!(matches!(
            source.fetch_cameras(),
            Err(SitecamError::RecordSource(_))
        ));
    }
}
