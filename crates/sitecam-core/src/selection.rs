//! Camera selection input.
//!
//! The host decides which camera (if any) is being previewed. The render loop
//! samples the selection once per tick and never caches it across ticks.

use std::sync::{Arc, PoisonError, RwLock};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureConfig;
use crate::error::Result;

/// Target point where each axis may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetAxes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl TargetAxes {
    /// Target used when an axis is missing.
    pub const DEFAULT_TARGET: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    /// A target with every axis present.
    pub fn full(target: Vec3) -> Self {
        Self {
            x: Some(target.x),
            y: Some(target.y),
            z: Some(target.z),
        }
    }

    /// Resolves the target, filling missing axes from `(0, 1, 0)`.
    pub fn resolve(&self) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(Self::DEFAULT_TARGET.x),
            self.y.unwrap_or(Self::DEFAULT_TARGET.y),
            self.z.unwrap_or(Self::DEFAULT_TARGET.z),
        )
    }
}

/// Live parameters of the selected camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSnapshot {
    #[serde(with = "point")]
    pub position: Vec3,
    #[serde(default)]
    pub target: TargetAxes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_fov: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f32>,
}

impl CameraSnapshot {
    /// Creates a snapshot with every field present.
    pub fn new(position: Vec3, target: Vec3, lens_fov: f32, resolution: f32) -> Self {
        Self {
            position,
            target: TargetAxes::full(target),
            lens_fov: Some(lens_fov),
            resolution: Some(resolution),
        }
    }

    /// Creates a snapshot with only a position; everything else defaults.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            target: TargetAxes::default(),
            lens_fov: None,
            resolution: None,
        }
    }

    /// The look-at target with missing axes filled in.
    pub fn resolved_target(&self) -> Vec3 {
        self.target.resolve()
    }

    /// The lens field of view (degrees) after applying the capture defaults.
    pub fn lens_fov_or_default(&self, config: &CaptureConfig) -> f32 {
        config.effective_lens_fov(self.lens_fov)
    }

    /// The nominal resolution after applying the capture defaults.
    pub fn resolution_or_default(&self, config: &CaptureConfig) -> f32 {
        config.effective_resolution(self.resolution)
    }
}

/// Which camera, if any, is being previewed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    /// No camera selected: no capture buffer, no overlay.
    #[default]
    None,
    /// A camera is selected.
    Active(CameraSnapshot),
}

impl Selection {
    /// Returns the snapshot if a camera is selected.
    pub fn snapshot(&self) -> Option<&CameraSnapshot> {
        match self {
            Selection::None => None,
            Selection::Active(snapshot) => Some(snapshot),
        }
    }

    /// Returns true if a camera is selected.
    pub fn is_active(&self) -> bool {
        matches!(self, Selection::Active(_))
    }

    /// Parses a selection from JSON; `null` means no selection.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Option<CameraSnapshot> = serde_json::from_str(json)?;
        Ok(snapshot.into())
    }
}

impl From<Option<CameraSnapshot>> for Selection {
    fn from(snapshot: Option<CameraSnapshot>) -> Self {
        snapshot.map_or(Selection::None, Selection::Active)
    }
}

impl From<CameraSnapshot> for Selection {
    fn from(snapshot: CameraSnapshot) -> Self {
        Selection::Active(snapshot)
    }
}

/// Something the render loop can sample the current selection from.
pub trait SelectionSource {
    /// Returns the selection for this tick.
    fn sample(&self) -> Selection;
}

impl SelectionSource for Selection {
    fn sample(&self) -> Selection {
        self.clone()
    }
}

impl<F> SelectionSource for F
where
    F: Fn() -> Selection,
{
    fn sample(&self) -> Selection {
        self()
    }
}

/// Cloneable selection handle shared between the host and the render loop.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection {
    inner: Arc<RwLock<Selection>>,
}

impl SharedSelection {
    /// Creates a handle with no camera selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the selection.
    pub fn set(&self, selection: Selection) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = selection;
    }

    /// Selects a camera.
    pub fn select(&self, snapshot: CameraSnapshot) {
        self.set(Selection::Active(snapshot));
    }

    /// Clears the selection.
    pub fn clear(&self) {
        self.set(Selection::None);
    }

    /// Returns a copy of the current selection.
    pub fn current(&self) -> Selection {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SelectionSource for SharedSelection {
    fn sample(&self) -> Selection {
        self.current()
    }
}

/// Serializes a `Vec3` as `{x, y, z}`.
mod point {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Point {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        Point {
            x: v.x,
            y: v.y,
            z: v.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        let p = Point::deserialize(deserializer)?;
        Ok(Vec3::new(p.x, p.y, p.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults_per_axis() {
        let target = TargetAxes {
            x: Some(5.0),
            y: None,
            z: Some(-2.0),
        };
        assert_eq!(target.resolve(), Vec3::new(5.0, 1.0, -2.0));
        assert_eq!(TargetAxes::default().resolve(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_explicit_zero_axis_is_kept() {
        let target = TargetAxes::full(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(target.resolve(), Vec3::ZERO);
    }

    #[test]
    fn test_selection_from_json() {
        let json = r#"{
            "position": { "x": -10, "y": 4, "z": 10 },
            "target": { "x": 0, "z": 0 },
            "lensFov": 90,
            "resolution": 1080
        }"#;
        let selection = Selection::from_json(json).unwrap();
        let snapshot = selection.snapshot().unwrap();
        assert_eq!(snapshot.position, Vec3::new(-10.0, 4.0, 10.0));
        assert_eq!(snapshot.resolved_target(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(snapshot.lens_fov, Some(90.0));
        assert_eq!(snapshot.resolution, Some(1080.0));
    }

    #[test]
    fn test_selection_null_is_none() {
        assert_eq!(Selection::from_json("null").unwrap(), Selection::None);
    }

    #[test]
    fn test_selection_minimal_json() {
        let selection = Selection::from_json(r#"{ "position": { "x": 1, "y": 2, "z": 3 } }"#)
            .unwrap();
        let snapshot = selection.snapshot().unwrap();
        let config = CaptureConfig::default();
        assert_eq!(snapshot.lens_fov_or_default(&config), 60.0);
        assert_eq!(snapshot.resolution_or_default(&config), 1080.0);
    }

    #[test]
    fn test_selection_without_position_is_rejected() {
        assert!(Selection::from_json(r#"{ "resolution": 1080 }"#).is_err());
    }

    #[test]
    fn test_shared_selection_switches() {
        let shared = SharedSelection::new();
        let reader = shared.clone();
        assert_eq!(reader.sample(), Selection::None);

        shared.select(CameraSnapshot::at(Vec3::X));
        assert!(reader.sample().is_active());

        shared.clear();
        assert!(!reader.sample().is_active());
    }

    #[test]
    fn test_closure_source() {
        let source = || Selection::Active(CameraSnapshot::at(Vec3::Y));
        assert!(source.sample().is_active());
    }
}
