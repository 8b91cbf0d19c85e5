//! Configuration options for sitecam.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capture::CaptureConfig;
use crate::error::{Result, SitecamError};

/// Converts a `0xRRGGBB` color to linear-ish `[0, 1]` components.
pub fn color_from_hex(hex: u32) -> Vec3 {
    let r = (hex >> 16) & 0xff;
    let g = (hex >> 8) & 0xff;
    let b = hex & 0xff;
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// Global configuration for a sitecam session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Window title.
    pub window_title: String,

    /// Initial window size in physical pixels.
    pub window_size: [u32; 2],

    /// Directory model identifiers are resolved against.
    pub asset_dir: PathBuf,

    /// Model identifiers placed in the sample layout, in order.
    pub models: Vec<String>,

    /// Per-asset load timeout in milliseconds.
    pub asset_timeout_ms: u64,

    /// Optional JSON file with camera records.
    pub camera_records: Option<PathBuf>,

    /// Scene appearance and layout.
    pub scene: SceneConfig,

    /// Navigation camera.
    pub main_camera: MainCameraConfig,

    /// Capture buffer sizing policy.
    pub capture: CaptureConfig,

    /// Picture-in-picture placement.
    pub overlay: OverlayConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_title: "sitecam".to_string(),
            window_size: [1280, 800],
            asset_dir: PathBuf::from("./public/models"),
            models: ["car.glb", "motorcycle.glb", "person.glb", "dog.glb", "tree.glb"]
                .into_iter()
                .map(String::from)
                .collect(),
            asset_timeout_ms: 10_000,
            camera_records: None,
            scene: SceneConfig::default(),
            main_camera: MainCameraConfig::default(),
            capture: CaptureConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl Options {
    /// Reads options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks every section for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.window_size[0] == 0 || self.window_size[1] == 0 {
            return Err(SitecamError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.window_size[0], self.window_size[1]
            )));
        }
        if self.asset_timeout_ms == 0 {
            return Err(SitecamError::InvalidConfig(
                "asset timeout must be non-zero".into(),
            ));
        }
        self.capture.validate()?;
        self.overlay.validate()?;
        self.main_camera.validate()?;
        Ok(())
    }

    /// Per-asset load timeout.
    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }
}

/// Scene appearance and sample layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Clear color of the main view.
    pub background_color: Vec3,
    /// Side length of the square ground plane.
    pub ground_size: f32,
    /// Ground plane color.
    pub ground_color: Vec3,
    /// Directional light position; it shines towards the origin.
    pub light_position: Vec3,
    /// Directional light color.
    pub light_color: Vec3,
    /// Directional light intensity.
    pub light_intensity: f32,
    /// Ambient light color.
    pub ambient_color: Vec3,
    /// Distance between consecutive models along X.
    pub layout_spacing: f32,
    /// Alternating lateral offset along Z.
    pub layout_offset: f32,
    /// Height models are placed at.
    pub layout_height: f32,
    /// Color of FOV cones.
    pub fov_color: Vec3,
    /// Opacity of FOV cones.
    pub fov_opacity: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background_color: color_from_hex(0xf3_f4_f6),
            ground_size: 100.0,
            ground_color: color_from_hex(0xe5_e7_eb),
            light_position: Vec3::new(20.0, 30.0, 20.0),
            light_color: Vec3::ONE,
            light_intensity: 1.0,
            ambient_color: color_from_hex(0x66_66_66),
            layout_spacing: 6.0,
            layout_offset: 4.0,
            layout_height: 0.75,
            fov_color: color_from_hex(0x60_a5_fa),
            fov_opacity: 0.15,
        }
    }
}

/// Navigation camera defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MainCameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for MainCameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 15.0, 30.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl MainCameraConfig {
    fn validate(&self) -> Result<()> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(SitecamError::InvalidConfig(format!(
                "main camera fov must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(SitecamError::InvalidConfig(format!(
                "main camera clip range is empty: near {}, far {}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// Picture-in-picture quad placement, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Presented width, independent of the capture buffer size.
    pub width: f32,
    /// Presented height.
    pub height: f32,
    /// Distance of the quad center from the right edge.
    pub offset_x: f32,
    /// Distance of the quad center from the bottom edge.
    pub offset_y: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: 320.0,
            height: 180.0,
            offset_x: 170.0,
            offset_y: 100.0,
        }
    }
}

impl OverlayConfig {
    fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(SitecamError::InvalidConfig(format!(
                "overlay size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(color_from_hex(0xffffff), Vec3::ONE);
        assert_eq!(color_from_hex(0x000000), Vec3::ZERO);
        assert_eq!(color_from_hex(0x999999), Vec3::splat(0.6));
        let c = color_from_hex(0x60a5fa);
        assert!((c.x - 96.0 / 255.0).abs() < 1e-6);
        assert!((c.z - 250.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.window_size, [1280, 800]);
        assert_eq!(options.models.len(), 5);
        assert_eq!(options.models[0], "car.glb");
        assert_eq!(options.overlay.offset_x, 170.0);
        assert_eq!(options.main_camera.far, 1000.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{
            "window_title": "Yard",
            "models": ["crane.glb"],
            "overlay": { "width": 480 },
            "capture": { "downscale": 0.25 }
        }"#;
        let options: Options = serde_json::from_str(json).unwrap();
        assert_eq!(options.window_title, "Yard");
        assert_eq!(options.models, vec!["crane.glb".to_string()]);
        assert_eq!(options.overlay.width, 480.0);
        assert_eq!(options.overlay.height, 180.0);
        assert_eq!(options.capture.downscale, 0.25);
        assert_eq!(options.capture.min_width, 64);
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut options = Options::default();
        options.overlay.width = 0.0;
        assert!(options.validate().is_err());

        let mut options = Options::default();
        options.main_camera.near = 0.0;
        assert!(options.validate().is_err());

        let mut options = Options::default();
        options.window_size = [0, 800];
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = std::env::temp_dir().join("sitecam-options-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("options.json");
        std::fs::write(&path, r#"{ "asset_timeout_ms": 250 }"#).unwrap();

        let options = Options::from_json_file(&path).unwrap();
        assert_eq!(options.asset_timeout(), Duration::from_millis(250));

        std::fs::write(&path, r#"{ "asset_timeout_ms": 0 }"#).unwrap();
        assert!(Options::from_json_file(&path).is_err());
    }
}
