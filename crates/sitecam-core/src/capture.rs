//! Sizing policy for simulated camera captures.
//!
//! A selected camera is rendered into a deliberately small off-screen buffer
//! and then stretched onto a fixed-size overlay quad. The buffer size is a
//! function of the camera's nominal resolution, so low-resolution cameras
//! produce visibly coarser previews.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SitecamError};

/// Policy constants for deriving capture buffer sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Fraction of the nominal width kept in the buffer.
    pub downscale: f32,
    /// Width to height ratio of the buffer.
    pub aspect: AspectRatio,
    /// Smallest buffer width.
    pub min_width: u32,
    /// Smallest buffer height.
    pub min_height: u32,
    /// Nominal widths above this are clamped before downscaling.
    pub max_base_width: f32,
    /// Resolution used when the selection has none, or a non-positive one.
    pub default_resolution: f32,
    /// Lens field of view (degrees) used when the selection has none.
    pub default_lens_fov: f32,
    /// Near clip of the capture camera.
    pub near: f32,
    /// Far clip of the capture camera.
    pub far: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            downscale: 0.18,
            aspect: AspectRatio::WIDESCREEN,
            min_width: 64,
            min_height: 36,
            max_base_width: 1920.0,
            default_resolution: 1080.0,
            default_lens_fov: 60.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

/// An exact width to height ratio, such as 16:9.
///
/// Kept as integers so the derived height rounds the same way as
/// `width * 9 / 16` does on paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// 16:9.
    pub const WIDESCREEN: Self = Self::new(16, 9);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The ratio as a float, for projection matrices.
    pub fn ratio(self) -> f32 {
        (f64::from(self.width) / f64::from(self.height)) as f32
    }

    /// Height matching `width`, before rounding.
    pub fn height_for(self, width: f64) -> f64 {
        width * f64::from(self.height) / f64::from(self.width)
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::WIDESCREEN
    }
}

/// Width and height of an off-screen buffer, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferSize {
    pub width: u32,
    pub height: u32,
}

impl BufferSize {
    /// Creates a new buffer size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in the buffer.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for BufferSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl CaptureConfig {
    /// Checks that the policy can produce a buffer for any input.
    pub fn validate(&self) -> Result<()> {
        if !(self.downscale.is_finite() && self.downscale > 0.0) {
            return Err(SitecamError::InvalidConfig(format!(
                "capture downscale must be positive, got {}",
                self.downscale
            )));
        }
        if self.aspect.width == 0 || self.aspect.height == 0 {
            return Err(SitecamError::InvalidConfig(format!(
                "capture aspect must be non-zero, got {}:{}",
                self.aspect.width, self.aspect.height
            )));
        }
        if self.min_width == 0 || self.min_height == 0 {
            return Err(SitecamError::InvalidConfig(
                "capture minimum size must be non-zero".into(),
            ));
        }
        if !(self.default_resolution.is_finite() && self.default_resolution > 0.0) {
            return Err(SitecamError::InvalidConfig(format!(
                "default resolution must be positive, got {}",
                self.default_resolution
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(SitecamError::InvalidConfig(format!(
                "capture clip range is empty: near {}, far {}",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// Returns the resolution to simulate, substituting the default for
    /// missing, non-positive or non-finite values.
    pub fn effective_resolution(&self, resolution: Option<f32>) -> f32 {
        match resolution {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => self.default_resolution,
        }
    }

    /// Returns the lens field of view to simulate, in degrees.
    pub fn effective_lens_fov(&self, lens_fov: Option<f32>) -> f32 {
        match lens_fov {
            Some(fov) if fov.is_finite() && fov > 0.0 && fov < 180.0 => fov,
            _ => self.default_lens_fov,
        }
    }

    /// Derives the capture buffer size for a nominal camera resolution.
    ///
    /// Monotonic in `resolution` and never smaller than
    /// `min_width` x `min_height`.
    pub fn buffer_size(&self, resolution: Option<f32>) -> BufferSize {
        let resolution = f64::from(self.effective_resolution(resolution));
        let base_width = resolution.min(f64::from(self.max_base_width));

        let width = (base_width * f64::from(self.downscale))
            .round()
            .max(f64::from(self.min_width));
        let height = self
            .aspect
            .height_for(width)
            .round()
            .max(f64::from(self.min_height));

        BufferSize::new(width as u32, height as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_constants() {
        let config = CaptureConfig::default();
        assert_eq!(config.downscale, 0.18);
        assert_eq!(config.aspect, AspectRatio::new(16, 9));
        assert!((config.aspect.ratio() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(config.min_width, 64);
        assert_eq!(config.min_height, 36);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buffer_size_1080() {
        let config = CaptureConfig::default();
        assert_eq!(config.buffer_size(Some(1080.0)), BufferSize::new(194, 109));
    }

    #[test]
    fn test_buffer_size_2688_is_clamped_to_1920() {
        let config = CaptureConfig::default();
        assert_eq!(config.buffer_size(Some(2688.0)), BufferSize::new(346, 195));
        assert_eq!(
            config.buffer_size(Some(2688.0)),
            config.buffer_size(Some(1920.0))
        );
    }

    #[test]
    fn test_missing_or_bad_resolution_falls_back() {
        let config = CaptureConfig::default();
        let expected = config.buffer_size(Some(1080.0));
        assert_eq!(config.buffer_size(None), expected);
        assert_eq!(config.buffer_size(Some(0.0)), expected);
        assert_eq!(config.buffer_size(Some(-720.0)), expected);
        assert_eq!(config.buffer_size(Some(f32::NAN)), expected);
        assert_eq!(config.buffer_size(Some(f32::INFINITY)), expected);
    }

    #[test]
    fn test_half_pixel_heights_round_up() {
        let config = CaptureConfig::default();
        // 72 * 9 / 16 = 40.5 and 200 * 9 / 16 = 112.5
        assert_eq!(config.buffer_size(Some(400.0)), BufferSize::new(72, 41));
        assert_eq!(config.buffer_size(Some(1111.0)), BufferSize::new(200, 113));
    }

    #[test]
    fn test_validate_rejects_zero_aspect() {
        let config = CaptureConfig {
            aspect: AspectRatio::new(16, 0),
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiny_resolution_hits_minimums() {
        let config = CaptureConfig::default();
        assert_eq!(config.buffer_size(Some(1.0)), BufferSize::new(64, 36));
        assert_eq!(config.buffer_size(Some(100.0)), BufferSize::new(64, 36));
    }

    #[test]
    fn test_custom_policy() {
        let config = CaptureConfig {
            downscale: 0.5,
            aspect: AspectRatio::new(4, 3),
            ..CaptureConfig::default()
        };
        assert_eq!(config.buffer_size(Some(640.0)), BufferSize::new(320, 240));
    }

    #[test]
    fn test_lens_fov_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.effective_lens_fov(Some(45.0)), 45.0);
        assert_eq!(config.effective_lens_fov(None), 60.0);
        assert_eq!(config.effective_lens_fov(Some(0.0)), 60.0);
        assert_eq!(config.effective_lens_fov(Some(270.0)), 60.0);
    }

    #[test]
    fn test_validate_rejects_degenerate_policy() {
        let bad_downscale = CaptureConfig {
            downscale: 0.0,
            ..CaptureConfig::default()
        };
        assert!(bad_downscale.validate().is_err());

        let bad_clip = CaptureConfig {
            near: 5.0,
            far: 1.0,
            ..CaptureConfig::default()
        };
        assert!(bad_clip.validate().is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: CaptureConfig =
            serde_json::from_str(r#"{ "downscale": 0.25, "minWidth": 80 }"#).unwrap();
        assert_eq!(config.downscale, 0.25);
        assert_eq!(config.min_width, 80);
        assert_eq!(config.min_height, 36);
    }
}
