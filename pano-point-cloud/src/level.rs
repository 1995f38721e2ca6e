/// Horizon leveling for equirectangular panoramas
use crate::config::LevelingSource;
use crate::constants::LEVELING_EPSILON;
use crate::error::{PipelineError, Result};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Camera attitude to undo, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelingAngles {
    /// Positive when the camera looked up.
    pub pitch: f64,
    /// Positive when tilted clockwise looking forward.
    pub roll: f64,
    pub heading: f64,
}

impl LevelingAngles {
    pub fn from_degrees(pitch: f64, roll: f64, heading: f64) -> Self {
        Self {
            pitch: pitch.to_radians(),
            roll: roll.to_radians(),
            heading: heading.to_radians(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.roll.is_finite() && self.heading.is_finite()
    }

    pub fn is_negligible(&self) -> bool {
        self.pitch.abs() < LEVELING_EPSILON
            && self.roll.abs() < LEVELING_EPSILON
            && self.heading.abs() < LEVELING_EPSILON
    }
}

/// JSON sidecar written by the panorama acquisition tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanoramaMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
    /// The image was already leveled when it was saved.
    #[serde(default)]
    pub auto_leveled: bool,
}

impl PanoramaMetadata {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PipelineError::SidecarRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| PipelineError::SidecarParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Angles still to correct, or `None` if the image is already level.
    /// Heading is kept so the panorama's orientation is preserved.
    pub fn correction(&self) -> Option<LevelingAngles> {
        if self.auto_leveled {
            return None;
        }
        Some(LevelingAngles {
            pitch: self.pitch,
            roll: normalize_angle(self.roll),
            heading: 0.0,
        })
    }
}

/// Resolve the configured leveling source into concrete angles.
pub fn resolve_angles(source: &LevelingSource) -> Result<Option<LevelingAngles>> {
    match source {
        LevelingSource::Disabled => Ok(None),
        LevelingSource::Manual(angles) => Ok(Some(*angles)),
        LevelingSource::Sidecar(path) => {
            let metadata = PanoramaMetadata::from_file(path)?;
            let correction = metadata.correction();
            if correction.is_none() {
                info!("{} reports an already leveled panorama", path.display());
            }
            Ok(correction)
        }
    }
}

/// Wrap an angle into (-π, π].
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Rotate an equirectangular image so the horizon is level.
///
/// Every output pixel is traced back through the inverse camera rotation
/// (heading about Y, pitch about Z, roll about X) and sampled bilinearly,
/// wrapping horizontally.
pub fn level_panorama(image: &RgbImage, angles: LevelingAngles) -> RgbImage {
    if angles.is_negligible() || image.width() < 2 || image.height() < 2 {
        return image.clone();
    }

    debug!(?angles, "Leveling panorama");

    let width = image.width();
    let height = image.height();
    let max_u = f64::from(width - 1);
    let max_v = f64::from(height - 1);

    let (sh, ch) = (-angles.heading).sin_cos();
    let (sp, cp) = (-angles.pitch).sin_cos();
    let (sr, cr) = angles.roll.sin_cos();

    RgbImage::from_fn(width, height, |u, v| {
        let polar = f64::from(v) / max_v * PI;
        let azimuth = f64::from(u) / max_u * TAU;

        let x = polar.sin() * azimuth.cos();
        let y = polar.cos();
        let z = polar.sin() * azimuth.sin();

        let (x1, y1, z1) = (ch * x + sh * z, y, -sh * x + ch * z);
        let (x2, y2, z2) = (cp * x1 - sp * y1, sp * x1 + cp * y1, z1);
        let (x3, y3, z3) = (x2, cr * y2 - sr * z2, sr * y2 + cr * z2);

        let source_polar = y3.clamp(-1.0, 1.0).acos();
        let source_azimuth = z3.atan2(x3).rem_euclid(TAU);

        sample_bilinear(
            image,
            source_azimuth / TAU * max_u,
            source_polar / PI * max_v,
        )
    })
}

fn sample_bilinear(image: &RgbImage, u: f64, v: f64) -> Rgb<u8> {
    let width = image.width();
    let height = image.height();

    let u0 = (u.floor() as u32).min(width - 1);
    let v0 = (v.floor() as u32).min(height - 1);
    let u1 = (u0 + 1) % width;
    let v1 = (v0 + 1).min(height - 1);

    let wu = u - f64::from(u0);
    let wv = v - f64::from(v0);

    let p00 = image.get_pixel(u0, v0).0;
    let p10 = image.get_pixel(u1, v0).0;
    let p01 = image.get_pixel(u0, v1).0;
    let p11 = image.get_pixel(u1, v1).0;

    let mut out = [0u8; 3];
    for channel in 0..3 {
        let value = f64::from(p00[channel]) * (1.0 - wu) * (1.0 - wv)
            + f64::from(p10[channel]) * wu * (1.0 - wv)
            + f64::from(p01[channel]) * (1.0 - wu) * wv
            + f64::from(p11[channel]) * wu * wv;
        out[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}
