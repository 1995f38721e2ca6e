/// Immutable run configuration shared by every pipeline stage
use crate::constants::{DEFAULT_MAX_SIZE, DEFAULT_RADIUS};
use crate::error::{PipelineError, Result};
use crate::level::LevelingAngles;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Point cloud file format written by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Ply,
    Xyz,
}

impl OutputFormat {
    /// Format implied by a path's extension, case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ply" => Some(OutputFormat::Ply),
            "xyz" => Some(OutputFormat::Xyz),
            _ => None,
        }
    }
}

/// Body encoding for PLY output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PlyEncoding {
    #[default]
    Ascii,
    Binary,
}

/// Euler angles in degrees, applied X then Y then Z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationDegrees {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Where leveling angles come from, if anywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelingSource {
    #[default]
    Disabled,
    /// Read pitch and roll from an acquisition sidecar JSON file.
    Sidecar(PathBuf),
    /// Explicit angles.
    Manual(LevelingAngles),
}

/// All user-tunable parameters for one conversion run.
/// Built once from the command line and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Explicit format; overrides the output extension when set.
    pub format: Option<OutputFormat>,
    pub ply_encoding: PlyEncoding,
    pub radius: f64,
    pub max_size: u32,
    pub invert: bool,
    pub rotation: RotationDegrees,
    pub height_min: f64,
    pub height_max: f64,
    pub brightness_min: f64,
    pub brightness_max: f64,
    /// Attach source colour to each vertex (PLY only).
    pub include_colour: bool,
    /// Dithered preview image destination.
    pub preview: Option<PathBuf>,
    pub leveling: LevelingSource,
    /// Write a JSON run summary next to the output.
    pub write_metadata: bool,
    pub show_progress: bool,
}

impl PipelineConfig {
    /// Configuration with documented defaults, writing `<input>.ply`.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = input.with_extension("ply");
        Self {
            input,
            output,
            format: None,
            ply_encoding: PlyEncoding::Ascii,
            radius: DEFAULT_RADIUS,
            max_size: DEFAULT_MAX_SIZE,
            invert: false,
            rotation: RotationDegrees::default(),
            height_min: 0.0,
            height_max: 1.0,
            brightness_min: 0.0,
            brightness_max: 1.0,
            include_colour: false,
            preview: None,
            leveling: LevelingSource::Disabled,
            write_metadata: false,
            show_progress: true,
        }
    }

    /// Reject out-of-range or contradictory parameters before any stage runs.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(invalid(format!(
                "radius must be a positive number, got {}",
                self.radius
            )));
        }

        if self.max_size == 0 {
            return Err(invalid("max-size must be greater than zero".to_string()));
        }

        let RotationDegrees { x, y, z } = self.rotation;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(invalid(format!(
                "rotation angles must be finite, got ({x}, {y}, {z})"
            )));
        }

        check_unit_range("height", self.height_min, self.height_max)?;
        check_unit_range("brightness", self.brightness_min, self.brightness_max)?;

        if let LevelingSource::Manual(angles) = &self.leveling {
            if !angles.is_finite() {
                return Err(invalid(format!(
                    "leveling angles must be finite, got {angles:?}"
                )));
            }
        }

        Ok(())
    }
}

/// `<output stem>_dithered.png` in the output's directory.
pub fn default_preview_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    output.with_file_name(format!("{stem}_dithered.png"))
}

fn check_unit_range(name: &str, min: f64, max: f64) -> Result<()> {
    for (label, value) in [("min", min), ("max", max)] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!(
                "{name}-{label} must be within [0, 1], got {value}"
            )));
        }
    }

    if min > max {
        return Err(invalid(format!(
            "{name}-min ({min}) is greater than {name}-max ({max})"
        )));
    }

    Ok(())
}

fn invalid(message: String) -> PipelineError {
    PipelineError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults_match_documented_cli() {
        let config = PipelineConfig::new("pano/square.jpg");
        assert_eq!(config.output, PathBuf::from("pano/square.ply"));
        assert_eq!(config.radius, 50.0);
        assert_eq!(config.max_size, 2000);
        assert_eq!((config.height_min, config.height_max), (0.0, 1.0));
        assert_eq!((config.brightness_min, config.brightness_max), (0.0, 1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_radius_and_size() {
        let mut config = PipelineConfig::new("a.png");
        config.radius = 0.0;
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::InvalidConfig);

        let mut config = PipelineConfig::new("a.png");
        config.radius = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new("a.png");
        config.max_size = 0;
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn rejects_inverted_and_out_of_range_bounds() {
        let mut config = PipelineConfig::new("a.png");
        config.height_min = 0.8;
        config.height_max = 0.2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("height-min"));

        let mut config = PipelineConfig::new("a.png");
        config.brightness_max = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new("a.png");
        config.height_min = 0.5;
        config.height_max = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn format_from_extension_is_case_insensitive() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/cloud.PLY")),
            Some(OutputFormat::Ply)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("cloud.xyz")),
            Some(OutputFormat::Xyz)
        );
        assert_eq!(OutputFormat::from_path(Path::new("cloud.obj")), None);
        assert_eq!(OutputFormat::from_path(Path::new("cloud")), None);
    }

    #[test]
    fn preview_sits_next_to_output() {
        assert_eq!(
            default_preview_path(Path::new("out/cloud.ply")),
            PathBuf::from("out/cloud_dithered.png")
        );
    }
}
