/// Command-line surface for the pano2points binary
use clap::Parser;
use pano_point_cloud::config::{LevelingSource, default_preview_path};
use pano_point_cloud::constants::{DEFAULT_MAX_SIZE, DEFAULT_RADIUS};
use pano_point_cloud::level::LevelingAngles;
use pano_point_cloud::{OutputFormat, PipelineConfig, PipelineError, PlyEncoding, RotationDegrees};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pano2points",
    version,
    about = "Convert an equirectangular panorama to a dithered spherical point cloud for laser engraving"
)]
pub struct Args {
    /// Input equirectangular panorama image
    pub input: PathBuf,

    /// Output file (.ply or .xyz). Defaults to the input name with .ply
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format, overriding the output extension
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// PLY body encoding
    #[arg(long, value_enum, default_value_t = PlyEncoding::Ascii)]
    pub ply_encoding: PlyEncoding,

    /// Sphere radius in output units (mm)
    #[arg(short, long, default_value_t = DEFAULT_RADIUS)]
    pub radius: f64,

    /// Maximum image dimension. Larger means more points
    #[arg(long, default_value_t = i64::from(DEFAULT_MAX_SIZE), allow_negative_numbers = true)]
    pub max_size: i64,

    /// Dark areas become points instead of bright ones
    #[arg(long)]
    pub invert: bool,

    /// Rotation around the X axis in degrees (applied first)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rotate_x: f64,

    /// Rotation around the Y axis in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rotate_y: f64,

    /// Rotation around the Z axis in degrees (applied last)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub rotate_z: f64,

    /// Minimum height kept, as a fraction (0 = bottom, 1 = top)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub height_min: f64,

    /// Maximum height kept, as a fraction (0 = bottom, 1 = top)
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub height_max: f64,

    /// Minimum original brightness kept (0-1)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub brightness_min: f64,

    /// Maximum original brightness kept (0-1)
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub brightness_max: f64,

    /// Write the dithered image next to the output
    #[arg(long)]
    pub preview: bool,

    /// Custom path for the dithered preview PNG (implies --preview)
    #[arg(long)]
    pub preview_dither: Option<PathBuf>,

    /// Store source colour on each PLY vertex
    #[arg(long, alias = "color")]
    pub colour: bool,

    /// Level the horizon using the input's JSON sidecar (<input>.json)
    #[arg(long)]
    pub level: bool,

    /// Explicit sidecar to level from (implies --level)
    #[arg(long)]
    pub level_metadata: Option<PathBuf>,

    /// Camera pitch to correct, in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub pitch: Option<f64>,

    /// Camera roll to correct, in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub roll: Option<f64>,

    /// Camera heading to correct, in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub heading: Option<f64>,

    /// Write a JSON run summary next to the output
    #[arg(long)]
    pub metadata: bool,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn into_config(self) -> Result<PipelineConfig, PipelineError> {
        let max_size = match u32::try_from(self.max_size) {
            Ok(size) if size > 0 => size,
            Ok(_) => {
                return Err(PipelineError::InvalidConfig(
                    "max-size must be a positive integer, got 0".to_string(),
                ));
            }
            Err(_) if self.max_size < 0 => {
                return Err(PipelineError::InvalidConfig(format!(
                    "max-size must be a positive integer, got {}",
                    self.max_size
                )));
            }
            Err(_) => {
                return Err(PipelineError::InvalidConfig(format!(
                    "max-size {} is too large (at most {})",
                    self.max_size,
                    u32::MAX
                )));
            }
        };

        let leveling = self.leveling_source();
        let mut config = PipelineConfig::new(&self.input);
        if let Some(output) = self.output {
            config.output = output;
        }

        config.preview = match (self.preview_dither, self.preview) {
            (Some(path), _) => Some(path),
            (None, true) => Some(default_preview_path(&config.output)),
            (None, false) => None,
        };

        Ok(PipelineConfig {
            format: self.format,
            ply_encoding: self.ply_encoding,
            radius: self.radius,
            max_size,
            invert: self.invert,
            rotation: RotationDegrees {
                x: self.rotate_x,
                y: self.rotate_y,
                z: self.rotate_z,
            },
            height_min: self.height_min,
            height_max: self.height_max,
            brightness_min: self.brightness_min,
            brightness_max: self.brightness_max,
            include_colour: self.colour,
            leveling,
            write_metadata: self.metadata,
            show_progress: !self.quiet,
            ..config
        })
    }

    fn leveling_source(&self) -> LevelingSource {
        if let Some(path) = &self.level_metadata {
            return LevelingSource::Sidecar(path.clone());
        }

        if self.pitch.is_some() || self.roll.is_some() || self.heading.is_some() {
            return LevelingSource::Manual(LevelingAngles::from_degrees(
                self.pitch.unwrap_or(0.0),
                self.roll.unwrap_or(0.0),
                self.heading.unwrap_or(0.0),
            ));
        }

        if self.level {
            LevelingSource::Sidecar(self.input.with_extension("json"))
        } else {
            LevelingSource::Disabled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PipelineConfig {
        let mut argv = vec!["pano2points"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap().into_config().unwrap()
    }

    #[test]
    fn defaults_follow_the_input_name() {
        let config = parse(&["data/square.jpg"]);
        assert_eq!(config.output, PathBuf::from("data/square.ply"));
        assert_eq!(config.radius, 50.0);
        assert_eq!(config.max_size, 2000);
        assert_eq!(config.preview, None);
        assert_eq!(config.leveling, LevelingSource::Disabled);
    }

    #[test]
    fn negative_angles_and_ranges_parse() {
        let config = parse(&[
            "pano.png",
            "--rotate-x",
            "-90",
            "--rotate-z",
            "15.5",
            "--height-min",
            "0.25",
            "--brightness-max",
            "0.8",
            "-o",
            "out/cloud.xyz",
        ]);
        assert_eq!(config.rotation.x, -90.0);
        assert_eq!(config.rotation.z, 15.5);
        assert_eq!(config.height_min, 0.25);
        assert_eq!(config.brightness_max, 0.8);
        assert_eq!(config.output, PathBuf::from("out/cloud.xyz"));
    }

    #[test]
    fn preview_path_defaults_next_to_output() {
        let config = parse(&["pano.png", "-o", "out/cloud.ply", "--preview"]);
        assert_eq!(config.preview, Some(PathBuf::from("out/cloud_dithered.png")));

        let config = parse(&["pano.png", "--preview-dither", "halftone.png"]);
        assert_eq!(config.preview, Some(PathBuf::from("halftone.png")));
    }

    #[test]
    fn non_positive_max_size_is_invalid_config() {
        let args = Args::try_parse_from(["pano2points", "pano.png", "--max-size", "-5"]).unwrap();
        let err = args.into_config().unwrap_err();
        assert_eq!(err.kind(), pano_point_cloud::ErrorKind::InvalidConfig);

        let args = Args::try_parse_from(["pano2points", "pano.png", "--max-size", "0"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn oversized_max_size_reports_the_limit() {
        let args =
            Args::try_parse_from(["pano2points", "pano.png", "--max-size", "5000000000"]).unwrap();
        let err = args.into_config().unwrap_err();
        assert_eq!(err.kind(), pano_point_cloud::ErrorKind::InvalidConfig);
        let message = err.to_string();
        assert!(message.contains("too large"), "{message}");
        assert!(!message.contains("positive"), "{message}");
    }

    #[test]
    fn leveling_source_precedence() {
        let config = parse(&["pano.jpg", "--level"]);
        assert_eq!(
            config.leveling,
            LevelingSource::Sidecar(PathBuf::from("pano.json"))
        );

        let config = parse(&["pano.jpg", "--level", "--pitch", "2"]);
        assert!(matches!(config.leveling, LevelingSource::Manual(_)));

        let config = parse(&["pano.jpg", "--pitch", "2", "--level-metadata", "meta.json"]);
        assert_eq!(
            config.leveling,
            LevelingSource::Sidecar(PathBuf::from("meta.json"))
        );
    }
}
