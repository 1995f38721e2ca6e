/// Panorama to point cloud converter orchestrating every pipeline stage.
use crate::bounds::PointCloudBounds;
use crate::config::{OutputFormat, PipelineConfig};
use crate::constants::{PROGRESS_CHARS, PROGRESS_TEMPLATE};
use crate::dither::{DitherMask, floyd_steinberg_with_progress};
use crate::error::Result;
use crate::exporter::{commit_all, resolve_format, stage_point_cloud};
use crate::filter::PointFilter;
use crate::level::{LevelingAngles, level_panorama, resolve_angles};
use crate::loader::{BrightnessMap, SourceImage, load_and_resize};
use crate::metadata::RunMetadata;
use crate::point_cloud::{PointCloud, PointGenerator};
use crate::preview::stage_preview;
use crate::sphere::{EulerRotation, SphereMapper};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info};

/// Intermediate and final products of one in-memory run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub brightness: BrightnessMap,
    pub mask: DitherMask,
    pub cloud: PointCloud,
}

/// What a completed conversion produced.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub width: usize,
    pub height: usize,
    pub candidate_points: usize,
    pub point_count: usize,
    pub bounds: Option<PointCloudBounds>,
    pub leveled: bool,
    pub preview: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
}

/// File-to-file conversion driven by a validated configuration.
pub struct PanoramaConverter {
    config: PipelineConfig,
}

impl PanoramaConverter {
    /// Validates `config` up front so no stage runs on bad parameters.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load, dither, map, filter and write. Every output is staged first
    /// and only moved into place once all of them were written, so a failed
    /// run leaves nothing behind.
    pub fn convert(&self) -> Result<ConversionReport> {
        let config = &self.config;
        debug!(?config, "Starting conversion");

        // Fail on an unusable output before doing any heavy work.
        let format = resolve_format(&config.output, config.format)?;
        let leveling = resolve_angles(&config.leveling)?;

        let source = load_and_resize(&config.input, config.max_size)?;
        let (source, leveled) = self.apply_leveling(source, leveling);
        let output = self.process(&source);

        info!(
            "Generated {} points from {} candidates",
            output.cloud.len(),
            output.mask.count_on()
        );

        let bounds = output.cloud.bounds();
        if let Some(bounds) = &bounds {
            self.log_bounds(bounds);
        }

        let mut staged = vec![stage_point_cloud(
            &output.cloud,
            &config.output,
            format,
            config.ply_encoding,
        )?];

        let preview = match &config.preview {
            Some(path) => {
                staged.push(stage_preview(&output.mask, path)?);
                Some(path.clone())
            }
            None => None,
        };

        let metadata = if config.write_metadata {
            let path = RunMetadata::path_for(&config.output);
            let run = RunMetadata {
                tool_version: crate::VERSION.to_string(),
                format,
                width: source.width(),
                height: source.height(),
                candidate_points: output.mask.count_on(),
                exported_points: output.cloud.len(),
                bounds,
                leveled,
                config: config.clone(),
            };
            staged.push(run.stage(&path)?);
            Some(path)
        } else {
            None
        };

        for path in commit_all(staged)? {
            info!("Saved {}", path.display());
        }

        Ok(ConversionReport {
            output: config.output.clone(),
            format,
            width: source.width(),
            height: source.height(),
            candidate_points: output.mask.count_on(),
            point_count: output.cloud.len(),
            bounds,
            leveled,
            preview,
            metadata,
        })
    }

    /// Run the in-memory stages on an already loaded image.
    pub fn process(&self, source: &SourceImage) -> PipelineOutput {
        let config = &self.config;
        let brightness = source.brightness_map();
        let (width, height) = (source.width(), source.height());

        info!(
            "Dithering {}x{} ({})",
            width,
            height,
            if config.invert {
                "inverted: dark areas become points"
            } else {
                "bright areas become points"
            }
        );
        let pb = self.progress_bar(height as u64, "Dithering");
        let mask = floyd_steinberg_with_progress(&brightness, config.invert, &pb);
        pb.finish_with_message("Dithered");

        let rotation = EulerRotation::from_degrees(config.rotation);
        if !rotation.is_identity() {
            info!(
                "Rotation: X={}°, Y={}°, Z={}°",
                config.rotation.x, config.rotation.y, config.rotation.z
            );
        }

        let filter = PointFilter::from_config(config);
        if !filter.is_pass_through() {
            info!(
                "Height range {:.0}%-{:.0}%, brightness range {:.0}%-{:.0}%",
                config.height_min * 100.0,
                config.height_max * 100.0,
                config.brightness_min * 100.0,
                config.brightness_max * 100.0
            );
        }

        let generator = PointGenerator {
            mask: &mask,
            brightness: &brightness,
            mapper: SphereMapper::new(config.radius, width, height, rotation),
            filter,
            colours: config.include_colour.then_some(source),
        };

        let pb = self.progress_bar(height as u64, "Mapping to sphere");
        let cloud = generator.generate_with_progress(&pb);
        pb.finish_with_message("Mapped");

        PipelineOutput {
            brightness,
            mask,
            cloud,
        }
    }

    /// Returns the image to process and whether it was actually leveled.
    fn apply_leveling(
        &self,
        source: SourceImage,
        angles: Option<LevelingAngles>,
    ) -> (SourceImage, bool) {
        match angles {
            Some(angles) if !angles.is_negligible() => {
                info!(
                    "Leveling panorama (pitch={:.2}°, roll={:.2}°, heading={:.2}°)",
                    angles.pitch.to_degrees(),
                    angles.roll.to_degrees(),
                    angles.heading.to_degrees()
                );
                (SourceImage::from_rgb(level_panorama(source.pixels(), angles)), true)
            }
            Some(_) => {
                debug!("Leveling angles are negligible, image left as is");
                (source, false)
            }
            None => (source, false),
        }
    }

    fn progress_bar(&self, len: u64, message: &'static str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(PROGRESS_CHARS),
        );
        pb.set_message(message);
        pb
    }

    /// Print coordinate bounds for verification.
    fn log_bounds(&self, bounds: &PointCloudBounds) {
        let (dx, dy, dz) = bounds.dimensions();
        debug!(
            "Bounds: X {:.2} to {:.2}, Y {:.2} to {:.2}, Z {:.2} to {:.2} (extent {:.2} x {:.2} x {:.2})",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y, bounds.min_z, bounds.max_z, dx, dy, dz
        );
    }
}
