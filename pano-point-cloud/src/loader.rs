/// Panorama decoding, downsampling and brightness extraction
use crate::constants::LUMA_WEIGHTS;
use crate::error::{PipelineError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use std::path::Path;
use tracing::{debug, info};

/// Resized source panorama. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbImage,
}

impl SourceImage {
    /// Downsample a decoded image so its longer side fits `max_size`.
    pub fn from_dynamic(image: DynamicImage, max_size: u32) -> Result<Self> {
        if max_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "max-size must be greater than zero".to_string(),
            ));
        }

        let (width, height) = image.dimensions();
        let (new_width, new_height) = resized_dimensions(width, height, max_size);

        let image = if (new_width, new_height) != (width, height) {
            debug!(width, height, new_width, new_height, "Resizing with Lanczos3");
            image.resize_exact(new_width, new_height, FilterType::Lanczos3)
        } else {
            image
        };

        Ok(Self {
            pixels: image.to_rgb8(),
        })
    }

    /// Wrap already-sized pixels without resampling.
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> usize {
        self.pixels.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixels.height() as usize
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn colour_at(&self, row: usize, col: usize) -> [u8; 3] {
        self.pixels.get_pixel(col as u32, row as u32).0
    }

    /// Continuous-tone brightness of every pixel, in [0, 1].
    pub fn brightness_map(&self) -> BrightnessMap {
        let values = self
            .pixels
            .pixels()
            .map(|pixel| f32::from(luma(pixel.0)) / 255.0)
            .collect();

        BrightnessMap {
            width: self.width(),
            height: self.height(),
            values,
        }
    }
}

/// Per-pixel brightness preserved from before dithering.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessMap {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl BrightnessMap {
    /// Build from row-major values. Returns `None` if the length does not match.
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == width * height).then_some(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.width + col]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Decode `path` and downsample it to fit `max_size`.
pub fn load_and_resize(path: &Path, max_size: u32) -> Result<SourceImage> {
    info!("Loading panorama: {}", path.display());

    let image = image::open(path).map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let source = SourceImage::from_dynamic(image, max_size)?;
    info!(
        "Working resolution: {}x{}",
        source.width(),
        source.height()
    );
    Ok(source)
}

/// Target size keeping aspect ratio. Never upsamples.
pub fn resized_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_size {
        return (width, height);
    }

    let scale = |dim: u32| (u64::from(dim) * u64::from(max_size) / u64::from(longest)).max(1) as u32;
    (scale(width), scale(height))
}

/// Integer BT.601 luma, rounded.
pub fn luma([r, g, b]: [u8; 3]) -> u8 {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    let weighted = u32::from(r) * wr + u32::from(g) * wg + u32::from(b) * wb;
    ((weighted + 500) / 1000) as u8
}
