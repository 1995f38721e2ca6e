/// Dithered halftone preview image
use crate::dither::DitherMask;
use crate::error::{PipelineError, Result};
use crate::exporter::StagedFile;
use image::codecs::png::PngEncoder;
use image::{ColorType, GrayImage, ImageEncoder, Luma};
use std::io::Write;
use std::path::Path;

/// Render the halftone as black/white pixels (white = bright).
/// The raw halftone is shown regardless of inversion.
pub fn render_preview(mask: &DitherMask) -> GrayImage {
    GrayImage::from_fn(mask.width() as u32, mask.height() as u32, |x, y| {
        if mask.halftone(y as usize, x as usize) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Encode the preview as PNG into a staged file at `path`.
pub fn stage_preview(mask: &DitherMask, path: &Path) -> Result<StagedFile> {
    let image = render_preview(mask);

    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(image.as_raw(), image.width(), image.height(), ColorType::L8)
        .map_err(|source| PipelineError::PreviewEncode {
            path: path.to_path_buf(),
            source,
        })?;

    StagedFile::write(path, |writer| writer.write_all(&encoded))
}
