/// Candidate mapping and filtering into the final point list
use crate::bounds::PointCloudBounds;
use crate::dither::DitherMask;
use crate::filter::PointFilter;
use crate::loader::{BrightnessMap, SourceImage};
use crate::sphere::{SphereMapper, SpherePoint};
use indicatif::ProgressBar;
use rayon::prelude::*;

/// Points that survived filtering, in row-major source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<SpherePoint>,
    /// Every point carries a source colour.
    pub has_colour: bool,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounds, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<PointCloudBounds> {
        PointCloudBounds::from_points(&self.points)
    }
}

/// Turns "on" dither cells into filtered sphere points.
pub struct PointGenerator<'a> {
    pub mask: &'a DitherMask,
    pub brightness: &'a BrightnessMap,
    pub mapper: SphereMapper,
    pub filter: PointFilter,
    /// Source pixels to colour vertices from.
    pub colours: Option<&'a SourceImage>,
}

impl PointGenerator<'_> {
    pub fn generate(&self) -> PointCloud {
        self.generate_with_progress(&ProgressBar::hidden())
    }

    /// Rows are mapped in parallel; the result keeps row-major order.
    pub fn generate_with_progress(&self, pb: &ProgressBar) -> PointCloud {
        let rows: Vec<Vec<SpherePoint>> = (0..self.mask.height())
            .into_par_iter()
            .map(|row| {
                let points = self.row_points(row);
                pb.inc(1);
                points
            })
            .collect();

        PointCloud {
            points: rows.into_iter().flatten().collect(),
            has_colour: self.colours.is_some(),
        }
    }

    fn row_points(&self, row: usize) -> Vec<SpherePoint> {
        (0..self.mask.width())
            .filter(|&col| self.mask.is_on(row, col))
            .filter_map(|col| {
                let point = self.mapper.map(row, col);
                if !self.filter.accepts(self.brightness.get(row, col), &point) {
                    return None;
                }
                Some(match self.colours {
                    Some(source) => point.with_colour(source.colour_at(row, col)),
                    None => point,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::floyd_steinberg;
    use crate::sphere::EulerRotation;
    use image::{Rgb, RgbImage};

    fn striped_source() -> SourceImage {
        // Bright top half, mid-grey bottom half.
        SourceImage::from_rgb(RgbImage::from_fn(8, 4, |_, y| {
            if y < 2 { Rgb([255, 255, 255]) } else { Rgb([128, 128, 128]) }
        }))
    }

    #[test]
    fn brightness_filter_uses_original_values() {
        let source = striped_source();
        let brightness = source.brightness_map();
        let mask = floyd_steinberg(&brightness, false);
        let mapper = SphereMapper::new(10.0, 8, 4, EulerRotation::identity());

        let all = PointGenerator {
            mask: &mask,
            brightness: &brightness,
            mapper,
            filter: PointFilter::new(10.0, (0.0, 1.0), (0.0, 1.0)),
            colours: None,
        }
        .generate();

        let bright_only = PointGenerator {
            mask: &mask,
            brightness: &brightness,
            mapper,
            filter: PointFilter::new(10.0, (0.0, 1.0), (0.9, 1.0)),
            colours: None,
        }
        .generate();

        assert_eq!(bright_only.len(), 16);
        assert!(all.len() > bright_only.len());
    }

    #[test]
    fn colour_is_attached_on_request() {
        let source = striped_source();
        let brightness = source.brightness_map();
        let mask = floyd_steinberg(&brightness, false);

        let cloud = PointGenerator {
            mask: &mask,
            brightness: &brightness,
            mapper: SphereMapper::new(1.0, 8, 4, EulerRotation::identity()),
            filter: PointFilter::new(1.0, (0.0, 1.0), (0.9, 1.0)),
            colours: Some(&source),
        }
        .generate();

        assert!(cloud.has_colour);
        assert!(cloud.points.iter().all(|p| p.colour == Some([255, 255, 255])));
    }

    #[test]
    fn empty_cloud_has_no_bounds() {
        assert!(PointCloud::default().bounds().is_none());
        assert!(PointCloud::default().is_empty());
    }
}
