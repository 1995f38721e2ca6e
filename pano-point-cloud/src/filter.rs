/// Brightness and height slicing of mapped points
use crate::config::PipelineConfig;
use crate::constants::HEIGHT_TOLERANCE;
use crate::sphere::SpherePoint;

/// Retention test applied to every mapped candidate.
///
/// Both ranges are inclusive. A range whose min exceeds its max accepts
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointFilter {
    radius: f64,
    height_min: f64,
    height_max: f64,
    brightness_min: f64,
    brightness_max: f64,
}

impl PointFilter {
    pub fn new(
        radius: f64,
        (height_min, height_max): (f64, f64),
        (brightness_min, brightness_max): (f64, f64),
    ) -> Self {
        Self {
            radius,
            height_min,
            height_max,
            brightness_min,
            brightness_max,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.radius,
            (config.height_min, config.height_max),
            (config.brightness_min, config.brightness_max),
        )
    }

    /// Whether the filter can only ever return true.
    pub fn is_pass_through(&self) -> bool {
        self.height_min <= 0.0
            && self.height_max >= 1.0
            && self.brightness_min <= 0.0
            && self.brightness_max >= 1.0
    }

    /// `brightness` is the source pixel's pre-dither value.
    pub fn accepts(&self, brightness: f32, point: &SpherePoint) -> bool {
        self.accepts_brightness(brightness) && self.accepts_height(point)
    }

    pub fn accepts_brightness(&self, brightness: f32) -> bool {
        let value = f64::from(brightness);
        self.brightness_min <= self.brightness_max
            && self.brightness_min <= value
            && value <= self.brightness_max
    }

    /// Tests the post-rotation vertical coordinate.
    pub fn accepts_height(&self, point: &SpherePoint) -> bool {
        if self.height_min > self.height_max {
            return false;
        }
        let height = self.normalized_height(point.y);
        self.height_min - HEIGHT_TOLERANCE <= height && height <= self.height_max + HEIGHT_TOLERANCE
    }

    /// Maps y from [-radius, radius] to [0, 1].
    pub fn normalized_height(&self, y: f64) -> f64 {
        (y + self.radius) / (2.0 * self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_height(y: f64) -> SpherePoint {
        SpherePoint::new([0.0, y, 0.0])
    }

    #[test]
    fn full_ranges_accept_everything() {
        let filter = PointFilter::new(10.0, (0.0, 1.0), (0.0, 1.0));
        assert!(filter.is_pass_through());
        assert!(filter.accepts(0.0, &at_height(-10.0)));
        assert!(filter.accepts(1.0, &at_height(10.0)));
    }

    #[test]
    fn brightness_bounds_are_inclusive() {
        let filter = PointFilter::new(10.0, (0.0, 1.0), (0.25, 0.75));
        assert!(filter.accepts_brightness(0.25));
        assert!(filter.accepts_brightness(0.75));
        assert!(!filter.accepts_brightness(0.2));
        assert!(!filter.accepts_brightness(0.8));
    }

    #[test]
    fn height_uses_normalised_y() {
        let filter = PointFilter::new(10.0, (0.5, 1.0), (0.0, 1.0));
        assert_eq!(filter.normalized_height(-10.0), 0.0);
        assert_eq!(filter.normalized_height(0.0), 0.5);
        assert!(filter.accepts_height(&at_height(5.0)));
        assert!(!filter.accepts_height(&at_height(-5.0)));
    }

    #[test]
    fn degenerate_band_keeps_the_equator() {
        let filter = PointFilter::new(10.0, (0.5, 0.5), (0.0, 1.0));
        assert!(filter.accepts_height(&at_height(6.123e-16)));
        assert!(!filter.accepts_height(&at_height(0.01)));
    }

    #[test]
    fn inverted_ranges_accept_nothing() {
        let filter = PointFilter::new(10.0, (0.6, 0.4), (0.0, 1.0));
        assert!(!filter.accepts_height(&at_height(0.0)));

        let filter = PointFilter::new(10.0, (0.0, 1.0), (0.9, 0.1));
        assert!(!filter.accepts_brightness(0.5));
    }
}
