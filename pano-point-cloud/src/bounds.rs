/// Point cloud coordinate bounds tracking
use crate::constants::BOUNDS_CHUNK_SIZE;
use crate::sphere::SpherePoint;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Bounds of `points` using a chunked parallel reduction.
    /// `None` when there are no points.
    pub fn from_points(points: &[SpherePoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let bounds = points
            .par_chunks(BOUNDS_CHUNK_SIZE)
            .map(|chunk| {
                let mut local_bounds = PointCloudBounds::new();
                for point in chunk {
                    local_bounds.update(point.x, point.y, point.z);
                }
                local_bounds
            })
            .reduce_with(PointCloudBounds::merge)
            .unwrap_or_else(PointCloudBounds::new);

        Some(bounds)
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_z = self.max_z.max(other.max_z);
        self
    }

    /// World space extent along each axis
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_extremes_across_chunks() {
        let mut points: Vec<SpherePoint> = (0..60_000)
            .map(|i| SpherePoint::new([i as f64 * 0.001, 0.0, -(i as f64) * 0.002]))
            .collect();
        points.push(SpherePoint::new([0.0, 7.5, 0.0]));

        let bounds = PointCloudBounds::from_points(&points).unwrap();
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 59_999.0 * 0.001);
        assert_eq!(bounds.max_y, 7.5);
        assert_eq!(bounds.min_z, -59_999.0 * 0.002);

        let (_, dy, _) = bounds.dimensions();
        assert_eq!(dy, 7.5);
    }
}
