/// Floyd-Steinberg error diffusion halftoning
use crate::constants::{DITHER_THRESHOLD, FLOYD_STEINBERG_KERNEL, PROGRESS_ROW_STRIDE};
use crate::loader::BrightnessMap;
use indicatif::ProgressBar;

/// Binary halftone with one cell per resized pixel.
///
/// `bits` holds the raw halftone (set = bright). `invert` flips which cells
/// count as point candidates without touching the halftone itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DitherMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
    invert: bool,
}

impl DitherMask {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the cell is a point candidate.
    pub fn is_on(&self, row: usize, col: usize) -> bool {
        self.bits[row * self.width + col] != self.invert
    }

    /// Raw halftone value, independent of inversion.
    pub fn halftone(&self, row: usize, col: usize) -> bool {
        self.bits[row * self.width + col]
    }

    pub fn count_on(&self) -> usize {
        self.bits.iter().filter(|&&bit| bit != self.invert).count()
    }
}

/// Halftone `brightness` in raster order.
pub fn floyd_steinberg(brightness: &BrightnessMap, invert: bool) -> DitherMask {
    floyd_steinberg_with_progress(brightness, invert, &ProgressBar::hidden())
}

/// As [`floyd_steinberg`], reporting rows to `pb`.
///
/// Each pixel's accumulated value is thresholded at 0.5 and the signed
/// quantisation error is pushed to the unvisited neighbours. Fractions that
/// would land outside the image are dropped. The scan is inherently
/// sequential.
pub fn floyd_steinberg_with_progress(
    brightness: &BrightnessMap,
    invert: bool,
    pb: &ProgressBar,
) -> DitherMask {
    let width = brightness.width();
    let height = brightness.height();

    let mut accumulated = brightness.values().to_vec();
    let mut bits = vec![false; width * height];

    for row in 0..height {
        for col in 0..width {
            let index = row * width + col;
            let value = accumulated[index];
            let on = value >= DITHER_THRESHOLD;
            bits[index] = on;

            let error = value - if on { 1.0 } else { 0.0 };
            if error == 0.0 {
                continue;
            }

            for &(d_row, d_col, weight) in &FLOYD_STEINBERG_KERNEL {
                let target_row = row + d_row;
                let Some(target_col) = col.checked_add_signed(d_col) else {
                    continue;
                };
                if target_row < height && target_col < width {
                    accumulated[target_row * width + target_col] += error * weight;
                }
            }
        }

        if row as u64 % PROGRESS_ROW_STRIDE == 0 {
            pb.set_position(row as u64);
        }
    }
    pb.set_position(height as u64);

    DitherMask {
        width,
        height,
        bits,
        invert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(width: usize, height: usize, value: f32) -> BrightnessMap {
        BrightnessMap::from_values(width, height, vec![value; width * height]).unwrap()
    }

    #[test]
    fn white_is_all_on_and_black_all_off() {
        let white = floyd_steinberg(&uniform(16, 8, 1.0), false);
        assert_eq!(white.count_on(), 16 * 8);

        let black = floyd_steinberg(&uniform(16, 8, 0.0), false);
        assert_eq!(black.count_on(), 0);
    }

    #[test]
    fn invert_flips_candidates_but_not_halftone() {
        let white = floyd_steinberg(&uniform(4, 4, 1.0), true);
        assert_eq!(white.count_on(), 0);
        assert!(white.halftone(2, 3));
        assert!(!white.is_on(2, 3));

        let black = floyd_steinberg(&uniform(4, 4, 0.0), true);
        assert_eq!(black.count_on(), 16);
    }

    #[test]
    fn threshold_is_inclusive_at_half() {
        let mask = floyd_steinberg(&uniform(1, 1, 0.5), false);
        assert!(mask.is_on(0, 0));
    }

    #[test]
    fn error_diffuses_to_the_right() {
        // 0.4 alone is off; its error (0.4 * 7/16 = 0.175) lifts 0.4 to 0.575.
        let map = BrightnessMap::from_values(2, 1, vec![0.4, 0.4]).unwrap();
        let mask = floyd_steinberg(&map, false);
        assert!(!mask.is_on(0, 0));
        assert!(mask.is_on(0, 1));
    }

    #[test]
    fn error_diffuses_below_with_weights() {
        // Only the below neighbour exists for a single column: 5/16 of 0.3.
        let map = BrightnessMap::from_values(1, 2, vec![0.3, 0.3]).unwrap();
        let mask = floyd_steinberg(&map, false);
        assert!(!mask.is_on(1, 0));

        let map = BrightnessMap::from_values(1, 2, vec![0.3, 0.45]).unwrap();
        let mask = floyd_steinberg(&map, false);
        assert!(mask.is_on(1, 0));
    }

    #[test]
    fn mid_grey_is_half_on() {
        let mask = floyd_steinberg(&uniform(64, 64, 0.5), false);
        let fraction = mask.count_on() as f64 / (64.0 * 64.0);
        assert!((fraction - 0.5).abs() < 0.02, "fraction was {fraction}");
    }
}
