/// Shared configuration for panorama to point cloud conversion

/// Default sphere radius in output units (millimetres for engraving)
pub const DEFAULT_RADIUS: f64 = 50.0;

/// Default cap on the longer image dimension after resizing
pub const DEFAULT_MAX_SIZE: u32 = 2000;

/// ITU-R BT.601 luma weights in parts per thousand (R, G, B)
pub const LUMA_WEIGHTS: [u32; 3] = [299, 587, 114];

/// Accumulated brightness at or above this value dithers to "on"
pub const DITHER_THRESHOLD: f32 = 0.5;

/// Floyd-Steinberg diffusion targets as (row offset, column offset, weight)
/// Order: right, below-left, below, below-right
pub const FLOYD_STEINBERG_KERNEL: [(usize, isize, f32); 4] = [
    (0, 1, 7.0 / 16.0),
    (1, -1, 3.0 / 16.0),
    (1, 0, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// Slack applied to both ends of the normalised height range
pub const HEIGHT_TOLERANCE: f64 = 1e-9;

/// Leveling angles below this magnitude (radians) are treated as zero
pub const LEVELING_EPSILON: f64 = 0.001;

/// Decimal places written for every coordinate in text formats
pub const COORDINATE_PRECISION: usize = 6;

/// Rows processed between progress bar refreshes
pub const PROGRESS_ROW_STRIDE: u64 = 16;

/// Chunk size for parallel bounds reduction
pub const BOUNDS_CHUNK_SIZE: usize = 25_000;

/// Shared progress bar look
pub const PROGRESS_TEMPLATE: &str = "[{bar:40.green/blue}] {pos}/{len} rows ({percent}%) {msg}";
pub const PROGRESS_CHARS: &str = "▉▊▋▌▍▎▏ ";
