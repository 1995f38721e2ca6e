//! Equirectangular panorama to spherical point cloud conversion for
//! subsurface laser engraving.
//!
//! The pipeline is strictly sequential:
//! load and resize, Floyd-Steinberg dither, map "on" pixels onto a rotated
//! sphere, filter by original brightness and post-rotation height, then
//! export as PLY or XYZ. A dithered preview and a JSON run summary can be
//! written alongside.

pub mod bounds;
pub mod config;
pub mod constants;
pub mod converter;
pub mod dither;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod level;
pub mod loader;
pub mod metadata;
pub mod ply_writer;
pub mod point_cloud;
pub mod preview;
pub mod sphere;

pub use config::{OutputFormat, PipelineConfig, PlyEncoding, RotationDegrees};
pub use converter::{ConversionReport, PanoramaConverter, PipelineOutput};
pub use error::{ErrorKind, PipelineError};
pub use point_cloud::PointCloud;
pub use sphere::SpherePoint;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
