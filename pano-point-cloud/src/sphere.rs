/// Equirectangular pixel to sphere mapping with Euler rotation
use crate::config::RotationDegrees;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

type Matrix3 = [[f64; 3]; 3];

const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Point on the output sphere, optionally carrying its source colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpherePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub colour: Option<[u8; 3]>,
}

impl SpherePoint {
    pub fn new([x, y, z]: [f64; 3]) -> Self {
        Self {
            x,
            y,
            z,
            colour: None,
        }
    }

    pub fn with_colour(self, colour: [u8; 3]) -> Self {
        Self {
            colour: Some(colour),
            ..self
        }
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn distance_from_origin(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Combined X, then Y, then Z rotation (R = Rz · Ry · Rx).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerRotation {
    matrix: Matrix3,
}

impl EulerRotation {
    pub fn identity() -> Self {
        Self { matrix: IDENTITY }
    }

    pub fn from_degrees(angles: RotationDegrees) -> Self {
        let rx = axis_x(angles.x.to_radians());
        let ry = axis_y(angles.y.to_radians());
        let rz = axis_z(angles.z.to_radians());
        Self {
            matrix: multiply(&rz, &multiply(&ry, &rx)),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == IDENTITY
    }

    pub fn apply(&self, point: [f64; 3]) -> [f64; 3] {
        apply_matrix(&self.matrix, point)
    }
}

/// Rotate about the X axis by `degrees`.
pub fn rotate_about_x(point: [f64; 3], degrees: f64) -> [f64; 3] {
    apply_matrix(&axis_x(degrees.to_radians()), point)
}

/// Rotate about the Y axis by `degrees`.
pub fn rotate_about_y(point: [f64; 3], degrees: f64) -> [f64; 3] {
    apply_matrix(&axis_y(degrees.to_radians()), point)
}

/// Rotate about the Z axis by `degrees`.
pub fn rotate_about_z(point: [f64; 3], degrees: f64) -> [f64; 3] {
    apply_matrix(&axis_z(degrees.to_radians()), point)
}

/// Y-up spherical to Cartesian. `polar` is measured from +Y, `azimuth` from +X towards +Z.
pub fn spherical_to_cartesian(azimuth: f64, polar: f64, radius: f64) -> [f64; 3] {
    let (sin_polar, cos_polar) = polar.sin_cos();
    let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();
    [
        radius * sin_polar * cos_azimuth,
        radius * cos_polar,
        radius * sin_polar * sin_azimuth,
    ]
}

/// Maps pixel coordinates of a `width` x `height` equirectangular image
/// onto a rotated sphere.
#[derive(Debug, Clone, Copy)]
pub struct SphereMapper {
    radius: f64,
    width: usize,
    height: usize,
    rotation: EulerRotation,
}

impl SphereMapper {
    pub fn new(radius: f64, width: usize, height: usize, rotation: EulerRotation) -> Self {
        Self {
            radius,
            width,
            height,
            rotation,
        }
    }

    /// Column spans 360° of longitude, row spans 180° from the north pole.
    pub fn map(&self, row: usize, col: usize) -> SpherePoint {
        let azimuth = col as f64 / self.width as f64 * TAU;
        let polar = row as f64 / self.height as f64 * PI;
        let cartesian = spherical_to_cartesian(azimuth, polar, self.radius);
        SpherePoint::new(self.rotation.apply(cartesian))
    }
}

fn axis_x(angle: f64) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]
}

fn axis_y(angle: f64) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

fn axis_z(angle: f64) -> Matrix3 {
    let (s, c) = angle.sin_cos();
    [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

fn multiply(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut output = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                output[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    output
}

fn apply_matrix(matrix: &Matrix3, input: [f64; 3]) -> [f64; 3] {
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            output[i] += matrix[i][j] * input[j];
        }
    }

    output
}
