//! Container data types

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::formats::header::SpzHeader;
use crate::formats::quaternion::RotationEncoding;
use crate::packing::{PositionEncoding, SH_MAX_COEFFS, SH_NEUTRAL_BYTE, sigmoid};

/// Per-point attribute arrays, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Positions,
    Alphas,
    Colors,
    Scales,
    Rotations,
    SphericalHarmonics,
}

impl Attribute {
    /// Storage order of the body
    pub const ALL: [Self; 6] = [
        Self::Positions,
        Self::Alphas,
        Self::Colors,
        Self::Scales,
        Self::Rotations,
        Self::SphericalHarmonics,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Positions => "positions",
            Self::Alphas => "alphas",
            Self::Colors => "colors",
            Self::Scales => "scales",
            Self::Rotations => "rotations",
            Self::SphericalHarmonics => "spherical harmonics",
        }
    }
}

/// Encodings and strides derived from a header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub position: PositionEncoding,
    pub rotation: RotationEncoding,
    /// SH coefficients per color channel
    pub sh_dim: usize,
}

impl AttributeLayout {
    pub const ALPHA_STRIDE: usize = 1;
    pub const COLOR_STRIDE: usize = 3;
    pub const SCALE_STRIDE: usize = 3;

    pub fn from_header(header: &SpzHeader) -> Self {
        Self {
            position: header.position_encoding(),
            rotation: header.rotation_encoding(),
            sh_dim: header.sh_dim(),
        }
    }

    /// Bytes per point for one attribute
    pub const fn stride(&self, attribute: Attribute) -> usize {
        match attribute {
            Attribute::Positions => self.position.stride(),
            Attribute::Alphas => Self::ALPHA_STRIDE,
            Attribute::Colors => Self::COLOR_STRIDE,
            Attribute::Scales => Self::SCALE_STRIDE,
            Attribute::Rotations => self.rotation.stride(),
            Attribute::SphericalHarmonics => self.sh_dim * 3,
        }
    }

    /// Strides in storage order
    pub fn strides(&self) -> [usize; 6] {
        Attribute::ALL.map(|attribute| self.stride(attribute))
    }

    /// Total bytes per point across all attributes
    pub fn point_stride(&self) -> usize {
        self.strides().iter().sum()
    }

    /// Body size for `point_count` points
    pub fn body_size(&self, point_count: usize) -> usize {
        self.point_stride() * point_count
    }
}

/// Borrowed view of one point's packed bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedPointRecord<'a> {
    /// 6 (half-float) or 9 (fixed-point) bytes
    pub position: &'a [u8],
    pub alpha: u8,
    /// RGB, 3 bytes
    pub color: &'a [u8],
    /// Log-domain scale, 3 bytes
    pub scale: &'a [u8],
    /// 3 (first-three) or 4 (smallest-three) bytes
    pub rotation: &'a [u8],
    /// Coefficient-major RGB triples; coefficients past the stored degree
    /// hold the neutral byte
    pub sh: [u8; SH_MAX_COEFFS * 3],
}

impl PackedPointRecord<'_> {
    /// RGB bytes of SH coefficient `index`
    pub fn sh_coefficient(&self, index: usize) -> [u8; 3] {
        [
            self.sh[index * 3],
            self.sh[index * 3 + 1],
            self.sh[index * 3 + 2],
        ]
    }

    /// SH bytes with every coefficient neutral
    pub(crate) const fn neutral_sh() -> [u8; SH_MAX_COEFFS * 3] {
        [SH_NEUTRAL_BYTE; SH_MAX_COEFFS * 3]
    }
}

/// Full-precision decoded splat
///
/// `scale` and `alpha` are kept in the domains the container stores them in
/// (log scale, logit opacity); use [`linear_scale`](Self::linear_scale) and
/// [`opacity`](Self::opacity) for the activated values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnpackedPoint {
    pub position: Vec3,
    pub rotation: Quat,
    /// Per-axis log scale
    pub scale: Vec3,
    /// Degree-0 color
    pub color: Vec3,
    /// Pre-sigmoid opacity
    pub alpha: f32,
    /// SH coefficients, RGB per coefficient; unused entries are zero
    pub sh: [Vec3; SH_MAX_COEFFS],
}

impl Default for UnpackedPoint {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ZERO,
            color: Vec3::ZERO,
            alpha: 0.0,
            sh: [Vec3::ZERO; SH_MAX_COEFFS],
        }
    }
}

impl UnpackedPoint {
    /// Opacity in [0, 1]
    pub fn opacity(&self) -> f32 {
        sigmoid(self.alpha)
    }

    /// Per-axis scale in world units
    pub fn linear_scale(&self) -> Vec3 {
        self.scale.exp()
    }

    /// Whether every SH coefficient is zero
    pub fn has_zero_sh(&self) -> bool {
        self.sh.iter().all(|c| *c == Vec3::ZERO)
    }
}
