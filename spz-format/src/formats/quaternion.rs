//! Rotation encodings
//!
//! SPZ has stored rotations two ways:
//!
//! ```text
//! First-three (versions 1-2, 3 bytes):
//!   byte i = round((q[i] + 1) * 127.5) for x, y, z; w >= 0 is implied
//!
//! Smallest-three (version 3+, 4 bytes, little-endian u32):
//!   bits  0..9   A   signed 10-bit, first stored component
//!   bits 10..19  B   signed 10-bit, second stored component
//!   bits 20..29  C   signed 10-bit, third stored component
//!   bits 30..31  idx index (x=0 .. w=3) of the omitted largest component
//! ```
//!
//! Stored components keep x, y, z, w order with the omitted one skipped.
//! Each value decodes as `sqrt(0.5) * v / 511`.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Largest magnitude of a smallest-three field
const FIELD_MAX: f32 = 511.0;

/// Mask for one 10-bit field
const FIELD_MASK: u32 = 0x3FF;

/// How rotations are stored, selected once from the format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationEncoding {
    /// 3 bytes: x, y, z in unorm8, w reconstructed as non-negative
    FirstThree,
    /// 4 bytes: three signed 10-bit fields plus a 2-bit omitted index
    SmallestThree,
}

impl RotationEncoding {
    /// Encoding used by a container version
    #[inline]
    pub const fn for_version(version: u32) -> Self {
        if version >= 3 {
            Self::SmallestThree
        } else {
            Self::FirstThree
        }
    }

    /// Bytes per point
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            Self::FirstThree => 3,
            Self::SmallestThree => 4,
        }
    }

    /// Decode one rotation from exactly `stride()` bytes
    #[inline]
    pub fn decode(self, bytes: &[u8]) -> Quat {
        match self {
            Self::FirstThree => decode_quat_first_three([bytes[0], bytes[1], bytes[2]]),
            Self::SmallestThree => decode_quat_smallest_three(u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
        }
    }

    /// Append one encoded rotation to `out`
    #[inline]
    pub fn encode_into(self, rotation: Quat, out: &mut Vec<u8>) {
        match self {
            Self::FirstThree => out.extend_from_slice(&encode_quat_first_three(rotation)),
            Self::SmallestThree => {
                out.extend_from_slice(&encode_quat_smallest_three(rotation).to_le_bytes())
            }
        }
    }
}

/// Normalize, falling back to identity for zero or non-finite input
#[inline]
fn normalize_or_identity(q: Quat) -> Quat {
    let length = q.length();
    if length > 0.0 && length.is_finite() {
        q * (1.0 / length)
    } else {
        Quat::IDENTITY
    }
}

// ============================================================================
// First-Three (legacy)
// ============================================================================

/// Encode a quaternion as three unorm8 imaginary components
///
/// The quaternion is negated when `w < 0` so the implied `w` is
/// non-negative; `q` and `-q` are the same rotation.
pub fn encode_quat_first_three(q: Quat) -> [u8; 3] {
    let q = normalize_or_identity(q);
    let q = if q.w < 0.0 { -q } else { q };
    let quantize = |v: f32| ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8;
    [quantize(q.x), quantize(q.y), quantize(q.z)]
}

/// Decode three unorm8 imaginary components, reconstructing `w >= 0`
pub fn decode_quat_first_three(bytes: [u8; 3]) -> Quat {
    let xyz = Vec3::new(
        f32::from(bytes[0]) / 127.5 - 1.0,
        f32::from(bytes[1]) / 127.5 - 1.0,
        f32::from(bytes[2]) / 127.5 - 1.0,
    );
    let w = (1.0 - xyz.length_squared()).max(0.0).sqrt();
    Quat::from_xyzw(xyz.x, xyz.y, xyz.z, w)
}

// ============================================================================
// Smallest-Three
// ============================================================================

/// Encode a quaternion using smallest-three encoding (32 bits)
///
/// Drops the largest-magnitude component and reconstructs it from the other
/// three on decode. The quaternion is negated first if needed so the dropped
/// component is non-negative.
pub fn encode_quat_smallest_three(q: Quat) -> u32 {
    let components = normalize_or_identity(q).to_array();

    let mut largest = 0;
    for i in 1..4 {
        if components[i].abs() > components[largest].abs() {
            largest = i;
        }
    }
    let sign = if components[largest] < 0.0 { -1.0 } else { 1.0 };

    let mut packed = (largest as u32) << 30;
    let mut shift = 0;
    for (i, &c) in components.iter().enumerate() {
        if i == largest {
            continue;
        }
        let value = (c * sign / FRAC_1_SQRT_2 * FIELD_MAX)
            .round()
            .clamp(-FIELD_MAX, FIELD_MAX) as i32;
        packed |= (value as u32 & FIELD_MASK) << shift;
        shift += 10;
    }
    packed
}

/// Decode a smallest-three encoded quaternion (32 bits)
pub fn decode_quat_smallest_three(packed: u32) -> Quat {
    let largest = (packed >> 30) as usize;

    let mut components = [0.0f32; 4];
    let mut sum_squares = 0.0;
    let mut shift = 0;
    for (i, slot) in components.iter_mut().enumerate() {
        if i == largest {
            continue;
        }
        // Sign-extend the 10-bit field
        let raw = ((packed >> shift) & FIELD_MASK) as i32;
        let value = (raw << 22) >> 22;
        let c = FRAC_1_SQRT_2 * value as f32 / FIELD_MAX;
        *slot = c;
        sum_squares += c * c;
        shift += 10;
    }
    components[largest] = (1.0 - sum_squares).max(0.0).sqrt();

    Quat::from_array(components)
}
