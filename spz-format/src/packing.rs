//! Per-field quantization codecs
//!
//! Converts between the quantized bytes stored in an SPZ container and
//! full-precision splat attributes:
//! - f32 ↔ f16 (IEEE 754 half-float, legacy positions)
//! - f32 ↔ 24-bit fixed point (positions)
//! - f32 ↔ u8 affine (scale, color, spherical harmonics)
//! - f32 ↔ u8 sigmoid/logit (alpha)
//!
//! Every function here is total: out-of-range inputs are clamped, never
//! rejected.

use glam::Vec3;
use half::f16;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Color channels are stored as `c * COLOR_SCALE + 0.5` in unorm8
pub const COLOR_SCALE: f32 = 0.15;

/// Logit input is clamped to `[ALPHA_EPSILON, 1 - ALPHA_EPSILON]`
pub const ALPHA_EPSILON: f32 = 0.0001;

/// Maximum spherical-harmonics coefficients per color channel (degree 3)
pub const SH_MAX_COEFFS: usize = 15;

/// Byte value that decodes to a zero SH coefficient
pub const SH_NEUTRAL_BYTE: u8 = 128;

/// Number of SH coefficients per channel for a degree (0→0, 1→3, 2→8, 3→15)
#[inline]
pub const fn sh_dim(degree: u8) -> usize {
    match degree {
        0 => 0,
        1 => 3,
        2 => 8,
        _ => SH_MAX_COEFFS,
    }
}

/// Round and clamp to the unorm8 range
#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// Half-Float (f16) Conversion
// ============================================================================

/// Convert f32 to f16 bits
#[inline]
pub fn f32_to_f16(value: f32) -> u16 {
    f16::from_f32(value).to_bits()
}

/// Convert f16 bits to f32
#[inline]
pub fn f16_to_f32(bits: u16) -> f32 {
    f16::from_bits(bits).to_f32()
}

// ============================================================================
// Position Packing
// ============================================================================

/// Bytes per position with half-float storage (3 × f16)
pub const POSITION_F16_STRIDE: usize = 6;

/// Bytes per position with 24-bit fixed-point storage (3 × i24)
pub const POSITION_FIXED_STRIDE: usize = 9;

/// How positions are stored, selected once from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionEncoding {
    /// 2 bytes per axis, IEEE half-float
    Float16,
    /// 3 bytes per axis, signed 24-bit scaled by `2^-fractional_bits`
    FixedPoint { fractional_bits: u8 },
}

impl PositionEncoding {
    /// Bytes per point
    #[inline]
    pub const fn stride(self) -> usize {
        match self {
            Self::Float16 => POSITION_F16_STRIDE,
            Self::FixedPoint { .. } => POSITION_FIXED_STRIDE,
        }
    }

    /// Decode one position from exactly `stride()` bytes
    #[inline]
    pub fn decode(self, bytes: &[u8]) -> Vec3 {
        match self {
            Self::Float16 => decode_position_f16(bytes),
            Self::FixedPoint { fractional_bits } => decode_position_fixed(bytes, fractional_bits),
        }
    }

    /// Append one encoded position to `out`
    #[inline]
    pub fn encode_into(self, position: Vec3, out: &mut Vec<u8>) {
        match self {
            Self::Float16 => out.extend_from_slice(&encode_position_f16(position)),
            Self::FixedPoint { fractional_bits } => {
                out.extend_from_slice(&encode_position_fixed(position, fractional_bits))
            }
        }
    }
}

/// Decode a half-float position (6 bytes)
#[inline]
pub fn decode_position_f16(bytes: &[u8]) -> Vec3 {
    debug_assert!(bytes.len() >= POSITION_F16_STRIDE);
    Vec3::new(
        f16_to_f32(u16::from_le_bytes([bytes[0], bytes[1]])),
        f16_to_f32(u16::from_le_bytes([bytes[2], bytes[3]])),
        f16_to_f32(u16::from_le_bytes([bytes[4], bytes[5]])),
    )
}

/// Encode a position as half-floats (6 bytes)
#[inline]
pub fn encode_position_f16(position: Vec3) -> [u8; POSITION_F16_STRIDE] {
    let mut bytes = [0u8; POSITION_F16_STRIDE];
    for (i, axis) in position.to_array().into_iter().enumerate() {
        bytes[i * 2..i * 2 + 2].copy_from_slice(&f32_to_f16(axis).to_le_bytes());
    }
    bytes
}

/// Smallest value representable in 24-bit two's complement
const FIXED24_MIN: i32 = -(1 << 23);
/// Largest value representable in 24-bit two's complement
const FIXED24_MAX: i32 = (1 << 23) - 1;

/// Read a little-endian 24-bit two's-complement value, sign-extended to i32
#[inline]
pub fn read_fixed24(bytes: [u8; 3]) -> i32 {
    let raw = i32::from(bytes[0]) | (i32::from(bytes[1]) << 8) | (i32::from(bytes[2]) << 16);
    (raw << 8) >> 8
}

/// Write an i32 as little-endian 24-bit two's complement (saturating)
#[inline]
pub fn write_fixed24(value: i32) -> [u8; 3] {
    let [b0, b1, b2, _] = value.clamp(FIXED24_MIN, FIXED24_MAX).to_le_bytes();
    [b0, b1, b2]
}

/// Decode a fixed-point position (9 bytes)
#[inline]
pub fn decode_position_fixed(bytes: &[u8], fractional_bits: u8) -> Vec3 {
    debug_assert!(bytes.len() >= POSITION_FIXED_STRIDE);
    let scale = (-f32::from(fractional_bits)).exp2();
    Vec3::new(
        read_fixed24([bytes[0], bytes[1], bytes[2]]) as f32 * scale,
        read_fixed24([bytes[3], bytes[4], bytes[5]]) as f32 * scale,
        read_fixed24([bytes[6], bytes[7], bytes[8]]) as f32 * scale,
    )
}

/// Encode a position as 24-bit fixed point (9 bytes)
#[inline]
pub fn encode_position_fixed(position: Vec3, fractional_bits: u8) -> [u8; POSITION_FIXED_STRIDE] {
    let scale = f32::from(fractional_bits).exp2();
    let mut bytes = [0u8; POSITION_FIXED_STRIDE];
    for (i, axis) in position.to_array().into_iter().enumerate() {
        let fixed = (axis * scale)
            .round()
            .clamp(FIXED24_MIN as f32, FIXED24_MAX as f32) as i32;
        bytes[i * 3..i * 3 + 3].copy_from_slice(&write_fixed24(fixed));
    }
    bytes
}

// ============================================================================
// Scale Packing
// ============================================================================

/// Decode a log-domain scale axis: `byte / 16 - 10`
#[inline]
pub fn decode_scale(byte: u8) -> f32 {
    f32::from(byte) / 16.0 - 10.0
}

/// Encode a log-domain scale axis
#[inline]
pub fn encode_scale(scale: f32) -> u8 {
    to_u8((scale + 10.0) * 16.0)
}

// ============================================================================
// Alpha Packing
// ============================================================================

/// Logistic sigmoid
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Inverse sigmoid with the input clamped away from 0 and 1
#[inline]
pub fn logit(x: f32) -> f32 {
    let x = x.clamp(ALPHA_EPSILON, 1.0 - ALPHA_EPSILON);
    (x / (1.0 - x)).ln()
}

/// Decode opacity to the pre-sigmoid (logit) domain
#[inline]
pub fn decode_alpha(byte: u8) -> f32 {
    logit(f32::from(byte) / 255.0)
}

/// Encode a logit-domain opacity
#[inline]
pub fn encode_alpha(alpha: f32) -> u8 {
    to_u8(sigmoid(alpha) * 255.0)
}

// ============================================================================
// Color Packing
// ============================================================================

/// Decode one color channel: `((byte / 255) - 0.5) / COLOR_SCALE`
#[inline]
pub fn decode_color(byte: u8) -> f32 {
    (f32::from(byte) / 255.0 - 0.5) / COLOR_SCALE
}

/// Encode one color channel
#[inline]
pub fn encode_color(color: f32) -> u8 {
    to_u8((color * COLOR_SCALE + 0.5) * 255.0)
}

// ============================================================================
// Spherical Harmonics Packing
// ============================================================================

/// Decode one SH coefficient: `(byte - 128) / 128`
#[inline]
pub fn decode_sh(byte: u8) -> f32 {
    (f32::from(byte) - 128.0) / 128.0
}

/// Encode one SH coefficient, keeping the top `bits` bits of precision
///
/// `bits` of 8 stores the full byte; smaller values snap the byte to a grid
/// of `2^(8 - bits)` so the outer compressor sees fewer distinct symbols.
#[inline]
pub fn encode_sh(value: f32, bits: u8) -> u8 {
    let q = i32::from(to_u8(value * 128.0 + 128.0));
    if bits >= 8 {
        return q as u8;
    }
    let bucket = 1i32 << (8 - bits.max(1));
    ((q + bucket / 2) / bucket * bucket).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sh_dim() {
        assert_eq!(sh_dim(0), 0);
        assert_eq!(sh_dim(1), 3);
        assert_eq!(sh_dim(2), 8);
        assert_eq!(sh_dim(3), 15);
    }

    #[test]
    fn test_f16_known_values() {
        assert_eq!(f32_to_f16(1.0), 0x3C00);
        assert_eq!(f32_to_f16(-2.0), 0xC000);
        assert_eq!(f16_to_f32(0x3800), 0.5);
        assert_eq!(f16_to_f32(0x7BFF), 65504.0);
    }

    #[test]
    fn test_fixed24_sign_extension() {
        assert_eq!(read_fixed24([0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(read_fixed24([0x00, 0x00, 0x80]), -(1 << 23));
        assert_eq!(read_fixed24([0xFF, 0xFF, 0x7F]), (1 << 23) - 1);
        assert_eq!(read_fixed24([0x01, 0x02, 0x03]), 0x030201);
    }

    #[test]
    fn test_fixed24_saturates() {
        assert_eq!(write_fixed24(i32::MAX), [0xFF, 0xFF, 0x7F]);
        assert_eq!(write_fixed24(i32::MIN), [0x00, 0x00, 0x80]);
        assert_eq!(write_fixed24(-1), [0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_position_fixed_decode() {
        // x = 4096 (1.0 at 12 bits), y = -2048 (-0.5), z = 0
        let bytes = [0x00, 0x10, 0x00, 0x00, 0xF8, 0xFF, 0x00, 0x00, 0x00];
        let p = decode_position_fixed(&bytes, 12);
        assert_eq!(p, Vec3::new(1.0, -0.5, 0.0));
    }

    #[test]
    fn test_position_fixed_precision() {
        let p = Vec3::new(1.2345, -678.9, 0.001);
        let decoded = decode_position_fixed(&encode_position_fixed(p, 12), 12);
        let step = 1.0 / 4096.0;
        assert!((decoded - p).abs().max_element() <= step);
    }

    #[test]
    fn test_position_fixed_wide_fractional_bits() {
        // Encodings built directly can carry more fractional bits than a header allows
        let encoding = PositionEncoding::FixedPoint { fractional_bits: 40 };
        let mut bytes = Vec::new();
        encoding.encode_into(Vec3::new(1.0, -1.0, 0.0), &mut bytes);
        assert_eq!(&bytes[..6], &[0xFF, 0xFF, 0x7F, 0x00, 0x00, 0x80]);

        let decoded = encoding.decode(&[1, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decoded, Vec3::new((-40.0f32).exp2(), 0.0, 0.0));
        assert_eq!(decode_position_fixed(&[0; 9], 255), Vec3::ZERO);
    }

    #[test]
    fn test_position_f16_decode() {
        let bytes = encode_position_f16(Vec3::new(1.0, -2.0, 0.5));
        assert_eq!(bytes, [0x00, 0x3C, 0x00, 0xC0, 0x00, 0x38]);
        assert_eq!(decode_position_f16(&bytes), Vec3::new(1.0, -2.0, 0.5));
    }

    #[test]
    fn test_position_encoding_stride() {
        assert_eq!(PositionEncoding::Float16.stride(), 6);
        assert_eq!(
            PositionEncoding::FixedPoint { fractional_bits: 12 }.stride(),
            9
        );
    }

    #[test]
    fn test_scale_affine() {
        assert_eq!(decode_scale(0), -10.0);
        assert_eq!(decode_scale(160), 0.0);
        assert_eq!(decode_scale(255), 5.9375);
        assert_eq!(encode_scale(0.0), 160);
        assert_eq!(encode_scale(-100.0), 0);
        assert_eq!(encode_scale(100.0), 255);
    }

    #[test]
    fn test_alpha_is_finite_at_extremes() {
        let low = decode_alpha(0);
        let high = decode_alpha(255);
        assert!(low.is_finite() && high.is_finite());
        assert!(low < -9.0 && high > 9.0);
        assert_eq!(encode_alpha(low), 0);
        assert_eq!(encode_alpha(high), 255);
    }

    #[test]
    fn test_alpha_midpoint() {
        assert!((decode_alpha(128) - logit(128.0 / 255.0)).abs() < 1e-6);
        assert_eq!(encode_alpha(0.0), 128);
    }

    #[test]
    fn test_logit_sigmoid_inverse() {
        for x in [0.1f32, 0.25, 0.5, 0.75, 0.9] {
            assert!((sigmoid(logit(x)) - x).abs() < 1e-5);
        }
    }

    #[test]
    fn test_color_affine() {
        assert!((decode_color(0) + 0.5 / COLOR_SCALE).abs() < 1e-5);
        assert!((decode_color(255) - 0.5 / COLOR_SCALE).abs() < 1e-5);
        for byte in 0..=255u8 {
            assert_eq!(encode_color(decode_color(byte)), byte);
        }
    }

    #[test]
    fn test_sh_affine() {
        assert_eq!(decode_sh(SH_NEUTRAL_BYTE), 0.0);
        assert_eq!(decode_sh(0), -1.0);
        for byte in 0..=255u8 {
            assert_eq!(encode_sh(decode_sh(byte), 8), byte);
        }
    }

    #[test]
    fn test_sh_bucketing() {
        // 4 bits -> multiples of 16
        assert_eq!(encode_sh(0.0, 4), 128);
        assert_eq!(encode_sh(decode_sh(135), 4), 128);
        assert_eq!(encode_sh(decode_sh(137), 4), 144);
        assert_eq!(encode_sh(1.0, 4), 255);
        // Already on the grid: stable
        for byte in (0..=240u8).step_by(16) {
            assert_eq!(encode_sh(decode_sh(byte), 4), byte);
        }
    }
}
