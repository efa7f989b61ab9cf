//! SPZ container header
//!
//! # Layout
//! ```text
//! 0x00: magic u32 LE          - 0x5053474E ("NGSP")
//! 0x04: version u32 LE        - 1..=3
//! 0x08: point_count u32 LE    - 1..=10,000,000
//! 0x0C: sh_degree u8          - 0..=3
//! 0x0D: fractional_bits u8    - 0..=16
//! 0x0E: flags u8              - bit0 antialiased, bit1 half-float positions
//! 0x0F: reserved u8
//! ```

use std::ops::RangeInclusive;

use tracing::warn;

use crate::error::{Result, SpzError};
use crate::formats::quaternion::RotationEncoding;
use crate::packing::{PositionEncoding, sh_dim};

/// Container magic ("NGSP" read little-endian)
pub const SPZ_MAGIC: u32 = 0x5053_474E;

/// Current container version
pub const SPZ_VERSION: u32 = 3;

/// Versions this crate reads and writes
pub const SUPPORTED_VERSIONS: RangeInclusive<u32> = 1..=SPZ_VERSION;

/// Byte-order variants of [`SPZ_MAGIC`] written by older tooling
pub const MAGIC_VARIANTS: [u32; 3] = [
    // Fully byte-swapped ("PSGN")
    SPZ_MAGIC.swap_bytes(),
    // 16-bit halves swapped ("SPNG")
    SPZ_MAGIC.rotate_left(16),
    // Bytes swapped within each half ("GNPS")
    ((SPZ_MAGIC & 0x00FF_00FF) << 8) | ((SPZ_MAGIC >> 8) & 0x00FF_00FF),
];

/// Upper bound on the declared point count
pub const MAX_POINT_COUNT: u32 = 10_000_000;

/// Highest spherical-harmonics degree
pub const MAX_SH_DEGREE: u8 = 3;

/// Highest fixed-point fractional bit count
pub const MAX_FRACTIONAL_BITS: u8 = 16;

/// Flag: splats were trained with antialiasing
pub const FLAG_ANTIALIASED: u8 = 0x1;

/// Flag: positions are stored as half-floats instead of fixed point
pub const FLAG_FLOAT16_POSITIONS: u8 = 0x2;

/// Whether `magic` is the canonical constant or a whitelisted variant
#[inline]
pub fn is_known_magic(magic: u32) -> bool {
    magic == SPZ_MAGIC || MAGIC_VARIANTS.contains(&magic)
}

/// SPZ container header (16 bytes)
///
/// Note: Not packed - we use explicit byte serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SpzHeader {
    pub magic: u32,
    pub version: u32,
    pub point_count: u32,
    pub sh_degree: u8,
    pub fractional_bits: u8,
    pub flags: u8,
    pub reserved: u8,
}

impl SpzHeader {
    pub const SIZE: usize = 16;

    pub fn new(
        version: u32,
        point_count: u32,
        sh_degree: u8,
        fractional_bits: u8,
        flags: u8,
    ) -> Self {
        Self {
            magic: SPZ_MAGIC,
            version,
            point_count,
            sh_degree,
            fractional_bits,
            flags,
            reserved: 0,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.point_count.to_le_bytes());
        bytes[12] = self.sh_degree;
        bytes[13] = self.fractional_bits;
        bytes[14] = self.flags;
        bytes[15] = self.reserved;
        bytes
    }

    /// Read header fields from bytes without validation
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            point_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            sh_degree: bytes[12],
            fractional_bits: bytes[13],
            flags: bytes[14],
            reserved: bytes[15],
        })
    }

    /// Parse and validate a header, accepting [`SUPPORTED_VERSIONS`]
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_accepting(bytes, SUPPORTED_VERSIONS)
    }

    /// Parse and validate a header, accepting only `versions`
    ///
    /// A whitelisted magic variant is normalized to [`SPZ_MAGIC`].
    pub fn parse_accepting(bytes: &[u8], versions: RangeInclusive<u32>) -> Result<Self> {
        let mut header = Self::from_bytes(bytes).ok_or_else(|| {
            SpzError::InvalidHeader(format!(
                "need {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            ))
        })?;

        if header.magic != SPZ_MAGIC {
            if !MAGIC_VARIANTS.contains(&header.magic) {
                return Err(SpzError::InvalidHeader(format!(
                    "unrecognized magic 0x{:08X}",
                    header.magic
                )));
            }
            warn!("Accepting byte-order variant magic 0x{:08X}", header.magic);
            header.magic = SPZ_MAGIC;
        }

        header.validate(versions)?;
        Ok(header)
    }

    /// Check version and field ranges (magic is checked by the parser)
    pub fn validate(&self, versions: RangeInclusive<u32>) -> Result<()> {
        if !versions.contains(&self.version) {
            return Err(SpzError::UnsupportedVersion(self.version));
        }
        if self.point_count == 0 || self.point_count > MAX_POINT_COUNT {
            return Err(SpzError::InvalidData(format!(
                "point count {} outside 1..={MAX_POINT_COUNT}",
                self.point_count
            )));
        }
        if self.sh_degree > MAX_SH_DEGREE {
            return Err(SpzError::InvalidData(format!(
                "sh_degree {} exceeds {MAX_SH_DEGREE}",
                self.sh_degree
            )));
        }
        if self.fractional_bits > MAX_FRACTIONAL_BITS {
            return Err(SpzError::InvalidData(format!(
                "fractional_bits {} exceeds {MAX_FRACTIONAL_BITS}",
                self.fractional_bits
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn is_antialiased(&self) -> bool {
        self.flags & FLAG_ANTIALIASED != 0
    }

    /// Version 1 always stored half-float positions; later versions use the flag
    #[inline]
    pub fn uses_float16(&self) -> bool {
        self.version == 1 || self.flags & FLAG_FLOAT16_POSITIONS != 0
    }

    pub fn position_encoding(&self) -> PositionEncoding {
        if self.uses_float16() {
            PositionEncoding::Float16
        } else {
            PositionEncoding::FixedPoint {
                fractional_bits: self.fractional_bits,
            }
        }
    }

    pub fn rotation_encoding(&self) -> RotationEncoding {
        RotationEncoding::for_version(self.version)
    }

    /// SH coefficients stored per color channel
    pub fn sh_dim(&self) -> usize {
        sh_dim(self.sh_degree)
    }
}
