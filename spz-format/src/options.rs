//! Decode and encode configuration
//!
//! Both option sets derive serde so tools can load them from a config file.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::coords::{CoordinateConverter, CoordinateSystem};
use crate::error::{Result, SpzError};
use crate::formats::header::{
    MAX_FRACTIONAL_BITS, MAX_SH_DEGREE, SPZ_VERSION, SUPPORTED_VERSIONS,
};

/// How far past a gzip magic the decoder looks for the container magic
pub const DEFAULT_MAGIC_SCAN_WINDOW: usize = 4096;

/// Fractional bits used for fixed-point positions (1/4096 unit precision)
pub const DEFAULT_FRACTIONAL_BITS: u8 = 12;

/// Options for [`PackedPointSet::decode`](crate::PackedPointSet::decode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// System the decoded points are returned in
    pub coordinate_system: CoordinateSystem,
    /// Lowest accepted container version
    pub min_version: u32,
    /// Highest accepted container version
    pub max_version: u32,
    /// Bytes scanned for the container magic when input still starts with gzip
    pub magic_scan_window: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            coordinate_system: CoordinateSystem::Unspecified,
            min_version: *SUPPORTED_VERSIONS.start(),
            max_version: *SUPPORTED_VERSIONS.end(),
            magic_scan_window: DEFAULT_MAGIC_SCAN_WINDOW,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compatibility shim for callers that only ever accepted version 2
    pub fn legacy_v2() -> Self {
        Self {
            min_version: 2,
            max_version: 2,
            ..Self::default()
        }
    }

    pub fn with_coordinate_system(mut self, system: CoordinateSystem) -> Self {
        self.coordinate_system = system;
        self
    }

    pub fn with_magic_scan_window(mut self, window: usize) -> Self {
        self.magic_scan_window = window;
        self
    }

    pub fn versions(&self) -> RangeInclusive<u32> {
        self.min_version..=self.max_version
    }

    /// Converter from the storage system to the requested one
    pub fn converter(&self) -> CoordinateConverter {
        CoordinateConverter::new(CoordinateSystem::STORAGE, self.coordinate_system)
    }
}

/// Options for [`PackedPointSet::encode`](crate::PackedPointSet::encode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Container version to write
    pub version: u32,
    /// Fixed-point fractional bits for positions
    pub fractional_bits: u8,
    /// SH degree to store (0..=3)
    pub sh_degree: u8,
    /// Store positions as half-floats (always true for version 1)
    pub float16_positions: bool,
    /// Set the antialiased flag
    pub antialiased: bool,
    /// System the input points are in
    pub coordinate_system: CoordinateSystem,
    /// Precision bits kept for degree-1 SH coefficients (1..=8)
    pub sh1_bits: u8,
    /// Precision bits kept for degree-2 and degree-3 SH coefficients (1..=8)
    pub sh_rest_bits: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: SPZ_VERSION,
            fractional_bits: DEFAULT_FRACTIONAL_BITS,
            sh_degree: 0,
            float16_positions: false,
            antialiased: false,
            coordinate_system: CoordinateSystem::Unspecified,
            sh1_bits: 8,
            sh_rest_bits: 8,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_sh_degree(mut self, degree: u8) -> Self {
        self.sh_degree = degree;
        self
    }

    pub fn with_fractional_bits(mut self, bits: u8) -> Self {
        self.fractional_bits = bits;
        self
    }

    pub fn with_float16_positions(mut self, enabled: bool) -> Self {
        self.float16_positions = enabled;
        self
    }

    pub fn with_antialiased(mut self, enabled: bool) -> Self {
        self.antialiased = enabled;
        self
    }

    pub fn with_coordinate_system(mut self, system: CoordinateSystem) -> Self {
        self.coordinate_system = system;
        self
    }

    pub fn with_sh_bits(mut self, sh1_bits: u8, sh_rest_bits: u8) -> Self {
        self.sh1_bits = sh1_bits;
        self.sh_rest_bits = sh_rest_bits;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(SpzError::UnsupportedVersion(self.version));
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
        for (name, bits) in [("sh1_bits", self.sh1_bits), ("sh_rest_bits", self.sh_rest_bits)] {
            if !(1..=8).contains(&bits) {
                return Err(SpzError::InvalidData(format!("{name} {bits} outside 1..=8")));
            }
        }
        Ok(())
    }

    /// Converter from the input system to the storage system
    pub fn converter(&self) -> CoordinateConverter {
        CoordinateConverter::new(self.coordinate_system, CoordinateSystem::STORAGE)
    }
}
