//! Read-only commands: `info` and `dump`

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use spz_format::{DecodeOptions, PackedPointSet, PositionEncoding, RotationEncoding};

/// Read and decode a container file
pub fn read_container(path: &Path, options: &DecodeOptions) -> Result<PackedPointSet> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    PackedPointSet::decode(&bytes, options).with_context(|| format!("Failed to decode {:?}", path))
}

/// Summary of a decoded container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub version: u32,
    pub points: usize,
    pub declared_points: usize,
    pub sh_degree: u8,
    pub fractional_bits: u8,
    pub antialiased: bool,
    pub position_encoding: PositionEncoding,
    pub rotation_encoding: RotationEncoding,
    pub point_stride: usize,
    pub serialized_size: usize,
}

impl ContainerInfo {
    pub fn from_set(set: &PackedPointSet) -> Self {
        let header = set.header();
        Self {
            version: header.version,
            points: set.len(),
            declared_points: set.declared_count(),
            sh_degree: header.sh_degree,
            fractional_bits: header.fractional_bits,
            antialiased: header.is_antialiased(),
            position_encoding: set.layout().position,
            rotation_encoding: set.layout().rotation,
            point_stride: set.layout().point_stride(),
            serialized_size: set.serialized_size(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.points < self.declared_points
    }
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version:          {}", self.version)?;
        if self.is_truncated() {
            writeln!(
                f,
                "points:           {} (declared {}, truncated)",
                self.points, self.declared_points
            )?;
        } else {
            writeln!(f, "points:           {}", self.points)?;
        }
        writeln!(f, "sh degree:        {}", self.sh_degree)?;
        match self.position_encoding {
            PositionEncoding::Float16 => writeln!(f, "positions:        float16")?,
            PositionEncoding::FixedPoint { fractional_bits } => {
                writeln!(f, "positions:        24-bit fixed, {fractional_bits} fractional bits")?
            }
        }
        let rotation = match self.rotation_encoding {
            RotationEncoding::FirstThree => "first-three (3 bytes)",
            RotationEncoding::SmallestThree => "smallest-three (4 bytes)",
        };
        writeln!(f, "rotations:        {rotation}")?;
        writeln!(f, "antialiased:      {}", self.antialiased)?;
        writeln!(f, "bytes per point:  {}", self.point_stride)?;
        write!(f, "serialized size:  {} bytes", self.serialized_size)
    }
}

/// Decode up to `limit` points as JSON
pub fn dump_json(
    set: &PackedPointSet,
    options: &DecodeOptions,
    limit: Option<usize>,
    pretty: bool,
) -> Result<String> {
    let end = limit.map_or(set.len(), |limit| limit.min(set.len()));
    let points = set.decode_range(0..end, &options.converter());
    let json = if pretty {
        serde_json::to_string_pretty(&points)
    } else {
        serde_json::to_string(&points)
    };
    json.context("Failed to serialize points")
}
