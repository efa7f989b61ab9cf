//! Writing commands: `convert` and `repair`

use std::path::Path;

use anyhow::{Context, Result};
use spz_format::{CoordinateSystem, DecodeOptions, EncodeOptions, PackedPointSet};

use crate::inspect::read_container;

/// Outcome of a write command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Points written
    pub points: usize,
    /// Points the source header declared
    pub declared_points: usize,
    pub input_bytes: u64,
    pub output_bytes: usize,
}

/// Re-encode a decoded set with new encoding options
///
/// `sh_degree` of `None` keeps the source degree; the degree in `encode` is
/// only used when passed explicitly. The antialiased flag is
/// kept when the source has it. Points stay in the storage system, so no
/// coordinate flips are applied either way.
pub fn reencode(
    set: &PackedPointSet,
    encode: &EncodeOptions,
    sh_degree: Option<u8>,
) -> Result<PackedPointSet> {
    let source = set.header();
    let encode = EncodeOptions {
        sh_degree: sh_degree.unwrap_or(source.sh_degree),
        antialiased: encode.antialiased || source.is_antialiased(),
        coordinate_system: CoordinateSystem::Unspecified,
        ..encode.clone()
    };
    let decode = DecodeOptions::default().with_coordinate_system(CoordinateSystem::Unspecified);

    let points = set.decode_all(&decode);
    PackedPointSet::encode(&points, &encode).context("Failed to encode points")
}

/// Decode `input` and write it re-encoded to `output`
pub fn convert_file(
    input: &Path,
    output: &Path,
    decode: &DecodeOptions,
    encode: &EncodeOptions,
    sh_degree: Option<u8>,
) -> Result<WriteSummary> {
    let set = read_container(input, decode)?;
    let converted = reencode(&set, encode, sh_degree)?;
    write_set(input, output, &set, &converted)
}

/// Rewrite `input` with the finalized point count, copying attribute bytes
///
/// Drops any partial point and trailing bytes of a truncated file without
/// requantizing.
pub fn repair_file(input: &Path, output: &Path, decode: &DecodeOptions) -> Result<WriteSummary> {
    let set = read_container(input, decode)?;
    if set.is_truncated() {
        tracing::info!(
            "Recovered {} of {} declared points",
            set.len(),
            set.declared_count()
        );
    }
    write_set(input, output, &set, &set)
}

fn write_set(
    input: &Path,
    output: &Path,
    source: &PackedPointSet,
    written: &PackedPointSet,
) -> Result<WriteSummary> {
    let input_bytes = std::fs::metadata(input)
        .with_context(|| format!("Failed to stat {:?}", input))?
        .len();
    let bytes = written.serialize();
    std::fs::write(output, &bytes).with_context(|| format!("Failed to write {:?}", output))?;

    Ok(WriteSummary {
        points: written.len(),
        declared_points: source.declared_count(),
        input_bytes,
        output_bytes: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use spz_format::UnpackedPoint;

    fn sample_set(version: u32, sh_degree: u8) -> PackedPointSet {
        let points: Vec<_> = (0..6)
            .map(|i| {
                let mut point = UnpackedPoint {
                    position: glam::Vec3::new(i as f32 * 0.5, 1.0, 2.0),
                    ..UnpackedPoint::default()
                };
                point.sh[0] = glam::Vec3::splat(0.25);
                point
            })
            .collect();
        let options = EncodeOptions::new()
            .with_version(version)
            .with_sh_degree(sh_degree)
            .with_antialiased(true);
        PackedPointSet::encode(&points, &options).unwrap()
    }

    #[test]
    fn test_reencode_keeps_source_degree() {
        let set = sample_set(2, 2);
        let converted = reencode(&set, &EncodeOptions::default(), None).unwrap();
        assert_eq!(converted.header().version, 3);
        assert_eq!(converted.header().sh_degree, 2);
        assert!(converted.header().is_antialiased());
        assert_eq!(converted.len(), set.len());
    }

    #[test]
    fn test_reencode_changes_degree() {
        let set = sample_set(3, 1);
        let converted = reencode(&set, &EncodeOptions::default(), Some(0)).unwrap();
        assert_eq!(converted.header().sh_degree, 0);
        assert_eq!(converted.layout().sh_dim, 0);
    }

    #[test]
    fn test_reencode_same_options_is_identity() {
        let set = sample_set(3, 1);
        let options = EncodeOptions::new().with_antialiased(true);
        let converted = reencode(&set, &options, None).unwrap();
        assert_eq!(converted.serialize(), set.serialize());
    }
}
