//! SPZ point container
//!
//! # Layout
//! ```text
//! Header (16 bytes, see `SpzHeader`)
//!
//! Body (each array is point_count × stride bytes, in this order):
//!   positions   6 (f16) or 9 (24-bit fixed point)
//!   alphas      1
//!   colors      3
//!   scales      3
//!   rotations   3 (first-three, v1-2) or 4 (smallest-three, v3)
//!   sh          sh_dim(degree) × 3
//! ```
//!
//! Decoding is a single pass: parse the header, lay out the expected byte
//! range of every attribute, clamp each range to the bytes actually present,
//! and take the smallest whole point count any attribute can supply. A
//! truncated file therefore decodes to fewer points instead of failing. If
//! no point survives the declared layout, the body is read as arrays packed
//! for the whole points it holds.
//! The resulting [`PackedPointSet`] is immutable.

mod types;


pub use types::*;

use std::ops::Range;

use glam::Vec3;
use tracing::{debug, warn};

use crate::coords::CoordinateConverter;
use crate::error::{Result, SpzError};
use crate::formats::header::{
    FLAG_ANTIALIASED, FLAG_FLOAT16_POSITIONS, MAX_POINT_COUNT, SpzHeader, is_known_magic,
};
use crate::options::{DecodeOptions, EncodeOptions};
use crate::packing::{
    SH_MAX_COEFFS, decode_alpha, decode_color, decode_scale, decode_sh, encode_alpha,
    encode_color, encode_scale, encode_sh,
};

/// First two bytes of a gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Find the start of the container in `bytes`
///
/// Input that still begins with a gzip magic is scanned (up to `window`
/// bytes) for a recognized container magic. Anything else is returned as-is
/// and left to the header parser.
pub fn locate_container(bytes: &[u8], window: usize) -> Result<&[u8]> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let last = window.min(bytes.len().saturating_sub(4));
    let found = (1..=last).find(|&offset| {
        let magic = u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]);
        is_known_magic(magic)
    });

    match found {
        Some(offset) => {
            warn!("Input starts with a gzip magic; found container magic at offset {offset}");
            Ok(&bytes[offset..])
        }
        None => Err(SpzError::InvalidHeader(format!(
            "input is gzip-compressed and no container magic was found in the first {window} bytes"
        ))),
    }
}

/// Decoded-but-still-quantized splats, one byte array per attribute
///
/// Safe to share across threads; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPointSet {
    /// Header with `point_count` set to the finalized count
    header: SpzHeader,
    /// Point count the source header declared
    declared_count: u32,
    layout: AttributeLayout,
    positions: Vec<u8>,
    alphas: Vec<u8>,
    colors: Vec<u8>,
    scales: Vec<u8>,
    rotations: Vec<u8>,
    sh: Vec<u8>,
}

impl PackedPointSet {
    /// Decode a container from a fully decompressed byte buffer
    pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Self> {
        let bytes = locate_container(bytes, options.magic_scan_window)?;
        let header = SpzHeader::parse_accepting(bytes, options.versions())?;
        let layout = AttributeLayout::from_header(&header);

        let body = &bytes[SpzHeader::SIZE..];
        let declared = header.point_count as usize;
        let (count, ranges) = finalize_layout(&layout, declared, body.len());

        if count == 0 {
            return Err(SpzError::InvalidData(format!(
                "no complete points in {} body bytes (declared {declared})",
                body.len()
            )));
        }
        if count < declared {
            warn!(
                "Truncated SPZ body: declared {declared} points, decoding {count} ({} of {} body bytes present)",
                body.len(),
                layout.body_size(declared)
            );
        }

        let [positions, alphas, colors, scales, rotations, sh] =
            Attribute::ALL.map(|attribute| {
                let index = attribute as usize;
                let start = ranges[index].start;
                body[start..start + count * layout.stride(attribute)].to_vec()
            });

        debug!(
            "Decoded SPZ v{} header: {count} points, sh_degree {}, {:?}, {:?}",
            header.version, header.sh_degree, layout.position, layout.rotation
        );

        Ok(Self {
            header: SpzHeader {
                point_count: count as u32,
                ..header
            },
            declared_count: header.point_count,
            layout,
            positions,
            alphas,
            colors,
            scales,
            rotations,
            sh,
        })
    }

    /// Quantize full-precision points into a new container
    pub fn encode(points: &[UnpackedPoint], options: &EncodeOptions) -> Result<Self> {
        options.validate()?;
        if points.is_empty() || points.len() > MAX_POINT_COUNT as usize {
            return Err(SpzError::InvalidData(format!(
                "cannot encode {} points (expected 1..={MAX_POINT_COUNT})",
                points.len()
            )));
        }

        let mut flags = 0;
        if options.antialiased {
            flags |= FLAG_ANTIALIASED;
        }
        if options.float16_positions {
            flags |= FLAG_FLOAT16_POSITIONS;
        }
        let header = SpzHeader::new(
            options.version,
            points.len() as u32,
            options.sh_degree,
            options.fractional_bits,
            flags,
        );
        let layout = AttributeLayout::from_header(&header);
        let converter = options.converter();

        let capacity = |attribute| points.len() * layout.stride(attribute);
        let mut positions = Vec::with_capacity(capacity(Attribute::Positions));
        let mut alphas = Vec::with_capacity(capacity(Attribute::Alphas));
        let mut colors = Vec::with_capacity(capacity(Attribute::Colors));
        let mut scales = Vec::with_capacity(capacity(Attribute::Scales));
        let mut rotations = Vec::with_capacity(capacity(Attribute::Rotations));
        let mut sh = Vec::with_capacity(capacity(Attribute::SphericalHarmonics));

        for point in points {
            layout
                .position
                .encode_into(converter.apply_position(point.position), &mut positions);
            alphas.push(encode_alpha(point.alpha));
            colors.extend(point.color.to_array().map(encode_color));
            scales.extend(point.scale.to_array().map(encode_scale));
            layout
                .rotation
                .encode_into(converter.apply_rotation(point.rotation), &mut rotations);

            for (i, coeff) in point.sh.iter().take(layout.sh_dim).enumerate() {
                let bits = if i < 3 {
                    options.sh1_bits
                } else {
                    options.sh_rest_bits
                };
                let coeff = *coeff * converter.sh[i];
                sh.extend(coeff.to_array().map(|c| encode_sh(c, bits)));
            }
        }

        debug!(
            "Encoded {} points as SPZ v{} ({:?}, {:?})",
            points.len(),
            header.version,
            layout.position,
            layout.rotation
        );

        Ok(Self {
            header,
            declared_count: header.point_count,
            layout,
            positions,
            alphas,
            colors,
            scales,
            rotations,
            sh,
        })
    }

    /// Header describing this set (point count is the finalized count)
    pub fn header(&self) -> &SpzHeader {
        &self.header
    }

    pub fn layout(&self) -> &AttributeLayout {
        &self.layout
    }

    /// Number of points available
    pub fn len(&self) -> usize {
        self.header.point_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point count declared by the source header
    pub fn declared_count(&self) -> usize {
        self.declared_count as usize
    }

    /// Whether the source had fewer points than it declared
    pub fn is_truncated(&self) -> bool {
        self.len() < self.declared_count()
    }

    /// Raw bytes of one attribute array
    pub fn attribute_bytes(&self, attribute: Attribute) -> &[u8] {
        match attribute {
            Attribute::Positions => &self.positions,
            Attribute::Alphas => &self.alphas,
            Attribute::Colors => &self.colors,
            Attribute::Scales => &self.scales,
            Attribute::Rotations => &self.rotations,
            Attribute::SphericalHarmonics => &self.sh,
        }
    }

    /// Packed bytes of point `index`
    pub fn get(&self, index: usize) -> Option<PackedPointRecord<'_>> {
        (index < self.len()).then(|| self.record(index))
    }

    /// Iterate packed records in order
    pub fn records(&self) -> impl ExactSizeIterator<Item = PackedPointRecord<'_>> + '_ {
        (0..self.len()).map(move |index| self.record(index))
    }

    /// Slice every attribute at `index`; callers check the bound
    fn record(&self, index: usize) -> PackedPointRecord<'_> {
        let slice = |attribute: Attribute| {
            let stride = self.layout.stride(attribute);
            &self.attribute_bytes(attribute)[index * stride..(index + 1) * stride]
        };

        let mut sh = PackedPointRecord::neutral_sh();
        let stored = slice(Attribute::SphericalHarmonics);
        sh[..stored.len()].copy_from_slice(stored);

        PackedPointRecord {
            position: slice(Attribute::Positions),
            alpha: self.alphas[index],
            color: slice(Attribute::Colors),
            scale: slice(Attribute::Scales),
            rotation: slice(Attribute::Rotations),
            sh,
        }
    }

    /// Decode one point
    pub fn decode_point(
        &self,
        index: usize,
        converter: &CoordinateConverter,
    ) -> Option<UnpackedPoint> {
        let record = self.get(index)?;
        let mut sh = [Vec3::ZERO; SH_MAX_COEFFS];
        for (i, coeff) in sh.iter_mut().enumerate().take(self.layout.sh_dim) {
            *coeff = Vec3::from_array(record.sh_coefficient(i).map(decode_sh));
        }
        converter.apply_sh(&mut sh);

        Some(UnpackedPoint {
            position: converter.apply_position(self.layout.position.decode(record.position)),
            rotation: converter.apply_rotation(self.layout.rotation.decode(record.rotation)),
            scale: Vec3::from_array(bytes3(record.scale).map(decode_scale)),
            color: Vec3::from_array(bytes3(record.color).map(decode_color)),
            alpha: decode_alpha(record.alpha),
            sh,
        })
    }

    /// Decode every point, converting to `options.coordinate_system`
    pub fn decode_all(&self, options: &DecodeOptions) -> Vec<UnpackedPoint> {
        self.decode_range(0..self.len(), &options.converter())
    }

    /// Decode the points in `range` (clamped to the set)
    ///
    /// Each attribute is decoded column-wise, so the position and rotation
    /// encodings are matched once per call rather than once per point.
    pub fn decode_range(
        &self,
        range: Range<usize>,
        converter: &CoordinateConverter,
    ) -> Vec<UnpackedPoint> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let count = end - start;
        let column = |attribute: Attribute| {
            let stride = self.layout.stride(attribute);
            &self.attribute_bytes(attribute)[start * stride..end * stride]
        };

        let mut points = vec![UnpackedPoint::default(); count];

        let position = self.layout.position;
        let stride = position.stride();
        let columns = column(Attribute::Positions).chunks_exact(stride);
        for (point, bytes) in points.iter_mut().zip(columns) {
            point.position = converter.apply_position(position.decode(bytes));
        }

        for (point, &byte) in points.iter_mut().zip(column(Attribute::Alphas)) {
            point.alpha = decode_alpha(byte);
        }

        for (point, bytes) in points
            .iter_mut()
            .zip(column(Attribute::Colors).chunks_exact(3))
        {
            point.color = Vec3::from_array(bytes3(bytes).map(decode_color));
        }

        for (point, bytes) in points
            .iter_mut()
            .zip(column(Attribute::Scales).chunks_exact(3))
        {
            point.scale = Vec3::from_array(bytes3(bytes).map(decode_scale));
        }

        let rotation = self.layout.rotation;
        let stride = rotation.stride();
        let columns = column(Attribute::Rotations).chunks_exact(stride);
        for (point, bytes) in points.iter_mut().zip(columns) {
            point.rotation = converter.apply_rotation(rotation.decode(bytes));
        }

        let sh_stride = self.layout.sh_dim * 3;
        if sh_stride > 0 {
            for (point, bytes) in points
                .iter_mut()
                .zip(column(Attribute::SphericalHarmonics).chunks_exact(sh_stride))
            {
                for (coeff, rgb) in point.sh.iter_mut().zip(bytes.chunks_exact(3)) {
                    *coeff = Vec3::from_array(bytes3(rgb).map(decode_sh));
                }
                converter.apply_sh(&mut point.sh);
            }
        }

        points
    }

    /// Total serialized size in bytes
    pub fn serialized_size(&self) -> usize {
        SpzHeader::SIZE + self.layout.body_size(self.len())
    }

    /// Write header and attribute arrays (byte copy, no requantization)
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_size());
        bytes.extend_from_slice(&self.header.to_bytes());
        for attribute in Attribute::ALL {
            bytes.extend_from_slice(self.attribute_bytes(attribute));
        }
        bytes
    }
}

/// Decode every point of a container buffer
pub fn decode_points(bytes: &[u8], options: &DecodeOptions) -> Result<Vec<UnpackedPoint>> {
    Ok(PackedPointSet::decode(bytes, options)?.decode_all(options))
}

/// Encode points straight to a container buffer
pub fn encode_points(points: &[UnpackedPoint], options: &EncodeOptions) -> Result<Vec<u8>> {
    Ok(PackedPointSet::encode(points, options)?.serialize())
}

/// Expected byte range of each attribute, clamped to `available` body bytes
fn attribute_ranges(
    layout: &AttributeLayout,
    declared: usize,
    available: usize,
) -> [Range<usize>; 6] {
    let mut offset = 0;
    Attribute::ALL.map(|attribute| {
        let expected = declared * layout.stride(attribute);
        let start = offset.min(available);
        let end = (offset + expected).min(available);
        offset += expected;
        start..end
    })
}

/// Point count and attribute ranges for a body of `available` bytes
///
/// Arrays are laid out for the declared count, and the count is cut to what
/// every array can supply. Only when that leaves no point at all is the body
/// laid out again for the whole points it holds (arrays packed back to back
/// under an overstated header count).
fn finalize_layout(
    layout: &AttributeLayout,
    declared: usize,
    available: usize,
) -> (usize, [Range<usize>; 6]) {
    let ranges = attribute_ranges(layout, declared, available);
    let count = finalized_count(layout, declared, &ranges);
    if count > 0 {
        return (count, ranges);
    }

    let whole = (available / layout.point_stride()).min(declared);
    if whole > 0 {
        debug!("No point fits the declared layout; body holds {whole} packed points");
        return (whole, attribute_ranges(layout, whole, available));
    }
    (0, ranges)
}

/// Largest point count every attribute range can supply
fn finalized_count(
    layout: &AttributeLayout,
    declared: usize,
    ranges: &[Range<usize>; 6],
) -> usize {
    Attribute::ALL
        .into_iter()
        .zip(ranges)
        .filter_map(|(attribute, range)| {
            let stride = layout.stride(attribute);
            (stride > 0).then(|| range.len() / stride)
        })
        .fold(declared, usize::min)
}

#[inline]
fn bytes3(bytes: &[u8]) -> [u8; 3] {
    [bytes[0], bytes[1], bytes[2]]
}
