//! SPZ Gaussian-splat container codec
//!
//! Decodes and encodes the SPZ format: a 16-byte header followed by
//! per-attribute byte arrays of quantized splats (position, opacity, color,
//! scale, rotation and spherical harmonics).
//!
//! # Modules
//!
//! - [`packing`] - Per-field quantization (f16, fixed point, logit, affine)
//! - [`formats`] - Header, rotation encodings and the point container
//! - [`coords`] - Coordinate-system conversion
//! - [`options`] - Decode/encode configuration
//! - [`accumulator`] - Thread-safe point accumulation with a one-shot finish
//!
//! # Example
//!
//! ```
//! use spz_format::{DecodeOptions, EncodeOptions, UnpackedPoint, decode_points, encode_points};
//!
//! let points = vec![UnpackedPoint::default(); 4];
//! let bytes = encode_points(&points, &EncodeOptions::default()).unwrap();
//! let decoded = decode_points(&bytes, &DecodeOptions::default()).unwrap();
//! assert_eq!(decoded.len(), 4);
//! ```

pub mod accumulator;
pub mod coords;
pub mod error;
pub mod formats;
pub mod options;
pub mod packing;

pub use accumulator::PointAccumulator;
pub use coords::{CoordinateConverter, CoordinateSystem};
pub use error::{Result, SpzError};
pub use options::{DecodeOptions, EncodeOptions};

// Re-export commonly used format items
pub use formats::{
    Attribute, AttributeLayout, BinarySerializable, PackedPointRecord, PackedPointSet,
    RotationEncoding, SPZ_MAGIC, SPZ_VERSION, SpzHeader, UnpackedPoint, decode_points,
    encode_points,
};

// Re-export commonly used packing items
pub use packing::{PositionEncoding, SH_MAX_COEFFS, sh_dim};
