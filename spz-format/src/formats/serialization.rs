//! Binary serialization trait for format headers.
//!
//! Gives generic code one interface over fixed-size headers while each
//! header keeps its own `to_bytes()` returning a fixed-size array.

use crate::error::Result;

/// Trait for binary-serializable format headers.
///
/// Uses `Vec<u8>` for the return type because associated const generics in
/// return types (`[u8; Self::SIZE]`) are not yet stable.
///
/// # Example
///
/// ```
/// use spz_format::formats::{BinarySerializable, SpzHeader};
///
/// let header = SpzHeader::new(3, 64, 1, 12, 0);
/// let bytes = header.serialize();
/// let parsed = SpzHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed, header);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize and validate.
    fn deserialize(bytes: &[u8]) -> Result<Self>;
}

impl BinarySerializable for super::SpzHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        Self::parse(bytes)
    }
}
