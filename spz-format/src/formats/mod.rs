//! SPZ binary formats
//!
//! The container is a 16-byte header followed by one byte array per point
//! attribute. Headers implement [`BinarySerializable`].

pub mod container;
pub mod header;
pub mod quaternion;
mod serialization;

pub use container::*;
pub use header::*;
pub use quaternion::*;
pub use serialization::BinarySerializable;
