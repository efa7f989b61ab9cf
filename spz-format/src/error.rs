//! SPZ decoding and encoding error types

use thiserror::Error;

/// Errors produced while parsing, decoding or encoding an SPZ container
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpzError {
    /// Buffer too short for a header, or the magic is not recognized
    #[error("invalid SPZ header: {0}")]
    InvalidHeader(String),

    /// Format version outside the accepted range
    #[error("unsupported SPZ version: {0}")]
    UnsupportedVersion(u32),

    /// Header fields out of range, or no attribute data left after truncation
    #[error("invalid SPZ data: {0}")]
    InvalidData(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SpzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SpzError::InvalidHeader("bad magic 0x00000000".into()).to_string(),
            "invalid SPZ header: bad magic 0x00000000"
        );
        assert_eq!(
            SpzError::UnsupportedVersion(7).to_string(),
            "unsupported SPZ version: 7"
        );
        assert_eq!(
            SpzError::InvalidData("sh_degree 4 exceeds 3".into()).to_string(),
            "invalid SPZ data: sh_degree 4 exceeds 3"
        );
    }
}
