//! Error types for Rayo operations

use thiserror::Error;

/// Result type for Rayo operations
pub type Result<T> = std::result::Result<T, RayoError>;

/// Errors raised by the safe, validated surface of the crate.
///
/// The register engine itself ([`VectorBackend`](crate::backends::VectorBackend)
/// and [`IndexedBackend`](crate::backends::IndexedBackend)) never produces a
/// runtime error: unsupported type/width combinations fail to compile, and
/// violated caller contracts on the `unsafe` methods are undefined behavior.
/// These variants exist only where slices and index buffers are checked
/// before the engine is invoked.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RayoError {
    /// A slice was too short to fill or drain a full register
    #[error("size mismatch: need at least {expected} elements, got {actual}")]
    SizeMismatch {
        /// Minimum number of elements required
        expected: usize,
        /// Number of elements provided
        actual: usize,
    },

    /// A lane index points outside the target buffer
    #[error("lane index {index} out of bounds for buffer of length {len}")]
    IndexOutOfBounds {
        /// The offending index value
        index: usize,
        /// Length of the target buffer
        len: usize,
    },

    /// An index array cannot be split into groups of the requested width
    #[error("group width {width} must be nonzero and divide the index count {len}")]
    InvalidGroupWidth {
        /// Length of the index array
        len: usize,
        /// Requested group width
        width: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RayoError::SizeMismatch {
            expected: 4,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "size mismatch: need at least 4 elements, got 2"
        );

        let err = RayoError::IndexOutOfBounds { index: 9, len: 8 };
        assert_eq!(
            err.to_string(),
            "lane index 9 out of bounds for buffer of length 8"
        );
    }

    #[test]
    fn test_error_equality() {
        let a = RayoError::InvalidGroupWidth { len: 10, width: 4 };
        let b = RayoError::InvalidGroupWidth { len: 10, width: 4 };
        assert_eq!(a, b);
    }
}
