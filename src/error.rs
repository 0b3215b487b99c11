//! Error types for the checked plane API.
//!
//! The raw metric functions have no error paths; their preconditions are
//! asserted in debug builds only. [`Plane`](crate::Plane) and
//! [`SsimOptions`](crate::SsimOptions) validate up front and report
//! failures through [`Error`].

use thiserror::Error;

/// Errors raised while validating planes or metric options.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { stride: usize, width: usize },

    #[error("buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("plane dimensions differ: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        a_width: usize,
        a_height: usize,
        b_width: usize,
        b_height: usize,
    },

    #[error("chroma plane is {width}x{height}, expected {expected_width}x{expected_height}")]
    InvalidChroma {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
