//! Error types shared across the frames crate.

use thiserror::Error;

/// Errors produced while building frame sources or processing frames.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Malformed shape, length or element type supplied at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The pixel buffer for a frame could not be reserved.
    #[error("Failed to allocate a buffer of {elements} elements")]
    AllocationFailure { elements: usize },

    /// A strict sequence was asked for a frame past its end.
    #[error("Frame index {index} is out of range for a sequence of length {length}")]
    IndexOutOfRange { index: usize, length: usize },

    /// A frame did not have the shape its sequence declares.
    #[error("Frame shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Colour conversion was requested on a frame with no axis of size 3.
    #[error("No colour axis of size 3 in frame shape {shape:?}")]
    ChannelAxisNotFound { shape: Vec<usize> },

    /// An operation received a frame with the wrong number of axes.
    #[error("Expected a {expected}-dimensional frame, got {actual} dimensions")]
    UnsupportedDimensionality { expected: usize, actual: usize },

    /// A processing parameter was set outside of its declared range.
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A processing step has no parameter with the requested name.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FrameError>;
