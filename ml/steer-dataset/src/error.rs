//! Error types for steer-dataset crate.

use thiserror::Error;

/// Errors that can occur while preparing regression data.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Image buffer length does not match its declared dimensions.
    #[error("sample {index}: expected {expected} pixel values, got {actual}")]
    BufferLength {
        /// Position of the sample in its batch.
        index: usize,
        /// Expected buffer length (C * H * W).
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Invalid image or input dimensions.
    #[error("invalid dimensions: {height}x{width}x{channels}")]
    InvalidDimensions {
        /// Height in pixels.
        height: usize,
        /// Width in pixels.
        width: usize,
        /// Number of channels.
        channels: usize,
    },

    /// Sample geometry is incompatible with the requested input shape.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// Target table is malformed.
    #[error("invalid targets: {0}")]
    InvalidTargets(String),

    /// Invalid split ratio.
    #[error("invalid split ratio: {0} (must be in (0, 1))")]
    InvalidSplitRatio(f32),

    /// Empty batch or dataset.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Tensor data could not be converted.
    #[error("tensor conversion failed: {0}")]
    TensorConversion(String),
}

impl DatasetError {
    /// Creates a buffer length error.
    #[must_use]
    pub const fn buffer_length(index: usize, expected: usize, actual: usize) -> Self {
        Self::BufferLength {
            index,
            expected,
            actual,
        }
    }

    /// Creates an invalid dimensions error.
    #[must_use]
    pub const fn invalid_dimensions(height: usize, width: usize, channels: usize) -> Self {
        Self::InvalidDimensions {
            height,
            width,
            channels,
        }
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid targets error.
    #[must_use]
    pub fn invalid_targets(reason: impl Into<String>) -> Self {
        Self::InvalidTargets(reason.into())
    }

    /// Creates a tensor conversion error.
    #[must_use]
    pub fn tensor_conversion(reason: impl Into<String>) -> Self {
        Self::TensorConversion(reason.into())
    }
}

/// Result type for steer-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
