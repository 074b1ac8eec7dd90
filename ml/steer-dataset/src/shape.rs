//! Network input geometry.

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Image geometry a network expects, described channels-last.
///
/// Configuration speaks in `height x width x channels`, the way camera frames
/// are usually described. Tensors handed to the network use Burn's
/// `[batch, channels, height, width]` layout; see [`InputShape::batch_dims`].
///
/// # Example
///
/// ```
/// use steer_dataset::InputShape;
///
/// let shape = InputShape::new(66, 200, 3);
/// assert_eq!(shape.numel(), 66 * 200 * 3);
/// assert_eq!(shape.batch_dims(8), [8, 3, 66, 200]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputShape {
    /// Image height in pixels.
    pub height: usize,

    /// Image width in pixels.
    pub width: usize,

    /// Number of colour channels.
    pub channels: usize,
}

impl InputShape {
    /// Creates a new input shape.
    #[must_use]
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of values in one image.
    #[must_use]
    pub const fn numel(&self) -> usize {
        self.height * self.width * self.channels
    }

    /// Tensor dimensions for a batch of `batch` images.
    #[must_use]
    pub const fn batch_dims(&self, batch: usize) -> [usize; 4] {
        [batch, self.channels, self.height, self.width]
    }

    /// Returns `true` if every dimension is positive.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.height > 0 && self.width > 0 && self.channels > 0
    }

    /// Checks that every dimension is positive.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::InvalidDimensions` otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DatasetError::invalid_dimensions(
                self.height,
                self.width,
                self.channels,
            ))
        }
    }
}

impl std::fmt::Display for InputShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}
