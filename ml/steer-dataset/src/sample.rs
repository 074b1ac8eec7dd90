//! Image sample types.

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::shape::InputShape;

/// A single decoded image ready for batching.
///
/// # Image Format
///
/// Pixels are stored as a flat `Vec<f32>` in CHW (Channel-Height-Width)
/// layout, normalized to `[0, 1]`.
///
/// # Example
///
/// ```
/// use steer_dataset::ImageSample;
///
/// let sample = ImageSample::new(vec![0.5; 3 * 64 * 64], 64, 64, 3);
/// assert!(sample.is_valid());
/// assert_eq!(sample.shape().numel(), 3 * 64 * 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Image data in CHW layout, normalized to `[0, 1]`.
    pub image_chw: Vec<f32>,

    /// Image height in pixels.
    pub height: usize,

    /// Image width in pixels.
    pub width: usize,

    /// Number of channels.
    pub channels: usize,
}

impl ImageSample {
    /// Creates a new sample from CHW data.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(image_chw: Vec<f32>, height: usize, width: usize, channels: usize) -> Self {
        Self {
            image_chw,
            height,
            width,
            channels,
        }
    }

    /// Creates a sample from interleaved 8-bit pixels (HWC, as decoders emit them).
    ///
    /// Values are rescaled from `0..=255` to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::BufferLength` if `pixels` does not hold
    /// `height * width * channels` bytes.
    pub fn from_hwc_u8(pixels: &[u8], height: usize, width: usize, channels: usize) -> Result<Self> {
        let expected = height * width * channels;
        if pixels.len() != expected {
            return Err(DatasetError::buffer_length(0, expected, pixels.len()));
        }

        let plane = height * width;
        let mut image_chw = vec![0.0; expected];
        for (i, &value) in pixels.iter().enumerate() {
            let c = i % channels;
            let pixel = i / channels;
            image_chw[c * plane + pixel] = f32::from(value) / 255.0;
        }

        Ok(Self::new(image_chw, height, width, channels))
    }

    /// Returns the sample geometry.
    #[must_use]
    pub const fn shape(&self) -> InputShape {
        InputShape::new(self.height, self.width, self.channels)
    }

    /// Returns `true` if the buffer matches the declared dimensions.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.shape().is_valid() && self.image_chw.len() == self.shape().numel()
    }
}

/// How samples are fitted to the network input size.
///
/// # Example
///
/// ```
/// use steer_dataset::ResizeMode;
///
/// let mode = ResizeMode::default();
/// assert!(matches!(mode, ResizeMode::Stretch));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResizeMode {
    /// Stretch to target size with nearest-neighbour interpolation (may distort aspect ratio).
    #[default]
    Stretch,

    /// No resizing; samples must already match the input size.
    None,
}

impl ResizeMode {
    /// Returns the mode name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_valid() {
        let sample = ImageSample::new(vec![0.0; 12], 2, 2, 3);
        assert!(sample.is_valid());

        let short = ImageSample::new(vec![0.0; 11], 2, 2, 3);
        assert!(!short.is_valid());

        let empty = ImageSample::new(Vec::new(), 0, 0, 3);
        assert!(!empty.is_valid());
    }

    #[test]
    fn sample_from_hwc_u8() {
        // 1x2 RGB: red, blue -> CHW planes [r0 r1 | g0 g1 | b0 b1]
        let pixels = [255, 0, 0, 0, 0, 255];
        let sample = ImageSample::from_hwc_u8(&pixels, 1, 2, 3).unwrap();

        assert_eq!(sample.shape(), InputShape::new(1, 2, 3));
        assert_eq!(sample.image_chw, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn sample_from_hwc_u8_wrong_length() {
        let result = ImageSample::from_hwc_u8(&[0; 5], 1, 2, 3);
        assert!(matches!(result, Err(DatasetError::BufferLength { .. })));
    }

    #[test]
    fn resize_mode_name() {
        assert_eq!(ResizeMode::Stretch.name(), "stretch");
        assert_eq!(ResizeMode::None.name(), "none");
    }
}
