//! Turning raw batch items into network-ready tensors.

use burn::prelude::Backend;
use burn::tensor::module::interpolate;
use burn::tensor::ops::{InterpolateMode, InterpolateOptions};
use burn::tensor::{Tensor, TensorData};
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::sample::{ImageSample, ResizeMode};
use crate::shape::InputShape;

/// Converts a window of raw dataset items into a batch tensor.
///
/// Implementations own everything between "what the dataset stores" (file
/// paths, frame ids, decoded buffers) and the `[batch, channels, height, width]`
/// tensor the network consumes: decoding, resizing, normalisation and
/// augmentation all happen here.
pub trait BatchTransform {
    /// Raw item type stored by the dataset.
    type Item;

    /// Builds a `[items.len(), C, H, W]` tensor matching `shape`.
    ///
    /// # Errors
    ///
    /// Returns a `DatasetError` if an item cannot be brought to `shape`.
    fn transform_batch<B: Backend>(
        &self,
        items: &[Self::Item],
        shape: InputShape,
        device: &B::Device,
    ) -> Result<Tensor<B, 4>>;
}

/// Batch transform for in-memory [`ImageSample`]s.
///
/// # Example
///
/// ```
/// use steer_dataset::{ResizeMode, SampleTransform};
///
/// let transform = SampleTransform::new(ResizeMode::Stretch);
/// assert_eq!(transform.resize_mode(), ResizeMode::Stretch);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleTransform {
    resize: ResizeMode,
}

impl SampleTransform {
    /// Creates a transform with the given resize mode.
    #[must_use]
    pub const fn new(resize: ResizeMode) -> Self {
        Self { resize }
    }

    /// Returns the resize mode.
    #[must_use]
    pub const fn resize_mode(&self) -> ResizeMode {
        self.resize
    }

    fn check_sample(&self, index: usize, sample: &ImageSample, shape: InputShape) -> Result<()> {
        if sample.image_chw.len() != sample.shape().numel() {
            return Err(DatasetError::buffer_length(
                index,
                sample.shape().numel(),
                sample.image_chw.len(),
            ));
        }
        if !sample.is_valid() {
            return Err(DatasetError::invalid_dimensions(
                sample.height,
                sample.width,
                sample.channels,
            ));
        }
        if sample.channels != shape.channels {
            return Err(DatasetError::shape_mismatch(
                format!("{} channels", shape.channels),
                format!("{} channels in sample {index}", sample.channels),
            ));
        }
        if self.resize == ResizeMode::None
            && (sample.height != shape.height || sample.width != shape.width)
        {
            return Err(DatasetError::shape_mismatch(
                shape.to_string(),
                format!("{} in sample {index}", sample.shape()),
            ));
        }
        Ok(())
    }

    /// Builds a `[1, C, H, W]` tensor for one checked sample, resized to `shape`.
    fn fit_sample<B: Backend>(
        sample: &ImageSample,
        shape: InputShape,
        device: &B::Device,
    ) -> Tensor<B, 4> {
        let data = TensorData::new(sample.image_chw.clone(), sample.shape().batch_dims(1));
        let image = Tensor::<B, 4>::from_data(data, device);
        if sample.height == shape.height && sample.width == shape.width {
            image
        } else {
            interpolate(
                image,
                [shape.height, shape.width],
                InterpolateOptions::new(InterpolateMode::Nearest),
            )
        }
    }
}

impl BatchTransform for SampleTransform {
    type Item = ImageSample;

    fn transform_batch<B: Backend>(
        &self,
        items: &[ImageSample],
        shape: InputShape,
        device: &B::Device,
    ) -> Result<Tensor<B, 4>> {
        shape.validate()?;
        if items.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }

        for (index, sample) in items.iter().enumerate() {
            self.check_sample(index, sample, shape)?;
        }
        let samples: Vec<Tensor<B, 4>> = items
            .iter()
            .map(|sample| Self::fit_sample::<B>(sample, shape, device))
            .collect();

        debug!(
            batch = items.len(),
            shape = %shape,
            resize = self.resize.name(),
            "Transformed batch"
        );

        Ok(Tensor::cat(samples, 0))
    }
}
