//! Regression data plumbing for SteerNet.
//!
//! This crate sits between stored training data and the networks in
//! `steer-models`:
//!
//! - [`InputShape`] - Image geometry a network expects
//! - [`ImageSample`] - Decoded image in CHW layout
//! - [`Targets`] - Row-major regression targets (and predictions)
//! - [`BatchTransform`] - Turns raw batch items into `[N, C, H, W]` tensors
//! - [`SampleTransform`] - In-memory `BatchTransform` for [`ImageSample`]s
//! - [`split_dataset`] - Seeded train/validation split
//!
//! # Example
//!
//! ```
//! use steer_dataset::{split_dataset, ImageSample, SplitRatio, Targets};
//!
//! let samples: Vec<ImageSample> = (0..4)
//!     .map(|_| ImageSample::new(vec![0.5; 3 * 8 * 8], 8, 8, 3))
//!     .collect();
//! let targets = Targets::scalar(vec![0.1, -0.2, 0.0, 0.3]);
//!
//! let ratio = SplitRatio::try_new(0.75).unwrap();
//! let (train, val) = split_dataset(&samples, &targets, ratio, Some(42)).unwrap();
//!
//! assert_eq!(train.items.len(), 3);
//! assert_eq!(val.items.len(), 1);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod sample;
mod shape;
mod splits;
mod targets;
mod transform;

pub use sample::{ImageSample, ResizeMode};
pub use shape::InputShape;
pub use splits::{Split, SplitRatio, shuffled_indices, split_dataset, split_indices};
pub use targets::Targets;
pub use transform::{BatchTransform, SampleTransform};

pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        BatchTransform, DatasetError, ImageSample, InputShape, ResizeMode, SampleTransform, Split,
        SplitRatio, Targets, shuffled_indices, split_dataset, split_indices,
    };
}
