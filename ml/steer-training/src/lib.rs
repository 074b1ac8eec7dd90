//! Training lifecycle for SteerNet regression models.
//!
//! This crate wraps a [`steer_models::ConvRegressor`] in a [`RegressionModel`]
//! that owns the architecture description and Adam optimizer state, and runs
//! the batched training loop.
//!
//! # Training Components
//!
//! - [`TrainingConfig`] - Configuration for training runs (JSON loadable)
//! - [`RegressionModel`] - build / train / fit / predict / validate / save / load
//! - [`TrainingMetrics`] - Metrics collected during training
//!
//! # Loss Functions
//!
//! - [`regression_loss`] - MAE or MSE, as declared by the architecture
//! - [`mean_absolute_error`] / [`per_feature_mae`] - host-side validation metrics
//!
//! # Logging
//!
//! Progress, ETA, validation error and persistence are reported through
//! `tracing`. No subscriber is installed here; the embedding binary picks one.
//!
//! # Example
//!
//! ```ignore
//! use steer_dataset::{InputShape, ResizeMode, SampleTransform};
//! use steer_models::ArchitectureKind;
//! use steer_training::{RegressionModel, TrainBackend, TrainingConfig};
//!
//! let device = Default::default();
//! let mut model = RegressionModel::<TrainBackend>::build(
//!     ArchitectureKind::Nvidia,
//!     InputShape::new(66, 200, 3),
//!     1,
//!     &device,
//! )?;
//!
//! let transform = SampleTransform::new(ResizeMode::Stretch);
//! let config = TrainingConfig::new(10).with_batch_size(64);
//! let metrics = model.train(&transform, &frames, &angles, Some((&val_frames, &val_angles)), &config)?;
//! println!("{}", metrics.summary());
//!
//! model.save("runs/nvidia", true)?;
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod backend;
mod config;
mod error;
mod loss;
mod metrics;
mod model;
mod progress;

// Re-export backends
pub use backend::{BackendKind, InferBackend, TrainBackend, TrainDevice};

// Re-export configuration
pub use config::{LearningRateSchedule, OptimizerConfig, TrainingConfig};

// Re-export loss functions
pub use loss::{mae_loss, mean_absolute_error, mse_loss, per_feature_mae, regression_loss};

// Re-export metrics
pub use metrics::{EpochMetrics, TrainingMetrics};

// Re-export the model lifecycle
pub use model::{DEFAULT_PREDICT_BATCH_SIZE, RegressionModel};
pub use progress::{eta, format_secs, item_eta};

// Re-export error types
pub use error::{Result, TrainingError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        EpochMetrics, LearningRateSchedule, OptimizerConfig, RegressionModel, TrainBackend,
        TrainingConfig, TrainingError, TrainingMetrics,
    };
    pub use steer_dataset::prelude::*;
    pub use steer_models::prelude::*;
}
