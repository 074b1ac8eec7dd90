//! Burn regression architectures and persistence for SteerNet.
//!
//! This crate describes convolutional regressors declaratively and builds
//! them as Burn modules.
//!
//! # Model Architectures
//!
//! - [`ArchitectureSpec`] - Serializable layer topology (conv stages, dense stages, head)
//! - [`ArchitectureKind`] - The built-in topologies (`simple`, `simple2`, `simple3`,
//!   `simple_mse`, `simple_good`, `nvidia`)
//! - [`ConvRegressor`] - The Burn module built from a spec
//!
//! # Persistence
//!
//! A saved model is `{stem}.json` (architecture) plus weights written by one of
//! Burn's recorders:
//! - Binary format (compact, fast) - `{stem}.bin`
//! - JSON format (human-readable, debuggable) - `{stem}.weights.json`
//!
//! # Backend Support
//!
//! Models are generic over Burn backends. Common choices:
//! - `burn-ndarray` - CPU inference/training (default)
//! - `burn-wgpu` - GPU inference/training
//!
//! # Example
//!
//! ```ignore
//! use steer_dataset::InputShape;
//! use steer_models::{ArchitectureKind, ConvRegressor};
//!
//! let spec = ArchitectureKind::Nvidia.spec(InputShape::new(66, 200, 3), 1);
//! let device = Default::default();
//! let model = ConvRegressor::<MyBackend>::new(&spec, &device)?;
//!
//! let input = Tensor::zeros([1, 3, 66, 200], &device);
//! let steering = model.forward(input);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod architecture;
mod checkpoint;
mod error;
mod regressor;
mod zoo;

// Re-export architecture descriptions
pub use architecture::{ArchitectureSpec, ConvStageSpec, DenseStageSpec, LossKind};
pub use zoo::ArchitectureKind;

// Re-export the network
pub use regressor::{ConvBlock, ConvRegressor, DenseBlock};

// Re-export persistence
pub use checkpoint::{
    CheckpointFormat, architecture_path, find_weights, load_architecture, load_weights,
    load_weights_file, save_architecture, save_weights,
};

// Re-export error types
pub use error::{ModelError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ArchitectureKind, ArchitectureSpec, CheckpointFormat, ConvRegressor, ConvStageSpec,
        DenseStageSpec, LossKind, ModelError, load_architecture, load_weights, save_architecture,
        save_weights,
    };
}
