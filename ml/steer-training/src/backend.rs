//! Backend aliases for training and inference.
//!
//! CPU (`burn-ndarray`) by default; the `wgpu` feature switches both aliases
//! to `burn-wgpu`.

use burn::backend::Autodiff;

/// Backend used for inference.
#[cfg(feature = "wgpu")]
pub type InferBackend = burn_wgpu::Wgpu<f32>;
/// Backend used for inference.
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn_ndarray::NdArray<f32>;

/// Autodiff backend used for training.
pub type TrainBackend = Autodiff<InferBackend>;

/// Device of [`TrainBackend`].
pub type TrainDevice = <TrainBackend as burn::prelude::Backend>::Device;

/// Backend selected at compile time.
///
/// # Example
///
/// ```
/// use steer_training::BackendKind;
///
/// println!("training on {}", BackendKind::compiled());
/// assert_eq!(BackendKind::NdArray.name(), "ndarray");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// CPU backend using ndarray.
    #[default]
    NdArray,

    /// GPU backend using WGPU.
    ///
    /// Requires the `wgpu` feature and compatible GPU hardware.
    Wgpu,
}

impl BackendKind {
    /// Returns the backend the aliases in this module resolve to.
    #[must_use]
    pub const fn compiled() -> Self {
        if cfg!(feature = "wgpu") {
            Self::Wgpu
        } else {
            Self::NdArray
        }
    }

    /// Returns `true` if this is a GPU backend.
    #[must_use]
    pub const fn is_gpu(&self) -> bool {
        matches!(self, Self::Wgpu)
    }

    /// Returns the backend name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NdArray => "ndarray",
            Self::Wgpu => "wgpu",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_default_is_cpu() {
        assert_eq!(BackendKind::default(), BackendKind::NdArray);
        assert!(!BackendKind::NdArray.is_gpu());
        assert!(BackendKind::Wgpu.is_gpu());
    }

    #[cfg(not(feature = "wgpu"))]
    #[test]
    fn compiled_backend_without_features() {
        assert_eq!(BackendKind::compiled(), BackendKind::NdArray);
        assert_eq!(BackendKind::compiled().to_string(), "ndarray");
    }
}
