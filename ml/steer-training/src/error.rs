//! Error types for steer-training crate.

use thiserror::Error;

/// Errors that can occur during training, evaluation or persistence.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Invalid training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset error.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Model error.
    #[error("model error: {0}")]
    Model(String),

    /// Checkpoint error.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Numerical instability detected.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl TrainingError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a dataset error.
    #[must_use]
    pub fn dataset(reason: impl Into<String>) -> Self {
        Self::Dataset(reason.into())
    }

    /// Creates a model error.
    #[must_use]
    pub fn model(reason: impl Into<String>) -> Self {
        Self::Model(reason.into())
    }

    /// Creates a checkpoint error.
    #[must_use]
    pub fn checkpoint(reason: impl Into<String>) -> Self {
        Self::Checkpoint(reason.into())
    }

    /// Creates a numerical instability error.
    #[must_use]
    pub fn numerical_instability(reason: impl Into<String>) -> Self {
        Self::NumericalInstability(reason.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TrainingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<steer_dataset::DatasetError> for TrainingError {
    fn from(err: steer_dataset::DatasetError) -> Self {
        Self::Dataset(err.to_string())
    }
}

impl From<steer_models::ModelError> for TrainingError {
    fn from(err: steer_models::ModelError) -> Self {
        use steer_models::ModelError;

        match err {
            ModelError::LoadCheckpoint { .. }
            | ModelError::SaveCheckpoint { .. }
            | ModelError::CheckpointNotFound(_)
            | ModelError::UnsupportedFormat(_) => Self::Checkpoint(err.to_string()),
            other => Self::Model(other.to_string()),
        }
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_config() {
        let err = TrainingError::invalid_config("batch size must be > 0");
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("batch size"));
    }

    #[test]
    fn error_dataset() {
        let err = TrainingError::dataset("empty dataset");
        assert!(err.to_string().contains("dataset error"));
    }

    #[test]
    fn error_numerical_instability() {
        let err = TrainingError::numerical_instability("loss is NaN");
        assert!(err.to_string().contains("numerical instability"));
    }

    #[test]
    fn error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: TrainingError = io_err.into();
        assert!(matches!(err, TrainingError::Io(_)));
    }

    #[test]
    fn error_from_model_error_splits_checkpoint_failures() {
        let err: TrainingError = steer_models::ModelError::checkpoint_not_found("m.bin").into();
        assert!(matches!(err, TrainingError::Checkpoint(_)));

        let err: TrainingError = steer_models::ModelError::invalid_config("bad").into();
        assert!(matches!(err, TrainingError::Model(_)));
    }

    #[test]
    fn error_from_dataset_error() {
        let err: TrainingError = steer_dataset::DatasetError::EmptyDataset.into();
        assert!(matches!(err, TrainingError::Dataset(_)));
    }
}
