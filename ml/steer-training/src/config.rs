//! Training configuration.

use std::path::Path;

use burn::optim::AdamConfig;
use burn::optim::decay::WeightDecayConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainingError};

/// Configuration for a training run.
///
/// # Example
///
/// ```
/// use steer_training::TrainingConfig;
///
/// let config = TrainingConfig::default();
/// assert_eq!(config.epochs, 1);
/// assert_eq!(config.batch_size, 64);
/// assert_eq!(config.predict_batch_size, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training epochs.
    pub epochs: usize,

    /// Batch size for optimizer steps.
    pub batch_size: usize,

    /// Batch size for prediction and validation.
    pub predict_batch_size: usize,

    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,

    /// Learning rate schedule.
    pub lr_schedule: LearningRateSchedule,

    /// Whether to visit samples in a new random order each epoch.
    pub shuffle: bool,

    /// Random seed for shuffling.
    pub seed: Option<u64>,

    /// Log per-batch prediction progress and per-feature validation error.
    pub verbose: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

impl TrainingConfig {
    /// Creates a new training config with the given epochs.
    #[must_use]
    pub const fn new(epochs: usize) -> Self {
        Self {
            epochs,
            batch_size: 64,
            predict_batch_size: 10,
            optimizer: OptimizerConfig::adam(1e-3),
            lr_schedule: LearningRateSchedule::Constant,
            shuffle: false,
            seed: None,
            verbose: false,
        }
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the prediction batch size.
    #[must_use]
    pub const fn with_predict_batch_size(mut self, batch_size: usize) -> Self {
        self.predict_batch_size = batch_size;
        self
    }

    /// Sets the optimizer.
    #[must_use]
    pub const fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Sets the learning rate schedule.
    #[must_use]
    pub const fn with_lr_schedule(mut self, schedule: LearningRateSchedule) -> Self {
        self.lr_schedule = schedule;
        self
    }

    /// Enables per-epoch shuffling with a fixed seed.
    #[must_use]
    pub const fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = Some(seed);
        self
    }

    /// Enables verbose progress logging.
    #[must_use]
    pub const fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Returns `true` if all values are valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(TrainingError::invalid_config("epochs must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(TrainingError::invalid_config("batch_size must be > 0"));
        }
        if self.predict_batch_size == 0 {
            return Err(TrainingError::invalid_config("predict_batch_size must be > 0"));
        }
        if !self.optimizer.is_valid() {
            return Err(TrainingError::invalid_config(format!(
                "invalid optimizer settings: {:?}",
                self.optimizer
            )));
        }
        if !self.lr_schedule.is_valid() {
            return Err(TrainingError::invalid_config(format!(
                "invalid learning rate schedule: {:?}",
                self.lr_schedule
            )));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Io` if the file cannot be read or parsed and
    /// `TrainingError::InvalidConfig` if the values are unusable.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Io` on failure.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Adam optimizer configuration.
///
/// Defaults follow the common Adam settings (`beta1 = 0.9`, `beta2 = 0.999`).
///
/// # Example
///
/// ```
/// use steer_training::OptimizerConfig;
///
/// let adam = OptimizerConfig::adam(1e-3);
/// assert_eq!(adam.learning_rate, 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Base learning rate.
    pub learning_rate: f64,

    /// Weight decay (L2 penalty, 0.0 = disabled).
    pub weight_decay: f32,

    /// Beta1 (first moment decay).
    pub beta1: f32,

    /// Beta2 (second moment decay).
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(1e-3)
    }
}

impl OptimizerConfig {
    /// Creates an Adam optimizer config.
    #[must_use]
    pub const fn adam(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            weight_decay: 0.0,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }

    /// Sets weight decay.
    #[must_use]
    pub const fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.learning_rate > 0.0
            && self.weight_decay >= 0.0
            && (0.0..1.0).contains(&self.beta1)
            && (0.0..1.0).contains(&self.beta2)
            && self.epsilon > 0.0
    }

    /// Builds the Burn optimizer config.
    #[must_use]
    pub fn to_adam(&self) -> AdamConfig {
        let config = AdamConfig::new()
            .with_beta_1(self.beta1)
            .with_beta_2(self.beta2)
            .with_epsilon(self.epsilon);

        if self.weight_decay > 0.0 {
            config.with_weight_decay(Some(WeightDecayConfig::new(self.weight_decay)))
        } else {
            config
        }
    }
}

/// Learning rate schedule.
///
/// # Example
///
/// ```
/// use steer_training::LearningRateSchedule;
///
/// let schedule = LearningRateSchedule::step(0.1, 30);
/// assert!((schedule.compute_lr(1.0, 30) - 0.1).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LearningRateSchedule {
    /// Constant learning rate.
    #[default]
    Constant,

    /// Step decay: multiply by factor every `step_size` epochs.
    Step {
        /// Decay factor.
        factor: f64,
        /// Epochs between decays.
        step_size: usize,
    },

    /// Exponential decay: lr * gamma^epoch.
    Exponential {
        /// Decay rate per epoch.
        gamma: f64,
    },
}

impl LearningRateSchedule {
    /// Creates a step decay schedule.
    #[must_use]
    pub const fn step(factor: f64, step_size: usize) -> Self {
        Self::Step { factor, step_size }
    }

    /// Creates an exponential decay schedule.
    #[must_use]
    pub const fn exponential(gamma: f64) -> Self {
        Self::Exponential { gamma }
    }

    /// Returns `true` if the schedule parameters are usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Constant => true,
            Self::Step { factor, step_size } => *factor > 0.0 && *step_size > 0,
            Self::Exponential { gamma } => *gamma > 0.0,
        }
    }

    /// Computes the learning rate for a given epoch (0-indexed).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn compute_lr(&self, base_lr: f64, epoch: usize) -> f64 {
        match self {
            Self::Constant => base_lr,
            Self::Step { factor, step_size } => {
                let decays = epoch / (*step_size).max(1);
                base_lr * factor.powi(decays as i32)
            }
            Self::Exponential { gamma } => base_lr * gamma.powi(epoch as i32),
        }
    }
}
