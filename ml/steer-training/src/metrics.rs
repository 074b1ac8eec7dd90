//! Training metrics.

use serde::{Deserialize, Serialize};

/// Metrics for a single training epoch.
///
/// # Example
///
/// ```
/// use steer_training::EpochMetrics;
///
/// let metrics = EpochMetrics::new(0, 0.5, Some(0.4));
/// assert_eq!(metrics.epoch, 0);
/// assert!((metrics.train_loss - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (0-indexed).
    pub epoch: usize,

    /// Mean training loss over the batches trained this epoch.
    pub train_loss: f32,

    /// Validation mean absolute error (if validation data was given).
    pub val_mae: Option<f32>,

    /// Learning rate used.
    pub learning_rate: f64,

    /// Training time in seconds.
    pub train_time_secs: f32,

    /// Validation time in seconds.
    pub val_time_secs: Option<f32>,

    /// Estimated seconds left in the run after this epoch.
    pub eta_secs: f32,

    /// Number of optimizer steps taken.
    pub batches: usize,

    /// Number of training samples processed.
    pub train_samples: usize,
}

impl EpochMetrics {
    /// Creates new epoch metrics.
    #[must_use]
    pub const fn new(epoch: usize, train_loss: f32, val_mae: Option<f32>) -> Self {
        Self {
            epoch,
            train_loss,
            val_mae,
            learning_rate: 0.0,
            train_time_secs: 0.0,
            val_time_secs: None,
            eta_secs: 0.0,
            batches: 0,
            train_samples: 0,
        }
    }

    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the training time.
    #[must_use]
    pub const fn with_train_time(mut self, secs: f32) -> Self {
        self.train_time_secs = secs;
        self
    }

    /// Sets the validation time.
    #[must_use]
    pub const fn with_val_time(mut self, secs: f32) -> Self {
        self.val_time_secs = Some(secs);
        self
    }

    /// Sets the remaining-time estimate.
    #[must_use]
    pub const fn with_eta(mut self, secs: f32) -> Self {
        self.eta_secs = secs;
        self
    }

    /// Sets batch and sample counts.
    #[must_use]
    pub const fn with_batches(mut self, batches: usize, samples: usize) -> Self {
        self.batches = batches;
        self.train_samples = samples;
        self
    }

    /// Returns total time (train + val) in seconds.
    #[must_use]
    pub fn total_time_secs(&self) -> f32 {
        self.train_time_secs + self.val_time_secs.unwrap_or(0.0)
    }
}

/// Aggregate metrics for a training run.
///
/// # Example
///
/// ```
/// use steer_training::{EpochMetrics, TrainingMetrics};
///
/// let mut metrics = TrainingMetrics::new();
/// metrics.add_epoch(EpochMetrics::new(0, 0.5, Some(0.4)));
/// metrics.add_epoch(EpochMetrics::new(1, 0.3, Some(0.35)));
///
/// assert_eq!(metrics.epochs_completed(), 2);
/// assert!((metrics.final_loss() - 0.3).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Metrics for each epoch.
    pub epoch_metrics: Vec<EpochMetrics>,

    /// Best validation MAE seen.
    pub best_val_mae: Option<f32>,

    /// Epoch with best validation MAE.
    pub best_epoch: Option<usize>,

    /// Total training time in seconds.
    pub total_time_secs: f32,
}

impl TrainingMetrics {
    /// Creates new empty training metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metrics for an epoch.
    pub fn add_epoch(&mut self, metrics: EpochMetrics) {
        if let Some(val_mae) = metrics.val_mae {
            if self.best_val_mae.map_or(true, |best| val_mae < best) {
                self.best_val_mae = Some(val_mae);
                self.best_epoch = Some(metrics.epoch);
            }
        }

        self.total_time_secs += metrics.total_time_secs();
        self.epoch_metrics.push(metrics);
    }

    /// Returns the number of completed epochs.
    #[must_use]
    pub fn epochs_completed(&self) -> usize {
        self.epoch_metrics.len()
    }

    /// Returns the final training loss.
    #[must_use]
    pub fn final_loss(&self) -> f32 {
        self.epoch_metrics.last().map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the final validation MAE.
    #[must_use]
    pub fn final_val_mae(&self) -> Option<f32> {
        self.epoch_metrics.last().and_then(|m| m.val_mae)
    }

    /// Returns the initial training loss.
    #[must_use]
    pub fn initial_loss(&self) -> f32 {
        self.epoch_metrics
            .first()
            .map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the loss improvement ratio.
    #[must_use]
    pub fn loss_improvement(&self) -> f32 {
        let initial = self.initial_loss();
        let final_loss = self.final_loss();
        if initial > 0.0 && !initial.is_nan() && !final_loss.is_nan() {
            1.0 - (final_loss / initial)
        } else {
            0.0
        }
    }

    /// Returns training losses as a vector.
    #[must_use]
    pub fn train_losses(&self) -> Vec<f32> {
        self.epoch_metrics.iter().map(|m| m.train_loss).collect()
    }

    /// Returns validation MAEs as a vector.
    #[must_use]
    pub fn val_maes(&self) -> Vec<Option<f32>> {
        self.epoch_metrics.iter().map(|m| m.val_mae).collect()
    }

    /// Returns learning rates as a vector.
    #[must_use]
    pub fn learning_rates(&self) -> Vec<f64> {
        self.epoch_metrics.iter().map(|m| m.learning_rate).collect()
    }

    /// Returns a human-readable summary.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let _ = writeln!(s, "Training Summary");
        let _ = writeln!(s, "================");
        let _ = writeln!(s, "Epochs completed: {}", self.epochs_completed());
        let _ = writeln!(s, "Total time: {:.1}s", self.total_time_secs);
        let _ = writeln!(
            s,
            "Initial loss: {:.4} -> Final loss: {:.4}",
            self.initial_loss(),
            self.final_loss()
        );
        let _ = writeln!(s, "Improvement: {:.1}%", self.loss_improvement() * 100.0);

        if let Some(best) = self.best_val_mae {
            let _ = writeln!(
                s,
                "Best val MAE: {:.4} (epoch {})",
                best,
                self.best_epoch.unwrap_or(0)
            );
        }

        s
    }
}
