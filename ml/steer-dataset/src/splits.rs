//! Train/validation splitting and seeded shuffling.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::targets::Targets;

/// Ratio for splitting datasets into train/validation sets.
///
/// The ratio specifies the proportion of data to use for training.
/// The remainder goes to validation.
///
/// # Example
///
/// ```
/// use steer_dataset::SplitRatio;
///
/// // 80% train, 20% validation
/// let ratio = SplitRatio::try_new(0.8).unwrap();
/// assert!((ratio.train_ratio() - 0.8).abs() < 1e-6);
/// assert!((ratio.val_ratio() - 0.2).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    train: f32,
}

impl SplitRatio {
    /// Creates a split ratio.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::InvalidSplitRatio` unless `train` is in `(0, 1)`.
    pub fn try_new(train: f32) -> Result<Self> {
        if train > 0.0 && train < 1.0 {
            Ok(Self { train })
        } else {
            Err(DatasetError::InvalidSplitRatio(train))
        }
    }

    /// Returns the training ratio.
    #[must_use]
    pub const fn train_ratio(&self) -> f32 {
        self.train
    }

    /// Returns the validation ratio.
    #[must_use]
    pub fn val_ratio(&self) -> f32 {
        1.0 - self.train
    }

    /// Computes the split point for a given dataset size.
    ///
    /// Both sides keep at least one item when `total >= 2`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn split_point(&self, total: usize) -> usize {
        if total < 2 {
            return total;
        }
        ((total as f32 * self.train).round() as usize).clamp(1, total - 1)
    }

    /// Common 80/20 split.
    pub const EIGHTY_TWENTY: Self = Self { train: 0.8 };

    /// Common 90/10 split.
    pub const NINETY_TEN: Self = Self { train: 0.9 };
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self::EIGHTY_TWENTY
    }
}

/// Returns `0..len` in a random order.
///
/// With a seed the order is reproducible across runs.
#[must_use]
pub fn shuffled_indices(len: usize, seed: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
    indices.shuffle(&mut rng);
    indices
}

/// Splits `0..len` into shuffled train and validation index sets.
///
/// # Example
///
/// ```
/// use steer_dataset::{split_indices, SplitRatio};
///
/// let (train, val) = split_indices(10, SplitRatio::EIGHTY_TWENTY, Some(42));
/// assert_eq!(train.len(), 8);
/// assert_eq!(val.len(), 2);
/// ```
#[must_use]
pub fn split_indices(len: usize, ratio: SplitRatio, seed: Option<u64>) -> (Vec<usize>, Vec<usize>) {
    let mut train = shuffled_indices(len, seed);
    let val = train.split_off(ratio.split_point(len));
    (train, val)
}

/// A dataset partition with its matching targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    /// Raw items.
    pub items: Vec<T>,
    /// One target row per item.
    pub targets: Targets,
}

/// Splits items and their targets into train and validation partitions.
///
/// # Errors
///
/// Returns `DatasetError::InvalidTargets` if the target table does not have
/// one row per item.
pub fn split_dataset<T: Clone>(
    items: &[T],
    targets: &Targets,
    ratio: SplitRatio,
    seed: Option<u64>,
) -> Result<(Split<T>, Split<T>)> {
    if targets.rows() != items.len() {
        return Err(DatasetError::invalid_targets(format!(
            "{} target rows for {} items",
            targets.rows(),
            items.len()
        )));
    }

    let (train_idx, val_idx) = split_indices(items.len(), ratio, seed);
    let gather = |indices: &[usize]| Split {
        items: indices.iter().map(|&i| items[i].clone()).collect(),
        targets: targets.select_rows(indices),
    };

    Ok((gather(&train_idx), gather(&val_idx)))
}
