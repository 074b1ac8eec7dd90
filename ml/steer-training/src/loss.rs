//! Regression losses and error metrics.

use burn::prelude::Backend;
use burn::tensor::Tensor;
use steer_dataset::Targets;
use steer_models::LossKind;

use crate::error::{Result, TrainingError};

/// Mean absolute error between two `[batch, outputs]` tensors.
pub fn mae_loss<B: Backend>(pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
    (pred - target).abs().mean()
}

/// Mean squared error between two `[batch, outputs]` tensors.
pub fn mse_loss<B: Backend>(pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
    (pred - target).powf_scalar(2.0).mean()
}

/// Computes the training loss an architecture was declared with.
///
/// # Returns
///
/// Scalar loss value (shape `[1]`).
pub fn regression_loss<B: Backend>(
    kind: LossKind,
    pred: Tensor<B, 2>,
    target: Tensor<B, 2>,
) -> Tensor<B, 1> {
    match kind {
        LossKind::Mae => mae_loss(pred, target),
        LossKind::Mse => mse_loss(pred, target),
    }
}

/// Mean absolute error over every value of two equally shaped tables.
///
/// # Errors
///
/// Returns `TrainingError::Dataset` if the tables differ in shape or are empty.
///
/// # Example
///
/// ```
/// use steer_dataset::Targets;
/// use steer_training::mean_absolute_error;
///
/// let pred = Targets::scalar(vec![1.0, 2.0]);
/// let truth = Targets::scalar(vec![1.5, 1.0]);
/// assert!((mean_absolute_error(&pred, &truth).unwrap() - 0.75).abs() < 1e-6);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_error(pred: &Targets, truth: &Targets) -> Result<f32> {
    check_same_shape(pred, truth)?;
    let total: f64 = pred
        .values()
        .iter()
        .zip(truth.values())
        .map(|(p, t)| f64::from((p - t).abs()))
        .sum();
    Ok((total / pred.values().len() as f64) as f32)
}

/// Mean absolute error of each output column.
///
/// # Errors
///
/// Returns `TrainingError::Dataset` if the tables differ in shape or are empty.
#[allow(clippy::cast_precision_loss)]
pub fn per_feature_mae(pred: &Targets, truth: &Targets) -> Result<Vec<f32>> {
    check_same_shape(pred, truth)?;
    let rows = pred.rows() as f64;
    let mut sums = vec![0.0_f64; pred.width()];
    for (i, (p, t)) in pred.values().iter().zip(truth.values()).enumerate() {
        sums[i % pred.width()] += f64::from((p - t).abs());
    }
    Ok(sums.into_iter().map(|s| (s / rows) as f32).collect())
}

fn check_same_shape(pred: &Targets, truth: &Targets) -> Result<()> {
    if pred.is_empty() || truth.is_empty() {
        return Err(TrainingError::dataset("cannot score an empty table"));
    }
    if pred.rows() != truth.rows() || pred.width() != truth.width() {
        return Err(TrainingError::dataset(format!(
            "prediction table is {}x{}, targets are {}x{}",
            pred.rows(),
            pred.width(),
            truth.rows(),
            truth.width()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn scalar(loss: Tensor<TestBackend, 1>) -> f32 {
        loss.into_scalar().elem()
    }

    #[test]
    fn mae_zero_for_identical() {
        let device = <TestBackend as Backend>::Device::default();
        let values = Tensor::<TestBackend, 2>::from_data([[0.1, 0.2], [0.3, 0.4]], &device);
        assert!(scalar(mae_loss(values.clone(), values)).abs() < 1e-6);
    }

    #[test]
    fn mae_and_mse_values() {
        let device = <TestBackend as Backend>::Device::default();
        let pred = Tensor::<TestBackend, 2>::from_data([[1.0], [3.0]], &device);
        let target = Tensor::<TestBackend, 2>::from_data([[0.0], [0.0]], &device);

        // |1| + |3| / 2 = 2, (1 + 9) / 2 = 5
        assert!((scalar(mae_loss(pred.clone(), target.clone())) - 2.0).abs() < 1e-6);
        assert!((scalar(mse_loss(pred, target)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn regression_loss_dispatches_on_kind() {
        let device = <TestBackend as Backend>::Device::default();
        let pred = Tensor::<TestBackend, 2>::from_data([[2.0]], &device);
        let target = Tensor::<TestBackend, 2>::from_data([[0.0]], &device);

        let mae = scalar(regression_loss(LossKind::Mae, pred.clone(), target.clone()));
        let mse = scalar(regression_loss(LossKind::Mse, pred, target));
        assert!((mae - 2.0).abs() < 1e-6);
        assert!((mse - 4.0).abs() < 1e-6);
    }

    #[test]
    fn host_mae_matches_tensor_mae() {
        let pred = Targets::new(vec![0.5, 1.0, -0.5, 2.0], 2).unwrap();
        let truth = Targets::new(vec![0.0, 1.0, 0.5, 0.0], 2).unwrap();

        // |0.5| + 0 + |1.0| + |2.0| = 3.5 over 4 values
        let mae = mean_absolute_error(&pred, &truth).unwrap();
        assert!((mae - 0.875).abs() < 1e-6);

        let device = <TestBackend as Backend>::Device::default();
        let tensor_mae = scalar(mae_loss(
            pred.to_tensor::<TestBackend>(&device),
            truth.to_tensor::<TestBackend>(&device),
        ));
        assert!((tensor_mae - mae).abs() < 1e-6);
    }

    #[test]
    fn per_feature_mae_splits_columns() {
        let pred = Targets::new(vec![0.5, 1.0, -0.5, 2.0], 2).unwrap();
        let truth = Targets::new(vec![0.0, 1.0, 0.5, 0.0], 2).unwrap();

        let per_feature = per_feature_mae(&pred, &truth).unwrap();
        assert_eq!(per_feature.len(), 2);
        assert!((per_feature[0] - 0.75).abs() < 1e-6);
        assert!((per_feature[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mae_rejects_mismatched_tables() {
        let pred = Targets::scalar(vec![1.0, 2.0]);
        let truth = Targets::scalar(vec![1.0]);
        assert!(mean_absolute_error(&pred, &truth).is_err());
        assert!(per_feature_mae(&Targets::zeros(0, 1), &Targets::zeros(0, 1)).is_err());
    }
}
