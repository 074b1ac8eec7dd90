//! End-to-end lifecycle tests for SteerNet regression models.
//!
//! Organized by stage:
//!
//! - Training: `train` / `fit` on small synthetic frames
//! - Persistence: `save` / `load` / `from_file`, including the fresh-weights fallback
//! - Configuration: run configs loaded from JSON

// Allow test-specific patterns
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::cast_precision_loss)]

use approx::assert_relative_eq;
use steer_dataset::{
    ImageSample, InputShape, ResizeMode, SampleTransform, SplitRatio, Targets, split_dataset,
};
use steer_models::{ArchitectureKind, CheckpointFormat, LossKind};
use steer_training::{
    OptimizerConfig, RegressionModel, TrainBackend, TrainingConfig, TrainingError,
    per_feature_mae,
};

const SHAPE: InputShape = InputShape::new(12, 12, 1);

/// Frames of uniform brightness; the target is the brightness itself.
fn brightness_dataset(n: usize) -> (Vec<ImageSample>, Targets) {
    let levels: Vec<f32> = (0..n).map(|i| (i as f32 + 0.5) / n as f32).collect();
    let frames = levels
        .iter()
        .map(|&b| ImageSample::new(vec![b; SHAPE.numel()], 12, 12, 1))
        .collect();
    (frames, Targets::scalar(levels))
}

fn model(kind: ArchitectureKind, outputs: usize) -> RegressionModel<TrainBackend> {
    RegressionModel::build(kind, SHAPE, outputs, &Default::default()).unwrap()
}

fn transform() -> SampleTransform {
    SampleTransform::new(ResizeMode::None)
}

fn stem_in(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).display().to_string()
}

fn assert_same_predictions(a: &Targets, b: &Targets) {
    assert_eq!(a.rows(), b.rows());
    assert_eq!(a.width(), b.width());
    for (x, y) in a.values().iter().zip(b.values()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-5);
    }
}

// =============================================================================
// Training
// =============================================================================

mod training {
    use super::*;

    #[test]
    fn training_reduces_loss() {
        let (frames, targets) = brightness_dataset(8);
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let config = TrainingConfig::new(25)
            .with_batch_size(4)
            .with_optimizer(OptimizerConfig::adam(1e-3));

        let metrics = model
            .train(&transform(), &frames, &targets, None, &config)
            .unwrap();

        assert_eq!(metrics.epochs_completed(), 25);
        assert!(metrics.train_losses().iter().all(|l| l.is_finite()));
        assert!(
            metrics.final_loss() < metrics.initial_loss(),
            "loss went from {} to {}",
            metrics.initial_loss(),
            metrics.final_loss()
        );
    }

    #[test]
    fn validation_mae_tracked_every_epoch() {
        let (frames, targets) = brightness_dataset(10);
        let (train, val) =
            split_dataset(&frames, &targets, SplitRatio::EIGHTY_TWENTY, Some(3)).unwrap();
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let config = TrainingConfig::new(3).with_batch_size(4).with_shuffle(11);

        let metrics = model
            .train(
                &transform(),
                &train.items,
                &train.targets,
                Some((&val.items, &val.targets)),
                &config,
            )
            .unwrap();

        assert!(metrics.val_maes().iter().all(Option::is_some));
        assert!(metrics.best_val_mae.is_some());
        assert!(metrics.best_epoch.is_some());

        let last = metrics.final_val_mae().unwrap();
        let check = model
            .validate(&transform(), &val.items, &val.targets, false)
            .unwrap();
        assert_relative_eq!(last, check, epsilon = 1e-5);
    }

    #[test]
    fn mismatched_validation_targets_leave_model_untouched() {
        let (frames, targets) = brightness_dataset(6);
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let before = model.predict_raw(&transform(), &frames, 10, false).unwrap();

        let result = model.train(
            &transform(),
            &frames,
            &targets,
            Some((&frames[..2], &targets)),
            &TrainingConfig::new(1).with_batch_size(2),
        );
        assert!(matches!(result, Err(TrainingError::Dataset(_))));

        let after = model.predict_raw(&transform(), &frames, 10, false).unwrap();
        assert_same_predictions(&before, &after);
    }

    #[test]
    fn empty_validation_set_leaves_model_untouched() {
        let (frames, targets) = brightness_dataset(6);
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let before = model.predict_raw(&transform(), &frames, 10, false).unwrap();

        let result = model.train(
            &transform(),
            &frames,
            &targets,
            Some((&frames[..0], &Targets::zeros(0, 1))),
            &TrainingConfig::new(3).with_batch_size(2),
        );
        assert!(matches!(result, Err(TrainingError::Dataset(_))));

        let after = model.predict_raw(&transform(), &frames, 10, false).unwrap();
        assert_same_predictions(&before, &after);
    }

    #[test]
    fn multi_output_regression() {
        let (frames, levels) = brightness_dataset(6);
        let rows: Vec<Vec<f32>> = levels.values().iter().map(|&b| vec![b, 1.0 - b]).collect();
        let targets = Targets::from_rows(&rows).unwrap();
        let mut model = model(ArchitectureKind::SimpleMse, 2);

        model
            .train(
                &transform(),
                &frames,
                &targets,
                None,
                &TrainingConfig::new(2).with_batch_size(3),
            )
            .unwrap();

        let predictions = model.predict_raw(&transform(), &frames, 4, false).unwrap();
        assert_eq!(predictions.rows(), 6);
        assert_eq!(predictions.width(), 2);
        assert_eq!(per_feature_mae(&predictions, &targets).unwrap().len(), 2);
    }

    #[test]
    fn fit_on_transformed_tensors() {
        use steer_dataset::BatchTransform;

        let (frames, targets) = brightness_dataset(6);
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let device = model.device().clone();
        let inputs = transform()
            .transform_batch::<TrainBackend>(&frames, SHAPE, &device)
            .unwrap();

        let metrics = model
            .fit(
                inputs,
                targets.to_tensor::<TrainBackend>(&device),
                &TrainingConfig::new(2).with_batch_size(4),
            )
            .unwrap();

        assert_eq!(metrics.epochs_completed(), 2);
        assert_eq!(metrics.epoch_metrics[0].batches, 2);
    }
}

// =============================================================================
// Persistence
// =============================================================================

mod persistence {
    use super::*;

    #[test]
    fn save_then_from_file_restores_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "steer");
        let (frames, targets) = brightness_dataset(6);

        let mut model = model(ArchitectureKind::Simple, 1);
        model
            .train(
                &transform(),
                &frames,
                &targets,
                None,
                &TrainingConfig::new(1).with_batch_size(3),
            )
            .unwrap();
        model.save(&stem, true).unwrap();

        assert!(dir.path().join("steer.json").exists());
        assert!(dir.path().join("steer.bin").exists());

        let restored = RegressionModel::<TrainBackend>::from_file(&stem, &Default::default())
            .unwrap();
        assert_eq!(restored.spec(), model.spec());

        let expected = model.predict_raw(&transform(), &frames, 10, false).unwrap();
        let actual = restored.predict_raw(&transform(), &frames, 10, false).unwrap();
        assert_same_predictions(&expected, &actual);
    }

    #[test]
    fn json_weights_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "readable");
        let (frames, _) = brightness_dataset(4);

        let model = model(ArchitectureKind::SimpleGood, 1);
        model
            .save_with_format(&stem, CheckpointFormat::Json, true)
            .unwrap();
        assert!(dir.path().join("readable.weights.json").exists());

        let restored = RegressionModel::<TrainBackend>::from_file(&stem, &Default::default())
            .unwrap();
        let expected = model.predict_raw(&transform(), &frames, 10, false).unwrap();
        let actual = restored.predict_raw(&transform(), &frames, 10, false).unwrap();
        assert_same_predictions(&expected, &actual);
    }

    #[test]
    fn load_replaces_weights() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "donor");
        let (frames, _) = brightness_dataset(4);

        let donor = model(ArchitectureKind::SimpleGood, 1);
        donor.save(&stem, true).unwrap();

        let mut receiver = model(ArchitectureKind::SimpleGood, 1);
        receiver.load(&stem).unwrap();

        let expected = donor.predict_raw(&transform(), &frames, 10, false).unwrap();
        let actual = receiver.predict_raw(&transform(), &frames, 10, false).unwrap();
        assert_same_predictions(&expected, &actual);
    }

    #[test]
    fn load_missing_weights_keeps_model() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, _) = brightness_dataset(4);
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let before = model.predict_raw(&transform(), &frames, 10, false).unwrap();

        let result = model.load(&stem_in(&dir, "absent"));
        assert!(matches!(result, Err(TrainingError::Checkpoint(_))));

        let after = model.predict_raw(&transform(), &frames, 10, false).unwrap();
        assert_same_predictions(&before, &after);
    }

    #[test]
    fn from_file_without_weights_falls_back_and_trains() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "arch_only");
        let (frames, targets) = brightness_dataset(4);

        model(ArchitectureKind::SimpleGood, 1)
            .save(&stem, false)
            .unwrap();
        assert!(dir.path().join("arch_only.json").exists());
        assert!(!dir.path().join("arch_only.bin").exists());

        let mut restored = RegressionModel::<TrainBackend>::from_file(&stem, &Default::default())
            .unwrap();
        assert_eq!(restored.input_shape(), SHAPE);
        assert_eq!(restored.output_length(), 1);

        let metrics = restored
            .train(
                &transform(),
                &frames,
                &targets,
                None,
                &TrainingConfig::new(1).with_batch_size(2),
            )
            .unwrap();
        assert!(metrics.final_loss().is_finite());
    }

    #[test]
    fn from_file_fallback_trains_with_mae() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "mse_arch");

        let original = model(ArchitectureKind::SimpleMse, 1);
        assert_eq!(original.loss(), LossKind::Mse);
        original.save(&stem, false).unwrap();

        let restored = RegressionModel::<TrainBackend>::from_file(&stem, &Default::default())
            .unwrap();
        assert_eq!(restored.loss(), LossKind::Mae);
    }

    #[test]
    fn from_file_with_weights_keeps_stored_loss() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "mse_full");

        model(ArchitectureKind::SimpleMse, 1).save(&stem, true).unwrap();

        let restored = RegressionModel::<TrainBackend>::from_file(&stem, &Default::default())
            .unwrap();
        assert_eq!(restored.loss(), LossKind::Mse);
    }

    #[test]
    fn from_file_without_architecture_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            RegressionModel::<TrainBackend>::from_file(&stem_in(&dir, "nothing"), &Default::default());
        assert!(matches!(result, Err(TrainingError::Checkpoint(_))));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn run_config_from_json_file_drives_training() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{
                "epochs": 2,
                "batch_size": 3,
                "optimizer": { "learning_rate": 0.0005 },
                "lr_schedule": { "Step": { "factor": 0.5, "step_size": 1 } }
            }"#,
        )
        .unwrap();

        let config = TrainingConfig::from_json_file(&path).unwrap();
        let (frames, targets) = brightness_dataset(6);
        let mut model = model(ArchitectureKind::SimpleGood, 1);
        let metrics = model
            .train(&transform(), &frames, &targets, None, &config)
            .unwrap();

        let rates = metrics.learning_rates();
        assert_relative_eq!(rates[0], 5e-4, epsilon = 1e-12);
        assert_relative_eq!(rates[1], 2.5e-4, epsilon = 1e-12);
    }
}
