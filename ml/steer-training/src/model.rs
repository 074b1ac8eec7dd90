//! The regression model lifecycle: build, train, predict, validate, persist.

use std::ops::Range;
use std::time::Instant;

use burn::module::{AutodiffModule, Module};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, GradientsParams, Optimizer};
use burn::prelude::Backend;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Int, Tensor, TensorData};
use steer_dataset::{BatchTransform, InputShape, Targets, shuffled_indices};
use steer_models::{
    ArchitectureKind, ArchitectureSpec, CheckpointFormat, ConvRegressor, LossKind,
    load_architecture, load_weights, save_architecture,
};
use tracing::{debug, info, warn};

use crate::config::{OptimizerConfig, TrainingConfig};
use crate::error::{Result, TrainingError};
use crate::loss::{mean_absolute_error, per_feature_mae, regression_loss};
use crate::metrics::{EpochMetrics, TrainingMetrics};
use crate::progress::{eta, format_secs, item_eta};

/// Prediction batch size used by [`RegressionModel::validate`].
pub const DEFAULT_PREDICT_BATCH_SIZE: usize = 10;

/// A convolutional steering regressor together with its architecture and
/// optimizer state.
///
/// Training runs on the autodiff backend `B`; prediction and validation run
/// on `B::InnerBackend` with dropout disabled.
///
/// # Example
///
/// ```
/// use steer_dataset::{ImageSample, InputShape, ResizeMode, SampleTransform};
/// use steer_models::ArchitectureKind;
/// use steer_training::{RegressionModel, TrainBackend};
///
/// let device = Default::default();
/// let model = RegressionModel::<TrainBackend>::build(
///     ArchitectureKind::SimpleGood,
///     InputShape::new(16, 16, 3),
///     1,
///     &device,
/// )
/// .unwrap();
///
/// let frames = vec![ImageSample::new(vec![0.5; 3 * 20 * 20], 20, 20, 3); 3];
/// let transform = SampleTransform::new(ResizeMode::Stretch);
/// let steering = model.predict_raw(&transform, &frames, 2, false).unwrap();
/// assert_eq!(steering.rows(), 3);
/// ```
pub struct RegressionModel<B: AutodiffBackend> {
    network: ConvRegressor<B>,
    spec: ArchitectureSpec,
    optimizer: OptimizerAdaptor<Adam, ConvRegressor<B>, B>,
    optimizer_config: OptimizerConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> RegressionModel<B> {
    /// Builds a freshly initialized model of a built-in architecture.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Model` if the input shape is too small for the
    /// architecture or `output_length` is zero.
    pub fn build(
        kind: ArchitectureKind,
        input_shape: InputShape,
        output_length: usize,
        device: &B::Device,
    ) -> Result<Self> {
        if kind == ArchitectureKind::Nvidia {
            info!("NVIDIA model used");
        }
        Self::from_spec(kind.spec(input_shape, output_length), device)
    }

    /// Builds a freshly initialized model from an architecture description.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Model` if the description does not validate.
    pub fn from_spec(spec: ArchitectureSpec, device: &B::Device) -> Result<Self> {
        let network = ConvRegressor::new(&spec, device)?;
        let optimizer_config = OptimizerConfig::default();

        info!(
            architecture = %spec.name,
            input = %spec.input_shape,
            outputs = spec.output_length,
            loss = %spec.loss,
            parameters = network.num_params(),
            "Built regression model"
        );

        Ok(Self {
            network,
            spec,
            optimizer: optimizer_config.to_adam().init(),
            optimizer_config,
            device: device.clone(),
        })
    }

    /// Rebuilds a model saved with [`save`](Self::save).
    ///
    /// The architecture is read from `{stem}.json`. If the weights next to it
    /// are missing or do not fit the architecture, the freshly initialized
    /// network is kept, a warning is logged and the model is set up to train
    /// from scratch with MAE loss and default Adam settings.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Checkpoint` if `{stem}.json` does not exist and
    /// `TrainingError::Model` if it does not describe a valid network.
    pub fn from_file(stem: &str, device: &B::Device) -> Result<Self> {
        let spec = load_architecture(stem)?;
        let mut model = Self::from_spec(spec, device)?;

        match load_weights::<B, _>(model.network.clone(), stem, device) {
            Ok(network) => {
                model.network = network;
                model.reset_optimizer();
                info!(stem, "Loaded model from disk");
            }
            Err(err) => {
                warn!(
                    stem,
                    error = %err,
                    "Could not load weights, continuing with a freshly initialized network"
                );
                if model.spec.loss != LossKind::Mae {
                    info!(stem, stored = %model.spec.loss, "Falling back to mae loss");
                    model.spec.loss = LossKind::Mae;
                }
            }
        }

        Ok(model)
    }

    /// Returns the network.
    #[must_use]
    pub const fn network(&self) -> &ConvRegressor<B> {
        &self.network
    }

    /// Returns the architecture description.
    #[must_use]
    pub const fn spec(&self) -> &ArchitectureSpec {
        &self.spec
    }

    /// Returns the expected input geometry.
    #[must_use]
    pub const fn input_shape(&self) -> InputShape {
        self.spec.input_shape
    }

    /// Returns the number of regression outputs.
    #[must_use]
    pub const fn output_length(&self) -> usize {
        self.spec.output_length
    }

    /// Returns the training loss.
    #[must_use]
    pub const fn loss(&self) -> LossKind {
        self.spec.loss
    }

    /// Returns the device the model lives on.
    #[must_use]
    pub const fn device(&self) -> &B::Device {
        &self.device
    }

    /// Trains over raw items, transforming one batch at a time.
    ///
    /// Every epoch walks the items in windows of `config.batch_size` (in a
    /// fresh random order when `config.shuffle` is set), takes one optimizer
    /// step per window and logs the mean loss, the epoch time and the time
    /// left. With `validation`, the validation MAE is computed after every
    /// epoch.
    ///
    /// # Errors
    ///
    /// Returns an error without touching the model if the config is invalid,
    /// `items` is empty or a target table does not have one row of
    /// `output_length` values per item. Transform failures and a non-finite
    /// loss abort training.
    pub fn train<T>(
        &mut self,
        transform: &T,
        items: &[T::Item],
        targets: &Targets,
        validation: Option<(&[T::Item], &Targets)>,
        config: &TrainingConfig,
    ) -> Result<TrainingMetrics>
    where
        T: BatchTransform,
        T::Item: Clone,
    {
        config.validate()?;
        self.check_targets(items.len(), targets)?;
        if let Some((val_items, val_targets)) = validation {
            self.check_targets(val_items.len(), val_targets)?;
            if val_items.is_empty() {
                return Err(TrainingError::dataset("cannot validate on an empty dataset"));
            }
        }
        if items.is_empty() {
            return Err(TrainingError::dataset("cannot train on an empty dataset"));
        }

        let shape = self.input_shape();
        let device = self.device.clone();
        let next_batch = |window: &[usize]| -> Result<(Tensor<B, 4>, Tensor<B, 2>)> {
            let (inputs, rows) = match contiguous(window) {
                Some(range) => (
                    transform.transform_batch::<B>(&items[range.clone()], shape, &device)?,
                    targets.slice_rows(range),
                ),
                None => {
                    let gathered: Vec<T::Item> =
                        window.iter().map(|&i| items[i].clone()).collect();
                    (
                        transform.transform_batch::<B>(&gathered, shape, &device)?,
                        targets.select_rows(window),
                    )
                }
            };
            Ok((inputs, rows.to_tensor::<B>(&device)))
        };

        let validate = |model: &Self| -> Result<Option<f32>> {
            validation
                .map(|(val_items, val_targets)| {
                    model.validate_batched(
                        transform,
                        val_items,
                        val_targets,
                        config.predict_batch_size,
                        config.verbose,
                    )
                })
                .transpose()
        };

        self.run_epochs(items.len(), config, next_batch, validate)
    }

    /// Trains on already transformed tensors.
    ///
    /// Same loop as [`train`](Self::train), with batches sliced straight out
    /// of `inputs` (`[N, C, H, W]`) and `targets` (`[N, output_length]`).
    ///
    /// # Errors
    ///
    /// Returns an error without touching the model if the config is invalid,
    /// the tensors are empty or their shapes disagree with the architecture.
    pub fn fit(
        &mut self,
        inputs: Tensor<B, 4>,
        targets: Tensor<B, 2>,
        config: &TrainingConfig,
    ) -> Result<TrainingMetrics> {
        config.validate()?;
        self.check_batch(&inputs, &targets)?;
        let [samples, _, _, _] = inputs.dims();
        if samples == 0 {
            return Err(TrainingError::dataset("cannot train on an empty dataset"));
        }

        let device = self.device.clone();
        let next_batch = |window: &[usize]| -> Result<(Tensor<B, 4>, Tensor<B, 2>)> {
            Ok(match contiguous(window) {
                Some(range) => (
                    inputs.clone().narrow(0, range.start, range.len()),
                    targets.clone().narrow(0, range.start, range.len()),
                ),
                None => {
                    let indices = index_tensor::<B>(window, &device);
                    (
                        inputs.clone().select(0, indices.clone()),
                        targets.clone().select(0, indices),
                    )
                }
            })
        };

        self.run_epochs(samples, config, next_batch, |_: &Self| Ok(None))
    }

    /// Runs one forward pass, backward pass and optimizer step.
    ///
    /// Uses the learning rate of the current optimizer settings.
    ///
    /// # Returns
    ///
    /// The batch loss before the step.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Model` if the tensor shapes disagree with the
    /// architecture and `TrainingError::NumericalInstability` if the loss is
    /// not finite.
    pub fn train_on_batch(&mut self, inputs: Tensor<B, 4>, targets: Tensor<B, 2>) -> Result<f32> {
        self.check_batch(&inputs, &targets)?;
        self.step(inputs, targets, self.optimizer_config.learning_rate)
    }

    /// Runs inference on an already transformed `[N, C, H, W]` batch.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Model` if the input does not match the
    /// architecture's input shape.
    pub fn predict(
        &self,
        inputs: Tensor<B::InnerBackend, 4>,
    ) -> Result<Tensor<B::InnerBackend, 2>> {
        Ok(self.network.valid().try_forward(&self.spec, inputs)?)
    }

    /// Runs batched inference over raw items.
    ///
    /// # Returns
    ///
    /// A `items.len() x output_length` table; empty input gives an empty table.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::InvalidConfig` for a zero batch size and
    /// propagates transform failures.
    pub fn predict_raw<T: BatchTransform>(
        &self,
        transform: &T,
        items: &[T::Item],
        batch_size: usize,
        verbose: bool,
    ) -> Result<Targets> {
        if batch_size == 0 {
            return Err(TrainingError::invalid_config("batch_size must be > 0"));
        }

        let mut predictions = Targets::zeros(items.len(), self.output_length());
        if items.is_empty() {
            return Ok(predictions);
        }

        let network = self.network.valid();
        let started = Instant::now();

        for (batch, chunk) in items.chunks(batch_size).enumerate() {
            let start = batch * batch_size;
            let inputs = transform.transform_batch::<B::InnerBackend>(
                chunk,
                self.input_shape(),
                &self.device,
            )?;
            let output = network.try_forward(&self.spec, inputs)?;
            predictions.write_rows(start, &Targets::from_tensor(output)?)?;

            if verbose {
                let remaining = item_eta(started.elapsed(), start, items.len());
                info!(
                    images = start,
                    eta = %format_secs(remaining),
                    "{start} images, eta is {}",
                    format_secs(remaining)
                );
            }
        }

        Ok(predictions)
    }

    /// Predicts over `items` and returns the mean absolute error against
    /// `targets` over all outputs.
    ///
    /// In verbose mode the MAE of every output column is logged too.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Dataset` if `items` is empty or `targets` does
    /// not have one row of `output_length` values per item.
    pub fn validate<T: BatchTransform>(
        &self,
        transform: &T,
        items: &[T::Item],
        targets: &Targets,
        verbose: bool,
    ) -> Result<f32> {
        self.validate_batched(transform, items, targets, DEFAULT_PREDICT_BATCH_SIZE, verbose)
    }

    /// Writes the architecture to `{stem}.json` and, if `save_weights` is
    /// set, binary weights to `{stem}.bin`.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Checkpoint` if a file cannot be written.
    pub fn save(&self, stem: &str, save_weights: bool) -> Result<()> {
        self.save_with_format(stem, CheckpointFormat::default(), save_weights)
    }

    /// Like [`save`](Self::save) with an explicit weight format.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Checkpoint` if a file cannot be written.
    pub fn save_with_format(
        &self,
        stem: &str,
        format: CheckpointFormat,
        save_weights: bool,
    ) -> Result<()> {
        let architecture = save_architecture(&self.spec, stem)?;
        debug!(path = %architecture.display(), "Saved architecture");

        if save_weights {
            let weights = steer_models::save_weights::<B, _>(&self.network, stem, format)?;
            debug!(path = %weights.display(), format = %format, "Saved weights");
        }

        info!(stem, weights = save_weights, "Saved model to disk");
        Ok(())
    }

    /// Replaces the current weights with the ones stored for `stem`.
    ///
    /// Optimizer state is reset.
    ///
    /// # Errors
    ///
    /// Returns `TrainingError::Checkpoint` if no weights exist for `stem` or
    /// they do not fit this architecture. The model is unchanged on error.
    pub fn load(&mut self, stem: &str) -> Result<()> {
        self.network = load_weights::<B, _>(self.network.clone(), stem, &self.device)?;
        self.reset_optimizer();
        info!(stem, "Loaded weights");
        Ok(())
    }

    fn validate_batched<T: BatchTransform>(
        &self,
        transform: &T,
        items: &[T::Item],
        targets: &Targets,
        batch_size: usize,
        verbose: bool,
    ) -> Result<f32> {
        self.check_targets(items.len(), targets)?;
        if items.is_empty() {
            return Err(TrainingError::dataset("cannot validate on an empty dataset"));
        }

        let predictions = self.predict_raw(transform, items, batch_size, false)?;
        if verbose {
            for (feature, mae) in per_feature_mae(&predictions, targets)?.into_iter().enumerate() {
                info!(feature, mae, "Validation MAE for feature {feature}: {mae:.4}");
            }
        }
        mean_absolute_error(&predictions, targets)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn run_epochs<F, V>(
        &mut self,
        samples: usize,
        config: &TrainingConfig,
        mut next_batch: F,
        mut validate: V,
    ) -> Result<TrainingMetrics>
    where
        F: FnMut(&[usize]) -> Result<(Tensor<B, 4>, Tensor<B, 2>)>,
        V: FnMut(&Self) -> Result<Option<f32>>,
    {
        self.use_optimizer(config.optimizer);

        let mut metrics = TrainingMetrics::new();
        let started = Instant::now();

        for epoch in 0..config.epochs {
            info!(epoch, epochs = config.epochs, "epoch {epoch}");
            let lr = config
                .lr_schedule
                .compute_lr(config.optimizer.learning_rate, epoch);

            let order = if config.shuffle {
                shuffled_indices(samples, config.seed.map(|s| s.wrapping_add(epoch as u64)))
            } else {
                (0..samples).collect()
            };

            let epoch_start = Instant::now();
            let mut loss_sum = 0.0_f64;
            let mut batches = 0_usize;
            for window in order.chunks(config.batch_size) {
                let (inputs, targets) = next_batch(window)?;
                loss_sum += f64::from(self.step(inputs, targets, lr)?);
                batches += 1;
            }
            let train_loss = (loss_sum / batches as f64) as f32;
            let train_time = epoch_start.elapsed();

            let remaining = eta(started.elapsed(), epoch + 1, config.epochs);
            info!(
                epoch,
                loss = train_loss,
                loss_kind = %self.spec.loss,
                lr,
                epoch_time = %format_secs(train_time),
                eta = %format_secs(remaining),
                "{} = {train_loss:.4}, epoch time {}, eta {}",
                self.spec.loss,
                format_secs(train_time),
                format_secs(remaining)
            );

            let val_start = Instant::now();
            let val_mae = validate(self)?;
            let val_time = val_start.elapsed();

            let mut epoch_metrics = EpochMetrics::new(epoch, train_loss, val_mae)
                .with_learning_rate(lr)
                .with_train_time(train_time.as_secs_f32())
                .with_eta(remaining.as_secs_f32())
                .with_batches(batches, samples);
            if let Some(mae) = val_mae {
                info!(epoch, val_mae = mae, "validation mae = {mae:.4}");
                epoch_metrics = epoch_metrics.with_val_time(val_time.as_secs_f32());
            }
            metrics.add_epoch(epoch_metrics);
        }

        Ok(metrics)
    }

    fn step(&mut self, inputs: Tensor<B, 4>, targets: Tensor<B, 2>, lr: f64) -> Result<f32> {
        let output = self.network.forward(inputs);
        let loss = regression_loss(self.spec.loss, output, targets);
        let value: f32 = loss.clone().into_scalar().elem();
        if !value.is_finite() {
            return Err(TrainingError::numerical_instability(format!(
                "{} loss is {value}",
                self.spec.loss
            )));
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self.optimizer.step(lr, self.network.clone(), grads);

        Ok(value)
    }

    fn use_optimizer(&mut self, config: OptimizerConfig) {
        if config != self.optimizer_config {
            self.optimizer_config = config;
            self.reset_optimizer();
        }
    }

    fn reset_optimizer(&mut self) {
        self.optimizer = self.optimizer_config.to_adam().init();
    }

    fn check_targets(&self, items: usize, targets: &Targets) -> Result<()> {
        if targets.width() != self.output_length() {
            return Err(TrainingError::dataset(format!(
                "targets have {} columns, model predicts {}",
                targets.width(),
                self.output_length()
            )));
        }
        if targets.rows() != items {
            return Err(TrainingError::dataset(format!(
                "{items} items but {} target rows",
                targets.rows()
            )));
        }
        Ok(())
    }

    fn check_batch(&self, inputs: &Tensor<B, 4>, targets: &Tensor<B, 2>) -> Result<()> {
        let dims = inputs.dims();
        let expected = self.input_shape().batch_dims(dims[0]);
        if dims != expected {
            return Err(TrainingError::model(format!(
                "input batch is {dims:?}, expected {expected:?}"
            )));
        }
        let [rows, width] = targets.dims();
        if rows != dims[0] || width != self.output_length() {
            return Err(TrainingError::dataset(format!(
                "targets are [{rows}, {width}], expected [{}, {}]",
                dims[0],
                self.output_length()
            )));
        }
        Ok(())
    }
}

impl<B: AutodiffBackend> std::fmt::Debug for RegressionModel<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegressionModel")
            .field("spec", &self.spec)
            .field("optimizer", &self.optimizer_config)
            .finish_non_exhaustive()
    }
}

/// Returns the range a window covers if its indices are consecutive.
fn contiguous(window: &[usize]) -> Option<Range<usize>> {
    let first = *window.first()?;
    window
        .iter()
        .enumerate()
        .all(|(offset, &index)| index == first + offset)
        .then(|| first..first + window.len())
}

#[allow(clippy::cast_possible_wrap)]
fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let values: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(values, [indices.len()]), device)
}
