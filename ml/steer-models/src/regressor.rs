//! Convolutional regression network.

use burn::module::Module;
use burn::nn;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation::relu;

use crate::architecture::{ArchitectureSpec, ConvStageSpec, DenseStageSpec};
use crate::error::{ModelError, Result};

/// `conv -> relu -> [pool] -> [dropout]`.
#[derive(Debug, Module)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    pool: Option<MaxPool2d>,
    dropout: Option<nn::Dropout>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, stage: &ConvStageSpec, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, stage.filters], [stage.kernel, stage.kernel])
            .with_stride([stage.stride, stage.stride])
            .init(device);
        let pool = stage
            .pool
            .map(|size| MaxPool2dConfig::new([size, size]).with_strides([size, size]).init());
        let dropout = stage.dropout.map(|p| nn::DropoutConfig::new(p).init());

        Self {
            conv,
            pool,
            dropout,
        }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = relu(self.conv.forward(input));
        if let Some(pool) = &self.pool {
            x = pool.forward(x);
        }
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
        }
        x
    }
}

/// `linear -> relu -> [dropout]`.
#[derive(Debug, Module)]
pub struct DenseBlock<B: Backend> {
    linear: nn::Linear<B>,
    dropout: Option<nn::Dropout>,
}

impl<B: Backend> DenseBlock<B> {
    fn new(in_features: usize, stage: &DenseStageSpec, device: &B::Device) -> Self {
        Self {
            linear: nn::LinearConfig::new(in_features, stage.units).init(device),
            dropout: stage.dropout.map(|p| nn::DropoutConfig::new(p).init()),
        }
    }

    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.linear.forward(input));
        match &self.dropout {
            Some(dropout) => dropout.forward(x),
            None => x,
        }
    }
}

/// Convolutional network regressing a fixed number of continuous outputs.
///
/// Architecture: Conv blocks -> Flatten -> Dense blocks -> Linear head
///
/// The network is built from an [`ArchitectureSpec`]; the description is not stored
/// in the module, so the same description must be used to rebuild it before
/// loading weights.
///
/// Dropout is only active on autodiff backends, so inference through
/// `AutodiffModule::valid` is deterministic.
///
/// # Type Parameters
///
/// - `B`: The Burn backend (e.g., `NdArray`, `Autodiff<NdArray>`)
///
/// # Example
///
/// ```ignore
/// use steer_dataset::InputShape;
/// use steer_models::{ArchitectureKind, ConvRegressor};
///
/// let spec = ArchitectureKind::Simple.spec(InputShape::new(32, 32, 3), 1);
/// let model = ConvRegressor::<MyBackend>::new(&spec, &device)?;
///
/// let input = Tensor::zeros([4, 3, 32, 32], &device);
/// assert_eq!(model.forward(input).dims(), [4, 1]);
/// ```
#[derive(Debug, Module)]
pub struct ConvRegressor<B: Backend> {
    convs: Vec<ConvBlock<B>>,
    dense: Vec<DenseBlock<B>>,
    head: nn::Linear<B>,
}

impl<B: Backend> ConvRegressor<B> {
    /// Builds a freshly initialized network.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidConfig` if the description does not validate.
    pub fn new(spec: &ArchitectureSpec, device: &B::Device) -> Result<Self> {
        spec.validate()?;

        let mut channels = spec.input_shape.channels;
        let mut convs = Vec::with_capacity(spec.conv_stages.len());
        for stage in &spec.conv_stages {
            convs.push(ConvBlock::new(channels, stage, device));
            channels = stage.filters;
        }

        let mut features = spec.flattened_features()?;
        let mut dense = Vec::with_capacity(spec.dense_stages.len());
        for stage in &spec.dense_stages {
            dense.push(DenseBlock::new(features, stage, device));
            features = stage.units;
        }

        let head = nn::LinearConfig::new(features, spec.output_length).init(device);

        Ok(Self { convs, dense, head })
    }

    /// Runs the forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: Images of shape `[batch_size, channels, height, width]`
    ///
    /// # Returns
    ///
    /// Predictions of shape `[batch_size, output_length]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = input;
        for block in &self.convs {
            x = block.forward(x);
        }

        let mut x: Tensor<B, 2> = x.flatten(1, 3);
        for block in &self.dense {
            x = block.forward(x);
        }

        self.head.forward(x)
    }

    /// Runs the forward pass after checking the input against `spec`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::ShapeMismatch` if `input` is not
    /// `[_, channels, height, width]` for the description's input shape.
    pub fn try_forward(&self, spec: &ArchitectureSpec, input: Tensor<B, 4>) -> Result<Tensor<B, 2>> {
        let [batch, c, h, w] = input.dims();
        let expected = spec.input_shape.batch_dims(batch);
        if [batch, c, h, w] != expected {
            return Err(ModelError::shape_mismatch(
                format!("{expected:?}"),
                format!("{:?}", [batch, c, h, w]),
            ));
        }
        Ok(self.forward(input))
    }
}
