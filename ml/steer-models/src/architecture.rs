//! Declarative architecture descriptions.
//!
//! An [`ArchitectureSpec`] is the serializable half of a saved model: it
//! names every layer and hyperparameter needed to rebuild the network, while
//! the weights live in a separate recorder file.

use serde::{Deserialize, Serialize};
use steer_dataset::InputShape;

use crate::error::{ModelError, Result};

/// Training objective attached to an architecture.
///
/// # Example
///
/// ```
/// use steer_models::LossKind;
///
/// assert_eq!(LossKind::default(), LossKind::Mae);
/// assert_eq!(LossKind::Mse.name(), "mse");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// Mean absolute error.
    #[default]
    Mae,

    /// Mean squared error.
    Mse,
}

impl LossKind {
    /// Returns the loss name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mae => "mae",
            Self::Mse => "mse",
        }
    }
}

impl std::fmt::Display for LossKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One convolution with optional max-pooling and dropout behind it.
///
/// The block runs `conv -> relu -> pool -> dropout`. Convolutions use valid
/// padding; pooling uses a square window with stride equal to its size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvStageSpec {
    /// Output channels.
    pub filters: usize,

    /// Square kernel size.
    pub kernel: usize,

    /// Stride in both directions.
    pub stride: usize,

    /// Max-pool window (and stride), if pooled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<usize>,

    /// Dropout probability, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropout: Option<f64>,
}

impl ConvStageSpec {
    /// Creates a stride-1 convolution stage.
    #[must_use]
    pub const fn new(filters: usize, kernel: usize) -> Self {
        Self {
            filters,
            kernel,
            stride: 1,
            pool: None,
            dropout: None,
        }
    }

    /// Sets the stride.
    #[must_use]
    pub const fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Adds max-pooling.
    #[must_use]
    pub const fn with_pool(mut self, size: usize) -> Self {
        self.pool = Some(size);
        self
    }

    /// Adds dropout.
    #[must_use]
    pub const fn with_dropout(mut self, prob: f64) -> Self {
        self.dropout = Some(prob);
        self
    }

    /// Spatial size after this stage, or `None` if the input is too small.
    #[must_use]
    pub fn output_size(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        if self.stride == 0 || height < self.kernel || width < self.kernel {
            return None;
        }
        let mut h = (height - self.kernel) / self.stride + 1;
        let mut w = (width - self.kernel) / self.stride + 1;

        if let Some(pool) = self.pool {
            if pool == 0 {
                return None;
            }
            h /= pool;
            w /= pool;
        }

        (h > 0 && w > 0).then_some((h, w))
    }
}

/// One hidden fully-connected layer with `ReLU` and optional dropout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenseStageSpec {
    /// Number of units.
    pub units: usize,

    /// Dropout probability, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropout: Option<f64>,
}

impl DenseStageSpec {
    /// Creates a dense stage.
    #[must_use]
    pub const fn new(units: usize) -> Self {
        Self {
            units,
            dropout: None,
        }
    }

    /// Adds dropout.
    #[must_use]
    pub const fn with_dropout(mut self, prob: f64) -> Self {
        self.dropout = Some(prob);
        self
    }
}

/// Complete layer topology of a convolutional regressor.
///
/// The network is `conv stages -> flatten -> dense stages -> linear head`,
/// with the head producing `output_length` values.
///
/// # Example
///
/// ```
/// use steer_dataset::InputShape;
/// use steer_models::{ArchitectureSpec, ConvStageSpec, DenseStageSpec};
///
/// let spec = ArchitectureSpec::new("tiny", InputShape::new(8, 8, 1), 1)
///     .with_conv(ConvStageSpec::new(4, 3).with_pool(2))
///     .with_dense(DenseStageSpec::new(16));
///
/// assert!(spec.validate().is_ok());
/// assert_eq!(spec.flattened_features().unwrap(), 4 * 3 * 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    /// Architecture name.
    pub name: String,

    /// Expected input geometry.
    pub input_shape: InputShape,

    /// Convolution stages in order.
    pub conv_stages: Vec<ConvStageSpec>,

    /// Hidden dense stages in order.
    pub dense_stages: Vec<DenseStageSpec>,

    /// Number of regression outputs.
    pub output_length: usize,

    /// Training objective.
    #[serde(default)]
    pub loss: LossKind,
}

impl ArchitectureSpec {
    /// Creates an empty topology (a single linear head).
    #[must_use]
    pub fn new(name: impl Into<String>, input_shape: InputShape, output_length: usize) -> Self {
        Self {
            name: name.into(),
            input_shape,
            conv_stages: Vec::new(),
            dense_stages: Vec::new(),
            output_length,
            loss: LossKind::Mae,
        }
    }

    /// Appends a convolution stage.
    #[must_use]
    pub fn with_conv(mut self, stage: ConvStageSpec) -> Self {
        self.conv_stages.push(stage);
        self
    }

    /// Appends a dense stage.
    #[must_use]
    pub fn with_dense(mut self, stage: DenseStageSpec) -> Self {
        self.dense_stages.push(stage);
        self
    }

    /// Sets the loss.
    #[must_use]
    pub const fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    /// Feature map `(channels, height, width)` after the last conv stage.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidConfig` if the input is too small for the
    /// stack of convolutions and pools.
    pub fn feature_map(&self) -> Result<(usize, usize, usize)> {
        let mut channels = self.input_shape.channels;
        let mut height = self.input_shape.height;
        let mut width = self.input_shape.width;

        for (i, stage) in self.conv_stages.iter().enumerate() {
            let (h, w) = stage.output_size(height, width).ok_or_else(|| {
                ModelError::invalid_config(format!(
                    "conv stage {i} cannot process a {height}x{width} feature map"
                ))
            })?;
            channels = stage.filters;
            height = h;
            width = w;
        }

        Ok((channels, height, width))
    }

    /// Number of features entering the first dense layer.
    ///
    /// # Errors
    ///
    /// See [`ArchitectureSpec::feature_map`].
    pub fn flattened_features(&self) -> Result<usize> {
        let (c, h, w) = self.feature_map()?;
        Ok(c * h * w)
    }

    /// Total number of trainable parameters.
    ///
    /// # Errors
    ///
    /// See [`ArchitectureSpec::feature_map`].
    pub fn parameter_count(&self) -> Result<usize> {
        let mut total = 0;
        let mut channels = self.input_shape.channels;
        for stage in &self.conv_stages {
            total += stage.kernel * stage.kernel * channels * stage.filters + stage.filters;
            channels = stage.filters;
        }

        let mut features = self.flattened_features()?;
        for stage in &self.dense_stages {
            total += features * stage.units + stage.units;
            features = stage.units;
        }

        Ok(total + features * self.output_length + self.output_length)
    }

    /// Checks every dimension and probability in the topology.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.input_shape.validate()?;

        if self.output_length == 0 {
            return Err(ModelError::invalid_config("output_length must be > 0"));
        }

        for (i, stage) in self.conv_stages.iter().enumerate() {
            if stage.filters == 0 || stage.kernel == 0 || stage.stride == 0 {
                return Err(ModelError::invalid_config(format!(
                    "conv stage {i}: filters, kernel and stride must be > 0"
                )));
            }
            if stage.pool == Some(0) {
                return Err(ModelError::invalid_config(format!(
                    "conv stage {i}: pool size must be > 0"
                )));
            }
            check_dropout(stage.dropout, &format!("conv stage {i}"))?;
        }

        for (i, stage) in self.dense_stages.iter().enumerate() {
            if stage.units == 0 {
                return Err(ModelError::invalid_config(format!(
                    "dense stage {i}: units must be > 0"
                )));
            }
            check_dropout(stage.dropout, &format!("dense stage {i}"))?;
        }

        self.feature_map().map(|_| ())
    }

    /// Serializes the topology to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Serialization` on failure.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a topology from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Serialization` for malformed JSON and
    /// `ModelError::InvalidConfig` for an unusable topology.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }
}

fn check_dropout(dropout: Option<f64>, stage: &str) -> Result<()> {
    match dropout {
        Some(p) if !(0.0..1.0).contains(&p) => Err(ModelError::invalid_config(format!(
            "{stage}: dropout {p} must be in [0, 1)"
        ))),
        _ => Ok(()),
    }
}
