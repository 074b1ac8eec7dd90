//! Built-in regression architectures.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use steer_dataset::InputShape;

use crate::architecture::{ArchitectureSpec, ConvStageSpec, DenseStageSpec, LossKind};
use crate::error::ModelError;

/// Named architectures shipped with SteerNet.
///
/// All of them are `ReLU` conv stacks with a linear regression head and
/// differ only in layer sizes, dropout and loss.
///
/// # Example
///
/// ```
/// use steer_dataset::InputShape;
/// use steer_models::{ArchitectureKind, LossKind};
///
/// let spec = ArchitectureKind::SimpleMse.spec(InputShape::new(32, 32, 3), 1);
/// assert_eq!(spec.loss, LossKind::Mse);
/// assert_eq!(spec.conv_stages.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureKind {
    /// Two 3x3 convs (24, 48), one pool, dense 128 -> 50.
    #[default]
    Simple,

    /// `Simple` plus an unpooled 5x5 conv with 64 filters.
    Simple2,

    /// `Simple` plus a pooled 5x5 conv with 64 filters.
    Simple3,

    /// `Simple` trained on mean squared error.
    SimpleMse,

    /// Slimmer variant: convs (16, 32), a single dense 128.
    SimpleGood,

    /// The five-conv end-to-end driving network from NVIDIA's `PilotNet` paper.
    Nvidia,
}

impl ArchitectureKind {
    /// Every built-in architecture.
    pub const ALL: [Self; 6] = [
        Self::Simple,
        Self::Simple2,
        Self::Simple3,
        Self::SimpleMse,
        Self::SimpleGood,
        Self::Nvidia,
    ];

    /// Returns the architecture name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Simple2 => "simple2",
            Self::Simple3 => "simple3",
            Self::SimpleMse => "simple_mse",
            Self::SimpleGood => "simple_good",
            Self::Nvidia => "nvidia",
        }
    }

    /// Builds the layer topology for the given input and output size.
    #[must_use]
    pub fn spec(&self, input_shape: InputShape, output_length: usize) -> ArchitectureSpec {
        let base = ArchitectureSpec::new(self.name(), input_shape, output_length);

        match self {
            Self::Simple => simple_head(
                base.with_conv(ConvStageSpec::new(24, 3))
                    .with_conv(ConvStageSpec::new(48, 3).with_pool(2).with_dropout(0.25)),
            ),
            Self::Simple2 => simple_head(
                base.with_conv(ConvStageSpec::new(24, 3))
                    .with_conv(ConvStageSpec::new(48, 3).with_pool(2))
                    .with_conv(ConvStageSpec::new(64, 5).with_dropout(0.25)),
            ),
            Self::Simple3 => simple_head(
                base.with_conv(ConvStageSpec::new(24, 3))
                    .with_conv(ConvStageSpec::new(48, 3).with_pool(2))
                    .with_conv(ConvStageSpec::new(64, 5).with_pool(2).with_dropout(0.25)),
            ),
            Self::SimpleMse => {
                let mut spec = Self::Simple.spec(input_shape, output_length);
                self.name().clone_into(&mut spec.name);
                spec.with_loss(LossKind::Mse)
            }
            Self::SimpleGood => base
                .with_conv(ConvStageSpec::new(16, 3))
                .with_conv(ConvStageSpec::new(32, 3).with_pool(2).with_dropout(0.25))
                .with_dense(DenseStageSpec::new(128).with_dropout(0.25)),
            Self::Nvidia => base
                .with_conv(ConvStageSpec::new(24, 5).with_stride(2))
                .with_conv(ConvStageSpec::new(36, 5).with_stride(2))
                .with_conv(ConvStageSpec::new(48, 5).with_stride(2))
                .with_conv(ConvStageSpec::new(64, 3))
                .with_conv(ConvStageSpec::new(64, 3))
                .with_dense(DenseStageSpec::new(100))
                .with_dense(DenseStageSpec::new(10)),
        }
    }
}

fn simple_head(spec: ArchitectureSpec) -> ArchitectureSpec {
    spec.with_dense(DenseStageSpec::new(128).with_dropout(0.25))
        .with_dense(DenseStageSpec::new(50))
}

impl std::fmt::Display for ArchitectureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ArchitectureKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ModelError::unknown_architecture(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA: InputShape = InputShape::new(66, 200, 3);

    #[test]
    fn every_kind_builds_a_valid_spec() {
        for kind in ArchitectureKind::ALL {
            let spec = kind.spec(CAMERA, 2);
            assert!(spec.validate().is_ok(), "{kind} should validate");
            assert_eq!(spec.name, kind.name());
            assert_eq!(spec.output_length, 2);
        }
    }

    #[test]
    fn only_simple_mse_uses_mse() {
        for kind in ArchitectureKind::ALL {
            let expected = if kind == ArchitectureKind::SimpleMse {
                LossKind::Mse
            } else {
                LossKind::Mae
            };
            assert_eq!(kind.spec(CAMERA, 1).loss, expected);
        }
    }

    #[test]
    fn simple_mse_matches_simple_topology() {
        let simple = ArchitectureKind::Simple.spec(CAMERA, 1);
        let mse = ArchitectureKind::SimpleMse.spec(CAMERA, 1);
        assert_eq!(simple.conv_stages, mse.conv_stages);
        assert_eq!(simple.dense_stages, mse.dense_stages);
    }

    #[test]
    fn simple3_pools_twice() {
        let spec = ArchitectureKind::Simple3.spec(InputShape::new(32, 32, 3), 1);
        // 32 -> 30 -> 28 -> pool 14 -> 10 -> pool 5
        assert_eq!(spec.feature_map().unwrap(), (64, 5, 5));
    }

    #[test]
    fn simple2_pools_once() {
        let spec = ArchitectureKind::Simple2.spec(InputShape::new(32, 32, 3), 1);
        // 32 -> 30 -> 28 -> pool 14 -> 10
        assert_eq!(spec.feature_map().unwrap(), (64, 10, 10));
    }

    #[test]
    fn nvidia_feature_map() {
        let spec = ArchitectureKind::Nvidia.spec(CAMERA, 1);
        // 66x200 -> 31x98 -> 14x47 -> 5x22 -> 3x20 -> 1x18
        assert_eq!(spec.feature_map().unwrap(), (64, 1, 18));
        assert_eq!(spec.dense_stages.len(), 2);
        assert!(spec.conv_stages.iter().all(|s| s.dropout.is_none()));
    }

    #[test]
    fn nvidia_rejects_small_inputs() {
        let spec = ArchitectureKind::Nvidia.spec(InputShape::new(32, 32, 3), 1);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn simple_good_dense_head() {
        let spec = ArchitectureKind::SimpleGood.spec(CAMERA, 1);
        assert_eq!(spec.dense_stages, vec![DenseStageSpec::new(128).with_dropout(0.25)]);
        assert_eq!(spec.conv_stages[0].filters, 16);
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("nvidia".parse::<ArchitectureKind>().unwrap(), ArchitectureKind::Nvidia);
        assert_eq!(
            "Simple-MSE".parse::<ArchitectureKind>().unwrap(),
            ArchitectureKind::SimpleMse
        );
        assert!("vgg".parse::<ArchitectureKind>().is_err());
    }

    #[test]
    fn kind_serialization() {
        let json = serde_json::to_string(&ArchitectureKind::SimpleGood).unwrap();
        assert_eq!(json, "\"simple_good\"");
    }
}
