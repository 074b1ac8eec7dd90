//! Architecture and weight persistence.
//!
//! A saved model is a pair of files sharing one stem:
//!
//! - `{stem}.json` - the [`ArchitectureSpec`] as pretty JSON
//! - `{stem}.bin` or `{stem}.weights.json` - the weights, via a Burn recorder

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinFileRecorder, FullPrecisionSettings, PrettyJsonFileRecorder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::architecture::ArchitectureSpec;
use crate::error::{ModelError, Result};

/// Supported weight file formats.
///
/// # Example
///
/// ```
/// use steer_models::CheckpointFormat;
///
/// let format = CheckpointFormat::from_extension("bin");
/// assert_eq!(format, Some(CheckpointFormat::Binary));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckpointFormat {
    /// Binary format - compact and fast.
    ///
    /// Uses Burn's `BinFileRecorder` with full precision.
    #[default]
    Binary,

    /// JSON format - human-readable.
    ///
    /// Uses Burn's `PrettyJsonFileRecorder`. Written as `{stem}.weights.json`
    /// so it never collides with the architecture file.
    Json,
}

impl CheckpointFormat {
    /// Formats in the order [`find_weights`] probes them.
    pub const ALL: [Self; 2] = [Self::Binary, Self::Json];

    /// Determines format from file extension.
    ///
    /// - `.bin`, `.burn` -> Binary
    /// - `.json` -> Json
    /// - Other -> None
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bin" | "burn" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Determines format from file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the file suffix appended to a model stem.
    #[must_use]
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "weights.json",
        }
    }

    /// Returns the format name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }

    /// Weight file path for a model stem.
    #[must_use]
    pub fn weights_path(&self, stem: &str) -> PathBuf {
        PathBuf::from(format!("{stem}.{}", self.suffix()))
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Architecture file path for a model stem.
#[must_use]
pub fn architecture_path(stem: &str) -> PathBuf {
    PathBuf::from(format!("{stem}.json"))
}

/// Writes `spec` to `{stem}.json`.
///
/// # Errors
///
/// Returns `ModelError::SaveCheckpoint` if the file cannot be written.
pub fn save_architecture(spec: &ArchitectureSpec, stem: &str) -> Result<PathBuf> {
    let path = architecture_path(stem);
    let json = spec.to_json()?;
    std::fs::write(&path, json)
        .map_err(|e| ModelError::save_checkpoint(path.display().to_string(), e.to_string()))?;
    debug!(path = %path.display(), "Wrote architecture");
    Ok(path)
}

/// Reads and validates the architecture stored at `{stem}.json`.
///
/// # Errors
///
/// Returns `ModelError::CheckpointNotFound` if the file does not exist,
/// `ModelError::Serialization` if it is not a valid description.
pub fn load_architecture(stem: &str) -> Result<ArchitectureSpec> {
    let path = architecture_path(stem);
    if !path.exists() {
        return Err(ModelError::checkpoint_not_found(path.display().to_string()));
    }
    let json = std::fs::read_to_string(&path)?;
    ArchitectureSpec::from_json(&json)
}

/// Returns the first existing weight file for `stem`, with its format.
#[must_use]
pub fn find_weights(stem: &str) -> Option<(PathBuf, CheckpointFormat)> {
    CheckpointFormat::ALL
        .into_iter()
        .map(|format| (format.weights_path(stem), format))
        .find(|(path, _)| path.exists())
}

/// Saves model weights next to a model stem.
///
/// # Returns
///
/// The full path to the saved weights.
///
/// # Errors
///
/// Returns `ModelError::SaveCheckpoint` if saving fails.
pub fn save_weights<B, M>(model: &M, stem: &str, format: CheckpointFormat) -> Result<PathBuf>
where
    B: Backend,
    M: Module<B>,
{
    let path = format.weights_path(stem);
    let fail = |e: burn::record::RecorderError| {
        ModelError::save_checkpoint(path.display().to_string(), e.to_string())
    };

    match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model.clone().save_file(path.clone(), &recorder).map_err(fail)?;
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model.clone().save_file(path.clone(), &recorder).map_err(fail)?;
        }
    }

    debug!(path = %path.display(), format = %format, "Wrote weights");
    Ok(path)
}

/// Loads weights from an explicit file into `model`.
///
/// The format is taken from the file extension.
///
/// # Errors
///
/// Returns `ModelError::CheckpointNotFound` if the file doesn't exist,
/// `ModelError::UnsupportedFormat` if the format can't be determined and
/// `ModelError::LoadCheckpoint` if the record does not fit the model.
pub fn load_weights_file<B, M>(model: M, path: &Path, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    if !path.exists() {
        return Err(ModelError::checkpoint_not_found(path.display().to_string()));
    }

    let format = CheckpointFormat::from_path(path)
        .ok_or_else(|| ModelError::unsupported_format(path.display().to_string()))?;
    let fail =
        |e: burn::record::RecorderError| ModelError::load_checkpoint(path.display().to_string(), e.to_string());

    let loaded = match format {
        CheckpointFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model.load_file(path, &recorder, device).map_err(fail)?
        }
        CheckpointFormat::Json => {
            let recorder = PrettyJsonFileRecorder::<FullPrecisionSettings>::new();
            model.load_file(path, &recorder, device).map_err(fail)?
        }
    };

    debug!(path = %path.display(), format = %format, "Loaded weights");
    Ok(loaded)
}

/// Loads the weights stored for `stem` into `model`.
///
/// Binary weights are preferred when both formats exist.
///
/// # Errors
///
/// Returns `ModelError::CheckpointNotFound` if no weight file exists for
/// `stem`, otherwise see [`load_weights_file`].
pub fn load_weights<B, M>(model: M, stem: &str, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    let (path, _) = find_weights(stem)
        .ok_or_else(|| ModelError::checkpoint_not_found(format!("{stem}.{{bin,weights.json}}")))?;
    load_weights_file(model, &path, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::ConvRegressor;
    use crate::zoo::ArchitectureKind;
    use burn::tensor::Tensor;
    use burn_ndarray::NdArray;
    use steer_dataset::InputShape;

    type TestBackend = NdArray<f32>;

    fn stem_in(dir: &tempfile::TempDir, name: &str) -> String {
        dir.path().join(name).display().to_string()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            CheckpointFormat::from_extension("bin"),
            Some(CheckpointFormat::Binary)
        );
        assert_eq!(
            CheckpointFormat::from_extension("burn"),
            Some(CheckpointFormat::Binary)
        );
        assert_eq!(
            CheckpointFormat::from_extension("JSON"),
            Some(CheckpointFormat::Json)
        );
        assert_eq!(CheckpointFormat::from_extension("h5"), None);
    }

    #[test]
    fn format_paths_do_not_collide_with_architecture() {
        let stem = "runs/v1.2/model";
        assert_eq!(architecture_path(stem), PathBuf::from("runs/v1.2/model.json"));
        assert_eq!(
            CheckpointFormat::Binary.weights_path(stem),
            PathBuf::from("runs/v1.2/model.bin")
        );
        assert_eq!(
            CheckpointFormat::Json.weights_path(stem),
            PathBuf::from("runs/v1.2/model.weights.json")
        );
    }

    #[test]
    fn format_display() {
        assert_eq!(format!("{}", CheckpointFormat::Binary), "binary");
        assert_eq!(format!("{}", CheckpointFormat::Json), "json");
    }

    #[test]
    fn architecture_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "arch");
        let spec = ArchitectureKind::Simple2.spec(InputShape::new(32, 32, 3), 2);

        let path = save_architecture(&spec, &stem).unwrap();
        assert!(path.exists());
        assert_eq!(load_architecture(&stem).unwrap(), spec);
    }

    #[test]
    fn load_architecture_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_architecture(&stem_in(&dir, "missing"));
        assert!(matches!(result, Err(ModelError::CheckpointNotFound(_))));
    }

    #[test]
    fn weights_round_trip_both_formats() {
        let device = Default::default();
        let spec = ArchitectureKind::SimpleGood.spec(InputShape::new(12, 12, 1), 1);
        let input = Tensor::<TestBackend, 4>::ones([1, 1, 12, 12], &device);

        for format in CheckpointFormat::ALL {
            let dir = tempfile::tempdir().unwrap();
            let stem = stem_in(&dir, "weights");

            let original = ConvRegressor::<TestBackend>::new(&spec, &device).unwrap();
            let saved = save_weights(&original, &stem, format).unwrap();
            assert_eq!(saved, format.weights_path(&stem));
            assert!(saved.exists());

            let fresh = ConvRegressor::<TestBackend>::new(&spec, &device).unwrap();
            let restored = load_weights(fresh, &stem, &device).unwrap();

            let expected = original.forward(input.clone()).into_data();
            let actual = restored.forward(input.clone()).into_data();
            expected.assert_approx_eq(&actual, 5);
        }
    }

    #[test]
    fn load_weights_missing() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let spec = ArchitectureKind::SimpleGood.spec(InputShape::new(12, 12, 1), 1);
        let model = ConvRegressor::<TestBackend>::new(&spec, &device).unwrap();

        let result = load_weights(model, &stem_in(&dir, "none"), &device);
        assert!(matches!(result, Err(ModelError::CheckpointNotFound(_))));
    }

    #[test]
    fn find_weights_prefers_binary() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let stem = stem_in(&dir, "both");
        let spec = ArchitectureKind::SimpleGood.spec(InputShape::new(12, 12, 1), 1);
        let model = ConvRegressor::<TestBackend>::new(&spec, &device).unwrap();

        save_weights(&model, &stem, CheckpointFormat::Json).unwrap();
        assert_eq!(find_weights(&stem).map(|(_, f)| f), Some(CheckpointFormat::Json));

        save_weights(&model, &stem, CheckpointFormat::Binary).unwrap();
        assert_eq!(find_weights(&stem).map(|(_, f)| f), Some(CheckpointFormat::Binary));
    }
}
