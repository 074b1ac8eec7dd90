//! Regression target tables.

use std::ops::Range;

use burn::prelude::Backend;
use burn::tensor::{Tensor, TensorData};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Row-major table of regression values, one row per sample.
///
/// Used both for ground-truth targets and for model predictions.
///
/// # Example
///
/// ```
/// use steer_dataset::Targets;
///
/// let targets = Targets::from_rows(&[vec![0.1, 1.0], vec![0.2, 2.0]]).unwrap();
/// assert_eq!(targets.rows(), 2);
/// assert_eq!(targets.width(), 2);
/// assert_eq!(targets.row(1), &[0.2, 2.0]);
/// assert_eq!(targets.column(1), vec![1.0, 2.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    values: Vec<f32>,
    width: usize,
}

impl Targets {
    /// Creates a table from flat row-major values.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::InvalidTargets` if `width` is zero or does not
    /// divide the number of values.
    pub fn new(values: Vec<f32>, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(DatasetError::invalid_targets("row width must be > 0"));
        }
        if values.len() % width != 0 {
            return Err(DatasetError::invalid_targets(format!(
                "{} values do not form rows of width {width}",
                values.len()
            )));
        }
        Ok(Self { values, width })
    }

    /// Creates a single-column table (one scalar per sample).
    #[must_use]
    pub const fn scalar(values: Vec<f32>) -> Self {
        Self { values, width: 1 }
    }

    /// Creates a zero-filled table.
    #[must_use]
    pub fn zeros(rows: usize, width: usize) -> Self {
        Self {
            values: vec![0.0; rows * width],
            width: width.max(1),
        }
    }

    /// Creates a table from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::EmptyDataset` if there are no rows and
    /// `DatasetError::InvalidTargets` if row widths differ.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let width = rows.first().map(Vec::len).ok_or(DatasetError::EmptyDataset)?;
        let mut values = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DatasetError::invalid_targets(format!(
                    "row {i} has {} values, expected {width}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Self::new(values, width)
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.values.len() / self.width
    }

    /// Number of values per row.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat row-major values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// One row.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.width..(index + 1) * self.width]
    }

    /// One column, copied out.
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f32> {
        self.values
            .iter()
            .skip(index)
            .step_by(self.width)
            .copied()
            .collect()
    }

    /// Copies a contiguous range of rows into a new table.
    ///
    /// The range is clamped to the table length.
    #[must_use]
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.rows());
        let start = range.start.min(end);
        Self {
            values: self.values[start * self.width..end * self.width].to_vec(),
            width: self.width,
        }
    }

    /// Gathers rows by index into a new table.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut values = Vec::with_capacity(indices.len() * self.width);
        for &i in indices {
            values.extend_from_slice(self.row(i));
        }
        Self {
            values,
            width: self.width,
        }
    }

    /// Overwrites rows starting at `start` with the rows of `other`.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::InvalidTargets` if widths differ or the rows do not fit.
    pub fn write_rows(&mut self, start: usize, other: &Self) -> Result<()> {
        if other.width != self.width {
            return Err(DatasetError::invalid_targets(format!(
                "row width {} does not match {}",
                other.width, self.width
            )));
        }
        if start + other.rows() > self.rows() {
            return Err(DatasetError::invalid_targets(format!(
                "rows {start}..{} exceed table of {} rows",
                start + other.rows(),
                self.rows()
            )));
        }
        let offset = start * self.width;
        self.values[offset..offset + other.values.len()].copy_from_slice(&other.values);
        Ok(())
    }

    /// Builds a `[rows, width]` tensor on `device`.
    #[must_use]
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let data = TensorData::new(self.values.clone(), [self.rows(), self.width]);
        Tensor::from_data(data, device)
    }

    /// Reads a `[rows, width]` tensor back into a table.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::TensorConversion` if the tensor data cannot be
    /// read as `f32`.
    pub fn from_tensor<B: Backend>(tensor: Tensor<B, 2>) -> Result<Self> {
        let [_, width] = tensor.dims();
        let values = tensor
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| DatasetError::tensor_conversion(format!("{e:?}")))?;
        Self::new(values, width)
    }
}
