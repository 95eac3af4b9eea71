use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use thiserror::Error;

use crate::Float;

#[cfg(test)]
mod tests;

/// Error variants raised when the training or prediction data is malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    #[error("design matrix has no samples")]
    NoSamples,
    #[error("design matrix has no features")]
    NoFeatures,
    #[error("found {targets} targets for {samples} samples")]
    TargetsMismatch { samples: usize, targets: usize },
    #[error("found {weights} sample weights for {samples} samples")]
    SampleWeightsMismatch { samples: usize, weights: usize },
    #[error("sample weights must be non-negative and sum to a positive value")]
    InvalidSampleWeights,
    #[error("input {0} contains NaN or infinity")]
    NonFinite(&'static str),
    #[error("expected {expected} features, found {found}")]
    FeatureMismatch { expected: usize, found: usize },
}

/// A dense dataset: a design matrix of shape `(n_samples, n_features)`, a
/// single target per sample and optional per-sample weights.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBase<F> {
    pub design_matrix: Array2<F>,
    pub targets: Array1<F>,
    pub sample_weight: Option<Array1<F>>,
}

/// This implementation block provides a method for the creation of datasets
/// from dense matrices.
impl<F: Float> From<(Array2<F>, Array1<F>)> for DatasetBase<F> {
    fn from(data: (Array2<F>, Array1<F>)) -> Self {
        DatasetBase::new(data.0, data.1)
    }
}

impl<F: Float> DatasetBase<F> {
    /// This method instantiates a new dataset from a design matrix and targets.
    pub fn new(design_matrix: Array2<F>, targets: Array1<F>) -> DatasetBase<F> {
        DatasetBase {
            design_matrix,
            targets,
            sample_weight: None,
        }
    }

    /// Attaches per-sample weights to the dataset.
    pub fn with_sample_weight(mut self, sample_weight: Array1<F>) -> DatasetBase<F> {
        self.sample_weight = Some(sample_weight);
        self
    }

    /// This method is a getter for the design matrix.
    pub fn design_matrix(&self) -> ArrayView2<F> {
        self.design_matrix.view()
    }

    /// This method is a getter for the targets.
    pub fn targets(&self) -> ArrayView1<F> {
        self.targets.view()
    }

    pub fn sample_weight(&self) -> Option<ArrayView1<F>> {
        self.sample_weight.as_ref().map(|sw| sw.view())
    }

    pub fn n_samples(&self) -> usize {
        self.design_matrix.len_of(Axis(0))
    }

    pub fn n_features(&self) -> usize {
        self.design_matrix.len_of(Axis(1))
    }
}

/// Checks that a design matrix and a target vector can be used for fitting:
/// non-empty, consistent lengths and finite entries.
pub fn check_x_y<F: Float>(X: ArrayView2<F>, y: ArrayView1<F>) -> Result<(), DatasetError> {
    check_array(X)?;
    if y.len() != X.nrows() {
        return Err(DatasetError::TargetsMismatch {
            samples: X.nrows(),
            targets: y.len(),
        });
    }
    if !y.iter().all(|yi| yi.is_finite()) {
        return Err(DatasetError::NonFinite("y"));
    }
    Ok(())
}

/// Checks that a design matrix is non-empty and finite.
pub fn check_array<F: Float>(X: ArrayView2<F>) -> Result<(), DatasetError> {
    if X.nrows() == 0 {
        return Err(DatasetError::NoSamples);
    }
    if X.ncols() == 0 {
        return Err(DatasetError::NoFeatures);
    }
    if !X.iter().all(|xij| xij.is_finite()) {
        return Err(DatasetError::NonFinite("X"));
    }
    Ok(())
}
