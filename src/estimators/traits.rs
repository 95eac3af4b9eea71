use ndarray::{Array1, ArrayView2};

use super::error::Result;
use crate::datasets::DatasetBase;
use crate::Float;

/// Fit trait
///
/// The fittable trait allows an estimator to be fitted to a dataset (a design
/// matrix, targets and optional sample weights). The estimator is updated in
/// place and returned, so that calls can be chained.
pub trait Fit<F: Float> {
    fn fit(&mut self, dataset: &DatasetBase<F>) -> Result<&mut Self>;
}

/// Predict trait
///
/// A fitted linear model predicts `X @ coefficients + intercept`.
pub trait Predict<F: Float> {
    fn predict(&self, x: ArrayView2<F>) -> Result<Array1<F>>;
}
