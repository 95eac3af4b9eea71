use ndarray::{Array1, ArrayView1, ArrayView2, Axis, CowArray, Ix1, Ix2};
use ndarray_stats::SummaryStatisticsExt;

use crate::datasets::DatasetError;
use crate::Float;


/// Centered (and possibly weighted) training data together with the offsets
/// needed to recover the intercept once the coefficients are known.
#[derive(Debug, Clone)]
pub struct PreprocessedData<'a, F> {
    pub x: CowArray<'a, F, Ix2>,
    pub y: CowArray<'a, F, Ix1>,
    pub x_offset: Array1<F>,
    pub y_offset: F,
    pub x_scale: Array1<F>,
}

/// Validates sample weights and rescales them so that they sum to the number
/// of samples. This keeps the magnitude of the data-fitting term, hence of the
/// regularization hyperparameters, independent of the weights' overall scale.
pub fn check_sample_weight<F: Float>(
    sample_weight: ArrayView1<F>,
    n_samples: usize,
) -> Result<Array1<F>, DatasetError> {
    if sample_weight.len() != n_samples {
        return Err(DatasetError::SampleWeightsMismatch {
            samples: n_samples,
            weights: sample_weight.len(),
        });
    }
    if !sample_weight.iter().all(|sw| sw.is_finite()) {
        return Err(DatasetError::NonFinite("sample_weight"));
    }
    if sample_weight.iter().any(|&sw| sw < F::zero()) {
        return Err(DatasetError::InvalidSampleWeights);
    }
    let total = sample_weight.sum();
    if total <= F::zero() {
        return Err(DatasetError::InvalidSampleWeights);
    }
    Ok(&sample_weight * (F::cast(n_samples) / total))
}

/// Centers the design matrix and the targets when an intercept is fitted.
///
/// When `fit_intercept` is false, offsets are zero and the data is passed
/// through untouched: with `copy == false` no allocation happens at all.
/// Centering always works on an owned buffer, so it allocates unless `copy`
/// already did.
pub fn preprocess_data<'a, F: Float>(
    X: ArrayView2<'a, F>,
    y: ArrayView1<'a, F>,
    fit_intercept: bool,
    copy: bool,
    sample_weight: Option<ArrayView1<F>>,
) -> Result<PreprocessedData<'a, F>, DatasetError> {
    let n_features = X.ncols();
    let (mut x, mut y) = if copy {
        (CowArray::from(X.to_owned()), CowArray::from(y.to_owned()))
    } else {
        (CowArray::from(X), CowArray::from(y))
    };

    let x_scale = Array1::<F>::ones(n_features);
    if !fit_intercept {
        return Ok(PreprocessedData {
            x,
            y,
            x_offset: Array1::zeros(n_features),
            y_offset: F::zero(),
            x_scale,
        });
    }

    let (x_offset, y_offset) = match sample_weight {
        Some(sw) => {
            let x_offset = x
                .view()
                .weighted_mean_axis(Axis(0), &sw.view())
                .map_err(|_| DatasetError::InvalidSampleWeights)?;
            let y_offset = y
                .view()
                .weighted_mean(&sw.view())
                .map_err(|_| DatasetError::InvalidSampleWeights)?;
            (x_offset, y_offset)
        }
        None => {
            let x_offset = x.mean_axis(Axis(0)).ok_or(DatasetError::NoSamples)?;
            let y_offset = y.mean().ok_or(DatasetError::NoSamples)?;
            (x_offset, y_offset)
        }
    };

    let mut x_owned = x.into_owned();
    x_owned -= &x_offset;
    x = CowArray::from(x_owned);
    let mut y_owned = y.into_owned();
    y_owned -= y_offset;
    y = CowArray::from(y_owned);

    Ok(PreprocessedData {
        x,
        y,
        x_offset,
        y_offset,
        x_scale,
    })
}

/// Rescales each sample (row of `X` and entry of `y`) by the square root of
/// its weight, so that an unweighted least-squares objective on the rescaled
/// data equals the weighted objective on the original data.
pub fn rescale_data<'a, F: Float>(
    X: CowArray<'a, F, Ix2>,
    y: CowArray<'a, F, Ix1>,
    sample_weight: ArrayView1<F>,
) -> (CowArray<'a, F, Ix2>, CowArray<'a, F, Ix1>) {
    let sw_sqrt = sample_weight.mapv(|sw| sw.sqrt());
    let mut X = X.into_owned();
    for (mut row, &scale) in X.rows_mut().into_iter().zip(sw_sqrt.iter()) {
        row *= scale;
    }
    let y = y.into_owned() * &sw_sqrt;
    (CowArray::from(X), CowArray::from(y))
}

/// Recovers the coefficients in the original feature scale and the intercept
/// from the offsets computed by [`preprocess_data`].
pub fn set_intercept<F: Float>(
    coefficients: Array1<F>,
    x_offset: ArrayView1<F>,
    y_offset: F,
    x_scale: ArrayView1<F>,
    fit_intercept: bool,
) -> (Array1<F>, F) {
    if !fit_intercept {
        return (coefficients, F::zero());
    }
    let coefficients = coefficients / &x_scale;
    let intercept = y_offset - x_offset.dot(&coefficients);
    (coefficients, intercept)
}
