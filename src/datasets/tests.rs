use ndarray::{array, Array1, Array2};

use super::*;

#[test]
fn test_dataset_from_tuple() {
    let X = array![[1., 2.], [3., 4.], [5., 6.]];
    let y = array![1., 2., 3.];
    let dataset = DatasetBase::from((X, y)).with_sample_weight(array![1., 1., 2.]);
    assert_eq!(dataset.n_samples(), 3);
    assert_eq!(dataset.n_features(), 2);
    assert_eq!(dataset.sample_weight().unwrap()[2], 2.);
}

#[test]
fn test_check_x_y_valid() {
    let X = array![[1., 0.], [0., 1.]];
    let y = array![1., 1.];
    assert!(check_x_y(X.view(), y.view()).is_ok());
}

#[test]
fn test_check_x_y_mismatch() {
    let X = array![[1., 0.], [0., 1.]];
    let y = array![1., 1., 3.];
    assert_eq!(
        check_x_y(X.view(), y.view()),
        Err(DatasetError::TargetsMismatch {
            samples: 2,
            targets: 3
        })
    );
}

#[test]
fn test_check_x_y_non_finite() {
    let X = array![[1., f64::NAN], [0., 1.]];
    let y = array![1., 1.];
    assert_eq!(
        check_x_y(X.view(), y.view()),
        Err(DatasetError::NonFinite("X"))
    );

    let X = array![[1., 0.], [0., 1.]];
    let y = array![1., f64::INFINITY];
    assert_eq!(
        check_x_y(X.view(), y.view()),
        Err(DatasetError::NonFinite("y"))
    );
}

#[test]
fn test_check_array_empty() {
    let X = Array2::<f64>::zeros((0, 3));
    assert_eq!(check_array(X.view()), Err(DatasetError::NoSamples));
    let X = Array2::<f64>::zeros((3, 0));
    let y = Array1::<f64>::zeros(3);
    assert_eq!(check_x_y(X.view(), y.view()), Err(DatasetError::NoFeatures));
}
