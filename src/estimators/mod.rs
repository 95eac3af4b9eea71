//! Convex regression estimators.
//!
//! A [`CvxEstimator`] combines base options ([`CvxParams`]), a
//! [`ProblemBuilder`] describing the data-fitting objective and an ordered
//! pipeline of [`Regularizer`]s. [`Ridge`] and [`Lasso`] are ready-made
//! combinations.


pub mod builder;
pub mod declarations;
pub mod error;
pub mod estimator;
pub mod hyperparams;
pub mod models;
pub mod regularizers;
pub mod traits;
pub mod translator;

pub use builder::{generate_problem, BuildContext, Canonicals, ProblemBuilder, Regularizer};
pub use declarations::{
    Closed, HasHyperparameters, HyperValue, Interval, IntervalKind, ParamConstraint, TypeKind,
};
pub use error::EstimatorError;
pub use estimator::CvxEstimator;
pub use hyperparams::{CvxParams, CvxValidParams, LassoParams, ParamGuard, RidgeParams};
pub use models::{Lasso, LeastSquares, LeastSquaresAuxiliaries, Ridge};
pub use regularizers::{Tikhonov, L1};
pub use traits::{Fit, Predict};
pub use translator::{generate_parameters, set_parameter_values, CvxParameters};
