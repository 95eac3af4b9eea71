use ndarray::Array2;
use serde_json::Value;

use super::declarations::{
    invalid_parameter, Closed, Declarations, HasHyperparameters, HyperValue, Interval,
    ParamConstraint, TypeKind,
};
use super::error::{EstimatorError, Result};
use super::estimator::CvxEstimator;
use super::models::LeastSquares;
use super::regularizers::{Tikhonov, L1};
use crate::expressions::ParameterValue;
use crate::solvers::installed_solvers;
use crate::Float;

/// A set of hyperparameters whose values have not been checked for validity.
/// A reference to the checked hyperparameters can only be obtained once the
/// checks passed, and `check_ref()` and `check()` run the same checks.
pub trait ParamGuard {
    type Checked;
    type Error: std::error::Error;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error>;

    fn check(self) -> std::result::Result<Self::Checked, Self::Error>;
}

/// Verified options shared by every convex estimator
#[derive(Debug, Clone, PartialEq)]
pub struct CvxValidParams {
    fit_intercept: bool,
    copy_x: bool,
    warm_start: bool,
    solver: Option<String>,
    solver_options: Option<Value>,
}

impl CvxValidParams {
    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    pub fn copy_x(&self) -> bool {
        self.copy_x
    }

    pub fn warm_start(&self) -> bool {
        self.warm_start
    }

    pub fn solver(&self) -> Option<&str> {
        self.solver.as_deref()
    }

    pub fn solver_options(&self) -> Option<&Value> {
        self.solver_options.as_ref()
    }
}

/// Options shared by every convex estimator, during construction
#[derive(Debug, Clone, PartialEq)]
pub struct CvxParams(CvxValidParams);

impl Default for CvxParams {
    fn default() -> Self {
        Self::new()
    }
}

impl CvxParams {
    pub fn new() -> CvxParams {
        Self(CvxValidParams {
            fit_intercept: false,
            copy_x: true,
            warm_start: false,
            solver: None,
            solver_options: None,
        })
    }

    /// Whether to center the data and estimate an intercept. When `false`
    /// the data is assumed to be centered already.
    /// Defaults to `false` if not set.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Whether the training data is copied before preprocessing. When
    /// `false` and no intercept is fitted, the caller's arrays are used
    /// directly.
    /// Defaults to `true` if not set.
    pub fn copy_x(mut self, copy_x: bool) -> Self {
        self.0.copy_x = copy_x;
        self
    }

    /// Reuse the assembled problem and the previous solution when fitting
    /// again on unchanged data.
    /// Defaults to `false` if not set.
    pub fn warm_start(mut self, warm_start: bool) -> Self {
        self.0.warm_start = warm_start;
        self
    }

    /// Name of the solver backend, see [`installed_solvers`].
    /// Defaults to the default backend if not set.
    pub fn solver(mut self, solver: &str) -> Self {
        self.0.solver = Some(solver.to_string());
        self
    }

    /// Options forwarded to the solver backend, as a JSON mapping.
    pub fn solver_options(mut self, solver_options: Value) -> Self {
        self.0.solver_options = Some(solver_options);
        self
    }
}

impl ParamGuard for CvxParams {
    type Checked = CvxValidParams;
    type Error = EstimatorError;

    /// Validate the solver choice and the solver options
    fn check_ref(&self) -> Result<&Self::Checked> {
        if let Some(solver) = &self.0.solver {
            if !installed_solvers().contains(&solver.as_str()) {
                let value = HyperValue::<f64>::Str(solver.clone());
                return Err(invalid_parameter("solver", &value, &solver_constraints::<f64>()));
            }
        }
        match &self.0.solver_options {
            Some(options) if !options.is_object() => {
                Err(EstimatorError::InvalidSolverOptions(options.to_string()))
            }
            _ => Ok(&self.0),
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

fn solver_constraints<F: Float>() -> Vec<ParamConstraint<F>> {
    vec![
        ParamConstraint::Options(installed_solvers().to_vec()),
        ParamConstraint::NoneValue,
    ]
}

impl<F: Float> HasHyperparameters<F> for CvxParams {
    fn parameter_constraints(&self) -> Declarations<F> {
        vec![
            ("fit_intercept", vec![ParamConstraint::Boolean]),
            ("copy_x", vec![ParamConstraint::Boolean]),
            ("warm_start", vec![ParamConstraint::Boolean]),
            ("solver", solver_constraints()),
            (
                "solver_options",
                vec![
                    ParamConstraint::InstanceOf(TypeKind::Mapping),
                    ParamConstraint::NoneValue,
                ],
            ),
        ]
    }

    fn get_param(&self, name: &str) -> Option<HyperValue<F>> {
        let params = &self.0;
        let value = match name {
            "fit_intercept" => HyperValue::Bool(params.fit_intercept),
            "copy_x" => HyperValue::Bool(params.copy_x),
            "warm_start" => HyperValue::Bool(params.warm_start),
            "solver" => params
                .solver
                .clone()
                .map_or(HyperValue::None, HyperValue::Str),
            "solver_options" => params
                .solver_options
                .clone()
                .map_or(HyperValue::None, HyperValue::Mapping),
            _ => return None,
        };
        Some(value)
    }

    fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()> {
        let params = &mut self.0;
        match (name, value) {
            ("fit_intercept", HyperValue::Bool(b)) => params.fit_intercept = b,
            ("copy_x", HyperValue::Bool(b)) => params.copy_x = b,
            ("warm_start", HyperValue::Bool(b)) => params.warm_start = b,
            ("solver", HyperValue::Str(s)) => params.solver = Some(s),
            ("solver", HyperValue::None) => params.solver = None,
            ("solver_options", HyperValue::Mapping(v)) => params.solver_options = Some(v),
            ("solver_options", HyperValue::None) => params.solver_options = None,
            (name, value) => {
                return match HasHyperparameters::<F>::constraints_of(self, name) {
                    Some(constraints) => Err(invalid_parameter(name, &value, &constraints)),
                    None => Err(EstimatorError::UnknownParameter(name.to_string())),
                }
            }
        }
        Ok(())
    }
}

/// Constraint of the hyperparameters scaling a penalty: `[0, inf)`.
pub(crate) fn nonneg_real<F: Float>() -> ParamConstraint<F> {
    ParamConstraint::Interval(Interval::real(Some(F::zero()), None, Closed::Left))
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function:
/// ```ignore
/// 1 / (2 * n_samples) * ||y - X beta||^2_2
///     + 2 * n_samples * eta * ||W beta||^2_2
/// ```
/// where `W` is the identity unless a Tikhonov matrix is given.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeParams<F> {
    base: CvxParams,
    eta: F,
    tikhonov_w: Option<Array2<F>>,
}

impl<F: Float> Default for RidgeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure a Ridge model
impl<F: Float> RidgeParams<F> {
    pub fn new() -> RidgeParams<F> {
        RidgeParams {
            base: CvxParams::new(),
            eta: F::one(),
            tikhonov_w: None,
        }
    }

    /// Set the regularization strength. It can be changed between warm
    /// started fits without rebuilding the problem.
    /// Defaults to `1` if not set.
    pub fn eta(mut self, eta: F) -> Self {
        self.eta = eta;
        self
    }

    /// Set the Tikhonov matrix `W`, of shape `(n_rows, n_features)`.
    pub fn tikhonov_w(mut self, tikhonov_w: Array2<F>) -> Self {
        self.tikhonov_w = Some(tikhonov_w);
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.base = self.base.fit_intercept(fit_intercept);
        self
    }

    pub fn copy_x(mut self, copy_x: bool) -> Self {
        self.base = self.base.copy_x(copy_x);
        self
    }

    pub fn warm_start(mut self, warm_start: bool) -> Self {
        self.base = self.base.warm_start(warm_start);
        self
    }

    pub fn solver(mut self, solver: &str) -> Self {
        self.base = self.base.solver(solver);
        self
    }

    pub fn solver_options(mut self, solver_options: Value) -> Self {
        self.base = self.base.solver_options(solver_options);
        self
    }

    /// Assembles the estimator: least squares with a Tikhonov regularizer.
    pub fn build(self) -> Result<CvxEstimator<F, LeastSquares>> {
        CvxEstimator::new(self.base, LeastSquares::new())?
            .with_regularizer(Tikhonov::new(self.eta, self.tikhonov_w))
    }
}

/// A hyper-parameter set during construction
///
/// Configures and minimizes the following objective function:
/// ```ignore
/// 1 / (2 * n_samples) * ||y - X beta||^2_2
///     + alpha * ||beta||_1
/// ```
/// `alpha` is either a scalar or one weight per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct LassoParams<F> {
    base: CvxParams,
    alpha: ParameterValue<F>,
    positive: bool,
}

impl<F: Float> Default for LassoParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure a Lasso model
impl<F: Float> LassoParams<F> {
    pub fn new() -> LassoParams<F> {
        LassoParams {
            base: CvxParams::new(),
            alpha: ParameterValue::Scalar(F::one()),
            positive: false,
        }
    }

    /// Set the regularization hyperparameter. A higher value yields sparser
    /// solutions.
    /// Defaults to `1` if not set.
    pub fn alpha(mut self, alpha: F) -> Self {
        self.alpha = ParameterValue::Scalar(alpha);
        self
    }

    /// Set one regularization weight per feature.
    pub fn feature_weights(mut self, alpha: ndarray::Array1<F>) -> Self {
        self.alpha = ParameterValue::Vector(alpha);
        self
    }

    /// Constrain the coefficients to be non-negative.
    /// Defaults to `false` if not set.
    pub fn positive(mut self, positive: bool) -> Self {
        self.positive = positive;
        self
    }

    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.base = self.base.fit_intercept(fit_intercept);
        self
    }

    pub fn copy_x(mut self, copy_x: bool) -> Self {
        self.base = self.base.copy_x(copy_x);
        self
    }

    pub fn warm_start(mut self, warm_start: bool) -> Self {
        self.base = self.base.warm_start(warm_start);
        self
    }

    pub fn solver(mut self, solver: &str) -> Self {
        self.base = self.base.solver(solver);
        self
    }

    pub fn solver_options(mut self, solver_options: Value) -> Self {
        self.base = self.base.solver_options(solver_options);
        self
    }

    /// Assembles the estimator: least squares with an L1 regularizer.
    pub fn build(self) -> Result<CvxEstimator<F, LeastSquares>> {
        CvxEstimator::new(self.base, LeastSquares::new().positive(self.positive))?
            .with_regularizer(L1::new(self.alpha))
    }
}
