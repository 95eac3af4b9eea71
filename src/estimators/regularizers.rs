use ndarray::Array2;

use super::builder::{BuildContext, Regularizer};
use super::declarations::{
    invalid_parameter, Declarations, HasHyperparameters, HyperValue, ParamConstraint,
};
use super::error::{EstimatorError, Result};
use super::hyperparams::nonneg_real;
use crate::expressions::{
    norm1, sum_squares, weighted_norm1, AffineExpression, Expression, Parameter, ParameterValue,
};
use crate::Float;

fn live_parameter<'a, F: Float, A>(
    context: &'a BuildContext<F, A>,
    name: &str,
) -> Result<&'a Parameter<F>> {
    context
        .parameters
        .get(name)
        .ok_or_else(|| EstimatorError::MissingParameter(name.to_string()))
}

/// Tikhonov regularization: adds
/// `2 * n_samples * eta * ||W @ beta||^2` to the objective. The `2 * n_samples`
/// factor keeps the scale of `eta` independent of the dataset size.
#[derive(Debug, Clone, PartialEq)]
pub struct Tikhonov<F> {
    eta: F,
    tikhonov_w: Option<Array2<F>>,
}

impl<F: Float> Tikhonov<F> {
    /// `W` defaults to the identity when `tikhonov_w` is `None`.
    pub fn new(eta: F, tikhonov_w: Option<Array2<F>>) -> Self {
        Tikhonov { eta, tikhonov_w }
    }

    pub fn eta(&self) -> F {
        self.eta
    }

    pub fn tikhonov_w(&self) -> Option<&Array2<F>> {
        self.tikhonov_w.as_ref()
    }
}

impl<F: Float> HasHyperparameters<F> for Tikhonov<F> {
    fn parameter_constraints(&self) -> Declarations<F> {
        vec![(
            "tikhonov_w",
            vec![ParamConstraint::ArrayLike, ParamConstraint::NoneValue],
        )]
    }

    fn cvx_parameter_constraints(&self) -> Declarations<F> {
        vec![("eta", vec![nonneg_real()])]
    }

    fn get_param(&self, name: &str) -> Option<HyperValue<F>> {
        match name {
            "eta" => Some(HyperValue::Real(self.eta)),
            "tikhonov_w" => Some(
                self.tikhonov_w
                    .clone()
                    .map_or(HyperValue::None, HyperValue::Matrix),
            ),
            _ => None,
        }
    }

    fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()> {
        match (name, value) {
            ("eta", value) => {
                self.eta = value
                    .as_real()
                    .ok_or_else(|| invalid_parameter(name, &value, &[nonneg_real()]))?;
            }
            ("tikhonov_w", HyperValue::Matrix(w)) => self.tikhonov_w = Some(w),
            ("tikhonov_w", HyperValue::None) => self.tikhonov_w = None,
            ("tikhonov_w", value) => {
                return Err(invalid_parameter(
                    name,
                    &value,
                    &[ParamConstraint::ArrayLike, ParamConstraint::NoneValue],
                ))
            }
            _ => return Err(EstimatorError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }
}

impl<F: Float, A> Regularizer<F, A> for Tikhonov<F> {
    fn apply(&self, objective: Expression<F>, context: &BuildContext<F, A>) -> Result<Expression<F>> {
        let n_samples = context.x.nrows();
        let n_features = context.x.ncols();
        let eta = live_parameter(context, "eta")?;
        let tikhonov_w = match &self.tikhonov_w {
            Some(w) => w.clone(),
            None => Array2::eye(n_features),
        };
        let penalty = sum_squares(AffineExpression::matmul(tikhonov_w, context.beta)?)
            .scaled(F::cast(2 * n_samples))
            .times(eta)?;
        Ok(objective + penalty)
    }
}

/// L1 regularization: adds `alpha * ||beta||_1` to the objective, or
/// `sum_j alpha_j * |beta_j|` when `alpha` holds one weight per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct L1<F> {
    alpha: ParameterValue<F>,
}

impl<F: Float> L1<F> {
    pub fn new(alpha: ParameterValue<F>) -> Self {
        L1 { alpha }
    }

    pub fn alpha(&self) -> &ParameterValue<F> {
        &self.alpha
    }
}

impl<F: Float> HasHyperparameters<F> for L1<F> {
    fn cvx_parameter_constraints(&self) -> Declarations<F> {
        vec![("alpha", vec![nonneg_real(), ParamConstraint::ArrayLike])]
    }

    fn get_param(&self, name: &str) -> Option<HyperValue<F>> {
        match (name, &self.alpha) {
            ("alpha", ParameterValue::Scalar(alpha)) => Some(HyperValue::Real(*alpha)),
            ("alpha", ParameterValue::Vector(alpha)) => Some(HyperValue::Array(alpha.clone())),
            _ => None,
        }
    }

    fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()> {
        if name != "alpha" {
            return Err(EstimatorError::UnknownParameter(name.to_string()));
        }
        self.alpha = match value {
            HyperValue::Array(alpha) => ParameterValue::Vector(alpha),
            value => ParameterValue::Scalar(value.as_real().ok_or_else(|| {
                invalid_parameter(name, &value, &[nonneg_real(), ParamConstraint::ArrayLike])
            })?),
        };
        Ok(())
    }
}

impl<F: Float, A> Regularizer<F, A> for L1<F> {
    fn apply(&self, objective: Expression<F>, context: &BuildContext<F, A>) -> Result<Expression<F>> {
        let alpha = live_parameter(context, "alpha")?;
        let penalty = match alpha.shape() {
            Some(_) => weighted_norm1(context.beta, alpha)?,
            None => norm1(context.beta).times(alpha)?,
        };
        Ok(objective + penalty)
    }
}
