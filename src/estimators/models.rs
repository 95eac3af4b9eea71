use ndarray::{ArrayView1, ArrayView2};

use super::builder::ProblemBuilder;
use super::declarations::{
    invalid_parameter, Declarations, HasHyperparameters, HyperValue, ParamConstraint,
};
use super::error::{EstimatorError, Result};
use super::hyperparams::{LassoParams, RidgeParams};
use super::translator::CvxParameters;
use crate::expressions::{sum_squares, AffineExpression, Constraint, Expression, Variable};
use crate::Float;

/// Auxiliaries of [`LeastSquares`].
#[derive(Debug, Clone)]
pub struct LeastSquaresAuxiliaries<F> {
    /// `X @ beta - y`
    pub residual: AffineExpression<F>,
}

/// Ordinary least squares objective `1 / (2 * n_samples) * ||X beta - y||^2`,
/// optionally restricted to non-negative coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeastSquares {
    positive: bool,
}

impl LeastSquares {
    pub fn new() -> Self {
        LeastSquares { positive: false }
    }

    /// Constrain the coefficients to be non-negative.
    pub fn positive(mut self, positive: bool) -> Self {
        self.positive = positive;
        self
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }
}

impl<F: Float> HasHyperparameters<F> for LeastSquares {
    fn parameter_constraints(&self) -> Declarations<F> {
        vec![("positive", vec![ParamConstraint::Boolean])]
    }

    fn get_param(&self, name: &str) -> Option<HyperValue<F>> {
        match name {
            "positive" => Some(HyperValue::Bool(self.positive)),
            _ => None,
        }
    }

    fn set_param(&mut self, name: &str, value: HyperValue<F>) -> Result<()> {
        match (name, value) {
            ("positive", HyperValue::Bool(positive)) => {
                self.positive = positive;
                Ok(())
            }
            ("positive", value) => Err(invalid_parameter(
                name,
                &value,
                &[ParamConstraint::Boolean],
            )),
            _ => Err(EstimatorError::UnknownParameter(name.to_string())),
        }
    }
}

impl<F: Float> ProblemBuilder<F> for LeastSquares {
    type Auxiliaries = LeastSquaresAuxiliaries<F>;

    fn generate_auxiliaries(
        &self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        beta: &Variable<F>,
        _parameters: &CvxParameters<F>,
    ) -> Result<Option<Self::Auxiliaries>> {
        let residual = AffineExpression::matmul(x.to_owned(), beta)?.minus(y)?;
        Ok(Some(LeastSquaresAuxiliaries { residual }))
    }

    fn generate_objective(
        &self,
        x: ArrayView2<F>,
        y: ArrayView1<F>,
        beta: &Variable<F>,
        _parameters: &CvxParameters<F>,
        auxiliaries: Option<&Self::Auxiliaries>,
    ) -> Result<Expression<F>> {
        let residual = match auxiliaries {
            Some(auxiliaries) => auxiliaries.residual.clone(),
            None => AffineExpression::matmul(x.to_owned(), beta)?.minus(y)?,
        };
        let n_samples = F::cast(x.nrows());
        Ok(sum_squares(residual).scaled(F::one() / (F::cast(2.) * n_samples)))
    }

    fn generate_constraints(
        &self,
        _x: ArrayView2<F>,
        _y: ArrayView1<F>,
        beta: &Variable<F>,
        _parameters: &CvxParameters<F>,
        _auxiliaries: Option<&Self::Auxiliaries>,
    ) -> Result<Option<Vec<Constraint<F>>>> {
        if self.positive {
            Ok(Some(vec![Constraint::nonneg(beta)]))
        } else {
            Ok(None)
        }
    }
}

/// Least squares with a Tikhonov (ridge) penalty.
pub struct Ridge;

impl Ridge {
    /// This method instantiates a Ridge estimator builder with default
    /// parameters.
    pub fn params<F: Float>() -> RidgeParams<F> {
        RidgeParams::new()
    }
}

/// Least squares with an L1 penalty. The L1-regularization used yields sparse
/// solutions.
pub struct Lasso;

impl Lasso {
    /// This method instantiates a Lasso estimator builder with default
    /// parameters.
    pub fn params<F: Float>() -> LassoParams<F> {
        LassoParams::new()
    }
}
