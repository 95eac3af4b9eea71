use ndarray::Array1;

use super::{ExpressionError, Variable};
use crate::Float;

/// Elementwise bounds `lower <= beta <= upper` on the decision variable.
/// Infinite entries leave the corresponding side unbounded.
#[derive(Debug, Clone)]
pub struct Constraint<F> {
    variable: Variable<F>,
    lower: Array1<F>,
    upper: Array1<F>,
}

impl<F: Float> Constraint<F> {
    pub fn bounds(
        variable: &Variable<F>,
        lower: Array1<F>,
        upper: Array1<F>,
    ) -> Result<Self, ExpressionError> {
        for (what, bound) in [("lower bound", &lower), ("upper bound", &upper)] {
            if bound.len() != variable.len() {
                return Err(ExpressionError::ShapeMismatch {
                    what,
                    expected: variable.len(),
                    found: bound.len(),
                });
            }
        }
        if lower.iter().chain(upper.iter()).any(|b| b.is_nan()) {
            return Err(ExpressionError::NanBound);
        }
        Ok(Constraint {
            variable: variable.clone(),
            lower,
            upper,
        })
    }

    /// `beta >= lower`
    pub fn lower_bound(variable: &Variable<F>, lower: Array1<F>) -> Result<Self, ExpressionError> {
        let upper = Array1::from_elem(variable.len(), F::infinity());
        Constraint::bounds(variable, lower, upper)
    }

    /// `beta <= upper`
    pub fn upper_bound(variable: &Variable<F>, upper: Array1<F>) -> Result<Self, ExpressionError> {
        let lower = Array1::from_elem(variable.len(), F::neg_infinity());
        Constraint::bounds(variable, lower, upper)
    }

    /// `beta >= 0`
    pub fn nonneg(variable: &Variable<F>) -> Self {
        Constraint {
            variable: variable.clone(),
            lower: Array1::zeros(variable.len()),
            upper: Array1::from_elem(variable.len(), F::infinity()),
        }
    }

    pub fn variable(&self) -> &Variable<F> {
        &self.variable
    }

    pub fn lower(&self) -> &Array1<F> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<F> {
        &self.upper
    }
}
