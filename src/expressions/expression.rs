use std::ops::{Add, AddAssign};

use ndarray::{Array1, Array2, ArrayView1};

use super::{ExpressionError, Parameter, ParameterError, Variable};
use crate::Float;

/// An affine function of the decision variable: `A @ beta - b`.
#[derive(Debug, Clone)]
pub struct AffineExpression<F> {
    a: Array2<F>,
    b: Array1<F>,
    variable: Variable<F>,
}

impl<F: Float> AffineExpression<F> {
    /// `A @ beta`, where the number of columns of `A` must match the length of
    /// the variable.
    pub fn matmul(a: Array2<F>, variable: &Variable<F>) -> Result<Self, ExpressionError> {
        if a.ncols() != variable.len() {
            return Err(ExpressionError::ShapeMismatch {
                what: "matrix columns",
                expected: variable.len(),
                found: a.ncols(),
            });
        }
        let b = Array1::zeros(a.nrows());
        Ok(AffineExpression {
            a,
            b,
            variable: variable.clone(),
        })
    }

    /// Subtracts a constant vector from the expression.
    pub fn minus(mut self, b: ArrayView1<F>) -> Result<Self, ExpressionError> {
        if b.len() != self.a.nrows() {
            return Err(ExpressionError::ShapeMismatch {
                what: "offset length",
                expected: self.a.nrows(),
                found: b.len(),
            });
        }
        self.b = &self.b + &b;
        Ok(self)
    }

    pub fn matrix(&self) -> &Array2<F> {
        &self.a
    }

    pub fn offset(&self) -> &Array1<F> {
        &self.b
    }

    pub fn variable(&self) -> &Variable<F> {
        &self.variable
    }

    /// Evaluates the expression at the variable's current value.
    pub fn value(&self) -> Option<Array1<F>> {
        self.variable.value().map(|beta| self.a.dot(&beta) - &self.b)
    }
}

/// Product of a constant and scalar parameters, multiplying a [`Term`].
#[derive(Debug, Clone)]
pub struct Scale<F> {
    constant: F,
    parameters: Vec<Parameter<F>>,
}

impl<F: Float> Scale<F> {
    fn one() -> Self {
        Scale {
            constant: F::one(),
            parameters: Vec::new(),
        }
    }

    pub fn constant(&self) -> F {
        self.constant
    }

    pub fn parameters(&self) -> &[Parameter<F>] {
        &self.parameters
    }

    /// Current numerical value, read from the parameters' current values.
    pub fn value(&self) -> Result<F, ParameterError> {
        self.parameters
            .iter()
            .try_fold(self.constant, |acc, p| Ok(acc * p.scalar_value()?))
    }

    /// Whether the scale is non-negative for every admissible parameter value.
    pub fn is_nonneg(&self) -> bool {
        if self.constant == F::zero() {
            return true;
        }
        let mut negative = self.constant < F::zero();
        for parameter in self.parameters.iter() {
            match parameter.sign() {
                Some(sign) if sign.is_nonneg() => {}
                Some(_) => negative = !negative,
                None => return false,
            }
        }
        !negative
    }
}

/// The atoms an objective is made of.
#[derive(Debug, Clone)]
pub enum TermKind<F> {
    /// `||A @ beta - b||_2^2`
    SumSquares(AffineExpression<F>),
    /// `sum_j w_j |beta_j|`, with unit weights when `weights` is `None`.
    Norm1 {
        variable: Variable<F>,
        weights: Option<Parameter<F>>,
    },
    /// `c @ beta`
    Linear { variable: Variable<F>, c: Array1<F> },
}

/// A scaled atom.
#[derive(Debug, Clone)]
pub struct Term<F> {
    pub scale: Scale<F>,
    pub kind: TermKind<F>,
}

impl<F: Float> Term<F> {
    pub fn variable(&self) -> &Variable<F> {
        match &self.kind {
            TermKind::SumSquares(affine) => affine.variable(),
            TermKind::Norm1 { variable, .. } => variable,
            TermKind::Linear { variable, .. } => variable,
        }
    }

    /// DCP-style curvature check: convex atoms need a scale that is known to
    /// be non-negative, and weighted norms need non-negative weights.
    pub fn is_convex(&self) -> bool {
        match &self.kind {
            TermKind::Linear { .. } => true,
            TermKind::SumSquares(_) => self.scale.is_nonneg(),
            TermKind::Norm1 { weights, .. } => {
                let weights_nonneg = weights
                    .as_ref()
                    .map_or(true, |w| w.sign().map_or(false, |s| s.is_nonneg()));
                weights_nonneg && self.scale.is_nonneg()
            }
        }
    }
}

/// A scalar objective: a sum of scaled convex atoms of the decision variable.
#[derive(Debug, Clone)]
pub struct Expression<F> {
    terms: Vec<Term<F>>,
}

impl<F: Float> Default for Expression<F> {
    fn default() -> Self {
        Expression { terms: Vec::new() }
    }
}

impl<F: Float> Expression<F> {
    /// The constant zero expression.
    pub fn zero() -> Self {
        Expression::default()
    }

    fn atom(kind: TermKind<F>) -> Self {
        Expression {
            terms: vec![Term {
                scale: Scale::one(),
                kind,
            }],
        }
    }

    pub fn terms(&self) -> &[Term<F>] {
        &self.terms
    }

    /// Multiplies the expression by a constant.
    pub fn scaled(mut self, c: F) -> Self {
        for term in self.terms.iter_mut() {
            term.scale.constant *= c;
        }
        self
    }

    /// Multiplies the expression by a scalar parameter.
    pub fn times(mut self, parameter: &Parameter<F>) -> Result<Self, ExpressionError> {
        if parameter.shape().is_some() {
            return Err(ExpressionError::Parameter(ParameterError::NotScalar {
                name: parameter.name().to_string(),
            }));
        }
        for term in self.terms.iter_mut() {
            term.scale.parameters.push(parameter.clone());
        }
        Ok(self)
    }

    pub fn is_convex(&self) -> bool {
        self.terms.iter().all(|term| term.is_convex())
    }
}

impl<F: Float> Add for Expression<F> {
    type Output = Expression<F>;

    fn add(mut self, rhs: Expression<F>) -> Expression<F> {
        self.terms.extend(rhs.terms);
        self
    }
}

impl<F: Float> AddAssign for Expression<F> {
    fn add_assign(&mut self, rhs: Expression<F>) {
        self.terms.extend(rhs.terms);
    }
}

/// `||affine||_2^2`
pub fn sum_squares<F: Float>(affine: AffineExpression<F>) -> Expression<F> {
    Expression::atom(TermKind::SumSquares(affine))
}

/// `||beta||_1`
pub fn norm1<F: Float>(variable: &Variable<F>) -> Expression<F> {
    Expression::atom(TermKind::Norm1 {
        variable: variable.clone(),
        weights: None,
    })
}

/// `sum_j w_j |beta_j|` with a vector-valued weight parameter.
pub fn weighted_norm1<F: Float>(
    variable: &Variable<F>,
    weights: &Parameter<F>,
) -> Result<Expression<F>, ExpressionError> {
    match weights.shape() {
        Some(len) if len == variable.len() => Ok(Expression::atom(TermKind::Norm1 {
            variable: variable.clone(),
            weights: Some(weights.clone()),
        })),
        shape => Err(ExpressionError::ShapeMismatch {
            what: "norm weights",
            expected: variable.len(),
            found: shape.unwrap_or(1),
        }),
    }
}

/// `c @ beta`
pub fn linear<F: Float>(
    variable: &Variable<F>,
    c: Array1<F>,
) -> Result<Expression<F>, ExpressionError> {
    if c.len() != variable.len() {
        return Err(ExpressionError::ShapeMismatch {
            what: "linear coefficients",
            expected: variable.len(),
            found: c.len(),
        });
    }
    Ok(Expression::atom(TermKind::Linear {
        variable: variable.clone(),
        c,
    }))
}
