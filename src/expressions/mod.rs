//! Building blocks of the optimization problems: the decision variable, live
//! parameters, convex objective expressions and bound constraints.

use thiserror::Error;

mod constraint;
mod expression;
mod parameter;
mod variable;

#[cfg(test)]
mod tests;

pub use constraint::Constraint;
pub use expression::{
    linear, norm1, sum_squares, weighted_norm1, AffineExpression, Expression, Scale, Term,
    TermKind,
};
pub use parameter::{Parameter, ParameterAttributes, ParameterValue, Sign};
pub use variable::Variable;

/// Error variants raised when assigning a value to a [`Parameter`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("parameter {name} must be {sign}")]
    SignViolation { name: String, sign: Sign },
    #[error("parameter {name} must hold integer values")]
    NotInteger { name: String },
    #[error("parameter {name} must hold boolean values")]
    NotBoolean { name: String },
    #[error("parameter {name} must be a scalar")]
    NotScalar { name: String },
    #[error("parameter {name} must be finite")]
    NonFinite { name: String },
    #[error("parameter {name} expects a {expected}, got a {found}")]
    ShapeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    #[error("parameter {name} cannot be both {first} and {second}")]
    ConflictingHints {
        name: String,
        first: Sign,
        second: Sign,
    },
}

/// Error variants raised while building expressions and constraints.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("{what} has size {found}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("bounds must not be NaN")]
    NanBound,
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
