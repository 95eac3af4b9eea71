use thiserror::Error;

use crate::datasets::DatasetError;
use crate::expressions::{ExpressionError, ParameterError};
use crate::problem::ProblemError;
use crate::solvers::SolverError;

/// Simplified `Result` using [`EstimatorError`] as error type
pub type Result<T> = std::result::Result<T, EstimatorError>;

/// Error variants from hyperparameter configuration, problem assembly or
/// model estimation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    /// A hyperparameter value violates every one of its declared constraints
    #[error("the {name} parameter must be {allowed}, got {value}")]
    InvalidParameter {
        name: String,
        value: String,
        allowed: String,
    },
    #[error("unknown parameter {0}")]
    UnknownParameter(String),
    #[error("solver_options must be a mapping, got {0}")]
    InvalidSolverOptions(String),
    #[error("parameter {0} is declared by more than one component")]
    DuplicateParameter(String),
    /// The problem has no live parameter for a solver-parameterized
    /// hyperparameter, it must be rebuilt before values can be pushed
    #[error("no optimization parameter named {0} in the assembled problem")]
    MissingParameter(String),
    #[error("the estimator is not fitted yet, call fit before using it")]
    NotFitted,
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}
