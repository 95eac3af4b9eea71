//! Convex minimization problems over a single decision variable.
//!
//! A [`Problem`] keeps its objective and constraints in symbolic form.
//! Every call to [`Problem::solve`] compiles them into a
//! [`QuadraticProgram`] from the parameters' *current* values, so assigning
//! new parameter values between two solves is enough to solve a different
//! instance of the same problem.

use log::{debug, warn};
use ndarray::Array1;
use thiserror::Error;

use crate::expressions::{Constraint, Expression, ExpressionError, ParameterError, TermKind, Variable};
use crate::solvers::{
    solver_backend, QuadraticProgram, SolveStatus, SolverError, SolverOptions,
};
use crate::Float;

#[cfg(test)]
mod tests;

/// Error variants raised while assembling or solving a [`Problem`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    #[error("the objective is not convex, check the sign of the parameters scaling it")]
    NotConvex,
    #[error("the objective and constraints must all refer to the decision variable")]
    VariableMismatch,
    #[error("solver {solver} failed with status {status}")]
    OptimizationFailed {
        solver: &'static str,
        status: SolveStatus,
    },
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// A convex problem: minimize `objective` subject to `constraints`.
#[derive(Debug, Clone)]
pub struct Problem<F> {
    variable: Variable<F>,
    objective: Expression<F>,
    constraints: Vec<Constraint<F>>,
}

/// Summary of a successful solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport<F> {
    /// The minimizer, also written to the decision variable.
    pub solution: Array1<F>,
    pub solver: &'static str,
    pub status: SolveStatus,
    pub objective: F,
    pub iterations: usize,
}

impl<F: Float> Problem<F> {
    /// Creates the problem of minimizing `objective` over `variable`.
    ///
    /// The objective must be convex for every admissible value of its
    /// parameters, and every term and constraint must refer to `variable`.
    pub fn minimize(
        variable: &Variable<F>,
        objective: Expression<F>,
        constraints: Option<Vec<Constraint<F>>>,
    ) -> Result<Self, ProblemError> {
        let constraints = constraints.unwrap_or_default();
        if !objective.is_convex() {
            return Err(ProblemError::NotConvex);
        }
        let terms_match = objective
            .terms()
            .iter()
            .all(|term| term.variable().same_as(variable));
        let constraints_match = constraints.iter().all(|c| c.variable().same_as(variable));
        if !(terms_match && constraints_match) {
            return Err(ProblemError::VariableMismatch);
        }
        Ok(Problem {
            variable: variable.clone(),
            objective,
            constraints,
        })
    }

    pub fn variable(&self) -> &Variable<F> {
        &self.variable
    }

    pub fn objective(&self) -> &Expression<F> {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint<F>] {
        &self.constraints
    }

    /// Compiles the problem into canonical form with the current parameter
    /// values.
    ///
    /// `s * ||A beta - b||^2` contributes `2s A^T A` to `P`, `-2s A^T b` to `q`
    /// and `s b^T b` to `r`. Bounds of several constraints are intersected.
    pub fn compile(&self) -> Result<QuadraticProgram<F>, ProblemError> {
        let n_features = self.variable.len();
        let mut qp = QuadraticProgram::zeros(n_features);
        let two = F::cast(2.);

        for term in self.objective.terms() {
            let scale = term.scale.value()?;
            match &term.kind {
                TermKind::SumSquares(affine) => {
                    let A = affine.matrix();
                    let b = affine.offset();
                    qp.P.scaled_add(two * scale, &A.t().dot(A));
                    qp.q.scaled_add(-two * scale, &A.t().dot(b));
                    qp.r += scale * b.dot(b);
                }
                TermKind::Norm1 { weights, .. } => {
                    let weights = match weights {
                        Some(parameter) => parameter.vector_value(n_features)?,
                        None => Array1::ones(n_features),
                    };
                    qp.l1.scaled_add(scale, &weights);
                }
                TermKind::Linear { c, .. } => qp.q.scaled_add(scale, c),
            }
        }

        for constraint in self.constraints.iter() {
            qp.lower.zip_mut_with(constraint.lower(), |lo, &c| *lo = F::max(*lo, c));
            qp.upper.zip_mut_with(constraint.upper(), |hi, &c| *hi = F::min(*hi, c));
        }

        Ok(qp)
    }

    /// Solves the problem with the named backend (the default one when
    /// `None`). With `warm_start`, the solver starts from the variable's value
    /// left by the previous solve.
    ///
    /// On success the solution is written to the decision variable. Solves
    /// that run out of iterations are accepted with a warning. The variable is
    /// left untouched on failure.
    pub fn solve(
        &self,
        solver: Option<&str>,
        options: &SolverOptions<F>,
        warm_start: bool,
    ) -> Result<SolveReport<F>, ProblemError> {
        let backend = solver_backend::<F>(solver)?;
        let qp = self.compile()?;
        let initial = if warm_start {
            self.variable.value()
        } else {
            None
        };

        debug!(
            "solving problem with {} features using {} (warm start: {})",
            qp.n_features(),
            backend.name(),
            initial.is_some()
        );
        let solution = backend.solve(&qp, options, initial.as_ref().map(|w| w.view()))?;

        let (w, objective) = match (solution.status, solution.w, solution.objective) {
            (status, Some(w), Some(objective)) if status.is_solved() => (w, objective),
            (status, ..) => {
                return Err(ProblemError::OptimizationFailed {
                    solver: backend.name(),
                    status,
                })
            }
        };
        if solution.status == SolveStatus::OptimalInaccurate {
            warn!(
                "solver {} did not converge after {} iterations, consider increasing max_iter",
                backend.name(),
                solution.iterations
            );
        }
        debug!(
            "solver {} finished with status {} after {} iterations, objective {}",
            backend.name(),
            solution.status,
            solution.iterations,
            objective
        );

        self.variable.set_value(w.clone());
        Ok(SolveReport {
            solution: w,
            solver: backend.name(),
            status: solution.status,
            objective,
            iterations: solution.iterations,
        })
    }
}
