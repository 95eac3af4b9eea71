//! Solver backends.
//!
//! Every backend minimizes the same canonical problem, a [`QuadraticProgram`]:
//! ```ignore
//! 1/2 * w^T P w + q^T w + r + sum_j l1_j * |w_j|
//!     subject to lower <= w <= upper
//! ```
//! Backends are selected by name from a read-only registry
//! ([`installed_solvers`]).

use std::fmt;

use ndarray::{Array1, Array2, ArrayView1};
use serde_json::Value;
use thiserror::Error;

use crate::helpers::helpers::max_abs;
use crate::helpers::prox::prox_l1_box;
use crate::Float;

mod cd;
mod fista;

#[cfg(test)]
mod tests;

pub use cd::CoordinateDescent;
pub use fista::Fista;

const INSTALLED_SOLVERS: [&str; 2] = ["CD", "FISTA"];

/// Largest number of iterates combined by Anderson extrapolation.
pub const MAX_ANDERSON_K: usize = 100;

/// Names of the solver backends compiled into the crate.
pub fn installed_solvers() -> &'static [&'static str] {
    &INSTALLED_SOLVERS
}

/// Backend used when no solver is configured.
pub fn default_solver() -> &'static str {
    INSTALLED_SOLVERS[0]
}

/// Returns the backend registered under `name`, or the default backend.
pub fn solver_backend<F: Float>(name: Option<&str>) -> Result<Box<dyn SolverBackend<F>>, SolverError> {
    match name.unwrap_or(default_solver()) {
        "CD" => Ok(Box::new(CoordinateDescent)),
        "FISTA" => Ok(Box::new(Fista)),
        other => Err(SolverError::UnknownSolver(other.to_string())),
    }
}

/// Error variants raised by solver selection, option parsing or the solvers
/// themselves.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("unknown solver {0}, installed solvers are CD and FISTA")]
    UnknownSolver(String),
    #[error("solver options must be a mapping")]
    NotAMapping,
    #[error("invalid solver option {key}: {reason}")]
    InvalidOption { key: String, reason: String },
    #[error("numerical failure in solver {solver}: {reason}")]
    Numerical {
        solver: &'static str,
        reason: &'static str,
    },
}

/// Outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    /// The iteration budget ran out before the stopping criterion was met.
    OptimalInaccurate,
    Infeasible,
    Unbounded,
}

impl SolveStatus {
    /// Whether the solution can be used as coefficients.
    pub fn is_solved(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::OptimalInaccurate => "optimal_inaccurate",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
        };
        write!(f, "{}", s)
    }
}

/// The result returned by a backend. `w` and `objective` are only set when
/// the status is a solved one.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<F> {
    pub status: SolveStatus,
    pub w: Option<Array1<F>>,
    pub objective: Option<F>,
    pub iterations: usize,
}

impl<F: Float> Solution<F> {
    fn failed(status: SolveStatus) -> Self {
        Solution {
            status,
            w: None,
            objective: None,
            iterations: 0,
        }
    }
}

/// Options shared by the solver backends.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions<F> {
    max_iter: usize,
    tol: F,
    use_acceleration: bool,
    K: usize,
    verbose: bool,
}

impl<F: Float> Default for SolverOptions<F> {
    fn default() -> Self {
        SolverOptions {
            max_iter: 10_000,
            tol: F::cast(1e-10),
            use_acceleration: true,
            K: 5,
            verbose: false,
        }
    }
}

impl<F: Float> SolverOptions<F> {
    /// Parses options from a JSON mapping, e.g. `{"max_iter": 500, "tol": 1e-8}`.
    ///
    /// Recognized keys are `max_iter`, `tol`, `use_acceleration`, `K` and
    /// `verbose`. Unknown keys and mistyped values are rejected rather than
    /// silently ignored.
    pub fn from_json(options: Option<&Value>) -> Result<Self, SolverError> {
        let mut parsed = SolverOptions::default();
        let map = match options {
            None => return Ok(parsed),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(SolverError::NotAMapping),
        };
        for (key, value) in map.iter() {
            let invalid = |reason: &str| SolverError::InvalidOption {
                key: key.clone(),
                reason: reason.to_string(),
            };
            match key.as_str() {
                "max_iter" => {
                    let max_iter = value
                        .as_u64()
                        .filter(|&m| m > 0)
                        .ok_or_else(|| invalid("expected a positive integer"))?;
                    parsed.max_iter = max_iter as usize;
                }
                "tol" => {
                    let tol = value
                        .as_f64()
                        .filter(|&t| t > 0. && t.is_finite())
                        .ok_or_else(|| invalid("expected a positive float"))?;
                    parsed.tol = F::cast(tol);
                }
                "use_acceleration" => {
                    parsed.use_acceleration =
                        value.as_bool().ok_or_else(|| invalid("expected a boolean"))?;
                }
                "K" => {
                    let K = value
                        .as_u64()
                        .filter(|&k| k > 0 && k <= MAX_ANDERSON_K as u64)
                        .ok_or_else(|| invalid("expected an integer between 1 and 100"))?;
                    parsed.K = K as usize;
                }
                "verbose" => {
                    parsed.verbose = value.as_bool().ok_or_else(|| invalid("expected a boolean"))?;
                }
                _ => return Err(invalid("unknown option")),
            }
        }
        Ok(parsed)
    }

    /// Set the maximum number of passes over the coordinates (or proximal
    /// gradient steps).
    /// Defaults to `10_000` if not set.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the stopping criterion (largest proximal gradient residual,
    /// relative to the magnitude of the linear term).
    /// Defaults to `1e-10` if not set.
    pub fn tol(mut self, tol: F) -> Self {
        self.tol = tol;
        self
    }

    /// Enables Anderson extrapolation of the coordinate descent iterates.
    /// Defaults to `true` if not set.
    pub fn use_acceleration(mut self, use_acceleration: bool) -> Self {
        self.use_acceleration = use_acceleration;
        self
    }

    /// Set the number of iterates used for extrapolation, at most
    /// [`MAX_ANDERSON_K`].
    /// Defaults to `5` if not set.
    pub fn K(mut self, K: usize) -> Self {
        self.K = K;
        self
    }

    /// Logs solver progress at info level instead of trace level.
    /// Defaults to `false` if not set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn get_max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn get_tol(&self) -> F {
        self.tol
    }

    pub fn get_use_acceleration(&self) -> bool {
        self.use_acceleration
    }

    pub fn get_K(&self) -> usize {
        self.K
    }

    pub fn get_verbose(&self) -> bool {
        self.verbose
    }
}

/// A solver backend.
pub trait SolverBackend<F: Float> {
    fn name(&self) -> &'static str;

    /// Minimizes `qp`, starting from `initial` when given (warm start).
    fn solve(
        &self,
        qp: &QuadraticProgram<F>,
        options: &SolverOptions<F>,
        initial: Option<ArrayView1<F>>,
    ) -> Result<Solution<F>, SolverError>;
}

/// The canonical problem handed to the solver backends.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticProgram<F> {
    pub P: Array2<F>,
    pub q: Array1<F>,
    pub r: F,
    pub l1: Array1<F>,
    pub lower: Array1<F>,
    pub upper: Array1<F>,
}

impl<F: Float> QuadraticProgram<F> {
    /// The unconstrained, unregularized program with zero objective.
    pub fn zeros(n_features: usize) -> Self {
        QuadraticProgram {
            P: Array2::zeros((n_features, n_features)),
            q: Array1::zeros(n_features),
            r: F::zero(),
            l1: Array1::zeros(n_features),
            lower: Array1::from_elem(n_features, F::neg_infinity()),
            upper: Array1::from_elem(n_features, F::infinity()),
        }
    }

    pub fn n_features(&self) -> usize {
        self.q.len()
    }

    /// Objective value at `w`, given the precomputed product `Pw = P @ w`.
    pub fn objective(&self, w: ArrayView1<F>, Pw: ArrayView1<F>) -> F {
        let l1_value: F = w
            .iter()
            .zip(self.l1.iter())
            .map(|(&wj, &l1j)| l1j * wj.abs())
            .sum();
        F::cast(0.5) * w.dot(&Pw) + self.q.dot(&w) + self.r + l1_value
    }

    /// Whether the bounds describe an empty set.
    pub fn is_infeasible(&self) -> bool {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .any(|(&lo, &hi)| lo > hi)
    }

    /// Finds a coordinate along which the objective decreases without bound.
    ///
    /// A zero diagonal entry of the positive semi-definite `P` means the whole
    /// row is zero, so the objective is piecewise linear in that coordinate.
    pub fn unbounded_coordinate(&self) -> Option<usize> {
        (0..self.n_features()).find(|&j| {
            if self.P[[j, j]] != F::zero() {
                return false;
            }
            let (g, l1) = (self.q[j], self.l1[j]);
            (g + l1 < F::zero() && self.upper[j] == F::infinity())
                || (g - l1 > F::zero() && self.lower[j] == F::neg_infinity())
        })
    }

    /// Whether the drift from `from` to `to` certifies an unbounded objective:
    /// the step, restricted to the directions the bounds leave open, lies in
    /// the null space of `P` and decreases the linear part. Along such a ray
    /// the objective falls linearly forever.
    pub fn is_unbounded_along(&self, from: ArrayView1<F>, to: ArrayView1<F>) -> bool {
        let drift = &to - &from;
        let drift_norm = max_abs(drift.view());
        if !(drift_norm > F::zero() && drift_norm.is_finite()) {
            return false;
        }
        let mut u = drift / drift_norm;
        for ((uj, &lo), &hi) in u.iter_mut().zip(self.lower.iter()).zip(self.upper.iter()) {
            let blocked_down = lo > F::neg_infinity() && *uj < F::zero();
            let blocked_up = hi < F::infinity() && *uj > F::zero();
            if blocked_down || blocked_up {
                *uj = F::zero();
            }
        }
        // most of the drift must survive the bounds
        if max_abs(u.view()) < F::cast(0.5) {
            return false;
        }

        let rtol = F::epsilon().sqrt();
        let P_scale = self.P.fold(F::one(), |acc, &p| F::max(acc, p.abs()));
        if max_abs(self.P.dot(&u).view()) > rtol * P_scale {
            return false;
        }
        let slope = self.q.dot(&u)
            + self
                .l1
                .iter()
                .zip(u.iter())
                .map(|(&l1j, &uj)| l1j * uj.abs())
                .sum::<F>();
        slope < -rtol * self.tolerance_scale()
    }

    /// Minimizer of the objective along coordinate `j` with all other
    /// coordinates fixed, given the partial gradient `grad_j` of the smooth
    /// part.
    pub fn coordinate_minimizer(&self, w_j: F, grad_j: F, j: usize) -> F {
        let (lo, hi, l1) = (self.lower[j], self.upper[j], self.l1[j]);
        let curvature = self.P[[j, j]];
        if curvature > F::zero() {
            return prox_l1_box(w_j - grad_j / curvature, l1 / curvature, lo, hi);
        }
        // piecewise linear in w_j: slope g + l1 on the right, g - l1 on the left
        if grad_j + l1 < F::zero() {
            hi
        } else if grad_j - l1 > F::zero() {
            lo
        } else {
            prox_l1_box(F::zero(), F::zero(), lo, hi)
        }
    }

    /// Distance of each coordinate to optimality, measured by the proximal
    /// gradient residual, along with the largest distance. It is zero exactly
    /// at the minimizers of the program.
    pub fn optimality_violation(&self, w: ArrayView1<F>, Pw: ArrayView1<F>) -> (Array1<F>, F) {
        let dist = Array1::from_iter((0..self.n_features()).map(|j| {
            let curvature = self.P[[j, j]];
            let step = if curvature > F::zero() {
                curvature
            } else {
                F::one()
            };
            let grad_j = Pw[j] + self.q[j];
            let prox = prox_l1_box(
                w[j] - grad_j / step,
                self.l1[j] / step,
                self.lower[j],
                self.upper[j],
            );
            step * (w[j] - prox).abs()
        }));
        let max_dist = dist.fold(F::zero(), |max_val, &d| F::max(max_val, d));
        (dist, max_dist)
    }

    /// Scale against which the stopping tolerance is compared.
    pub fn tolerance_scale(&self) -> F {
        F::max(F::one(), max_abs(self.q.view()))
    }

    /// Projects `w` onto the bounds.
    pub fn project(&self, w: &mut Array1<F>) {
        for ((wj, &lo), &hi) in w.iter_mut().zip(self.lower.iter()).zip(self.upper.iter()) {
            *wj = F::min(F::max(*wj, lo), hi);
        }
    }

    /// Feasible starting point: the warm start when its size matches, zero
    /// otherwise, projected onto the bounds.
    pub fn initial_point(&self, initial: Option<ArrayView1<F>>) -> Array1<F> {
        let mut w = match initial {
            Some(w0) if w0.len() == self.n_features() => w0.to_owned(),
            _ => Array1::zeros(self.n_features()),
        };
        self.project(&mut w);
        w
    }
}
