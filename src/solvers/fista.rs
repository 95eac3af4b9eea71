use log::{debug, info, trace};
use ndarray::{Array1, ArrayView1, Zip};

use super::{QuadraticProgram, Solution, SolveStatus, SolverBackend, SolverError, SolverOptions};
use crate::helpers::prox::prox_l1_box;
use crate::Float;

/// Accelerated proximal gradient descent (FISTA).
///
/// The step size is the inverse of a Gershgorin upper bound on the largest
/// eigenvalue of `P`, so no eigendecomposition is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fista;

impl<F: Float> SolverBackend<F> for Fista {
    fn name(&self) -> &'static str {
        "FISTA"
    }

    fn solve(
        &self,
        qp: &QuadraticProgram<F>,
        options: &SolverOptions<F>,
        initial: Option<ArrayView1<F>>,
    ) -> Result<Solution<F>, SolverError> {
        if qp.is_infeasible() {
            return Ok(Solution::failed(SolveStatus::Infeasible));
        }
        if let Some(j) = qp.unbounded_coordinate() {
            debug!("objective decreases without bound along coordinate {}", j);
            return Ok(Solution::failed(SolveStatus::Unbounded));
        }

        let lipschitz = gershgorin_bound(qp);
        let tol = options.get_tol() * qp.tolerance_scale();
        let verbose = options.get_verbose();

        let mut w = qp.initial_point(initial);
        let mut z = w.clone();
        let mut w_checkpoint = w.clone();
        let mut t = F::one();

        for iter in 0..options.get_max_iter() {
            let grad = qp.P.dot(&z) + &qp.q;
            let mut w_next = Array1::<F>::zeros(w.len());
            Zip::indexed(&mut w_next).for_each(|j, w_j| {
                *w_j = prox_l1_box(
                    z[j] - grad[j] / lipschitz,
                    qp.l1[j] / lipschitz,
                    qp.lower[j],
                    qp.upper[j],
                );
            });

            let t_next = (F::one() + (F::one() + F::cast(4.) * t * t).sqrt()) / F::cast(2.);
            let momentum = (t - F::one()) / t_next;
            z = &w_next + &((&w_next - &w) * momentum);
            w = w_next;
            t = t_next;

            if !w.iter().all(|wj| wj.is_finite()) {
                return Err(SolverError::Numerical {
                    solver: "FISTA",
                    reason: "iterates are not finite",
                });
            }

            if iter % 10 == 0 || iter + 1 == options.get_max_iter() {
                let Pw = qp.P.dot(&w);
                let (_, violation) = qp.optimality_violation(w.view(), Pw.view());
                if verbose {
                    info!(
                        "iteration {}, objective {}, optimality violation {}",
                        iter + 1,
                        qp.objective(w.view(), Pw.view()),
                        violation
                    );
                } else {
                    trace!("iteration {}, optimality violation {}", iter + 1, violation);
                }
                if violation <= tol {
                    let objective = qp.objective(w.view(), Pw.view());
                    return Ok(Solution {
                        status: SolveStatus::Optimal,
                        w: Some(w),
                        objective: Some(objective),
                        iterations: iter + 1,
                    });
                }
                if iter + 1 < options.get_max_iter() {
                    w_checkpoint.assign(&w);
                }
            }
        }

        if qp.is_unbounded_along(w_checkpoint.view(), w.view()) {
            debug!("iterates drift along a direction of unbounded decrease");
            return Ok(Solution::failed(SolveStatus::Unbounded));
        }
        let Pw = qp.P.dot(&w);
        let objective = qp.objective(w.view(), Pw.view());
        Ok(Solution {
            status: SolveStatus::OptimalInaccurate,
            w: Some(w),
            objective: Some(objective),
            iterations: options.get_max_iter(),
        })
    }
}

/// Largest absolute row sum of `P`, an upper bound on its spectral radius.
/// Falls back to one for the zero matrix.
pub fn gershgorin_bound<F: Float>(qp: &QuadraticProgram<F>) -> F {
    let bound = qp
        .P
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|p| p.abs()).sum::<F>())
        .fold(F::zero(), F::max);
    if bound > F::zero() {
        bound
    } else {
        F::one()
    }
}
