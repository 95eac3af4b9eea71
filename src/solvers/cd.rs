use log::{debug, info, trace};
use ndarray::{s, Array1, Array2, ArrayView1};

use super::{
    QuadraticProgram, Solution, SolveStatus, SolverBackend, SolverError, SolverOptions,
    MAX_ANDERSON_K,
};
use crate::helpers::helpers::solve_lin_sys;
use crate::Float;

/// Cyclic coordinate descent with Anderson acceleration.
///
/// Each epoch minimizes the objective exactly along every coordinate in turn,
/// keeping the product `P @ w` up to date. Every `K + 1` epochs, the last
/// iterates are combined into an extrapolated point, which is retained only if
/// it decreases the objective.
///
/// Reference: `https://arxiv.org/abs/2204.07826`
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateDescent;

impl<F: Float> SolverBackend<F> for CoordinateDescent {
    fn name(&self) -> &'static str {
        "CD"
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

        let n_features = qp.n_features();
        let K = options.get_K();
        if K == 0 || K > MAX_ANDERSON_K {
            return Err(SolverError::InvalidOption {
                key: "K".to_string(),
                reason: "expected an integer between 1 and 100".to_string(),
            });
        }
        let tol = options.get_tol() * qp.tolerance_scale();
        let verbose = options.get_verbose();

        let mut w = qp.initial_point(initial);
        let mut Pw = qp.P.dot(&w);
        let mut w_checkpoint = w.clone();
        let mut last_K_w = Array2::<F>::zeros((K + 1, n_features));

        for epoch in 0..options.get_max_iter() {
            cd_epoch(qp, &mut w, &mut Pw);

            if options.get_use_acceleration() {
                anderson_accel(qp, &mut last_K_w, &mut w, &mut Pw, epoch, K, verbose);
            }

            if !w.iter().all(|wj| wj.is_finite()) {
                return Err(SolverError::Numerical {
                    solver: "CD",
                    reason: "iterates are not finite",
                });
            }

            if epoch % 10 == 0 || epoch + 1 == options.get_max_iter() {
                let (_, violation) = qp.optimality_violation(w.view(), Pw.view());
                if verbose {
                    info!(
                        "epoch {}, objective {}, optimality violation {}",
                        epoch + 1,
                        qp.objective(w.view(), Pw.view()),
                        violation
                    );
                } else {
                    trace!("epoch {}, optimality violation {}", epoch + 1, violation);
                }
                if violation <= tol {
                    let objective = qp.objective(w.view(), Pw.view());
                    return Ok(Solution {
                        status: SolveStatus::Optimal,
                        w: Some(w),
                        objective: Some(objective),
                        iterations: epoch + 1,
                    });
                }
                if epoch + 1 < options.get_max_iter() {
                    w_checkpoint.assign(&w);
                }
            }
        }

        if qp.is_unbounded_along(w_checkpoint.view(), w.view()) {
            debug!("iterates drift along a direction of unbounded decrease");
            return Ok(Solution::failed(SolveStatus::Unbounded));
        }
        let objective = qp.objective(w.view(), Pw.view());
        Ok(Solution {
            status: SolveStatus::OptimalInaccurate,
            w: Some(w),
            objective: Some(objective),
            iterations: options.get_max_iter(),
        })
    }
}

/// One pass of exact coordinate minimization over all the features.
pub fn cd_epoch<F: Float>(qp: &QuadraticProgram<F>, w: &mut Array1<F>, Pw: &mut Array1<F>) {
    for j in 0..qp.n_features() {
        let old_w_j = w[j];
        let grad_j = Pw[j] + qp.q[j];
        let new_w_j = qp.coordinate_minimizer(old_w_j, grad_j, j);
        let diff = new_w_j - old_w_j;
        if diff != F::zero() {
            w[j] = new_w_j;
            Pw.scaled_add(diff, &qp.P.column(j));
        }
    }
}

/// Anderson extrapolation given the `K` previous iterates. The extrapolated
/// point is projected onto the bounds, then selected only if it decreases the
/// objective, which preserves convergence.
fn anderson_accel<F: Float>(
    qp: &QuadraticProgram<F>,
    last_K_w: &mut Array2<F>,
    w: &mut Array1<F>,
    Pw: &mut Array1<F>,
    epoch: usize,
    K: usize,
    verbose: bool,
) {
    last_K_w.row_mut(epoch % (K + 1)).assign(w);

    if epoch % (K + 1) != K {
        return;
    }

    let U = &last_K_w.slice(s![1.., ..]) - &last_K_w.slice(s![..K, ..]);
    let C = U.dot(&U.t());

    // Ill-conditioned extrapolation matrices are expected close to convergence
    let z = match solve_lin_sys(C.view(), Array1::<F>::ones(K).view()) {
        Ok(z) => z,
        Err(_) => {
            trace!("singular extrapolation matrix, could not extrapolate");
            return;
        }
    };
    let z_sum = z.sum();
    if z_sum == F::zero() || !z_sum.is_finite() {
        return;
    }
    let c = &z / z_sum;

    let mut w_acc = c.dot(&last_K_w.slice(s![..K, ..]));
    qp.project(&mut w_acc);
    let Pw_acc = qp.P.dot(&w_acc);

    let p_obj = qp.objective(w.view(), Pw.view());
    let p_obj_acc = qp.objective(w_acc.view(), Pw_acc.view());

    if p_obj_acc < p_obj {
        if verbose {
            info!("[ACCEL] p_obj {} :: p_obj_acc {}", p_obj, p_obj_acc);
        }
        w.assign(&w_acc);
        Pw.assign(&Pw_acc);
    }
}
