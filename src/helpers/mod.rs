
/// This module implements the one-dimensional proximal operators used by the
/// solver backends.
pub mod prox {
    use crate::Float;

    /// The soft-thresholding operator is the proximal operator of the
    /// (weighted) L1-norm.
    pub fn soft_thresholding<F: Float>(x: F, threshold: F) -> F {
        if x > threshold {
            x - threshold
        } else if x < -threshold {
            x + threshold
        } else {
            F::zero()
        }
    }

    /// Projection of a scalar onto the interval `[lower, upper]`. Infinite
    /// bounds leave the corresponding side open.
    pub fn box_projection<F: Float>(x: F, lower: F, upper: F) -> F {
        if x < lower {
            lower
        } else if x > upper {
            upper
        } else {
            x
        }
    }

    /// Exact proximal operator of `threshold * |x| + indicator([lower, upper])`.
    ///
    /// For a one-dimensional convex function the constrained minimizer is the
    /// unconstrained one clipped to the interval.
    pub fn prox_l1_box<F: Float>(x: F, threshold: F, lower: F, upper: F) -> F {
        box_projection(soft_thresholding(x, threshold), lower, upper)
    }
}

/// This module contains numerical helpers shared by the solver backends.
pub mod helpers {
    use crate::Float;
    use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

    /// This function solves a square linear system using Gaussian elimination
    /// with partial pivoting. It is called by the Anderson extrapolation of
    /// the coordinate descent backend to invert the (small) extrapolation
    /// matrix, hence no BLAS routine is involved.
    pub fn solve_lin_sys<F: Float>(
        A: ArrayView2<F>,
        b: ArrayView1<F>,
    ) -> Result<Array1<F>, &'static str> {
        let size = b.len();
        if A.nrows() != size || A.ncols() != size {
            return Err("Dimension mismatch between matrix and right-hand side");
        }

        let mut system = Array2::<F>::zeros((size, size + 1));
        for i in 0..size {
            for j in 0..size {
                system[[i, j]] = A[[i, j]];
            }
            system[[i, size]] = b[i];
        }

        // Forward elimination
        for col in 0..size {
            let pivot_row = (col..size)
                .max_by(|&r1, &r2| {
                    system[[r1, col]]
                        .abs()
                        .partial_cmp(&system[[r2, col]].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(col);
            let pivot = system[[pivot_row, col]];
            if pivot == F::zero() || !pivot.is_finite() {
                return Err("Infinitely many solutions or singular matrix");
            }
            if pivot_row != col {
                for k in 0..size + 1 {
                    system.swap([col, k], [pivot_row, k]);
                }
            }
            for row in (col + 1)..size {
                let factor = system[[row, col]] / pivot;
                if factor == F::zero() {
                    continue;
                }
                for k in col..size + 1 {
                    let delta = factor * system[[col, k]];
                    system[[row, k]] -= delta;
                }
            }
        }

        // Back substitution
        let mut x = Array1::<F>::zeros(size);
        for i in (0..size).rev() {
            let mut acc = system[[i, size]];
            for k in (i + 1)..size {
                acc -= system[[i, k]] * x[k];
            }
            x[i] = acc / system[[i, i]];
        }

        if x.iter().all(|xi| xi.is_finite()) {
            Ok(x)
        } else {
            Err("Ill-conditioned system produced non-finite values")
        }
    }

    /// Maximum absolute value of an array, `0` for empty arrays.
    pub fn max_abs<F: Float>(x: ArrayView1<F>) -> F {
        x.fold(F::zero(), |max_val, &xi| F::max(max_val, xi.abs()))
    }
}

/// This module contains helpers functions to efficiently write tests.
pub mod test_helpers {
    use crate::Float;
    use ndarray::prelude::*;
    use ndarray::{Array1, Array2, ArrayView1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    pub fn assert_array_all_close<F: Float>(x: ArrayView1<F>, y: ArrayView1<F>, delta: F) {
        assert_eq!(x.len(), y.len());
        for i in 0..x.len() {
            if x[i].abs_diff_ne(&y[i], delta) {
                panic!("x: {}, y: {} ; with precision level {}", x[i], y[i], delta);
            }
        }
    }

    pub fn fill_random_vector(capacity: usize, seed: u64) -> Vec<f64> {
        let mut r = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0., 1.).unwrap();
        (0..capacity).map(|_| normal.sample(&mut r)).collect()
    }

    /// Generates a seeded, well-posed regression problem `y = X w + 0.1 * noise`.
    pub fn generate_random_data(n_samples: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
        let data_x = fill_random_vector(n_samples * n_features, 42);
        let data_w = fill_random_vector(n_features, 43);
        let data_e = fill_random_vector(n_samples, 44);
        let X = Array2::from_shape_vec((n_samples, n_features).f(), data_x).unwrap();
        let true_w = Array1::from_shape_vec(n_features, data_w).unwrap();
        let noise = Array1::from_shape_vec(n_samples, data_e).unwrap();
        let y = X.dot(&true_w) + noise * 0.1;

        (X, y)
    }
}
